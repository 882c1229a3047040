//! Named policy lookup.
//!
//! An operator-supplied name resolves to `<name>.policy` in a policy
//! directory first and falls back to the policies compiled into the binary.
//! The directory is reached through the `PolicyDirectory` trait so tests can
//! substitute an in-memory one.

use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    error::{PolicyError, Result},
    parser::parse_policy,
    Policy,
};

/// File extension of policy files.
pub const POLICY_EXTENSION: &str = "policy";

/// A policy compiled into the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinPolicy {
    /// Name the policy is looked up by.
    pub name: &'static str,
    /// Policy text.
    pub contents: &'static str,
}

include!(concat!(env!("OUT_DIR"), "/builtin_policies.rs"));

/// Source of operator-provided policy files.
pub trait PolicyDirectory {
    /// Reads a policy file, returning `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than the file being absent.
    fn read(&self, file_name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Lists file names in the directory. A missing directory is empty.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than the directory being absent.
    fn list(&self) -> io::Result<Vec<String>>;
}

/// Policy directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsPolicyDirectory {
    root: PathBuf,
}

impl FsPolicyDirectory {
    /// Create a directory source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory searched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PolicyDirectory for FsPolicyDirectory {
    fn read(&self, file_name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.root.join(file_name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self) -> io::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in entries {
            if let Some(name) = entry?.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// Resolves policy names against a directory and the builtin table.
#[derive(Debug, Clone)]
pub struct PolicyCatalog<D> {
    directory: D,
    builtins: &'static [BuiltinPolicy],
}

impl<D: PolicyDirectory> PolicyCatalog<D> {
    /// Create a catalog over `directory` and the compiled-in policies.
    pub fn new(directory: D) -> Self {
        Self::with_builtins(directory, BUILTIN_POLICIES)
    }

    /// Create a catalog with an explicit builtin table.
    pub fn with_builtins(directory: D, builtins: &'static [BuiltinPolicy]) -> Self {
        Self { directory, builtins }
    }

    /// Returns the text of the named policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::InvalidPolicyName`, `PolicyError::UnknownPolicy`
    /// or `PolicyError::Directory`.
    pub fn source(&self, name: &str) -> Result<Vec<u8>> {
        validate_policy_name(name)?;

        let file_name = format!("{name}.{POLICY_EXTENSION}");
        let from_directory = self
            .directory
            .read(&file_name)
            .map_err(|e| PolicyError::Directory { reason: format!("{file_name}: {e}") })?;
        if let Some(bytes) = from_directory {
            debug!(policy = name, "using policy from directory");
            return Ok(bytes);
        }

        self.builtins
            .iter()
            .find(|builtin| builtin.name == name)
            .map(|builtin| {
                debug!(policy = name, "using builtin policy");
                builtin.contents.as_bytes().to_vec()
            })
            .ok_or_else(|| PolicyError::UnknownPolicy { name: name.to_string() })
    }

    /// Looks up and parses the named policy.
    ///
    /// # Errors
    ///
    /// Returns lookup errors from `source` and parse errors from the policy.
    pub fn load(&self, name: &str) -> Result<Policy> {
        parse_policy(&self.source(name)?)
    }

    /// Names of all available policies, sorted and de-duplicated.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::Directory` if the directory cannot be listed.
    pub fn list(&self) -> Result<Vec<String>> {
        let files =
            self.directory.list().map_err(|e| PolicyError::Directory { reason: e.to_string() })?;

        let mut names: BTreeSet<String> =
            self.builtins.iter().map(|builtin| builtin.name.to_string()).collect();
        names.extend(files.iter().filter_map(|file| {
            let name = file.strip_suffix(POLICY_EXTENSION)?.strip_suffix('.')?;
            validate_policy_name(name).is_ok().then(|| name.to_string())
        }));
        Ok(names.into_iter().collect())
    }
}

/// Checks that `name` is safe to use as a file name component.
///
/// Names start with an ASCII letter or digit and continue with letters,
/// digits, `.`, `_` or `-`.
///
/// # Errors
///
/// Returns `PolicyError::InvalidPolicyName` otherwise.
pub fn validate_policy_name(name: &str) -> Result<()> {
    let mut bytes = name.bytes();
    let valid = bytes.next().is_some_and(|b| b.is_ascii_alphanumeric())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if !valid {
        return Err(PolicyError::InvalidPolicyName { name: name.to_string() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryDirectory {
        files: HashMap<String, String>,
    }

    impl MemoryDirectory {
        fn with(mut self, file: &str, contents: &str) -> Self {
            self.files.insert(file.to_string(), contents.to_string());
            self
        }
    }

    impl PolicyDirectory for MemoryDirectory {
        fn read(&self, file_name: &str) -> io::Result<Option<Vec<u8>>> {
            Ok(self.files.get(file_name).map(|c| c.as_bytes().to_vec()))
        }

        fn list(&self) -> io::Result<Vec<String>> {
            Ok(self.files.keys().cloned().collect())
        }
    }

    static BUILTINS: &[BuiltinPolicy] = &[
        BuiltinPolicy { name: "alpha", contents: "quorum none\n" },
        BuiltinPolicy { name: "shared", contents: "# builtin\nquorum none\n" },
    ];

    #[test]
    fn validates_names() {
        for name in ["a", "vouch-test-1", "A.b_c-9", "0"] {
            assert!(validate_policy_name(name).is_ok(), "{name} should be valid");
        }
        for name in ["", ".hidden", "-x", "../etc/passwd", "a/b", "a b", "a\\b", "é"] {
            assert_eq!(
                validate_policy_name(name),
                Err(PolicyError::InvalidPolicyName { name: name.to_string() })
            );
        }
    }

    #[test]
    fn directory_shadows_builtin() {
        let dir = MemoryDirectory::default().with("shared.policy", "# local\nquorum none\n");
        let catalog = PolicyCatalog::with_builtins(dir, BUILTINS);

        assert_eq!(catalog.source("shared").unwrap(), b"# local\nquorum none\n");
        assert_eq!(catalog.source("alpha").unwrap(), b"quorum none\n");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let catalog = PolicyCatalog::with_builtins(MemoryDirectory::default(), BUILTINS);

        assert_eq!(
            catalog.source("missing").unwrap_err(),
            PolicyError::UnknownPolicy { name: "missing".to_string() }
        );
    }

    #[test]
    fn traversal_is_rejected_before_lookup() {
        let dir = MemoryDirectory::default().with("../secret.policy", "quorum none\n");
        let catalog = PolicyCatalog::with_builtins(dir, BUILTINS);

        assert!(matches!(
            catalog.source("../secret"),
            Err(PolicyError::InvalidPolicyName { .. })
        ));
    }

    #[test]
    fn list_merges_sources() {
        let dir = MemoryDirectory::default()
            .with("shared.policy", "quorum none\n")
            .with("zeta.policy", "quorum none\n")
            .with("notes.txt", "")
            .with(".policy", "")
            .with(".hidden.policy", "");
        let catalog = PolicyCatalog::with_builtins(dir, BUILTINS);

        assert_eq!(catalog.list().unwrap(), ["alpha", "shared", "zeta"]);
    }

    #[test]
    fn load_parses_policy() {
        let catalog = PolicyCatalog::with_builtins(MemoryDirectory::default(), BUILTINS);

        let policy = catalog.load("alpha").unwrap();

        assert!(policy.logs().is_empty());
    }

    #[test]
    fn builtin_table_is_sorted_and_parses() {
        assert!(!BUILTIN_POLICIES.is_empty());
        assert!(BUILTIN_POLICIES.windows(2).all(|pair| pair[0].name < pair[1].name));
        for builtin in BUILTIN_POLICIES {
            validate_policy_name(builtin.name).unwrap();
            parse_policy(builtin.contents.as_bytes()).unwrap();
        }
    }
}
