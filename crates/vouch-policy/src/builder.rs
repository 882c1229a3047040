//! Staged construction of policies.
//!
//! A `PolicyBuilder` accumulates logs, witnesses and groups, then is
//! consumed by `build` to produce an immutable `Policy`. Every witness and
//! group may be a member of at most one group, so no witness can be counted
//! through two branches of the tree. The first failing call poisons the
//! builder: later calls and `build` return `PolicyError::BuilderPoisoned`.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    sync::Arc,
};

use tracing::debug;
use vouch_core::KeyHash;

use crate::{
    entity::{Entity, EntityKind, Registry},
    error::{PolicyError, Result},
    quorum::QuorumNode,
    Policy,
};

/// Predefined name of the empty, always satisfied group.
pub const NONE: &str = "none";

/// How many members of a group must be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// An explicit count.
    Count(usize),
    /// At least one member.
    Any,
    /// Every member.
    All,
}

impl Threshold {
    /// Parses `any`, `all` or a canonical decimal count.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "any" => Some(Self::Any),
            "all" => Some(Self::All),
            count => vouch_core::parse_decimal(count)
                .and_then(|n| usize::try_from(n).ok())
                .map(Self::Count),
        }
    }

    /// The member count this threshold requires for a group of `members`.
    pub fn resolve(self, members: usize) -> usize {
        match self {
            Self::Count(n) => n,
            Self::Any => 1,
            Self::All => members,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(n) => write!(f, "{n}"),
            Self::Any => f.write_str("any"),
            Self::All => f.write_str("all"),
        }
    }
}

/// Builder for `Policy` values.
#[derive(Debug)]
pub struct PolicyBuilder {
    logs: Registry,
    witnesses: Registry,
    nodes: HashMap<String, Arc<QuorumNode>>,
    member_of: HashMap<String, String>,
    quorum: Option<Arc<QuorumNode>>,
    poisoned: bool,
}

impl Default for PolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyBuilder {
    /// Create a builder with only the predefined `none` group.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(NONE.to_string(), Arc::new(QuorumNode::none()));

        Self {
            logs: Registry::new(EntityKind::Log),
            witnesses: Registry::new(EntityKind::Witness),
            nodes,
            member_of: HashMap::new(),
            quorum: None,
            poisoned: false,
        }
    }

    /// Adds a log.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::DuplicateKey` if the log key is already known.
    pub fn add_log(&mut self, entity: Entity) -> Result<KeyHash> {
        self.ensure_usable()?;
        let result = self.logs.add(entity);
        self.track(result)
    }

    /// Adds a witness under `name`.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::DuplicateName` if the name is taken (including
    /// `none`) and `PolicyError::DuplicateKey` if the witness key is already
    /// known.
    pub fn add_witness(&mut self, name: &str, entity: Entity) -> Result<KeyHash> {
        self.ensure_usable()?;
        let result = self.try_add_witness(name, entity);
        self.track(result)
    }

    /// Adds a threshold group over previously defined members.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::DuplicateName`, `PolicyError::InvalidThreshold`
    /// unless `1 <= threshold <= members.len()`, `PolicyError::UndefinedName`
    /// for unknown members, and `PolicyError::AlreadyMember` when a member
    /// already belongs to a group or is listed twice.
    pub fn add_group(&mut self, name: &str, threshold: Threshold, members: &[&str]) -> Result<()> {
        self.ensure_usable()?;
        let result = self.try_add_group(name, threshold, members);
        self.track(result)
    }

    /// Makes the named witness or group the root of the policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::QuorumAlreadySet` on a second call and
    /// `PolicyError::UndefinedName` for unknown names.
    pub fn set_quorum(&mut self, name: &str) -> Result<()> {
        self.ensure_usable()?;
        let result = self.try_set_quorum(name);
        self.track(result)
    }

    /// Freezes the builder into a policy.
    ///
    /// # Errors
    ///
    /// Returns `PolicyError::BuilderPoisoned` if any earlier call failed and
    /// `PolicyError::MissingQuorum` if no quorum was set.
    pub fn build(self) -> Result<Policy> {
        self.ensure_usable()?;
        let quorum = self.quorum.ok_or(PolicyError::MissingQuorum)?;

        debug!(logs = self.logs.len(), witnesses = self.witnesses.len(), "built policy");
        Ok(Policy::from_parts(self.logs, self.witnesses, quorum))
    }

    fn try_add_witness(&mut self, name: &str, entity: Entity) -> Result<KeyHash> {
        self.ensure_new_name(name)?;
        let key_hash = self.witnesses.add(entity)?;
        self.nodes.insert(name.to_string(), Arc::new(QuorumNode::Witness(key_hash)));
        Ok(key_hash)
    }

    fn try_add_group(&mut self, name: &str, threshold: Threshold, members: &[&str]) -> Result<()> {
        self.ensure_new_name(name)?;

        let required = threshold.resolve(members.len());
        if required < 1 || required > members.len() {
            return Err(PolicyError::InvalidThreshold {
                threshold: threshold.to_string(),
                members: members.len(),
            });
        }

        let mut nodes = Vec::with_capacity(members.len());
        let mut listed = HashSet::new();
        for &member in members {
            let node = self
                .nodes
                .get(member)
                .ok_or_else(|| PolicyError::UndefinedName { name: member.to_string() })?;
            if let Some(group) = self.member_of.get(member) {
                return Err(PolicyError::AlreadyMember {
                    member: member.to_string(),
                    group: group.clone(),
                });
            }
            if !listed.insert(member) {
                return Err(PolicyError::AlreadyMember {
                    member: member.to_string(),
                    group: name.to_string(),
                });
            }
            nodes.push(Arc::clone(node));
        }

        for &member in members {
            self.member_of.insert(member.to_string(), name.to_string());
        }
        self.nodes.insert(
            name.to_string(),
            Arc::new(QuorumNode::Group { members: nodes, threshold: required }),
        );
        Ok(())
    }

    fn try_set_quorum(&mut self, name: &str) -> Result<()> {
        if self.quorum.is_some() {
            return Err(PolicyError::QuorumAlreadySet);
        }
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| PolicyError::UndefinedName { name: name.to_string() })?;
        self.quorum = Some(Arc::clone(node));
        Ok(())
    }

    fn ensure_new_name(&self, name: &str) -> Result<()> {
        if self.nodes.contains_key(name) {
            return Err(PolicyError::DuplicateName { name: name.to_string() });
        }
        Ok(())
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(PolicyError::BuilderPoisoned);
        }
        Ok(())
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}
