use std::{
    fs::{self, File},
    io::Write,
    path::PathBuf,
};

// Generated source embeds policy text as literals, never absolute paths.
fn main() {
    println!("cargo:rerun-if-changed=policies");

    let mut policies: Vec<(String, String)> = fs::read_dir("policies")
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "policy"))
        .map(|path| {
            let name = path.file_stem().unwrap().to_str().unwrap().to_string();
            (name, fs::read_to_string(&path).unwrap())
        })
        .collect();
    policies.sort();

    let out = PathBuf::from(std::env::var("OUT_DIR").unwrap()).join("builtin_policies.rs");
    let mut f = File::create(out).unwrap();
    writeln!(f, "/// Policies compiled into the binary, sorted by name.").unwrap();
    writeln!(f, "pub static BUILTIN_POLICIES: &[BuiltinPolicy] = &[").unwrap();
    for (name, contents) in &policies {
        writeln!(f, "    BuiltinPolicy {{ name: {name:?}, contents: {contents:?} }},").unwrap();
    }
    writeln!(f, "];").unwrap();
}
