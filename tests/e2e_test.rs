//! End-to-end tests driving the `vouch` binary.

use std::{
    fs,
    io::Write,
    path::Path,
    process::{Command, Output, Stdio},
};

use vouch_core::Signer;
use vouch_testing::{log_signer, witness_signer, CosignedTreeHeadBuilder, PolicyTextBuilder};

struct Vouch {
    dir: tempfile::TempDir,
}

impl Vouch {
    fn new() -> Self {
        Self { dir: tempfile::tempdir().unwrap() }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write(&self, name: &str, contents: &str) {
        fs::write(self.path().join(name), contents).unwrap();
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_vouch"));
        command
            .args(args)
            .current_dir(self.path())
            .env_remove("VOUCH_POLICY")
            .env_remove("VOUCH_POLICY_FILE")
            .env("VOUCH_POLICY_DIR", self.path().join("policies"))
            .env("RUST_LOG", "warn");
        command
    }

    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut command = self.command(args);
        command.envs(envs.iter().copied());
        command.output().unwrap()
    }

    fn run_with_stdin(&self, args: &[&str], envs: &[(&str, &str)], stdin: &str) -> Output {
        let mut command = self.command(args);
        command
            .envs(envs.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let mut child = command.spawn().unwrap();
        // The binary may exit before reading its input.
        let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
        child.wait_with_output().unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn verifies_with_builtin_policy() {
    let vouch = Vouch::new();
    let log = log_signer();
    let (w0, w1) = (witness_signer(0), witness_signer(1));
    let cth = CosignedTreeHeadBuilder::new(&log).cosigned_by(&w0).cosigned_by(&w1).build();
    vouch.write("cth.txt", &cth.to_ascii());

    let output = vouch.run(
        &["verify", &log.key_hash().to_hex(), "cth.txt"],
        &[("VOUCH_POLICY", "vouch-test-1")],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "size=42 verified=2 failed=0 ignored=0\n");
}

#[test]
fn rejects_insufficient_quorum() {
    let vouch = Vouch::new();
    let log = log_signer();
    let w0 = witness_signer(0);
    let cth = CosignedTreeHeadBuilder::new(&log).cosigned_by(&w0).build();

    let output = vouch.run_with_stdin(
        &["verify", &log.key_hash().to_hex()],
        &[("VOUCH_POLICY", "vouch-test-1")],
        &cth.to_ascii(),
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("E2003"), "{}", stderr(&output));
}

#[test]
fn policy_file_from_config_file() {
    let vouch = Vouch::new();
    let log = log_signer();
    let w3 = witness_signer(3);
    let policy = PolicyTextBuilder::new()
        .log(&log.public_key(), None)
        .witness("solo", &w3.public_key(), None)
        .quorum("solo")
        .build();
    vouch.write("site.policy", &policy);
    vouch.write("vouch.toml", "policy_file = \"site.policy\"\n");
    let cth = CosignedTreeHeadBuilder::new(&log).cosigned_by(&w3).size(7).build();

    let output =
        vouch.run_with_stdin(&["verify", &log.key_hash().to_hex(), "-"], &[], &cth.to_ascii());

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "size=7 verified=1 failed=0 ignored=0\n");
}

#[test]
fn directory_policy_shadows_builtin() {
    let vouch = Vouch::new();
    let log = log_signer();
    fs::create_dir(vouch.path().join("policies")).unwrap();
    let lenient = PolicyTextBuilder::new().log(&log.public_key(), None).quorum("none").build();
    vouch.write("policies/vouch-test-1.policy", &lenient);
    let cth = CosignedTreeHeadBuilder::new(&log).build();

    let output = vouch.run_with_stdin(
        &["verify", &log.key_hash().to_hex()],
        &[("VOUCH_POLICY", "vouch-test-1")],
        &cth.to_ascii(),
    );

    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn verifies_checkpoint_log_signature() {
    let vouch = Vouch::new();
    let log = log_signer();
    let w0 = witness_signer(0);
    let text = CosignedTreeHeadBuilder::new(&log).cosigned_by(&w0).build_checkpoint_text();
    vouch.write("checkpoint.txt", &text);

    let output = vouch.run(
        &["checkpoint", &log.key_hash().to_hex(), "checkpoint.txt"],
        &[("VOUCH_POLICY", "vouch-test-1")],
    );

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "size=42\n");
}

#[test]
fn checkpoint_from_unknown_log_rejected() {
    let vouch = Vouch::new();
    let rogue = witness_signer(7);
    let text = CosignedTreeHeadBuilder::new(&rogue).build_checkpoint_text();

    let output = vouch.run_with_stdin(
        &["checkpoint", &rogue.key_hash().to_hex()],
        &[("VOUCH_POLICY", "vouch-test-1")],
        &text,
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("is not part of the policy"), "{}", stderr(&output));
}

#[test]
fn lists_builtin_and_directory_policies() {
    let vouch = Vouch::new();
    fs::create_dir(vouch.path().join("policies")).unwrap();
    vouch.write("policies/site.policy", "quorum none\n");

    let output = vouch.run(&["policies"], &[("VOUCH_POLICY", "site")]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "site\nvouch-test-1\nvouch-test-nested\n");
}

#[test]
fn missing_policy_configuration_fails() {
    let vouch = Vouch::new();

    let output = vouch.run(&["policies"], &[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("one of policy or policy_file must be set"));
}

#[test]
fn invalid_policy_reports_line() {
    let vouch = Vouch::new();
    vouch.write("broken.policy", "quorum none\nfrobnicate\n");
    let log = log_signer();

    let output = vouch.run_with_stdin(
        &["verify", &log.key_hash().to_hex()],
        &[("VOUCH_POLICY_FILE", "broken.policy")],
        "",
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("line 2"), "{}", stderr(&output));
}

#[test]
fn rejects_malformed_log_key_hash() {
    let vouch = Vouch::new();

    let output = vouch.run(&["verify", "not-hex"], &[("VOUCH_POLICY", "vouch-test-1")]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("invalid value 'not-hex'"), "{}", stderr(&output));
}

#[test]
fn usage_on_bad_arguments() {
    let vouch = Vouch::new();

    let output = vouch.run(&["frobnicate"], &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Usage: vouch <COMMAND>"), "{}", stderr(&output));
}
