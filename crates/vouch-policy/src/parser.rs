//! Line-oriented policy configuration format.
//!
//! ```text
//! log <hex public key> [<url>]
//! witness <name> <hex public key> [<url>]
//! group <name> <threshold | any | all> <member>...
//! quorum <name>
//! ```
//!
//! `#` starts a comment and blank lines are ignored. Control characters
//! other than tab are rejected before anything else is looked at.

use vouch_core::PublicKey;

use crate::{
    builder::{PolicyBuilder, Threshold},
    entity::Entity,
    error::{PolicyError, Result},
    Policy,
};

/// Parses a policy from its text form.
///
/// # Errors
///
/// Returns the first error found, attributed to its line with
/// `PolicyError::AtLine`. A policy without a quorum declaration fails with
/// `PolicyError::MissingQuorum`.
pub fn parse_policy(input: &[u8]) -> Result<Policy> {
    let mut builder = PolicyBuilder::new();

    for (index, raw) in input.split(|&b| b == b'\n').enumerate() {
        parse_line(&mut builder, raw).map_err(|e| e.at_line(index + 1))?;
    }

    builder.build()
}

fn parse_line(builder: &mut PolicyBuilder, raw: &[u8]) -> Result<()> {
    if let Some(&byte) = raw.iter().find(|&&b| b.is_ascii() && is_control(char::from(b))) {
        return Err(PolicyError::InvalidCharacter { character: char::from(byte) });
    }
    let line = std::str::from_utf8(raw).map_err(|_| PolicyError::InvalidUtf8)?;
    if let Some(character) = line.chars().find(|&c| is_control(c)) {
        return Err(PolicyError::InvalidCharacter { character });
    }
    let line = line.split_once('#').map_or(line, |(content, _)| content);

    let fields: Vec<&str> = line.split_whitespace().collect();
    let Some((&keyword, args)) = fields.split_first() else {
        return Ok(());
    };

    match keyword {
        "log" => {
            let (key, url) = match args {
                [key] => (*key, None),
                [key, url] => (*key, Some(*url)),
                _ => return Err(arity("log", "<public key> [<url>]", args.len())),
            };
            builder.add_log(entity(key, url)?)?;
        },
        "witness" => {
            let (name, key, url) = match args {
                [name, key] => (*name, *key, None),
                [name, key, url] => (*name, *key, Some(*url)),
                _ => return Err(arity("witness", "<name> <public key> [<url>]", args.len())),
            };
            builder.add_witness(name, entity(key, url)?)?;
        },
        "group" => {
            let [name, threshold, members @ ..] = args else {
                return Err(arity("group", "<name> <threshold> <member>...", args.len()));
            };
            if members.is_empty() {
                return Err(arity("group", "<name> <threshold> <member>...", args.len()));
            }
            let threshold = Threshold::parse(threshold).ok_or_else(|| {
                PolicyError::InvalidThreshold {
                    threshold: threshold.to_string(),
                    members: members.len(),
                }
            })?;
            builder.add_group(name, threshold, members)?;
        },
        "quorum" => {
            let [name] = args else {
                return Err(arity("quorum", "<name>", args.len()));
            };
            builder.set_quorum(name)?;
        },
        other => return Err(PolicyError::UnknownKeyword { keyword: other.to_string() }),
    }
    Ok(())
}

/// Tab separates fields; every other C0, DEL or C1 control is rejected.
fn is_control(c: char) -> bool {
    c.is_control() && c != '\t'
}

fn entity(key: &str, url: Option<&str>) -> Result<Entity> {
    let public_key = PublicKey::from_hex(key)
        .map_err(|e| PolicyError::InvalidPublicKey { reason: e.to_string() })?;
    Ok(Entity::new(public_key, url.map(str::to_string)))
}

fn arity(keyword: &'static str, usage: &str, got: usize) -> PolicyError {
    PolicyError::invalid_syntax(keyword, format!("expected {keyword} {usage}, got {got} arguments"))
}
