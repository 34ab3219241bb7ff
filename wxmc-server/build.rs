//! Embeds build identification for the startup log line
//!
//! - `GIT_HASH`: short commit, `-dirty` when the tree has local edits,
//!   `unknown` outside a checkout
//! - `BUILD_TIMESTAMP`: RFC 3339, honouring `SOURCE_DATE_EPOCH`
//! - `BUILD_PROFILE`: cargo profile

use std::env;
use std::path::Path;
use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};

fn main() {
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
    watch_git_head();

    let commit = match git(&["rev-parse", "--short=8", "HEAD"]) {
        Some(hash) if is_dirty() => format!("{}-dirty", hash),
        Some(hash) => hash,
        None => "unknown".to_string(),
    };

    emit("GIT_HASH", &commit);
    emit("BUILD_TIMESTAMP", &build_time().to_rfc3339_opts(SecondsFormat::Secs, true));
    emit("BUILD_PROFILE", &env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string()));
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

/// Trimmed stdout of a successful git command
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string())
}

fn is_dirty() -> bool {
    git(&["status", "--porcelain", "--untracked-files=no"]).is_some_and(|s| !s.is_empty())
}

/// Rebuild when HEAD moves, instead of on every build
fn watch_git_head() {
    let Some(git_dir) = git(&["rev-parse", "--git-dir"]) else {
        return;
    };
    let head = Path::new(&git_dir).join("HEAD");
    println!("cargo:rerun-if-changed={}", head.display());

    if let Some(branch_ref) = git(&["symbolic-ref", "-q", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", Path::new(&git_dir).join(branch_ref).display());
    }
}

/// `SOURCE_DATE_EPOCH` for reproducible builds, else now
fn build_time() -> DateTime<Utc> {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}
