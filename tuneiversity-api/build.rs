//! Build script for tuneiversity-api
//!
//! Exposes build identification to the binary as compile-time env vars,
//! logged once at startup:
//! - `GIT_HASH`: short commit hash, or "unknown" outside a git checkout
//! - `BUILD_TIMESTAMP`: RFC 3339, UTC, whole seconds
//! - `BUILD_PROFILE`: cargo profile (debug/release)

use std::process::Command;

const UNKNOWN: &str = "unknown";

/// Short (8 character) hash of HEAD
fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    Some(hash.trim().to_string())
}

fn emit(key: &str, value: &str) {
    println!("cargo:rustc-env={}={}", key, value);
}

fn main() {
    let git_hash = git_short_hash().unwrap_or_else(|| UNKNOWN.to_string());
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string());

    emit("GIT_HASH", &git_hash);
    emit("BUILD_TIMESTAMP", &timestamp);
    emit("BUILD_PROFILE", &profile);

    // No rerun-if-changed: cargo reruns the script on every build, keeping
    // hash and timestamp current
}
