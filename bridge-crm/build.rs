//! Stamps the binary with the source revision it was built from
//!
//! Exposes `BRIDGE_REVISION` (`git describe`, with `-dirty` for uncommitted
//! changes), `BRIDGE_BUILT_AT` (UTC) and `BRIDGE_PROFILE` to the crate.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|t| !t.is_empty())
}

fn main() {
    let revision = git(&["describe", "--always", "--dirty", "--abbrev=8"])
        .unwrap_or_else(|| "unversioned".to_string());

    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    // Re-stamp when HEAD moves rather than on every source edit
    if let Some(head) = git(&["rev-parse", "--git-path", "HEAD"]) {
        println!("cargo:rerun-if-changed={}", head);
    }
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-env=BRIDGE_REVISION={}", revision);
    println!("cargo:rustc-env=BRIDGE_BUILT_AT={}", built_at);
    println!("cargo:rustc-env=BRIDGE_PROFILE={}", profile);
}
