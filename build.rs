use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let full = git_full_hash().or_else(env_git_hash);
    if let Some(hash) = full.as_deref() {
        println!("cargo:rustc-env=QUILL_GIT_HASH_FULL={hash}");
    }
    if let Some(short) = full.as_deref().and_then(shorten_hash) {
        println!("cargo:rustc-env=QUILL_GIT_HASH={short}");
    }
    if let Some(dirty) = git_is_dirty() {
        println!(
            "cargo:rustc-env=QUILL_GIT_DIRTY={}",
            if dirty { "true" } else { "false" }
        );
    }

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".into());
    println!("cargo:rustc-env=QUILL_BUILD_PROFILE={profile}");
    if let Ok(target) = env::var("TARGET") {
        println!("cargo:rustc-env=QUILL_BUILD_TARGET={target}");
    }
    println!(
        "cargo:rustc-env=QUILL_BUILD_UNIX={}",
        stable_build_unix_timestamp()
    );
}

fn git_full_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn env_git_hash() -> Option<String> {
    let hash = env::var("GITHUB_SHA").ok()?;
    let trimmed = hash.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn shorten_hash(hash: &str) -> Option<String> {
    let trimmed = hash.trim();
    if trimmed.len() < 7 {
        return None;
    }
    Some(trimmed.chars().take(8).collect())
}

fn git_is_dirty() -> Option<bool> {
    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(!output.stdout.is_empty())
}

fn stable_build_unix_timestamp() -> String {
    if let Ok(value) = env::var("SOURCE_DATE_EPOCH") {
        if value.parse::<u64>().is_ok() {
            return value;
        }
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or_else(|_| "0".into(), |duration| duration.as_secs().to_string())
}
