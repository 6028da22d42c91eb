use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs");

    let hash = run("git", &["rev-parse", "--short", "HEAD"]).unwrap_or_else(unknown);
    let status = match run("git", &["status", "--porcelain"]) {
        Some(changes) if changes.is_empty() => "clean".to_string(),
        Some(_) => "dirty".to_string(),
        None => unknown(),
    };
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let target = env::var("TARGET").unwrap_or_else(|_| unknown());
    let profile = env::var("PROFILE").unwrap_or_else(|_| unknown());
    let rustc = run("rustc", &["--version"]).unwrap_or_else(unknown);

    for (key, value) in [
        ("HASH", hash),
        ("STATUS", status),
        ("TIMESTAMP", timestamp),
        ("TARGET", target),
        ("PROFILE", profile),
        ("RUSTC", rustc),
    ] {
        println!("cargo:rustc-env=FINLEDGER_BUILD_{key}={value}");
    }
}

/// Trimmed stdout of a successful command.
fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|text| text.trim().to_string())
}

fn unknown() -> String {
    "unknown".to_string()
}
