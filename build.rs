use std::process::Command;

fn main() {
    // Tell Cargo to recognize the 'production' cfg
    println!("cargo::rustc-check-cfg=cfg(production)");
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();

    // Get git hash (short form)
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .unwrap_or_else(|| "unknown".to_string())
        .trim()
        .to_string();

    println!("cargo:rustc-env=BUILD_DATE={}", date);
    println!("cargo:rustc-env=GIT_HASH={}", git_hash);

    // Release builds read settings from the production config directory
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "debug".to_string());
    if profile == "release" {
        println!("cargo:rustc-cfg=production");

        if cfg!(target_os = "linux") {
            println!("cargo:rustc-link-arg=-static-libgcc");
        }
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
}
