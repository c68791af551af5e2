//! Build script: embeds version information at compile time.

use std::process::Command;

fn main() {
    // TUXSYNC_VERSION from the release environment wins over git describe.
    if let Ok(version) = std::env::var("TUXSYNC_VERSION") {
        println!("cargo:rustc-env=TUXSYNC_VERSION={version}");
    } else if let Ok(output) = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        && output.status.success()
    {
        let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=TUXSYNC_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=TUXSYNC_VERSION");
}
