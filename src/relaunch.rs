//! One-shot process relaunch.
//!
//! Some OS-level observation state is only correctly established at process
//! start, so a permission grant that arrives after an untrusted launch is
//! followed by a full relaunch: a detached shell script waits for this
//! process to exit, starts a fresh copy, and the current process terminates.

use std::path::Path;
use std::process::Command;

use tracing::info;

fn relaunch_script(exe: &Path) -> String {
    format!("#!/bin/sh\nsleep 1\nexec \"{}\"\n", exe.display())
}

/// Write and spawn the relaunch script. On success the caller is expected to
/// exit shortly afterwards; on failure the caller should tell the user to
/// restart by hand.
pub fn spawn_relauncher() -> Result<(), String> {
    let exe = std::env::current_exe().map_err(|e| format!("cannot resolve executable: {e}"))?;
    let script = relaunch_script(&exe);

    let path = std::env::temp_dir().join("docktoggle_relaunch.sh");
    std::fs::write(&path, script).map_err(|e| format!("cannot write relaunch script: {e}"))?;

    let chmod = Command::new("/bin/chmod")
        .arg("+x")
        .arg(&path)
        .status()
        .map_err(|e| format!("chmod failed to run: {e}"))?;
    if !chmod.success() {
        return Err(format!("chmod exited with {chmod}"));
    }

    Command::new("/bin/sh")
        .arg(&path)
        .spawn()
        .map_err(|e| format!("cannot spawn relauncher: {e}"))?;

    info!(script = %path.display(), "relauncher spawned");
    Ok(())
}
