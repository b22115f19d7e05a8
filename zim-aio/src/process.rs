// zim-aio/src/process.rs
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, error};
use zim_common::error::{Result, ZimError};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;
#[cfg(windows)]
const BELOW_NORMAL_PRIORITY_CLASS: u32 = 0x0000_4000;

/// Starts a process that outlives the caller. Standard streams are detached
/// and the child is never waited on. Returns the child's pid.
pub fn spawn_detached(program: &Path, args: &[String], cwd: Option<&Path>) -> Result<u32> {
    debug!(
        "Spawning detached process: {} {:?} (cwd: {:?})",
        program.display(),
        args,
        cwd
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW | BELOW_NORMAL_PRIORITY_CLASS);
    }

    match cmd.spawn() {
        Ok(child) => {
            let pid = child.id();
            debug!("Detached process started with pid {}", pid);
            // Dropping the handle does not kill or wait for the child.
            drop(child);
            Ok(pid)
        }
        Err(e) => {
            error!("Failed to spawn {}: {}", program.display(), e);
            Err(ZimError::io_at(e, "spawn", program))
        }
    }
}
