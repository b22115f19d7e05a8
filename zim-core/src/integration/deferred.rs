// zim-core/src/integration/deferred.rs
//! Self-deletion after exit: a small script is written to the temp directory
//! and started detached. It waits for the executable to become deletable,
//! removes it (and optionally its directory) and then removes itself.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zim_common::error::Result;

use super::DeferredDeleter;

#[derive(Debug, Clone)]
pub struct ScriptDeleter {
    script_dir: PathBuf,
}

impl Default for ScriptDeleter {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl ScriptDeleter {
    pub fn new(script_dir: PathBuf) -> Self {
        Self { script_dir }
    }

    /// Writes the script for the current process without starting it.
    pub fn write_script(&self, executable: &Path, directory: Option<&Path>) -> Result<PathBuf> {
        let pid = std::process::id();
        let script_path = self.script_dir.join(script_file_name(pid));
        let body = render_script(executable, directory, pid);
        zim_aio::fs::atomic_write_file(&script_path, body.as_bytes())?;
        #[cfg(unix)]
        zim_aio::fs::set_permissions(&script_path, 0o755)?;
        Ok(script_path)
    }
}

impl DeferredDeleter for ScriptDeleter {
    fn schedule_deletion(&self, executable: &Path, directory: Option<&Path>) -> Result<()> {
        let script_path = self.write_script(executable, directory)?;
        let (program, args) = launcher(&script_path);
        zim_aio::spawn_detached(&program, &args, Some(&self.script_dir))?;
        info!(
            "Scheduled removal of {} after exit via {}",
            executable.display(),
            script_path.display()
        );
        Ok(())
    }
}

#[cfg(windows)]
fn script_file_name(pid: u32) -> String {
    format!("uninstall_{pid}.bat")
}

#[cfg(not(windows))]
fn script_file_name(pid: u32) -> String {
    format!("uninstall_{pid}.sh")
}

#[cfg(windows)]
fn launcher(script: &Path) -> (PathBuf, Vec<String>) {
    (
        PathBuf::from("cmd.exe"),
        vec!["/C".to_string(), script.display().to_string()],
    )
}

#[cfg(not(windows))]
fn launcher(script: &Path) -> (PathBuf, Vec<String>) {
    (PathBuf::from("/bin/sh"), vec![script.display().to_string()])
}

/// Batch script that retries the delete until the executable is no longer locked.
#[cfg(windows)]
pub fn render_script(executable: &Path, directory: Option<&Path>, _pid: u32) -> String {
    let mut script = String::from("@echo off\r\n");
    script.push_str(":retry\r\n");
    script.push_str(&format!("del /f /q \"{}\" >nul 2>&1\r\n", executable.display()));
    script.push_str(&format!(
        "if exist \"{}\" (\r\n  timeout /t 1 /nobreak >nul\r\n  goto retry\r\n)\r\n",
        executable.display()
    ));
    if let Some(dir) = directory {
        script.push_str("timeout /t 1 /nobreak >nul\r\n");
        script.push_str(&format!("rmdir /s /q \"{}\"\r\n", dir.display()));
    }
    script.push_str("del \"%~f0\"\r\n");
    debug!("Rendered deferred deletion batch script");
    script
}

/// Shell script that waits for `pid` to exit before deleting.
#[cfg(not(windows))]
pub fn render_script(executable: &Path, directory: Option<&Path>, pid: u32) -> String {
    let mut script = String::from("#!/bin/sh\n");
    script.push_str(&format!(
        "while kill -0 {pid} 2>/dev/null; do sleep 1; done\n"
    ));
    script.push_str(&format!("rm -f {}\n", shell_quote(executable)));
    if let Some(dir) = directory {
        script.push_str(&format!("rm -rf {}\n", shell_quote(dir)));
    }
    script.push_str("rm -f \"$0\"\n");
    debug!("Rendered deferred deletion shell script");
    script
}

#[cfg(not(windows))]
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}
