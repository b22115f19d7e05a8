// zim/src/main.rs
use std::path::{Path, PathBuf};
use std::{env, fs, process};

use clap::Parser;
use colored::Colorize;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;
use zim_common::config::{Config, MANIFEST_FILENAME, UNINSTALLER_FILENAME};
use zim_common::error::Result as zimResult;

mod cli;
use cli::{CliArgs, UninstallerArgs};

/// When this binary is an installed application's uninstaller, the
/// directory it should remove.
fn uninstaller_dir(exe: &Path) -> Option<PathBuf> {
    let file_name = exe.file_name()?.to_str()?;
    if !file_name.eq_ignore_ascii_case(UNINSTALLER_FILENAME) {
        return None;
    }
    let dir = exe.parent()?;
    dir.join(MANIFEST_FILENAME)
        .is_file()
        .then(|| dir.to_path_buf())
}

fn init_logging(config: &Config, verbose: u8) {
    let level_filter = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let max_log_level = level_filter.into_level().unwrap_or(tracing::Level::INFO);

    let env_filter = EnvFilter::builder()
        .with_default_directive(level_filter.into())
        .with_env_var("ZIM_LOG")
        .from_env_lossy();

    let log_dir = config.logs_dir();
    if verbose == 0 {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!(
            "{} Failed to create log directory {}: {}",
            "Warning:".yellow().bold(),
            log_dir.display(),
            e
        );
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .without_time()
            .try_init();
        return;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "zim.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);
    let stderr_writer = std::io::stderr.with_max_level(max_log_level);
    let file_writer = non_blocking_appender.with_max_level(max_log_level);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(stderr_writer.and(file_writer))
        .with_ansi(true)
        .without_time()
        .try_init();

    // Keep the writer flushing until exit.
    Box::leak(Box::new(guard));

    debug!(
        "Verbose logging enabled. Writing logs to: {}/zim.log",
        log_dir.display()
    );
}

#[tokio::main]
async fn main() -> zimResult<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: Could not load config: {:#}", "Error".red().bold(), e);
            process::exit(1);
        }
    };

    let uninstall_dir = env::current_exe().ok().as_deref().and_then(uninstaller_dir);
    let result = match uninstall_dir {
        Some(dir) => {
            let mut args = UninstallerArgs::parse();
            init_logging(&config, args.verbose);
            debug!("Running as uninstaller for {}", dir.display());
            args.uninstall.target = Some(dir);
            args.uninstall.run(&config).await
        }
        None => {
            let cli_args = CliArgs::parse();
            init_logging(&config, cli_args.verbose);
            cli_args.command.run(&config).await
        }
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("{}: {:#}", "Error".red().bold(), e);
        process::exit(1);
    }

    debug!("Command completed successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uninstaller_mode_needs_name_and_manifest() {
        let tmp = tempfile::tempdir().unwrap();
        let uninstaller = tmp.path().join(UNINSTALLER_FILENAME);
        fs::write(&uninstaller, "").unwrap();
        assert_eq!(uninstaller_dir(&uninstaller), None);

        fs::write(tmp.path().join(MANIFEST_FILENAME), "{}").unwrap();
        assert_eq!(uninstaller_dir(&uninstaller), Some(tmp.path().to_path_buf()));
        assert_eq!(uninstaller_dir(&tmp.path().join("zim")), None);
    }
}
