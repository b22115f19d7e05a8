// zim/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use zim_common::error::Result;
use zim_common::Config;
use zim_core::pipeline::WorkerContext;
use zim_core::{JsonVersionStore, LocalIntegration, ScriptDeleter, StaticVersionStore, VersionStore};

pub mod inspect;
pub mod install;
pub mod list;
pub mod self_cmd;
pub mod status;
pub mod ui;
pub mod uninstall;

use crate::cli::inspect::Inspect;
use crate::cli::install::InstallArgs;
use crate::cli::list::List;
use crate::cli::self_cmd::SelfCommand;
use crate::cli::uninstall::Uninstall;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "zim", bin_name = "zim")]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Arguments accepted when the binary runs as an installed application's uninstaller.
#[derive(Parser, Debug)]
#[command(author, version, about = "Remove this application", long_about = None)]
pub struct UninstallerArgs {
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(flatten)]
    pub uninstall: Uninstall,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show which executable and layout zim detects in an archive
    Inspect(Inspect),
    /// Install a portable application from a ZIP archive
    Install(InstallArgs),
    /// Remove an installed application
    Uninstall(Uninstall),
    /// List applications installed by zim
    List(List),
    /// Install, update or remove zim itself
    #[command(name = "self", subcommand)]
    SelfCmd(SelfCommand),
}

impl Command {
    pub async fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Inspect(command) => command.run(config).await,
            Self::Install(command) => command.run(config).await,
            Self::Uninstall(command) => command.run(config).await,
            Self::List(command) => command.run(config).await,
            Self::SelfCmd(command) => command.run(config).await,
        }
    }
}

/// Version of the running binary: the version file in the state directory
/// when one exists, otherwise the version compiled in.
pub fn version_store(config: &Config) -> Arc<dyn VersionStore> {
    let path = config.version_file_path();
    if path.is_file() {
        Arc::new(JsonVersionStore::new(path))
    } else {
        Arc::new(StaticVersionStore::compiled())
    }
}

pub fn worker_context(config: &Config, running_executable: Option<PathBuf>) -> WorkerContext {
    WorkerContext {
        config: config.clone(),
        integration: Arc::new(LocalIntegration::new(config)),
        deleter: Arc::new(ScriptDeleter::default()),
        versions: version_store(config),
        running_executable,
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definitions_are_consistent() {
        CliArgs::command().debug_assert();
        UninstallerArgs::command().debug_assert();
    }

    #[test]
    fn parses_install_with_overrides() {
        let args = CliArgs::try_parse_from([
            "zim", "-vv", "install", "app.zip", "--name", "App", "--desktop", "--yes",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Install(install) => {
                assert_eq!(install.archive, PathBuf::from("app.zip"));
                assert_eq!(install.name.as_deref(), Some("App"));
                assert!(install.desktop);
                assert!(!install.start_menu);
                assert!(install.yes);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn additional_file_flags_conflict() {
        assert!(CliArgs::try_parse_from([
            "zim",
            "uninstall",
            "App",
            "--delete-additional",
            "--keep-additional",
        ])
        .is_err());
    }

    #[test]
    fn self_subcommands_parse() {
        let args = CliArgs::try_parse_from(["zim", "self", "update"]).unwrap();
        assert!(matches!(args.command, Command::SelfCmd(SelfCommand::Update(_))));
    }

    #[test]
    fn version_store_prefers_state_file() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::with_root(tmp.path());
        assert_eq!(
            version_store(&config).read().unwrap(),
            StaticVersionStore::compiled().read().unwrap()
        );
        std::fs::create_dir_all(config.state_dir()).unwrap();
        std::fs::write(
            config.version_file_path(),
            r#"{"major":1,"minor":2,"patch":3,"build":4}"#,
        )
        .unwrap();
        assert_eq!(version_store(&config).read().unwrap(), "1.2.3.4");
    }
}
