// SPDX-FileCopyrightText: 2026 Extmgr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! extmgr - manage installed browser extensions from the terminal.
//!
//! This is the binary entry point.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use extmgr::{Action, ConfirmMode, OutputOptions, ProfileRegistry, Session, shutdown};
use extmgr_config::ExtmgrConfig;
use extmgr_core::types::ExtensionId;

/// extmgr - manage installed browser extensions from the terminal.
#[derive(Parser, Debug)]
#[command(name = "extmgr", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to the XDG lookup).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Registry profile to manage, overriding `registry.profile_path`.
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List manageable extensions (the default).
    List,
    /// Enable an extension.
    Enable { id: String },
    /// Disable an extension.
    Disable { id: String },
    /// Flip an extension's enabled state.
    Toggle { id: String },
    /// Uninstall an extension after confirmation.
    Uninstall {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Print the details view URL for an extension.
    Details { id: String },
    /// Keep the list on screen, updating as the profile changes.
    Watch,
}

impl Commands {
    fn action(&self) -> Action {
        match self {
            Commands::List | Commands::Watch => Action::List,
            Commands::Enable { id } => Action::SetEnabled {
                id: ExtensionId::from(id.as_str()),
                enabled: true,
            },
            Commands::Disable { id } => Action::SetEnabled {
                id: ExtensionId::from(id.as_str()),
                enabled: false,
            },
            Commands::Toggle { id } => Action::Toggle {
                id: ExtensionId::from(id.as_str()),
            },
            Commands::Uninstall { id, .. } => Action::Uninstall {
                id: ExtensionId::from(id.as_str()),
            },
            Commands::Details { id } => Action::Details {
                id: ExtensionId::from(id.as_str()),
            },
        }
    }

    fn confirm_mode(&self) -> ConfirmMode {
        match self {
            Commands::Uninstall { yes: true, .. } => ConfirmMode::AssumeYes,
            _ => ConfirmMode::Prompt,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => extmgr_config::load_and_validate_path(path),
        None => extmgr_config::load_and_validate(),
    };
    let mut config: ExtmgrConfig = match loaded {
        Ok(config) => config,
        Err(errors) => {
            extmgr_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    if let Some(profile) = &cli.profile {
        config.registry.profile_path = profile.display().to_string();
    }

    init_tracing(&config.general.log_level);

    let command = cli.command.unwrap_or(Commands::List);
    let registry = Arc::new(ProfileRegistry::from_config(
        &config.registry,
        command.confirm_mode(),
    ));
    let output = OutputOptions::detect(cli.json, cli.plain);
    let mut session = Session::open(&config, registry, output).await;

    let code = match command {
        Commands::Watch => match session.watch(shutdown::install_signal_handler()).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("extmgr: {e}");
                1
            }
        },
        other => session.run(other.action()).await,
    };
    std::process::exit(code);
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("extmgr={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn uninstall_yes_skips_prompt() {
        let cli = Cli::parse_from(["extmgr", "uninstall", "abc", "--yes"]);
        let command = cli.command.unwrap();
        assert_eq!(command.confirm_mode(), ConfirmMode::AssumeYes);
        assert_eq!(
            command.action(),
            Action::Uninstall {
                id: ExtensionId::from("abc")
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["extmgr", "disable", "abc", "--json", "--plain"]);
        assert!(cli.json && cli.plain);
        assert_eq!(
            cli.command.unwrap().action(),
            Action::SetEnabled {
                id: ExtensionId::from("abc"),
                enabled: false
            }
        );
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = extmgr_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.sync.resync_delay_ms, 500);
    }
}
