//! CLI definitions for LightFPS.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LightFPS CLI.
#[derive(Parser)]
#[command(name = "lightfps")]
#[command(about = "Run the LightFPS page engine over HTML files and manage its settings")]
#[command(version)]
pub(crate) struct Cli {
    /// Also write logs to daily files in this directory
    #[arg(long, global = true, env = "LIGHTFPS_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the engine over an HTML page
    Optimize(OptimizeArgs),

    /// Inspect or edit the stored settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Print the equalizer preset table
    Presets {
        /// Engine tuning file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
pub(crate) struct OptimizeArgs {
    /// HTML page to optimize
    pub page: PathBuf,

    /// Settings snapshot (JSON object of persisted keys); defaults to the
    /// settings store
    #[arg(short, long)]
    pub settings: Option<PathBuf>,

    /// Override one setting, e.g. `--set enableDarkMode=true`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Engine tuning file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Virtual milliseconds to run after the engine
    #[arg(long, default_value_t = 0)]
    pub advance_ms: u64,

    /// Hide the page after the run
    #[arg(long)]
    pub hidden: bool,

    /// Directory that page resources (images) are loaded from; defaults to
    /// the page's directory
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Where to write the rewritten HTML; defaults to `<page>.lightfps.html`
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub(crate) enum SettingsAction {
    /// Show every setting
    Show {
        /// Settings store file
        #[arg(long)]
        store: Option<PathBuf>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change settings, e.g. `set autoOptimize=true soundPreset=bass`
    Set {
        /// KEY=VALUE pairs
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,

        /// Settings store file
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

/// Split `KEY=VALUE`.
pub(crate) fn split_pair(pair: &str) -> anyhow::Result<(&str, &str)> {
    pair.split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| anyhow::anyhow!("expected KEY=VALUE, got '{pair}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_optimize() {
        let cli = Cli::parse_from([
            "lightfps",
            "optimize",
            "page.html",
            "--set",
            "enableDarkMode=true",
            "--advance-ms",
            "6000",
            "--hidden",
        ]);
        let Commands::Optimize(args) = cli.command else {
            panic!("expected optimize");
        };
        assert_eq!(args.page, PathBuf::from("page.html"));
        assert_eq!(args.overrides, vec!["enableDarkMode=true".to_string()]);
        assert_eq!(args.advance_ms, 6000);
        assert!(args.hidden);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_parse_settings_set() {
        let cli = Cli::parse_from(["lightfps", "settings", "set", "autoOptimize=on", "soundPreset=bass"]);
        let Commands::Settings {
            action: SettingsAction::Set { pairs, store },
        } = cli.command
        else {
            panic!("expected settings set");
        };
        assert_eq!(pairs.len(), 2);
        assert!(store.is_none());
    }

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("soundPreset = vocal").unwrap(), ("soundPreset", "vocal"));
        assert!(split_pair("autoOptimize").is_err());
        assert!(split_pair("=true").is_err());
    }
}
