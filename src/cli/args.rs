//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::LoaderKind;

/// Live-reload client for the swdev dev server
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: swdev.toml)
    #[arg(short = 'C', long, global = true, default_value = "swdev.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Attach to the dev server and run a module with live reload
    #[command(visible_alias = "s")]
    Start {
        /// Module address, absolute or relative to the page origin (default: module.url)
        url: Option<String>,

        /// Prefix run ids with `nocache-` so every cache layer is bypassed
        #[arg(long)]
        nocache: bool,

        /// How the module is loaded
        #[arg(short, long, value_enum)]
        loader: Option<LoaderKind>,

        /// Dev server origin (e.g., http://localhost:7777)
        #[arg(short, long)]
        origin: Option<String>,
    },

    /// Ask the dev server to revalidate resources
    #[command(visible_alias = "r")]
    Revalidate {
        /// Paths (`/`-relative) or absolute URLs
        #[arg(required = true)]
        paths: Vec<String>,

        /// Dev server origin (e.g., http://localhost:7777)
        #[arg(short, long)]
        origin: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_args() {
        let cli = Cli::parse_from([
            "swdev", "-v", "start", "/app.so", "--nocache", "--loader", "process",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Start {
                url,
                nocache,
                loader,
                origin,
            } => {
                assert_eq!(url.as_deref(), Some("/app.so"));
                assert!(nocache);
                assert_eq!(loader, Some(LoaderKind::Process));
                assert_eq!(origin, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_revalidate_requires_paths() {
        assert!(Cli::try_parse_from(["swdev", "revalidate"]).is_err());

        let cli = Cli::parse_from(["swdev", "revalidate", "/a.js", "https://x/b.js"]);
        assert!(matches!(
            cli.command,
            Commands::Revalidate { ref paths, .. } if paths.len() == 2
        ));
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::parse_from(["swdev", "start", "-C", "dev/swdev.toml"]);
        assert_eq!(cli.config, PathBuf::from("dev/swdev.toml"));
    }
}
