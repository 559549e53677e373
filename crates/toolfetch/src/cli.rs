use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use toolfetch_core::ConfigLocator;
use toolfetch_install::Platform;

#[derive(Parser)]
#[command(name = "toolfetch")]
#[command(about = "Ensure external command-line tools are installed at a compatible version", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Platform key (`<os>-<arch>`) used to select download entries
    #[arg(long, global = true, env = "TOOLFETCH_PLATFORM", value_parser = parse_platform)]
    pub platform: Option<Platform>,

    /// Directory substituted for `$HOME` in `baseDir`
    #[arg(long, global = true, env = "TOOLFETCH_HOME")]
    pub home: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Make sure a tool is installed, downloading it when needed
    Ensure {
        /// Tool name in the tools document
        tool: String,

        #[command(flatten)]
        config: ConfigArg,

        /// Download without asking for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Report installed and required versions without downloading
    Probe {
        /// Tool name in the tools document
        tool: String,

        #[command(flatten)]
        config: ConfigArg,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show the platform key used for lookups
    Platform {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
pub struct ConfigArg {
    /// Path or URL of the tools document
    #[arg(short, long, env = "TOOLFETCH_CONFIG", default_value = "tools.json")]
    pub config: ConfigLocator,
}

fn parse_platform(value: &str) -> Result<Platform, String> {
    match value.split_once('-') {
        Some((os, arch)) if !os.is_empty() && !arch.is_empty() => Ok(Platform::new(os, arch)),
        _ => Err(format!("expected <os>-<arch>, got '{value}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_platform() {
        let platform = parse_platform("osx-arm64").unwrap();
        assert_eq!(platform.os(), "osx");
        assert_eq!(platform.arch(), "arm64");

        assert!(parse_platform("linux").is_err());
        assert!(parse_platform("-amd64").is_err());
    }

    #[test]
    fn test_config_defaults_to_tools_json() {
        let cli = Cli::try_parse_from(["toolfetch", "probe", "odo"]).unwrap();
        match cli.command {
            Commands::Probe { tool, config, json } => {
                assert_eq!(tool, "odo");
                assert_eq!(config.config, ConfigLocator::Path(PathBuf::from("tools.json")));
                assert!(!json);
            }
            _ => panic!("expected probe"),
        }
    }

    #[test]
    fn test_config_accepts_url() {
        let cli = Cli::try_parse_from([
            "toolfetch",
            "ensure",
            "kn",
            "--config",
            "https://example.com/tools.json",
            "--yes",
        ])
        .unwrap();
        match cli.command {
            Commands::Ensure { config, yes, .. } => {
                assert!(matches!(config.config, ConfigLocator::Url(_)));
                assert!(yes);
            }
            _ => panic!("expected ensure"),
        }
    }
}
