use crate::cli::Cli;
use std::path::PathBuf;
use toolfetch_install::{Platform, ToolManagerBuilder};

/// Global options shared by all subcommands
pub struct Context {
    pub platform: Option<Platform>,
    pub home: Option<PathBuf>,
    pub verbose: bool,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            platform: cli.platform.clone(),
            home: cli.home.clone(),
            verbose: cli.verbose,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform.clone().unwrap_or_else(Platform::current)
    }

    /// Manager builder carrying the global platform and home overrides
    pub fn manager_builder(&self) -> ToolManagerBuilder {
        let mut builder = toolfetch_install::ToolManager::builder().platform(self.platform());
        if let Some(home) = &self.home {
            builder = builder.home(home.clone());
        }
        builder
    }
}
