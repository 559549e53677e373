use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use toolfetch_core::ConfigLocator;
use toolfetch_install::ToolStatus;

#[derive(Serialize)]
struct ProbeOutput {
    tool: String,
    platform: String,
    required_version: String,
    /// `null` when the command is missing or its output did not match
    current_version: Option<String>,
    compatible: bool,
    command: String,
    target: String,
    cached: bool,
    silent: bool,
}

impl From<&ToolStatus> for ProbeOutput {
    fn from(status: &ToolStatus) -> Self {
        Self {
            tool: status.tool.clone(),
            platform: status.platform.clone(),
            required_version: status.required_version.clone(),
            current_version: (!status.current_version.is_empty())
                .then(|| status.current_version.clone()),
            compatible: status.compatible,
            command: status.command.clone(),
            target: status.target.display().to_string(),
            cached: status.cached(),
            silent: status.silent,
        }
    }
}

pub fn run(ctx: &Context, tool: &str, locator: &ConfigLocator, json: bool) -> Result<()> {
    let manager = ctx.manager_builder().build()?;
    let config = manager.load_config(locator)?;
    let status = manager.status(tool, &config, &locator.to_string())?;
    let output = ProbeOutput::from(&status);

    if json {
        return print_json(&output);
    }

    let current = output.current_version.as_deref().unwrap_or("not found");
    let verdict = if output.compatible {
        "compatible".green()
    } else if output.cached {
        "cached".yellow()
    } else {
        "download required".red()
    };

    print_text(&format!("{} ({})", output.tool.bold(), output.platform))?;
    print_text(&format!("  required: {}", output.required_version))?;
    print_text(&format!("  current:  {current}"))?;
    print_text(&format!("  status:   {verdict}"))?;
    print_text(&format!("  target:   {}", output.target))?;
    Ok(())
}
