use crate::context::Context;
use crate::output::{print_json, print_text};
use crate::terminal::{Interrupt, TerminalConfirm, TerminalProgress};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;
use toolfetch_core::ConfigLocator;
use toolfetch_install::ThreadTasks;

#[derive(Serialize)]
struct EnsureOutput {
    tool: String,
    command: String,
    downloaded: bool,
}

pub fn run(
    ctx: &Context,
    tool: &str,
    locator: &ConfigLocator,
    yes: bool,
    json: bool,
) -> Result<()> {
    let interrupt = Interrupt::new();
    interrupt.install();

    let progress = Arc::new(TerminalProgress::new(interrupt));
    let builder = ctx.manager_builder().tasks(ThreadTasks::with_sink(progress));
    let builder = if yes {
        builder.silent_confirm()
    } else {
        builder.confirm(TerminalConfirm)
    };
    let manager = builder.build()?;

    let instance = manager.ensure_tool(tool, locator).wait()?;
    let output = EnsureOutput {
        tool: tool.to_string(),
        command: instance.command,
        downloaded: instance.downloaded,
    };

    if json {
        return print_json(&output);
    }

    if output.downloaded {
        eprintln!("{} Installed {}", "✓".green().bold(), output.tool);
    }
    print_text(&output.command)?;
    Ok(())
}
