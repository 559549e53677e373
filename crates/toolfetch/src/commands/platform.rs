use crate::context::Context;
use crate::output::{print_json, print_text};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct PlatformOutput {
    key: String,
    os: String,
    arch: String,
    /// Keys tried in order when selecting a tool's download entry
    lookup: Vec<String>,
}

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let platform = ctx.platform();
    let output = PlatformOutput {
        key: platform.key(),
        os: platform.os().to_string(),
        arch: platform.arch().to_string(),
        lookup: platform.lookup_keys().to_vec(),
    };

    if json {
        return print_json(&output);
    }

    print_text(&output.key)?;
    if ctx.verbose {
        print_text(&format!("lookup: {}", output.lookup.join(", ")))?;
    }
    Ok(())
}
