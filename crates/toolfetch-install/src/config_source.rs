//! Loading the tools configuration from a path or URL

use crate::fetch::Fetcher;
use std::io::Read;
use toolfetch_core::{ConfigError, ConfigLocator, ToolsConfig};
use tracing::debug;

/// Reads and parses the document at `locator`
///
/// Paths are read from disk; URLs go through `fetcher`.
pub fn load_tools_config(
    locator: &ConfigLocator,
    fetcher: &dyn Fetcher,
) -> Result<ToolsConfig, ConfigError> {
    debug!(%locator, "loading tools config");

    match locator {
        ConfigLocator::Path(path) => ToolsConfig::from_file(path),
        ConfigLocator::Url(url) => {
            let location = url.to_string();
            let fetch_error = |reason: String| ConfigError::Fetch {
                location: location.clone(),
                reason,
            };

            let response = fetcher.fetch(url).map_err(|e| fetch_error(e.to_string()))?;
            let mut content = String::new();
            let mut body = response.body;
            body.read_to_string(&mut content)
                .map_err(|e| fetch_error(e.to_string()))?;

            ToolsConfig::from_json(&content, &location)
        }
    }
}
