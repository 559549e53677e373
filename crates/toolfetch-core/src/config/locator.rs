use super::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Where a tools configuration document lives
///
/// Parsed from a filesystem path or a `file://`, `http://` or `https://` URL;
/// `file://` URLs become paths.
///
/// ```rust
/// use toolfetch_core::config::ConfigLocator;
///
/// let local: ConfigLocator = "tools.json".parse().unwrap();
/// assert!(matches!(local, ConfigLocator::Path(_)));
///
/// let remote: ConfigLocator = "https://example.com/tools.json".parse().unwrap();
/// assert!(matches!(remote, ConfigLocator::Url(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocator {
    Path(PathBuf),
    Url(Url),
}

impl ConfigLocator {
    pub fn parse(location: &str) -> Result<Self, ConfigError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ConfigError::InvalidLocation(location.to_string()));
        }

        if !location.contains("://") {
            return Ok(ConfigLocator::Path(PathBuf::from(location)));
        }

        let url =
            Url::parse(location).map_err(|_| ConfigError::InvalidLocation(location.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(ConfigLocator::Url(url)),
            "file" => url
                .to_file_path()
                .map(ConfigLocator::Path)
                .map_err(|()| ConfigError::InvalidLocation(location.to_string())),
            _ => Err(ConfigError::InvalidLocation(location.to_string())),
        }
    }
}

impl FromStr for ConfigLocator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConfigLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLocator::Path(path) => write!(f, "{}", path.display()),
            ConfigLocator::Url(url) => write!(f, "{url}"),
        }
    }
}

impl From<PathBuf> for ConfigLocator {
    fn from(path: PathBuf) -> Self {
        ConfigLocator::Path(path)
    }
}

impl From<&Path> for ConfigLocator {
    fn from(path: &Path) -> Self {
        ConfigLocator::Path(path.to_path_buf())
    }
}

impl From<Url> for ConfigLocator {
    fn from(url: Url) -> Self {
        ConfigLocator::Url(url)
    }
}
