//! Fetching download artifacts and remote configuration documents
//!
//! The engine only needs a byte stream and, when the server declares one, its
//! length. [`HttpFetcher`] provides both over a blocking reqwest client and
//! also serves `file://` URLs so mirrors on disk work without a server.

use reqwest::blocking::Client;
use std::fs::File;
use std::io::{self, Read};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Timeout for whole artifact downloads
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("toolfetch/", env!("CARGO_PKG_VERSION"));

/// Body and declared length of a fetched resource
pub struct FetchResponse {
    pub body: Box<dyn Read + Send>,
    /// `None` when the server did not announce a length
    pub content_length: Option<u64>,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Fetch error types
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request failed or the server answered with an error status
    #[error("HTTP error fetching {url}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    /// Local `file://` resource could not be opened
    #[error("could not open {url}")]
    File {
        url: Url,
        #[source]
        source: io::Error,
    },

    #[error("unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { url: Url, scheme: String },
}

/// Source of download bytes
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&Url) -> Result<FetchResponse, FetchError> + Send + Sync,
{
    fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        self(url)
    }
}

/// Builds HTTP client with the toolfetch user agent
///
/// Proxies from `HTTP_PROXY`/`HTTPS_PROXY`/`NO_PROXY` are honoured.
///
/// # Errors
///
/// Returns error if client construction fails
pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

/// [`Fetcher`] for `http`, `https` and `file` URLs
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Fetcher with [`DOWNLOAD_TIMEOUT`]
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(DOWNLOAD_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_client(timeout)?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn fetch_http(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let http_error = |source: reqwest::Error| FetchError::Http {
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(http_error)?
            .error_for_status()
            .map_err(|e| http_error(e.without_url()))?;

        let content_length = response.content_length();
        Ok(FetchResponse {
            body: Box::new(response),
            content_length,
        })
    }

    fn fetch_file(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        let file_error = |source: io::Error| FetchError::File {
            url: url.clone(),
            source,
        };

        let path = url.to_file_path().map_err(|()| {
            file_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a local file path",
            ))
        })?;
        let file = File::open(&path).map_err(file_error)?;
        let len = file.metadata().map_err(file_error)?.len();

        Ok(FetchResponse {
            body: Box::new(file),
            content_length: Some(len),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<FetchResponse, FetchError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url),
            "file" => self.fetch_file(url),
            scheme => Err(FetchError::UnsupportedScheme {
                url: url.clone(),
                scheme: scheme.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn read_all(response: FetchResponse) -> Vec<u8> {
        let mut body = Vec::new();
        let mut reader = response.body;
        reader.read_to_end(&mut body).unwrap();
        body
    }

    #[test]
    fn test_fetch_http_body_and_length() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/odo.tar.gz")
            .with_status(200)
            .with_body(b"archive bytes")
            .create();

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::parse(&format!("{}/odo.tar.gz", server.url())).unwrap();
        let response = fetcher.fetch(&url).unwrap();

        assert_eq!(response.content_length, Some(13));
        assert_eq!(read_all(response), b"archive bytes");
        mock.assert();
    }

    #[test]
    fn test_fetch_http_error_status() {
        let mut server = Server::new();
        let _mock = server.mock("GET", "/missing").with_status(404).create();

        let fetcher = HttpFetcher::new().unwrap();
        let url = Url::parse(&format!("{}/missing", server.url())).unwrap();
        let err = fetcher.fetch(&url).unwrap_err();

        match err {
            FetchError::Http { source, .. } => {
                assert_eq!(source.status().map(|s| s.as_u16()), Some(404));
            }
            other => panic!("expected Http error, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kn");
        std::fs::write(&path, b"binary").unwrap();

        let url = Url::from_file_path(&path).unwrap();
        let response = HttpFetcher::new().unwrap().fetch(&url).unwrap();

        assert_eq!(response.content_length, Some(6));
        assert_eq!(read_all(response), b"binary");
    }

    #[test]
    fn test_fetch_unsupported_scheme() {
        let url = Url::parse("ftp://example.com/odo").unwrap();
        let err = HttpFetcher::new().unwrap().fetch(&url).unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme { ref scheme, .. } if scheme == "ftp"));
    }
}
