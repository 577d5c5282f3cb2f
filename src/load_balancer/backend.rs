//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its configured address
//! - Pre-parse the base URL used for probing and forwarding
//! - Build outbound URIs against that base
//!
//! Health is not stored here; see [`crate::health::state::HealthRegistry`].

use axum::http::uri::{InvalidUri, PathAndQuery, Uri};
use std::fmt;
use url::Url;

/// Error type for backend address parsing.
#[derive(Debug, thiserror::Error)]
pub enum BackendAddressError {
    #[error("invalid backend url `{address}`: {source}")]
    InvalidUrl {
        address: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported scheme `{scheme}` for backend `{address}` (only http is supported)")]
    UnsupportedScheme { address: String, scheme: String },
    #[error("backend `{0}` has no host")]
    MissingHost(String),
}

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// The address exactly as configured. Used as the registry key.
    address: String,
    /// Pre-calculated base URL.
    base_url: Url,
}

impl Backend {
    /// Parse a configured address. A bare `host:port` is read as `http://host:port`.
    pub fn parse(address: &str) -> Result<Self, BackendAddressError> {
        let trimmed = address.trim();
        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };

        let base_url = Url::parse(&candidate).map_err(|source| BackendAddressError::InvalidUrl {
            address: address.to_string(),
            source,
        })?;

        if base_url.scheme() != "http" {
            return Err(BackendAddressError::UnsupportedScheme {
                address: address.to_string(),
                scheme: base_url.scheme().to_string(),
            });
        }
        if base_url.host_str().is_none() {
            return Err(BackendAddressError::MissingHost(address.to_string()));
        }

        Ok(Self {
            address: address.to_string(),
            base_url,
        })
    }

    /// The configured address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The parsed base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the outbound URI for an inbound path and query.
    ///
    /// The inbound path is appended to the base URL's path, so a backend at
    /// `http://host:1/api` receives `/users` as `/api/users`.
    pub fn target_uri(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, InvalidUri> {
        let suffix = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        self.join(suffix)
    }

    /// Build the URI used to probe this backend.
    pub fn probe_uri(&self, path: &str) -> Result<Uri, InvalidUri> {
        if path.starts_with('/') {
            self.join(path)
        } else {
            self.join(&format!("/{}", path))
        }
    }

    fn join(&self, suffix: &str) -> Result<Uri, InvalidUri> {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{}{}", base, suffix).parse()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
