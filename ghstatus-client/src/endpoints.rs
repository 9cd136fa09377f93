//! API endpoint resolution
//!
//! Public GitHub serves its REST API from `api.github.com`. GitHub Enterprise
//! Server serves it from `<host>/api/v3/` and uploads from `<host>/api/uploads/`.

use reqwest::Url;

use crate::error::{ClientError, Result};

const PUBLIC_HOST: &str = "github.com";
const PUBLIC_API_URL: &str = "https://api.github.com/";
const PUBLIC_UPLOAD_URL: &str = "https://uploads.github.com/";

/// REST and upload roots for one GitHub host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub rest: Url,
    pub upload: Url,
}

impl ApiEndpoints {
    /// Resolve endpoints from a configured base URL
    ///
    /// `https://github.com` (or `https://api.github.com`) selects the public
    /// API. Any other host is treated as an enterprise root.
    pub fn from_base_url(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url.trim()).map_err(|e| {
            ClientError::InvalidConfig(format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        let host = parsed.host_str().ok_or_else(|| {
            ClientError::InvalidConfig(format!("Base URL '{}' has no host", base_url))
        })?;

        if host == PUBLIC_HOST || host == format!("api.{}", PUBLIC_HOST) {
            return Self::public();
        }

        Ok(Self {
            rest: enterprise_root(&parsed, "api/v3/"),
            upload: enterprise_root(&parsed, "api/uploads/"),
        })
    }

    /// Endpoints of public GitHub
    pub fn public() -> Result<Self> {
        let parse = |url: &str| {
            Url::parse(url).map_err(|e| ClientError::InvalidConfig(format!("{}: {}", url, e)))
        };
        Ok(Self {
            rest: parse(PUBLIC_API_URL)?,
            upload: parse(PUBLIC_UPLOAD_URL)?,
        })
    }

    pub fn is_public(&self) -> bool {
        self.rest.host_str() == Some("api.github.com")
    }

    /// Build a REST URL from raw path segments, percent-encoding each one
    pub fn rest_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.rest.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidConfig(format!("API root '{}' cannot carry a path", self.rest))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn enterprise_root(base: &Url, suffix: &str) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);

    let mut path = url.path().to_string();
    if !path.ends_with('/') {
        path.push('/');
    }

    let host = url.host_str().unwrap_or_default();
    let api_host = host.starts_with("api.") || host.contains(".api.");
    if !path.ends_with(&format!("/{}", suffix)) && !api_host {
        path.push_str(suffix);
    }

    url.set_path(&path);
    url
}
