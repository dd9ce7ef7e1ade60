//! Image references as stored in [`crate::model::cell::Cell::image`] and how to resolve them to
//! bytes.

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::Engine;

use crate::foundation::error::{GridError, GridResult};

/// Parsed form of a cell image reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline `data:` URI. Any `#fragment` uniqueness suffix is dropped.
    DataUri {
        media_type: Option<String>,
        bytes: Vec<u8>,
    },
    /// Same-origin path such as `/covers/123.jpg`.
    Path(String),
    /// Absolute `http(s)` URL served by a third party.
    Remote(String),
}

impl ImageSource {
    pub fn parse(reference: &str) -> GridResult<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(GridError::validation("image reference must be non-empty"));
        }
        if let Some(rest) = reference.strip_prefix("data:") {
            return parse_data_uri(rest);
        }
        let lower = reference.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(reference.to_string()));
        }
        Ok(Self::Path(reference.to_string()))
    }
}

fn parse_data_uri(rest: &str) -> GridResult<ImageSource> {
    let rest = rest.split_once('#').map_or(rest, |(uri, _fragment)| uri);
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| GridError::validation("data URI is missing ','"))?;

    let mut is_base64 = false;
    let mut media_type = None;
    for (idx, segment) in header.split(';').enumerate() {
        let seg = segment.trim();
        if seg.eq_ignore_ascii_case("base64") {
            is_base64 = true;
        } else if idx == 0 && seg.contains('/') {
            media_type = Some(seg.to_ascii_lowercase());
        }
    }
    if !is_base64 {
        return Err(GridError::validation(
            "only base64 data URIs are supported for images",
        ));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| GridError::decode(format!("invalid base64 data URI: {e}")))?;
    Ok(ImageSource::DataUri { media_type, bytes })
}

/// Encode bytes as a base64 `data:` URI.
pub fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!(
        "data:{media_type};base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

/// Append a `#t=<millis>` fragment so re-dropping identical bytes still changes the reference.
pub fn with_uniqueness_suffix(uri: &str, millis: u64) -> String {
    format!("{uri}#t={millis}")
}

/// Resolves an image reference to encoded bytes.
pub trait ImageFetcher {
    fn fetch(&self, source: &ImageSource) -> GridResult<Vec<u8>>;
}

/// Resolver for remote URLs, typically a same-origin proxy.
pub type ProxyFn = Box<dyn Fn(&str) -> GridResult<Vec<u8>>>;

/// Serves data URIs inline and same-origin paths from a directory.
///
/// Remote URLs are rejected unless a proxy callback is installed.
pub struct FsFetcher {
    root: PathBuf,
    proxy: Option<ProxyFn>,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            proxy: None,
        }
    }

    pub fn with_proxy(mut self, proxy: ProxyFn) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_path(&self, reference: &str) -> GridResult<PathBuf> {
        let without_query = reference.split(['?', '#']).next().unwrap_or(reference);
        let mut out = self.root.clone();
        let mut any = false;
        for part in without_query.replace('\\', "/").split('/') {
            if part.is_empty() || part == "." {
                continue;
            }
            if part == ".." {
                return Err(GridError::validation("image paths must not contain '..'"));
            }
            out.push(part);
            any = true;
        }
        if !any {
            return Err(GridError::validation("image path must contain a file name"));
        }
        Ok(out)
    }
}

impl std::fmt::Debug for FsFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsFetcher")
            .field("root", &self.root)
            .field("proxy", &self.proxy.is_some())
            .finish()
    }
}

impl ImageFetcher for FsFetcher {
    fn fetch(&self, source: &ImageSource) -> GridResult<Vec<u8>> {
        match source {
            ImageSource::DataUri { bytes, .. } => Ok(bytes.clone()),
            ImageSource::Path(p) => {
                let path = self.resolve_path(p)?;
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("read image '{}'", path.display()))?;
                Ok(bytes)
            }
            ImageSource::Remote(url) => match &self.proxy {
                Some(proxy) => proxy(url),
                None => Err(GridError::validation(format!(
                    "remote image '{url}' needs a proxy"
                ))),
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
