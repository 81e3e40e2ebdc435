//! Transport address construction
//!
//! A channel target is configured either as an absolute address
//! (`wss://host/path`) or as a path relative to the hosting origin (`/ws`).
//! The bearer credential travels as the `token` query parameter.

use crate::traits::{LiveWireError, Result};
use url::Url;

/// Name of the query parameter carrying the bearer credential
pub const TOKEN_PARAM: &str = "token";

/// Build the effective transport address for `target`
///
/// Absolute targets keep their host; `http`/`https` schemes are mapped to
/// `ws`/`wss`. Relative targets are resolved against `origin`, and the origin
/// scheme decides the channel scheme: a secure origin (`https`/`wss`) gives
/// `wss`, anything else `ws`. Existing query parameters are preserved.
pub fn build_address(target: &str, origin: Option<&str>, credential: &str) -> Result<Url> {
    let mut url = if target.contains("://") {
        let mut url = parse(target, target)?;
        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(invalid(target, format!("unsupported scheme '{}'", other)));
            }
        };
        set_scheme(&mut url, scheme, target)?;
        url
    } else if target.starts_with('/') {
        let origin = origin
            .ok_or_else(|| invalid(target, "relative target requires an origin".to_string()))?;
        let base = parse(origin, target)?;
        let scheme = if is_secure(base.scheme()) { "wss" } else { "ws" };
        let mut url = base
            .join(target)
            .map_err(|e| invalid(target, e.to_string()))?;
        set_scheme(&mut url, scheme, target)?;
        url
    } else {
        return Err(invalid(
            target,
            "expected an absolute address or a path starting with '/'".to_string(),
        ));
    };

    url.query_pairs_mut().append_pair(TOKEN_PARAM, credential);
    Ok(url)
}

/// Render an address for logs with the credential masked
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == TOKEN_PARAM {
                (k.into_owned(), "***".to_string())
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();

    if pairs.is_empty() {
        return masked.to_string();
    }

    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

fn is_secure(scheme: &str) -> bool {
    matches!(scheme, "https" | "wss")
}

fn parse(input: &str, target: &str) -> Result<Url> {
    Url::parse(input).map_err(|e| invalid(target, e.to_string()))
}

fn set_scheme(url: &mut Url, scheme: &str, target: &str) -> Result<()> {
    url.set_scheme(scheme)
        .map_err(|_| invalid(target, format!("cannot use scheme '{}'", scheme)))
}

fn invalid(target: &str, reason: String) -> LiveWireError {
    LiveWireError::InvalidTarget {
        target: target.to_string(),
        reason,
    }
}
