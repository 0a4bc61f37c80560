//! URL normalisation and SSRF screening for links about to be shortened.

use crate::error::ValidationError;
use async_trait::async_trait;
use std::io;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::warn;
use url::{Host, Url};

/// Looks up the addresses a hostname points to.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolves through the operating system, like any outbound connection would.
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addresses = tokio::net::lookup_host((host, 0)).await?;
        Ok(addresses.map(|address| address.ip()).collect())
    }
}

#[derive(Clone)]
pub struct UrlValidator {
    resolver: Arc<dyn HostResolver>,
}

impl UrlValidator {
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        Self { resolver }
    }

    /// Returns the normalised form of `raw_url`.
    ///
    /// `service_host` is the `Host` the request reached us on; links back to
    /// it are refused. A hostname that cannot be resolved is accepted, but one
    /// that resolves to a loopback or private address is not.
    pub async fn validate(
        &self,
        raw_url: &str,
        service_host: &str,
    ) -> Result<String, ValidationError> {
        let raw_url = raw_url.trim();
        if raw_url.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }
        // the URL parser drops tab/CR/LF silently, but the raw text is what gets stored
        if raw_url.chars().any(|c| c.is_ascii_control()) {
            return Err(ValidationError::InvalidFormat);
        }

        let normalized = if has_http_scheme(raw_url) {
            raw_url.to_string()
        } else {
            format!("https://{raw_url}")
        };

        let parsed = Url::parse(&normalized).map_err(|_| ValidationError::InvalidFormat)?;
        let host = parsed
            .host_str()
            .filter(|host| host.contains('.'))
            .ok_or(ValidationError::InvalidFormat)?;

        let own_host = strip_port(service_host);
        if !own_host.is_empty() && host.eq_ignore_ascii_case(own_host) {
            return Err(ValidationError::SelfReference);
        }

        let addresses = match parsed.host() {
            Some(Host::Ipv4(ip)) => vec![IpAddr::V4(ip)],
            Some(Host::Ipv6(ip)) => vec![IpAddr::V6(ip)],
            _ => match self.resolver.resolve(host).await {
                Ok(addresses) => addresses,
                Err(err) => {
                    warn!(host = %host, "Failed to resolve host, accepting URL: {}", err);
                    return Ok(normalized);
                }
            },
        };

        if addresses.iter().any(is_internal) {
            return Err(ValidationError::InternalAddress);
        }
        Ok(normalized)
    }
}

fn has_http_scheme(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_port(host: &str) -> &str {
    if let Some(bracketed) = host.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Loopback, private-range or link-local address, including IPv4 mapped into IPv6.
pub fn is_internal(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_internal(&IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || (v6.segments()[0] & 0xfe00) == 0xfc00 // fc00::/7 unique local
                    || (v6.segments()[0] & 0xffc0) == 0xfe80 // fe80::/10 link-local
            }
        },
    }
}
