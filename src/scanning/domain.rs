//! Public-suffix-aware URL splitting
//!
//! Splits a URL into subdomain, registrable label and suffix using the
//! Public Suffix List, so multi-part suffixes such as `co.uk` stay intact.

use std::net::Ipv4Addr;

use tldextract::{TldExtractor, TldOption};
use url::{Host, Url};

/// Components of a URL host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainParts {
    /// Registrable label (e.g. "example" for "www.example.co.uk"), or the
    /// address itself for IP hosts
    pub domain: String,
    /// Everything left of the registrable label (e.g. "www")
    pub subdomain: String,
    /// Public suffix (e.g. "co.uk"); empty for IP hosts
    pub suffix: String,
}

impl DomainParts {
    /// Whether the domain label is an IPv4 address
    pub fn is_ipv4(&self) -> bool {
        self.domain.parse::<Ipv4Addr>().is_ok()
    }
}

/// Splits URLs into [`DomainParts`]
pub struct DomainParser {
    extractor: TldExtractor,
}

impl DomainParser {
    /// Create a parser backed by the bundled suffix list snapshot
    pub fn new() -> Self {
        Self {
            extractor: TldExtractor::new(TldOption::default()),
        }
    }

    /// Split `url` into its components.
    ///
    /// Never fails: malformed input yields empty or partial parts.
    pub fn parse(&self, url: &str) -> DomainParts {
        let Some(host) = host_of(url) else {
            return DomainParts::default();
        };

        match host {
            HostKind::Ipv4(addr) => DomainParts {
                domain: addr.to_string(),
                ..Default::default()
            },
            HostKind::Name(name) => match self.extractor.extract(&format!("http://{}/", name)) {
                Ok(result) => DomainParts {
                    domain: result.domain.unwrap_or_default(),
                    subdomain: result.subdomain.unwrap_or_default(),
                    suffix: result.suffix.unwrap_or_default(),
                },
                Err(e) => {
                    tracing::debug!("Suffix extraction failed for {}: {}", name, e);
                    DomainParts::default()
                }
            },
        }
    }
}

impl Default for DomainParser {
    fn default() -> Self {
        Self::new()
    }
}

enum HostKind {
    Ipv4(Ipv4Addr),
    Name(String),
}

/// Pull the host out of `url`, tolerating a missing scheme
fn host_of(url: &str) -> Option<HostKind> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| Url::parse(&format!("http://{}", trimmed)).ok())?;

    match parsed.host()? {
        Host::Ipv4(addr) => Some(HostKind::Ipv4(addr)),
        Host::Ipv6(_) => None,
        Host::Domain(name) => {
            let name = name.trim_end_matches('.');
            (!name.is_empty()).then(|| HostKind::Name(name.to_lowercase()))
        }
    }
}
