use std::fmt;

use url::Url;

/// Domains admitted by default when no explicit configuration is given.
pub const DEFAULT_ALLOWED_DOMAINS: &[&str] = &["localhost", "github.com", "google.com"];

/// Raised when an admission check is asked about a string that does not
/// parse as a URL. Non-fatal: the check fails closed to "not allowed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedUrl {
    pub input: String,
}

impl fmt::Display for MalformedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed url: {}", self.input)
    }
}

impl std::error::Error for MalformedUrl {}

/// Domain admission list. A page is admitted when its hostname equals
/// `localhost`, equals a configured domain, or is a subdomain of one.
///
/// `localhost` is exact-match only, even as a configured entry; a suffix
/// rule there would admit arbitrary `*.localhost` hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    domains: Vec<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_DOMAINS.iter().map(ToString::to_string))
    }
}

impl AllowList {
    pub fn new(domains: impl IntoIterator<Item = String>) -> Self {
        Self {
            domains: domains.into_iter().collect(),
        }
    }

    /// Admission check with the parse failure surfaced to the caller.
    ///
    /// Hostname comparison is case-sensitive on the already-normalized
    /// hostname; `Url::parse` lower-cases hosts.
    pub fn check(&self, url: &str) -> Result<bool, MalformedUrl> {
        let parsed = Url::parse(url).map_err(|_| MalformedUrl {
            input: url.to_string(),
        })?;
        let Some(host) = parsed.host_str() else {
            return Err(MalformedUrl {
                input: url.to_string(),
            });
        };

        if host == "localhost" {
            return Ok(true);
        }
        Ok(self.domains.iter().any(|domain| {
            host == domain
                || (domain != "localhost" && host.ends_with(&format!(".{domain}")))
        }))
    }

    /// Admission check that fails closed: unparseable input is not allowed.
    pub fn is_allowed(&self, url: &str) -> bool {
        self.check(url).unwrap_or(false)
    }
}
