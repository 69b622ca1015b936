//! Origin allow-list for WebSocket upgrades.
//!
//! Patterns take the form `scheme://host[:port]`. The host may start with
//! `*.` to admit any subdomain (but not the bare domain), and the port may be
//! `*` to admit any explicit, non-zero port.

use std::fmt;
use std::str::FromStr;

use url::Url;

/// Origins accepted when configuration names none.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "https://roasted.lol",
    "https://*.roasted.lol",
    "http://localhost:*",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Exact(String),
    Subdomain(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortPattern {
    Default,
    Exact(u16),
    Any,
}

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginPattern {
    scheme: String,
    host: HostPattern,
    port: PortPattern,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid origin pattern '{pattern}': {reason}")]
pub struct OriginPatternError {
    pattern: String,
    reason: &'static str,
}

impl FromStr for OriginPattern {
    type Err = OriginPatternError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let fail = |reason| OriginPatternError {
            pattern: raw.to_owned(),
            reason,
        };
        let (scheme, rest) = raw.trim().split_once("://").ok_or_else(|| fail("missing scheme"))?;
        if !matches!(scheme, "http" | "https") {
            return Err(fail("scheme must be http or https"));
        }
        let rest = rest.trim_end_matches('/');
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, "*")) => (host, PortPattern::Any),
            Some((host, port)) => {
                let port = port.parse().map_err(|_| fail("port must be a number or *"))?;
                (host, PortPattern::Exact(port))
            }
            None => (rest, PortPattern::Default),
        };
        if host.is_empty() || host.contains(['/', '?', '#', '@']) {
            return Err(fail("host must be a bare name"));
        }
        let host = host.to_ascii_lowercase();
        let host = match host.strip_prefix("*.") {
            Some(parent) if !parent.is_empty() && !parent.contains('*') => {
                HostPattern::Subdomain(parent.to_owned())
            }
            Some(_) => return Err(fail("wildcard needs a parent domain")),
            None if host.contains('*') => return Err(fail("wildcards only as a leading '*.'")),
            None => HostPattern::Exact(host),
        };
        Ok(Self {
            scheme: scheme.to_owned(),
            host,
            port,
        })
    }
}

impl fmt::Display for OriginPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://", self.scheme)?;
        match &self.host {
            HostPattern::Exact(host) => f.write_str(host)?,
            HostPattern::Subdomain(parent) => write!(f, "*.{parent}")?,
        }
        match self.port {
            PortPattern::Default => Ok(()),
            PortPattern::Exact(port) => write!(f, ":{port}"),
            PortPattern::Any => f.write_str(":*"),
        }
    }
}

impl OriginPattern {
    fn matches(&self, origin: &Url) -> bool {
        let Some(host) = origin.host_str() else {
            return false;
        };
        if origin.scheme() != self.scheme {
            return false;
        }
        let host_ok = match &self.host {
            HostPattern::Exact(expected) => host == expected,
            HostPattern::Subdomain(parent) => host
                .strip_suffix(parent.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
        };
        // `Url::port` is `None` when the port is absent or the scheme default.
        let port_ok = match self.port {
            PortPattern::Default => origin.port().is_none(),
            PortPattern::Exact(port) => origin.port_or_known_default() == Some(port),
            PortPattern::Any => origin.port().is_some_and(|port| port != 0),
        };
        host_ok && port_ok
    }
}

/// Set of origins allowed to open leaderboard sockets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedOrigins(Vec<OriginPattern>);

impl AllowedOrigins {
    /// Parse every pattern, failing on the first invalid one.
    pub fn parse<I, S>(patterns: I) -> Result<Self, OriginPatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        patterns
            .into_iter()
            .map(|pattern| pattern.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn allows(&self, origin: &Url) -> bool {
        self.0.iter().any(|pattern| pattern.matches(origin))
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self(
            DEFAULT_ALLOWED_ORIGINS
                .iter()
                .filter_map(|pattern| pattern.parse().ok())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("http://localhost:4000", true)]
    #[case("http://localhost:0", false)]
    #[case("http://localhost", false)]
    #[case("https://roasted.lol", true)]
    #[case("https://roasted.lol:443", true)]
    #[case("https://www.roasted.lol", true)]
    #[case("https://roasted.lol.evil.com", false)]
    #[case("https://evilroasted.lol", false)]
    #[case("http://roasted.lol", false)]
    #[case("wss://roasted.lol", false)]
    fn default_allow_list(#[case] origin: &str, #[case] expected: bool) {
        let origin = Url::parse(origin).expect("url");
        assert_eq!(AllowedOrigins::default().allows(&origin), expected);
    }

    #[rstest]
    #[case("https://staging.example:8443", "https://staging.example:8443", true)]
    #[case("https://staging.example:8443", "https://staging.example", false)]
    #[case("https://*.example", "https://example", false)]
    fn custom_patterns(#[case] pattern: &str, #[case] origin: &str, #[case] expected: bool) {
        let allowed = AllowedOrigins::parse([pattern]).expect("pattern");
        let origin = Url::parse(origin).expect("url");
        assert_eq!(allowed.allows(&origin), expected);
    }

    #[rstest]
    #[case("roasted.lol")]
    #[case("ftp://roasted.lol")]
    #[case("https://*")]
    #[case("https://a.*.lol")]
    #[case("https://roasted.lol:http")]
    #[case("https://roasted.lol/path")]
    fn rejects_malformed_patterns(#[case] pattern: &str) {
        assert!(pattern.parse::<OriginPattern>().is_err());
    }

    #[test]
    fn patterns_display_as_written() {
        for raw in DEFAULT_ALLOWED_ORIGINS {
            let pattern: OriginPattern = raw.parse().expect("default pattern");
            assert_eq!(pattern.to_string(), *raw);
        }
    }
}
