//! Request metadata extraction.
//!
//! The inbound HTTP layer hands Keystone the raw forwarded-for chain,
//! user-agent, and optional client fingerprint header; this module turns
//! them into a validated [`RequestMeta`] value.

use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Sentinel used when no valid source IP could be determined.
pub const UNKNOWN_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Validated request metadata attached to every authentication event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    /// Source IP: first entry of the forwarded-for chain, falling back
    /// to the connection IP, else [`UNKNOWN_IP`].
    pub ip: IpAddr,
    /// Raw user-agent string, if any.
    pub user_agent: Option<String>,
    /// Client-supplied fingerprint header, if any.
    pub fingerprint: Option<String>,
}

impl RequestMeta {
    /// Build metadata from the raw request headers and connection info.
    pub fn extract(
        forwarded_for: Option<&str>,
        connection_ip: Option<IpAddr>,
        user_agent: Option<&str>,
        fingerprint: Option<&str>,
    ) -> Self {
        let ip = forwarded_for
            .and_then(parse_forwarded_for)
            .or(connection_ip)
            .unwrap_or(UNKNOWN_IP);

        Self {
            ip,
            user_agent: user_agent.map(str::to_string),
            fingerprint: fingerprint
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
        }
    }

    /// Metadata with no usable request context.
    pub fn unknown() -> Self {
        Self {
            ip: UNKNOWN_IP,
            user_agent: None,
            fingerprint: None,
        }
    }

    /// The source IP rendered for storage columns.
    pub fn ip_string(&self) -> Option<String> {
        if self.ip == UNKNOWN_IP {
            None
        } else {
            Some(self.ip.to_string())
        }
    }
}

/// Parse the first entry of an `X-Forwarded-For` style chain, validating
/// it as IPv4/IPv6.
fn parse_forwarded_for(chain: &str) -> Option<IpAddr> {
    chain
        .split(',')
        .next()
        .map(str::trim)
        .and_then(|entry| entry.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_forwarded_entry_wins() {
        let meta = RequestMeta::extract(
            Some("203.0.113.7, 10.0.0.1, 10.0.0.2"),
            Some("10.0.0.9".parse().unwrap()),
            None,
            None,
        );
        assert_eq!(meta.ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_invalid_forwarded_falls_back_to_connection() {
        let meta = RequestMeta::extract(
            Some("not-an-ip"),
            Some("192.0.2.4".parse().unwrap()),
            None,
            None,
        );
        assert_eq!(meta.ip, "192.0.2.4".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_sentinel_when_nothing_usable() {
        let meta = RequestMeta::extract(None, None, None, None);
        assert_eq!(meta.ip, UNKNOWN_IP);
        assert!(meta.ip_string().is_none());
    }

    #[test]
    fn test_ipv6_forwarded() {
        let meta = RequestMeta::extract(Some("2001:db8::1"), None, None, None);
        assert_eq!(meta.ip, "2001:db8::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_blank_fingerprint_dropped() {
        let meta = RequestMeta::extract(None, None, Some("Mozilla/5.0"), Some("  "));
        assert!(meta.fingerprint.is_none());
        assert_eq!(meta.user_agent.as_deref(), Some("Mozilla/5.0"));
    }
}
