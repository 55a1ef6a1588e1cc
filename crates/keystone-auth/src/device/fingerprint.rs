//! Best-effort device fingerprinting from client headers.
//!
//! Two grammars are recognized: the structured mobile client token
//! `<app>/<version> (<deviceName>;<systemName> <systemVersion>;<uniqueId>)`
//! and the standard layered browser user-agent string. Anything else
//! falls back to the client-supplied fingerprint header or a random
//! fingerprint. The result is a labeling heuristic only — two genuine
//! devices may collide, and it must never be treated as an identity
//! boundary.

use std::sync::LazyLock;

use rand::RngCore;
use regex::Regex;

use keystone_core::types::RequestMeta;

use crate::hash::sha256_hex;

static MOBILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<app>[\w.\-]+)/(?P<ver>[\w.\-]+) \((?P<device>[^;]+);\s*(?P<system>[^\s;]+)\s+(?P<sysver>[^;]+);\s*(?P<uid>[^)]+)\)")
        .expect("mobile fingerprint pattern")
});

static BROWSER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z]+)/(?P<ver>[\d.]+)\s+\((?P<sysinfo>[^)]*)\)")
        .expect("browser fingerprint pattern")
});

/// Product token, used to pick the trailing browser name out of a
/// layered user-agent string.
static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<name>[A-Za-z]+)/(?P<ver>[\d.]+)").expect("product token pattern")
});

/// The parsed identity of the client device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Stable-ish fingerprint string, unique per (account, device) row.
    pub fingerprint: String,
    /// Human-readable device name, when parseable.
    pub name: Option<String>,
    /// Platform label, when parseable.
    pub platform: Option<String>,
}

impl DeviceDescriptor {
    /// Derives a descriptor from request metadata.
    ///
    /// Precedence: structured mobile token, then browser user-agent
    /// grammar, then the client-supplied fingerprint header, then a
    /// random fingerprint (the device will not be recognized on its
    /// next visit, which is acceptable for unidentifiable clients).
    pub fn derive(meta: &RequestMeta) -> Self {
        if let Some(agent) = meta.user_agent.as_deref() {
            if let Some(descriptor) = parse_mobile(agent) {
                return descriptor;
            }
            if let Some(descriptor) = parse_browser(agent) {
                return descriptor;
            }
        }

        if let Some(supplied) = meta.fingerprint.as_deref() {
            return Self {
                fingerprint: sha256_hex(supplied),
                name: None,
                platform: None,
            };
        }

        Self {
            fingerprint: random_fingerprint(),
            name: None,
            platform: None,
        }
    }
}

fn parse_mobile(agent: &str) -> Option<DeviceDescriptor> {
    let caps = MOBILE_RE.captures(agent)?;
    let device = caps["device"].trim().to_string();
    let system = caps["system"].trim();
    let sysver = caps["sysver"].trim();
    let uid = caps["uid"].trim();

    Some(DeviceDescriptor {
        // The unique ID is the discriminating part; the app name keeps
        // two apps on the same device distinct.
        fingerprint: sha256_hex(&format!("{}:{uid}", &caps["app"])),
        name: Some(device),
        platform: Some(format!("{system} {sysver}")),
    })
}

fn parse_browser(agent: &str) -> Option<DeviceDescriptor> {
    let caps = BROWSER_RE.captures(agent)?;
    let sysinfo = caps["sysinfo"].trim();

    // Layered user-agents end with the actual browser's product token;
    // the leading token is almost always the `Mozilla/5.0` compatibility
    // marker.
    let name = PRODUCT_RE
        .captures_iter(agent)
        .last()
        .map(|c| c["name"].to_string())
        .unwrap_or_else(|| caps["name"].to_string());

    let platform = sysinfo
        .split(';')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(DeviceDescriptor {
        fingerprint: sha256_hex(agent),
        name: Some(name),
        platform,
    })
}

fn random_fingerprint() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(user_agent: Option<&str>, fingerprint: Option<&str>) -> RequestMeta {
        RequestMeta::extract(None, None, user_agent, fingerprint)
    }

    #[test]
    fn test_mobile_token_parsed() {
        let d = DeviceDescriptor::derive(&meta(
            Some("AcmeApp/2.4.1 (iPhone 15 Pro;iOS 17.2;ABCD-1234-EF)"),
            None,
        ));
        assert_eq!(d.name.as_deref(), Some("iPhone 15 Pro"));
        assert_eq!(d.platform.as_deref(), Some("iOS 17.2"));
        assert_eq!(d.fingerprint.len(), 64);
    }

    #[test]
    fn test_mobile_fingerprint_stable_across_ips() {
        let ua = "AcmeApp/2.4.1 (Pixel 8;Android 14;XYZ-99)";
        let a = DeviceDescriptor::derive(&meta(Some(ua), None));
        let b = DeviceDescriptor::derive(&meta(Some(ua), None));
        assert_eq!(a.fingerprint, b.fingerprint);
    }

    #[test]
    fn test_browser_agent_parsed() {
        let d = DeviceDescriptor::derive(&meta(
            Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            None,
        ));
        assert_eq!(d.name.as_deref(), Some("Safari"));
        assert_eq!(d.platform.as_deref(), Some("Windows NT 10.0"));
    }

    #[test]
    fn test_unparseable_agent_uses_client_fingerprint() {
        let d = DeviceDescriptor::derive(&meta(Some("curl"), Some("client-fp-1")));
        assert!(d.name.is_none());
        assert_eq!(d.fingerprint, sha256_hex("client-fp-1"));
    }

    #[test]
    fn test_nothing_usable_gets_random_fingerprint() {
        let a = DeviceDescriptor::derive(&meta(None, None));
        let b = DeviceDescriptor::derive(&meta(None, None));
        assert_eq!(a.fingerprint.len(), 32);
        assert_ne!(a.fingerprint, b.fingerprint);
    }
}
