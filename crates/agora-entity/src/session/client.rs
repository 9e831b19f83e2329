//! Request-derived client description.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What the gateway knows about the client making a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Raw `User-Agent` header.
    pub user_agent: Option<String>,
    /// Device class derived from the user agent.
    pub device: Option<String>,
    /// Browser family derived from the user agent.
    pub browser: Option<String>,
    /// Operating system derived from the user agent.
    pub os: Option<String>,
    /// Coarse location, if resolved upstream.
    pub location: Option<String>,
}

impl ClientInfo {
    /// Builds client info from an IP and a `User-Agent` string.
    pub fn from_request(ip_address: Option<String>, user_agent: Option<&str>) -> Self {
        let ua = user_agent.unwrap_or_default();
        Self {
            ip_address,
            user_agent: user_agent.map(str::to_string),
            device: user_agent.map(|_| detect_device(ua).to_string()),
            browser: user_agent.and_then(|_| detect_browser(ua)).map(str::to_string),
            os: user_agent.and_then(|_| detect_os(ua)).map(str::to_string),
            location: None,
        }
    }

    /// Sets the resolved location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Fields that go into the session's open metadata map.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        if let Some(os) = &self.os {
            map.insert("os".to_string(), os.clone());
        }
        if let Some(ua) = &self.user_agent {
            map.insert("user_agent".to_string(), ua.clone());
        }
        map
    }

    /// Snapshot stored on the user as `last_device_info`.
    pub fn device_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "device": self.device,
            "browser": self.browser,
            "os": self.os,
            "ip_address": self.ip_address,
            "location": self.location,
        })
    }
}

fn detect_device(ua: &str) -> &'static str {
    let lower = ua.to_ascii_lowercase();
    if lower.contains("ipad") || lower.contains("tablet") {
        "tablet"
    } else if lower.contains("mobi") || lower.contains("iphone") || lower.contains("android") {
        "mobile"
    } else {
        "desktop"
    }
}

// Order matters: Edge and Opera also advertise Chrome, Chrome also advertises Safari.
fn detect_browser(ua: &str) -> Option<&'static str> {
    if ua.contains("Edg/") {
        Some("Edge")
    } else if ua.contains("OPR/") || ua.contains("Opera") {
        Some("Opera")
    } else if ua.contains("Firefox/") {
        Some("Firefox")
    } else if ua.contains("Chrome/") || ua.contains("CriOS/") {
        Some("Chrome")
    } else if ua.contains("Safari/") {
        Some("Safari")
    } else {
        None
    }
}

fn detect_os(ua: &str) -> Option<&'static str> {
    if ua.contains("Windows") {
        Some("Windows")
    } else if ua.contains("iPhone") || ua.contains("iPad") {
        Some("iOS")
    } else if ua.contains("Mac OS X") || ua.contains("Macintosh") {
        Some("macOS")
    } else if ua.contains("Android") {
        Some("Android")
    } else if ua.contains("Linux") {
        Some("Linux")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

    #[test]
    fn test_desktop_chrome() {
        let info = ClientInfo::from_request(Some("10.0.0.1".into()), Some(CHROME_MAC));
        assert_eq!(info.device.as_deref(), Some("desktop"));
        assert_eq!(info.browser.as_deref(), Some("Chrome"));
        assert_eq!(info.os.as_deref(), Some("macOS"));
        assert_eq!(info.metadata().get("os").map(String::as_str), Some("macOS"));
    }

    #[test]
    fn test_mobile_safari() {
        let info = ClientInfo::from_request(None, Some(SAFARI_IPHONE));
        assert_eq!(info.device.as_deref(), Some("mobile"));
        assert_eq!(info.browser.as_deref(), Some("Safari"));
        assert_eq!(info.os.as_deref(), Some("iOS"));
    }

    #[test]
    fn test_missing_user_agent_leaves_fields_empty() {
        let info = ClientInfo::from_request(Some("10.0.0.2".into()), None);
        assert!(info.device.is_none());
        assert!(info.browser.is_none());
        assert!(info.metadata().is_empty());
    }
}
