//! User-agent parsing into device fingerprint attributes.
//!
//! The fingerprint is the device-matching key for session tracking: two
//! logins from the same browser/OS/device resolve to the same session
//! record even after the credential is rotated. Parsing is best-effort —
//! anything unrecognized degrades to `None`, never an error.

use serde::{Deserialize, Serialize};

/// Browser, OS, and device attributes parsed from a user-agent string.
///
/// Field-wise equality is the device-matching key; `None` fields must
/// compare equal to `None`, so unknown attributes still match
/// deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFingerprint {
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub device_type: Option<String>,
    pub device_vendor: Option<String>,
    pub device_model: Option<String>,
}

/// Parse a user-agent string into a [`DeviceFingerprint`].
pub fn parse(user_agent: &str) -> DeviceFingerprint {
    let ua = user_agent.trim();
    if ua.is_empty() {
        return DeviceFingerprint::default();
    }

    let (browser_name, browser_version) = parse_browser(ua);
    let (os_name, os_version) = parse_os(ua);
    let device_type = parse_device_type(ua);
    let (device_vendor, device_model) = parse_device(ua);

    DeviceFingerprint {
        browser_name,
        browser_version,
        os_name,
        os_version,
        device_type: Some(device_type.to_string()),
        device_vendor,
        device_model,
    }
}

/// Return the token directly after `marker`, ending at whitespace, `;`
/// or `)`.
fn token_after<'a>(ua: &'a str, marker: &str) -> Option<&'a str> {
    let start = ua.find(marker)? + marker.len();
    let rest = &ua[start..];
    let end = rest
        .find(|c: char| c == ' ' || c == ';' || c == ')')
        .unwrap_or(rest.len());
    let token = &rest[..end];
    (!token.is_empty()).then_some(token)
}

fn parse_browser(ua: &str) -> (Option<String>, Option<String>) {
    // Order matters: Edge and Opera UAs also contain a Chrome token, and
    // nearly everything contains a Safari token.
    if let Some(v) = token_after(ua, "Edg/") {
        return (Some("Edge".into()), Some(v.into()));
    }
    if let Some(v) = token_after(ua, "OPR/") {
        return (Some("Opera".into()), Some(v.into()));
    }
    if let Some(v) = token_after(ua, "Chrome/") {
        return (Some("Chrome".into()), Some(v.into()));
    }
    if let Some(v) = token_after(ua, "Firefox/") {
        return (Some("Firefox".into()), Some(v.into()));
    }
    if ua.contains("Safari/") {
        // Safari reports its real version behind a separate `Version/` token.
        return (Some("Safari".into()), token_after(ua, "Version/").map(Into::into));
    }
    (None, None)
}

fn parse_os(ua: &str) -> (Option<String>, Option<String>) {
    if let Some(v) = token_after(ua, "Windows NT ") {
        return (Some("Windows".into()), Some(v.into()));
    }
    if let Some(v) = token_after(ua, "Android ") {
        return (Some("Android".into()), Some(v.into()));
    }
    // iPhone reports "CPU iPhone OS 16_5", iPad reports "CPU OS 16_5".
    if let Some(v) = token_after(ua, "iPhone OS ").or_else(|| token_after(ua, "CPU OS ")) {
        return (Some("iOS".into()), Some(v.replace('_', ".")));
    }
    if let Some(v) = token_after(ua, "Mac OS X ") {
        return (Some("macOS".into()), Some(v.replace('_', ".")));
    }
    if ua.contains("Linux") {
        return (Some("Linux".into()), None);
    }
    (None, None)
}

fn parse_device_type(ua: &str) -> &'static str {
    if ua.contains("iPad") || ua.contains("Tablet") {
        "tablet"
    } else if ua.contains("Mobi") || ua.contains("iPhone") {
        "mobile"
    } else if ua.contains("Android") {
        // Android without a Mobile token is a tablet UA.
        "tablet"
    } else {
        "desktop"
    }
}

fn parse_device(ua: &str) -> (Option<String>, Option<String>) {
    if ua.contains("iPhone") {
        return (Some("Apple".into()), Some("iPhone".into()));
    }
    if ua.contains("iPad") {
        return (Some("Apple".into()), Some("iPad".into()));
    }
    if ua.contains("Macintosh") {
        return (Some("Apple".into()), None);
    }
    if ua.contains("Android") {
        if let Some(model) = android_model(ua) {
            let vendor = android_vendor(&model);
            return (vendor, Some(model));
        }
    }
    (None, None)
}

/// Extract the device model from an Android UA, e.g.
/// `(Linux; Android 13; Pixel 7 Build/TQ3A...)` yields `Pixel 7`.
fn android_model(ua: &str) -> Option<String> {
    let segment = if let Some(build) = ua.find(" Build/") {
        let head = &ua[..build];
        let start = head.rfind([';', '(']).map(|i| i + 1)?;
        &head[start..]
    } else {
        // No Build token: take the segment after the Android version.
        let vstart = ua.find("Android ")? + "Android ".len();
        let rest = &ua[vstart..];
        let vend = rest
            .find(|c: char| c == ' ' || c == ';' || c == ')')
            .unwrap_or(rest.len());
        let rest = rest[vend..].trim_start_matches([';', ' ']);
        let end = rest.find([';', ')']).unwrap_or(rest.len());
        &rest[..end]
    };
    let model = segment.trim();
    // "K" is Chrome's reduced UA placeholder, "wv" marks a WebView.
    if model.is_empty() || model == "K" || model == "wv" {
        None
    } else {
        Some(model.to_string())
    }
}

fn android_vendor(model: &str) -> Option<String> {
    if model.starts_with("Pixel") || model.starts_with("Nexus") {
        Some("Google".into())
    } else if model.starts_with("SM-") {
        Some("Samsung".into())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) \
        AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1";
    const CHROME_PIXEL: &str = "Mozilla/5.0 (Linux; Android 13; Pixel 7 Build/TQ3A.230805.001) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
    const EDGE_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";

    #[test]
    fn chrome_on_windows() {
        let fp = parse(CHROME_WIN);
        assert_eq!(fp.browser_name.as_deref(), Some("Chrome"));
        assert_eq!(fp.browser_version.as_deref(), Some("120.0.0.0"));
        assert_eq!(fp.os_name.as_deref(), Some("Windows"));
        assert_eq!(fp.os_version.as_deref(), Some("10.0"));
        assert_eq!(fp.device_type.as_deref(), Some("desktop"));
        assert_eq!(fp.device_vendor, None);
        assert_eq!(fp.device_model, None);
    }

    #[test]
    fn firefox_on_linux() {
        let fp = parse(FIREFOX_LINUX);
        assert_eq!(fp.browser_name.as_deref(), Some("Firefox"));
        assert_eq!(fp.browser_version.as_deref(), Some("121.0"));
        assert_eq!(fp.os_name.as_deref(), Some("Linux"));
        assert_eq!(fp.os_version, None);
        assert_eq!(fp.device_type.as_deref(), Some("desktop"));
    }

    #[test]
    fn safari_on_iphone() {
        let fp = parse(SAFARI_IPHONE);
        assert_eq!(fp.browser_name.as_deref(), Some("Safari"));
        assert_eq!(fp.browser_version.as_deref(), Some("16.5"));
        assert_eq!(fp.os_name.as_deref(), Some("iOS"));
        assert_eq!(fp.os_version.as_deref(), Some("16.5"));
        assert_eq!(fp.device_type.as_deref(), Some("mobile"));
        assert_eq!(fp.device_vendor.as_deref(), Some("Apple"));
        assert_eq!(fp.device_model.as_deref(), Some("iPhone"));
    }

    #[test]
    fn chrome_on_android_pixel() {
        let fp = parse(CHROME_PIXEL);
        assert_eq!(fp.browser_name.as_deref(), Some("Chrome"));
        assert_eq!(fp.os_name.as_deref(), Some("Android"));
        assert_eq!(fp.os_version.as_deref(), Some("13"));
        assert_eq!(fp.device_type.as_deref(), Some("mobile"));
        assert_eq!(fp.device_vendor.as_deref(), Some("Google"));
        assert_eq!(fp.device_model.as_deref(), Some("Pixel 7"));
    }

    #[test]
    fn edge_on_macos() {
        let fp = parse(EDGE_MAC);
        assert_eq!(fp.browser_name.as_deref(), Some("Edge"));
        assert_eq!(fp.browser_version.as_deref(), Some("120.0.2210.91"));
        assert_eq!(fp.os_name.as_deref(), Some("macOS"));
        assert_eq!(fp.os_version.as_deref(), Some("10.15.7"));
        assert_eq!(fp.device_type.as_deref(), Some("desktop"));
        assert_eq!(fp.device_vendor.as_deref(), Some("Apple"));
    }

    #[test]
    fn empty_user_agent_degrades_to_all_none() {
        assert_eq!(parse(""), DeviceFingerprint::default());
        assert_eq!(parse("   "), DeviceFingerprint::default());
    }

    #[test]
    fn parsing_is_deterministic() {
        assert_eq!(parse(CHROME_PIXEL), parse(CHROME_PIXEL));
    }

    #[test]
    fn reduced_android_ua_drops_placeholder_model() {
        let ua = "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 \
            (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36";
        let fp = parse(ua);
        assert_eq!(fp.device_model, None);
        assert_eq!(fp.device_vendor, None);
        assert_eq!(fp.device_type.as_deref(), Some("mobile"));
    }
}
