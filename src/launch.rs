//! Launch parameters handed to the app on entry.
//!
//! The bot opens the app with the user's phone number as a `phone` query
//! parameter. The value is shown read-only and drives no other logic.

use url::Url;

/// Query parameter carrying the contact value.
pub const PHONE_PARAM: &str = "phone";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    pub phone: Option<String>,
}

impl LaunchParams {
    /// Parse a full launch URL or a bare query string (`?phone=...`).
    pub fn from_url(raw: &str) -> Self {
        let raw = raw.trim();
        let parsed = Url::parse(raw).or_else(|_| {
            let query = raw.trim_start_matches('?');
            Url::parse(&format!("http://launch.invalid/?{query}"))
        });
        let phone = parsed.ok().and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == PHONE_PARAM)
                .map(|(_, v)| v.trim().to_string())
                .filter(|v| !v.is_empty())
        });
        Self { phone }
    }

    /// Explicit value wins over one parsed from a launch URL.
    pub fn resolve(phone: Option<String>, launch_url: Option<&str>) -> Self {
        match phone.filter(|p| !p.trim().is_empty()) {
            Some(p) => Self { phone: Some(p) },
            None => launch_url.map(Self::from_url).unwrap_or_default(),
        }
    }

    pub fn display_phone(&self) -> &str {
        self.phone.as_deref().unwrap_or("-")
    }
}
