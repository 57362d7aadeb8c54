//! Browser header profiles for scraping requests.
//!
//! Source sites serve different markup (or a bot wall) to clients that do
//! not look like a browser, so every request carries a coherent set of
//! browser headers. Ajax fragment requests use the `cors` fetch metadata a
//! real page script would send.

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT,
};

const CHROME_VERSIONS: &[(&str, &str)] = &[
    ("131", "131.0.6778.205"),
    ("132", "132.0.6834.160"),
    ("133", "133.0.6943.127"),
];

const FIREFOX_VERSIONS: &[&str] = &["133.0", "134.0", "135.0"];

const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.9",
    "en-US,en;q=0.9,es;q=0.8",
    "en-US,en;q=0.9,fr;q=0.8",
];

/// What kind of request the headers are for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Top-level page navigation.
    Document,
    /// Script-initiated fragment or JSON request.
    Ajax,
}

/// Browser profile with realistic fingerprint
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub accept_language: String,
    /// Empty for browsers that do not send client hints.
    pub sec_ch_ua: String,
    pub sec_ch_ua_platform: String,
}

#[derive(Debug, Clone, Copy)]
enum Platform {
    MacOS,
    Windows,
    Linux,
}

impl Platform {
    fn random() -> Self {
        let roll: f32 = rand::thread_rng().gen();
        if roll < 0.65 {
            Platform::Windows
        } else if roll < 0.85 {
            Platform::MacOS
        } else {
            Platform::Linux
        }
    }

    fn os_string(self) -> &'static str {
        match self {
            Platform::MacOS => "Macintosh; Intel Mac OS X 10_15_7",
            Platform::Windows => "Windows NT 10.0; Win64; x64",
            Platform::Linux => "X11; Linux x86_64",
        }
    }

    fn sec_ch_platform(self) -> &'static str {
        match self {
            Platform::MacOS => "\"macOS\"",
            Platform::Windows => "\"Windows\"",
            Platform::Linux => "\"Linux\"",
        }
    }
}

fn pick<T: Copy>(items: &[T], fallback: T) -> T {
    items
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(fallback)
}

/// Chrome profile on a random desktop platform.
#[must_use]
pub fn chrome_profile() -> BrowserProfile {
    let platform = Platform::random();
    let (major, full) = pick(CHROME_VERSIONS, ("133", "133.0.6943.127"));

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{full} Safari/537.36",
            platform.os_string()
        ),
        accept_language: pick(ACCEPT_LANGUAGES, "en-US,en;q=0.9").to_string(),
        sec_ch_ua: format!(
            "\"Google Chrome\";v=\"{major}\", \"Chromium\";v=\"{major}\", \"Not_A Brand\";v=\"24\""
        ),
        sec_ch_ua_platform: platform.sec_ch_platform().to_string(),
    }
}

/// Firefox profile on a random desktop platform.
#[must_use]
pub fn firefox_profile() -> BrowserProfile {
    let platform = Platform::random();
    let version = pick(FIREFOX_VERSIONS, "135.0");

    BrowserProfile {
        user_agent: format!(
            "Mozilla/5.0 ({}; rv:{version}) Gecko/20100101 Firefox/{version}",
            platform.os_string()
        ),
        accept_language: pick(ACCEPT_LANGUAGES, "en-US,en;q=0.9").to_string(),
        sec_ch_ua: String::new(),
        sec_ch_ua_platform: String::new(),
    }
}

/// Random profile, weighted towards Chrome.
#[must_use]
pub fn random_profile() -> BrowserProfile {
    let roll: f32 = rand::thread_rng().gen();
    if roll < 0.75 {
        chrome_profile()
    } else {
        firefox_profile()
    }
}

impl BrowserProfile {
    /// Profile with a fixed user agent (from configuration).
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            accept_language: "en-US,en;q=0.9".to_string(),
            sec_ch_ua: String::new(),
            sec_ch_ua_platform: String::new(),
        }
    }

    /// Headers for one request of the given kind.
    pub fn to_headers(&self, kind: RequestKind) -> Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&self.accept_language)?);

        if !self.sec_ch_ua.is_empty() {
            headers.insert(
                HeaderName::from_static("sec-ch-ua"),
                HeaderValue::from_str(&self.sec_ch_ua)?,
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-mobile"),
                HeaderValue::from_static("?0"),
            );
            headers.insert(
                HeaderName::from_static("sec-ch-ua-platform"),
                HeaderValue::from_str(&self.sec_ch_ua_platform)?,
            );
        }

        let (accept, dest, mode) = match kind {
            RequestKind::Document => (
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                "document",
                "navigate",
            ),
            RequestKind::Ajax => ("*/*", "empty", "cors"),
        };
        headers.insert(ACCEPT, HeaderValue::from_static(accept));
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static(dest),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static(mode),
        );
        if kind == RequestKind::Ajax {
            headers.insert(
                HeaderName::from_static("x-requested-with"),
                HeaderValue::from_static("XMLHttpRequest"),
            );
        }

        Ok(headers)
    }
}
