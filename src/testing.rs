//! Test doubles shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::fingerprint::RequestKind;
use crate::http_client::Fetch;

/// [`Fetch`] that serves canned bodies by exact URL and counts requests.
#[derive(Default)]
pub(crate) struct RouteFetch {
    routes: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
}

impl RouteFetch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn route(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), body.to_string());
        self
    }

    /// Number of requests made for `url`, served or not.
    pub(crate) fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Fetch for RouteFetch {
    async fn get_text(&self, url: &str, _kind: RequestKind, _referer: Option<&str>) -> Result<String> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 404 for {url}"))
    }
}

/// Canned pages of a FlixHQ-layout site with one show (`tv/watch-dark-17890`).
pub(crate) mod flixhq_site {
    use std::sync::Arc;

    use super::RouteFetch;
    use crate::config::FlixHqConfig;
    use crate::provider::FlixHqProvider;

    pub(crate) const BASE: &str = "https://flixhq.test";

    pub(crate) const SEASONS: &str = r#"
        <div class="dropdown-menu">
          <a data-id="501" class="dropdown-item ss-item">Season 1</a>
          <a data-id="502" class="dropdown-item ss-item">Season 2</a>
        </div>
    "#;

    pub(crate) const SEASON_ONE: &str = r#"
        <ul class="nav">
          <li class="nav-item"><a data-id="9001" class="eps-item" title="Eps 1: Secrets">Episode 1</a></li>
          <li class="nav-item"><a data-id="9002" class="eps-item" title="Eps 2: Lies">Episode 2</a></li>
          <li class="nav-item"><a data-id="9003" class="eps-item" title="Eps 3: Past and Present">Episode 3</a></li>
          <li class="nav-item"><a data-id="9004" class="eps-item" title="Eps 4: Double Lives">Episode 4</a></li>
        </ul>
    "#;

    pub(crate) fn servers_html(attr: &str) -> String {
        format!(
            r#"<ul class="nav">
                 <li class="nav-item"><a {attr}="11" title="Server UpCloud"><span>UpCloud</span></a></li>
                 <li class="nav-item"><a {attr}="12" title="Server Vidcloud"><span>Vidcloud</span></a></li>
                 <li class="nav-item"><a {attr}="13" title="Server MixDrop"><span>MixDrop</span></a></li>
               </ul>"#
        )
    }

    pub(crate) const UPCLOUD_SOURCES: &str = r#"{
        "sources": [{"file": "https://cdn.test/hls/master.m3u8", "type": "hls"}],
        "tracks": [{"file": "https://cc.test/eng.vtt", "label": "English", "kind": "captions"}]
    }"#;

    /// Provider pointed at [`BASE`] and served by `fetch`.
    pub(crate) fn provider(fetch: &Arc<RouteFetch>) -> FlixHqProvider {
        let config = FlixHqConfig {
            base_url: format!("{BASE}/"),
        };
        FlixHqProvider::new(&config, fetch.clone())
    }
}
