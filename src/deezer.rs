//! Deezer "now playing" provider
//!
//! Deezer has no public endpoint for the current track, but the profile page
//! embeds the application state as a JSON literal:
//!
//! ```text
//! <script>window.__DZR_APP_STATE__ = {...}</script>
//! ```
//!
//! The payload is everything between the marker and the next `</script>` on
//! the same line. `TAB.home.online` is only filled in while something plays;
//! a missing, `null` or empty value means nothing is playing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::provider::{endpoint, Provider, ProviderError, USER_AGENT};

const DEEZER_URL: &str = "https://deezer.com";

static APP_STATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<script>window\.__DZR_APP_STATE__ = (?P<state>.+?)</script>")
        .unwrap_or_else(|_| Regex::new("$^").unwrap())
});

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NowPlaying {
    #[serde(rename = "SNG_TITLE")]
    pub title: String,
    #[serde(rename = "ART_NAME")]
    pub artist: String,
    #[serde(rename = "ALB_TITLE")]
    pub album: String,
}

#[derive(Debug, Deserialize)]
struct AppState {
    #[serde(rename = "TAB")]
    tab: AppStateTab,
}

#[derive(Debug, Deserialize)]
struct AppStateTab {
    home: AppStateHome,
}

#[derive(Debug, Deserialize)]
struct AppStateHome {
    #[serde(default)]
    online: Option<Value>,
}

/// JSON values the page uses for "nothing playing"
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Pull the embedded application state JSON out of a profile page
fn extract_app_state(html: &str) -> Option<&str> {
    APP_STATE_PATTERN
        .captures(html)
        .and_then(|caps| caps.name("state"))
        .map(|m| m.as_str())
}

/// Parse a profile page into the currently playing track, if any
pub fn parse_profile_page(html: &str) -> Result<Option<NowPlaying>, ProviderError> {
    let state = extract_app_state(html).ok_or_else(|| {
        ProviderError::ParseError("application state marker not found".to_string())
    })?;

    let state: AppState =
        serde_json::from_str(state).map_err(|e| ProviderError::ParseError(e.to_string()))?;

    match state.tab.home.online {
        Some(online) if !is_blank(&online) => NowPlaying::deserialize(online)
            .map(Some)
            .map_err(|e| ProviderError::ParseError(e.to_string())),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone)]
pub struct DeezerProvider {
    base_url: String,
}

impl Default for DeezerProvider {
    fn default() -> Self {
        DeezerProvider {
            base_url: DEEZER_URL.to_string(),
        }
    }
}

impl DeezerProvider {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        DeezerProvider {
            base_url: base_url.into(),
        }
    }

    fn profile_url(&self, profile_id: &str) -> String {
        endpoint(&self.base_url, "us/profile", profile_id, "")
    }
}

impl Provider for DeezerProvider {
    type Payload = NowPlaying;

    fn name(&self) -> &'static str {
        "Deezer"
    }

    fn id_kind(&self) -> &'static str {
        "profile ID"
    }

    fn fetch(&self, profile_id: &str) -> Result<Option<NowPlaying>, ProviderError> {
        let url = self.profile_url(profile_id);
        tracing::debug!("Fetching Deezer profile from: {}", url);

        let html = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "text/html")
            .call()
            .map_err(ProviderError::from_ureq)?
            .into_string()
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        parse_profile_page(&html)
    }

    fn describe(&self, _profile_id: &str, track: &NowPlaying) -> String {
        format!("Playing {} - {} ({})", track.artist, track.title, track.album)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocking, html_response, mock_endpoint};
    use wiremock::ResponseTemplate;

    fn page(state: &str) -> String {
        format!(
            "<html><head><script src=\"app.js\"></script></head><body>\n<script>window.__DZR_APP_STATE__ = {}</script><script>var x = 1;</script>\n</body></html>",
            state
        )
    }

    #[test]
    fn test_parse_not_playing_without_online_key() {
        let html = page(r#"{"TAB":{"home":{"flow":[]}}}"#);
        assert_eq!(parse_profile_page(&html).unwrap(), None);
    }

    #[test]
    fn test_parse_null_online_is_not_playing() {
        let html = page(r#"{"TAB":{"home":{"online":null}}}"#);
        assert_eq!(parse_profile_page(&html).unwrap(), None);
    }

    #[test]
    fn test_parse_empty_online_is_not_playing() {
        for online in ["{}", "false", "\"\"", "[]"] {
            let html = page(&format!(r#"{{"TAB":{{"home":{{"online":{}}}}}}}"#, online));
            assert_eq!(parse_profile_page(&html).unwrap(), None, "online = {}", online);
        }
    }

    #[test]
    fn test_parse_partial_online_is_parse_error() {
        let html = page(r#"{"TAB":{"home":{"online":{"SNG_TITLE":"X"}}}}"#);
        assert!(matches!(
            parse_profile_page(&html),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_now_playing() {
        let html = page(
            r#"{"USER":{"ID":"42"},"TAB":{"home":{"online":{"SNG_TITLE":"X","ART_NAME":"Y","ALB_TITLE":"Z","SNG_ID":"1"}}}}"#,
        );

        let track = parse_profile_page(&html).unwrap().unwrap();
        assert_eq!(
            track,
            NowPlaying {
                title: "X".to_string(),
                artist: "Y".to_string(),
                album: "Z".to_string(),
            }
        );
        assert_eq!(DeezerProvider::default().describe("42", &track), "Playing Y - X (Z)");
    }

    #[test]
    fn test_parse_missing_marker_is_parse_error() {
        let result = parse_profile_page("<html><body>Maintenance</body></html>");
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_parse_malformed_state_is_parse_error() {
        let html = page(r#"{"TAB":{"home":"#);
        assert!(matches!(
            parse_profile_page(&html),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_missing_tab_is_parse_error() {
        let html = page(r#"{"USER":{}}"#);
        assert!(matches!(
            parse_profile_page(&html),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_profile_page() {
        let body = page(r#"{"TAB":{"home":{"online":{"SNG_TITLE":"One","ART_NAME":"Metallica","ALB_TITLE":"...And Justice for All"}}}}"#);
        let server = mock_endpoint("/us/profile/1234", html_response(200, &body)).await;
        let provider = DeezerProvider::with_base_url(server.uri());

        let track = blocking(move || provider.fetch("1234")).await.unwrap().unwrap();

        assert_eq!(track.artist, "Metallica");
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_found() {
        let server = mock_endpoint("/us/profile/0", ResponseTemplate::new(404)).await;
        let provider = DeezerProvider::with_base_url(server.uri());

        let result = blocking(move || provider.fetch("0")).await;

        assert!(matches!(result, Err(ProviderError::NotFound)));
    }

    #[tokio::test]
    async fn test_fetch_forbidden_is_network_error() {
        let server = mock_endpoint("/us/profile/1234", ResponseTemplate::new(403)).await;
        let provider = DeezerProvider::with_base_url(server.uri());

        let result = blocking(move || provider.fetch("1234")).await;

        assert!(matches!(result, Err(ProviderError::NetworkError(_))));
    }
}
