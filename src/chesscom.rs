//! chess.com ranked record provider

use std::ops::AddAssign;

use serde::Deserialize;
use serde_json::Value;

use crate::provider::{endpoint, Provider, ProviderError, USER_AGENT};

const CHESSCOM_API_URL: &str = "https://api.chess.com";

/// Win/loss/draw totals across all game modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Record {
    pub win: u64,
    pub loss: u64,
    pub draw: u64,
}

impl AddAssign for Record {
    fn add_assign(&mut self, other: Record) {
        self.win += other.win;
        self.loss += other.loss;
        self.draw += other.draw;
    }
}

#[derive(Debug, Clone)]
pub struct ChessComProvider {
    base_url: String,
}

impl Default for ChessComProvider {
    fn default() -> Self {
        ChessComProvider {
            base_url: CHESSCOM_API_URL.to_string(),
        }
    }
}

impl ChessComProvider {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        ChessComProvider {
            base_url: base_url.into(),
        }
    }

    fn stats_url(&self, username: &str) -> String {
        endpoint(&self.base_url, "pub/player", username, "/stats")
    }
}

/// Sum the records of every mode entry that carries a `record` object.
///
/// Entries without one (puzzles, tactics, FIDE rating) are skipped. A
/// `record` lacking any of the three counters is a parse error.
pub fn sum_records(stats: &Value) -> Result<Record, ProviderError> {
    let modes = stats
        .as_object()
        .ok_or_else(|| ProviderError::ParseError("stats payload is not an object".to_string()))?;

    let mut total = Record::default();
    for (mode, value) in modes {
        let Some(record) = value.get("record").filter(|r| r.is_object()) else {
            continue;
        };
        let record = Record::deserialize(record)
            .map_err(|e| ProviderError::ParseError(format!("{}: {}", mode, e)))?;
        total += record;
    }

    Ok(total)
}

impl Provider for ChessComProvider {
    type Payload = Record;

    fn name(&self) -> &'static str {
        "chess.com"
    }

    fn id_kind(&self) -> &'static str {
        "username"
    }

    fn fetch(&self, username: &str) -> Result<Option<Record>, ProviderError> {
        let url = self.stats_url(username);
        tracing::debug!("Fetching chess.com stats from: {}", url);

        let stats: Value = ureq::get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/json")
            .call()
            .map_err(ProviderError::from_ureq)?
            .into_json()
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        sum_records(&stats).map(Some)
    }

    fn describe(&self, username: &str, record: &Record) -> String {
        format!(
            "chess.com - {} - Wins: {}, Losses: {}, Draws: {}",
            username, record.win, record.loss, record.draw
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{blocking, html_response, json_response, mock_endpoint, REFUSED_URL};
    use serde_json::json;
    use wiremock::ResponseTemplate;

    #[test]
    fn test_sum_records_skips_entries_without_record() {
        let stats = json!({
            "chess_blitz": {"record": {"win": 3, "loss": 1, "draw": 0}},
            "chess_rapid": {"record": {"win": 2, "loss": 2, "draw": 1}},
            "other": {"no_record_here": true}
        });

        let total = sum_records(&stats).unwrap();
        assert_eq!(total, Record { win: 5, loss: 3, draw: 1 });
    }

    #[test]
    fn test_sum_records_ignores_extra_fields_and_scalars() {
        let stats = json!({
            "chess_daily": {
                "last": {"rating": 1200},
                "record": {"win": 7, "loss": 4, "draw": 2, "time_per_move": 3600, "timeout_percent": 0}
            },
            "fide": 1500,
            "tactics": {"highest": {"rating": 1800}}
        });

        let total = sum_records(&stats).unwrap();
        assert_eq!(total, Record { win: 7, loss: 4, draw: 2 });
    }

    #[test]
    fn test_sum_records_empty_object() {
        assert_eq!(sum_records(&json!({})).unwrap(), Record::default());
    }

    #[test]
    fn test_sum_records_missing_counter_is_parse_error() {
        let stats = json!({"chess_bullet": {"record": {"win": 1, "loss": 1}}});
        assert!(matches!(
            sum_records(&stats),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_sum_records_non_object_is_parse_error() {
        assert!(matches!(
            sum_records(&json!([1, 2, 3])),
            Err(ProviderError::ParseError(_))
        ));
    }

    #[test]
    fn test_describe() {
        let provider = ChessComProvider::default();
        let text = provider.describe("hikaru", &Record { win: 5, loss: 3, draw: 1 });
        assert_eq!(text, "chess.com - hikaru - Wins: 5, Losses: 3, Draws: 1");
    }

    #[tokio::test]
    async fn test_fetch_sums_remote_stats() {
        let body = r#"{"chess_blitz":{"record":{"win":3,"loss":1,"draw":0}},"chess_rapid":{"record":{"win":2,"loss":2,"draw":1}}}"#;
        let server = mock_endpoint("/pub/player/magnus/stats", json_response(200, body)).await;
        let provider = ChessComProvider::with_base_url(server.uri());

        let record = blocking(move || provider.fetch("magnus")).await.unwrap();

        assert_eq!(record, Some(Record { win: 5, loss: 3, draw: 1 }));
    }

    #[tokio::test]
    async fn test_fetch_404_is_not_found() {
        let body = r#"{"code":0,"message":"User \"nobody\" not found."}"#;
        let server = mock_endpoint("/pub/player/nobody/stats", json_response(404, body)).await;
        let provider = ChessComProvider::with_base_url(server.uri());

        let result = blocking(move || provider.fetch("nobody")).await;

        assert!(matches!(result, Err(ProviderError::NotFound)));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_network_error() {
        let server = mock_endpoint("/pub/player/magnus/stats", ResponseTemplate::new(503)).await;
        let provider = ChessComProvider::with_base_url(server.uri());

        let result = blocking(move || provider.fetch("magnus")).await;

        assert!(matches!(result, Err(ProviderError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_fetch_invalid_json_is_parse_error() {
        let server = mock_endpoint(
            "/pub/player/magnus/stats",
            html_response(200, "<html>maintenance</html>"),
        )
        .await;
        let provider = ChessComProvider::with_base_url(server.uri());

        let result = blocking(move || provider.fetch("magnus")).await;

        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_fetch_connection_refused_is_network_error() {
        let result = ChessComProvider::with_base_url(REFUSED_URL).fetch("magnus");
        assert!(matches!(result, Err(ProviderError::NetworkError(_))));
    }
}
