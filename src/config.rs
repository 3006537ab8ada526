//! Configuration management

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::chesscom::ChessComProvider;
use crate::deezer::DeezerProvider;
use crate::projector::AnyProvider;

/// Default configuration values
const DEFAULT_REFRESH_RATE: i32 = 1;
pub const MIN_REFRESH_RATE: i32 = 1;
pub const MAX_REFRESH_RATE: i32 = 60;

/// Settings keys shared by both plugins
pub const TEXT_SOURCE_KEY: &str = "text_source";
pub const REFRESH_RATE_KEY: &str = "refresh_rate";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to parse settings JSON: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Settings must be a JSON object")]
    NotAnObject,
}

/// Which status source a plugin instance polls
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    ChessCom = 0,
    Deezer = 1,
}

impl ProviderKind {
    /// Settings key holding the identifier for this provider
    pub fn identifier_key(self) -> &'static str {
        match self {
            ProviderKind::ChessCom => "chesscom_username",
            ProviderKind::Deezer => "deezer_profile_id",
        }
    }

    pub fn identifier_label(self) -> &'static str {
        match self {
            ProviderKind::ChessCom => "chess.com username",
            ProviderKind::Deezer => "Deezer Profile ID",
        }
    }

    pub fn provider(self) -> AnyProvider {
        match self {
            ProviderKind::ChessCom => AnyProvider::ChessCom(ChessComProvider::default()),
            ProviderKind::Deezer => AnyProvider::Deezer(DeezerProvider::default()),
        }
    }
}

/// Plugin settings, as entered in the host's properties panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub identifier: String,
    pub text_source_name: String,
    pub refresh_rate: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            identifier: String::new(),
            text_source_name: String::new(),
            refresh_rate: DEFAULT_REFRESH_RATE,
        }
    }
}

impl Settings {
    /// Read settings from the host's JSON settings object.
    ///
    /// Missing or mistyped keys keep their defaults. Numeric identifiers
    /// (Deezer profile IDs are often stored as numbers) are accepted.
    pub fn from_json(kind: ProviderKind, json: &str) -> Result<Self, SettingsError> {
        let value: Value = serde_json::from_str(json)?;
        let map = value.as_object().ok_or(SettingsError::NotAnObject)?;

        let mut settings = Settings::default();
        if let Some(identifier) = string_field(map, kind.identifier_key()) {
            settings.identifier = identifier;
        }
        if let Some(name) = string_field(map, TEXT_SOURCE_KEY) {
            settings.text_source_name = name;
        }
        if let Some(rate) = map.get(REFRESH_RATE_KEY).and_then(Value::as_i64) {
            settings.set_refresh_rate(rate.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
        }

        Ok(settings)
    }

    /// Store a refresh rate, clamped to the 1–60 Hz the panel allows
    pub fn set_refresh_rate(&mut self, rate: i32) {
        self.refresh_rate = rate.clamp(MIN_REFRESH_RATE, MAX_REFRESH_RATE);
    }

    /// Timer period: `1000 / refresh_rate` milliseconds
    pub fn interval(&self) -> Duration {
        let rate = self.refresh_rate.clamp(MIN_REFRESH_RATE, MAX_REFRESH_RATE) as u64;
        Duration::from_millis(1000 / rate)
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
