//! Properties panel description for the host

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::{
    ProviderKind, Settings, MAX_REFRESH_RATE, MIN_REFRESH_RATE, REFRESH_RATE_KEY, TEXT_SOURCE_KEY,
};

/// Source type id of the host's text widgets
pub const TEXT_SOURCE_KIND: &str = "text_gdiplus_v2";

pub fn description(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::ChessCom => "Replace textbox content with user's chess.com stats!",
        ProviderKind::Deezer => "Replace textbox content with user's Deezer currently playing music!",
    }
}

/// One control in the properties panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Property {
    Text {
        name: &'static str,
        description: &'static str,
    },
    Int {
        name: &'static str,
        description: &'static str,
        min: i32,
        max: i32,
        step: i32,
    },
    /// Editable combo box filled with eligible text sources
    List {
        name: &'static str,
        description: &'static str,
        editable: bool,
        items: Vec<String>,
    },
}

/// Controls for the panel, with the text source list prefilled
pub fn properties(kind: ProviderKind, text_sources: Vec<String>) -> Vec<Property> {
    vec![
        Property::Text {
            name: kind.identifier_key(),
            description: kind.identifier_label(),
        },
        Property::Int {
            name: REFRESH_RATE_KEY,
            description: "Refresh Rate (Hz)",
            min: MIN_REFRESH_RATE,
            max: MAX_REFRESH_RATE,
            step: 1,
        },
        Property::List {
            name: TEXT_SOURCE_KEY,
            description: "Text Source",
            editable: true,
            items: text_sources,
        },
    ]
}

/// Everything the host needs to build the panel
#[derive(Debug, Clone, Serialize)]
pub struct Panel {
    pub description: &'static str,
    pub defaults: Value,
    pub properties: Vec<Property>,
}

impl Panel {
    pub fn new(kind: ProviderKind, text_sources: Vec<String>) -> Self {
        let defaults = Settings::default();
        Panel {
            description: description(kind),
            defaults: json!({
                kind.identifier_key(): defaults.identifier,
                REFRESH_RATE_KEY: defaults.refresh_rate,
            }),
            properties: properties(kind, text_sources),
        }
    }
}

pub fn is_eligible_sink(source_id: &str) -> bool {
    source_id == TEXT_SOURCE_KIND
}

/// Names of the enumerated `(type id, name)` sources that can show text,
/// in enumeration order
pub fn eligible_sinks<'a, I>(sources: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    sources
        .into_iter()
        .filter(|(id, _)| is_eligible_sink(id))
        .map(|(_, name)| name.to_string())
        .collect()
}
