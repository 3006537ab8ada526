//! Projection of a provider fetch into a single display line

use std::fmt;

use thiserror::Error;

use crate::chesscom::ChessComProvider;
use crate::deezer::DeezerProvider;
use crate::provider::{Provider, ProviderError};

/// Text destined for the overlay widget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayText(String);

impl DisplayText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetch failure that must not touch the display
#[derive(Debug, Error)]
#[error("{provider} update failed: {source}")]
pub struct TransientFailure {
    pub provider: &'static str,
    #[source]
    pub source: ProviderError,
}

/// Fetch through `provider` and render the outcome.
///
/// Empty identifiers, unknown identifiers (404) and "nothing to report"
/// all produce fallback text. Every other error is returned untouched.
///
/// Surrounding whitespace is ignored when deciding emptiness and building the
/// request; the text shows the identifier as entered.
pub fn project<P: Provider + ?Sized>(
    provider: &P,
    identifier: &str,
) -> Result<DisplayText, TransientFailure> {
    let lookup = identifier.trim();

    if lookup.is_empty() {
        return Ok(DisplayText(format!(
            "No {} {} specified!",
            provider.name(),
            provider.id_kind()
        )));
    }

    let text = match provider.fetch(lookup) {
        Ok(Some(payload)) => provider.describe(identifier, &payload),
        Ok(None) => provider.idle_text(),
        Err(ProviderError::NotFound) => format!(
            "Invalid {} {}: {}!",
            provider.name(),
            provider.id_kind(),
            identifier
        ),
        Err(source) => {
            return Err(TransientFailure {
                provider: provider.name(),
                source,
            })
        }
    };

    Ok(DisplayText(text))
}

/// The providers the host can pick from
#[derive(Debug, Clone)]
pub enum AnyProvider {
    ChessCom(ChessComProvider),
    Deezer(DeezerProvider),
}

impl AnyProvider {
    pub fn project(&self, identifier: &str) -> Result<DisplayText, TransientFailure> {
        match self {
            AnyProvider::ChessCom(p) => project(p, identifier),
            AnyProvider::Deezer(p) => project(p, identifier),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AnyProvider::ChessCom(p) => p.name(),
            AnyProvider::Deezer(p) => p.name(),
        }
    }
}
