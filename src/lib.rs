//! Core library for the chess.com and Deezer OBS text status plugins
//!
//! Each tick polls a remote profile, turns the answer into one line of text
//! and writes it into a text source owned by the host. The host plugin shim
//! talks to this crate through the C functions re-exported from `ffi`.

mod chesscom;
mod config;
mod deezer;
mod ffi;
mod logging;
mod projector;
mod properties;
mod provider;
mod sink;
mod timer;

#[cfg(test)]
mod test_support;

pub use chesscom::{sum_records, ChessComProvider, Record};
pub use config::{ProviderKind, Settings, SettingsError};
pub use deezer::{parse_profile_page, DeezerProvider, NowPlaying};
pub use ffi::*;
pub use logging::init_logging;
pub use projector::{project, AnyProvider, DisplayText, TransientFailure};
pub use properties::{eligible_sinks, is_eligible_sink, Panel, Property, TEXT_SOURCE_KIND};
pub use provider::{Provider, ProviderError};
pub use sink::{run_tick, DisplaySink, SinkGuard};
pub use timer::Ticker;
