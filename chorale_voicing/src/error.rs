// Crate error type.
//
// Only the edges fail: parsing pitch classes and modes from text, reading
// and writing JSON files, and encoding MIDI. Every other module returns
// plain values.

use thiserror::Error;

/// Errors at the crate's I/O and parsing boundaries. The voicing engine
/// itself never fails; it degrades to a simpler result instead.
#[derive(Error, Debug)]
pub enum HarmonyError {
    #[error("Invalid pitch class: {0:?}")]
    InvalidPitchClass(String),

    #[error("Invalid mode: {0:?} (expected major or minor)")]
    InvalidMode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MIDI error: {0}")]
    Midi(String),
}
