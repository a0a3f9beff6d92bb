//! Error types for the nisse daemon

use std::time::Duration;

use thiserror::Error;

/// Result type alias for nisse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while listening, composing, generating, or speaking
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (missing credentials, out-of-range values)
    #[error("configuration error: {0}")]
    Config(String),

    /// Motion sensor error
    #[error("sensor error: {0}")]
    Sensor(String),

    /// Text generation error
    #[error("generation error: {0}")]
    Generation(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio player failed to run
    #[error("playback error: {0}")]
    Playback(String),

    /// Audio player binary is not installed
    #[error("audio player not found: {0}")]
    PlayerMissing(String),

    /// Audio player did not finish in time
    #[error("playback timed out after {0:?}")]
    PlaybackTimeout(Duration),

    /// Volume control error
    #[error("mixer error: {0}")]
    Mixer(String),

    /// Logging setup error
    #[error("logging error: {0}")]
    Logging(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
