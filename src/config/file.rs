//! TOML configuration file loading
//!
//! Supports `~/.config/nisse/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct NisseConfigFile {
    /// Trigger gating (cooldown, active hours, poll cadence)
    #[serde(default)]
    pub gate: GateFileConfig,

    /// Motion sensor selection
    #[serde(default)]
    pub sensor: SensorFileConfig,

    /// Personality, themes, names, styles
    #[serde(default)]
    pub theme: ThemeFileConfig,

    /// Text generation
    #[serde(default)]
    pub generation: GenerationFileConfig,

    /// Speech synthesis
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Audio player
    #[serde(default)]
    pub playback: PlaybackFileConfig,

    /// Startup volume
    #[serde(default)]
    pub mixer: MixerFileConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct GateFileConfig {
    pub cooldown_secs: Option<u64>,
    pub active_start: Option<u32>,
    pub active_end: Option<u32>,
    pub poll_interval_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SensorFileConfig {
    /// "gpio" or "manual"
    pub kind: Option<String>,
    pub pin: Option<u32>,
    /// sysfs GPIO root (defaults to `/sys/class/gpio`)
    pub sysfs_root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ThemeFileConfig {
    pub personality: Option<String>,
    pub general_theme: Option<String>,
    pub names: Option<Vec<String>>,
    pub styles: Option<Vec<String>>,
    pub lengths: Option<Vec<String>>,
    pub letters_path: Option<String>,
    pub general_theme_rate: Option<f64>,
    pub name_mention_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerationFileConfig {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    /// Phrases spoken when generation fails; empty aborts the cycle instead
    pub fallback_phrases: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VoiceFileConfig {
    pub voice_id: Option<String>,
    pub model: Option<String>,
    pub stability: Option<f32>,
    pub similarity_boost: Option<f32>,
    pub style: Option<f32>,
    pub use_speaker_boost: Option<bool>,
    /// Speaking-rate multiplier
    pub speed: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    /// Directory for transient audio files
    pub temp_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaybackFileConfig {
    /// Player binary (e.g. "mpg123")
    pub player: Option<String>,
    /// Argument template; `{device}` and `{file}` are substituted
    pub args: Option<Vec<String>>,
    /// Output device (e.g. "hw:2,0")
    pub device: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MixerFileConfig {
    pub card: Option<u32>,
    pub control: Option<String>,
    /// Volume percentage (0-100); unset skips volume setup
    pub volume: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingFileConfig {
    pub dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub elevenlabs: Option<String>,
}

/// Load the TOML config file from `path`, or the standard path when `None`
///
/// Returns `NisseConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> NisseConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return NisseConfigFile::default();
    };

    if !path.exists() {
        return NisseConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                NisseConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            NisseConfigFile::default()
        }
    }
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the TOML is malformed or a field has the wrong type
pub fn parse_config_file(content: &str) -> Result<NisseConfigFile, toml::de::Error> {
    toml::from_str(content)
}

/// Return the config file path: `~/.config/nisse/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("nisse").join("config.toml"))
}
