//! Configuration management for the nisse daemon
//!
//! Layering is env > TOML file > defaults, resolved once at startup.

pub mod file;

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::gate::{ActiveHours, DEFAULT_COOLDOWN};
use crate::theme::ThemeConfig;
use crate::voice::VoiceSettings;
use crate::{Error, Result};

use self::file::NisseConfigFile;

/// Nisse daemon configuration
#[derive(Debug)]
pub struct Config {
    /// Trigger gating
    pub gate: GateConfig,

    /// Motion sensor
    pub sensor: SensorConfig,

    /// Personality and prompt material
    pub theme: ThemeConfig,

    /// Text generation
    pub generation: GenerationConfig,

    /// Speech synthesis
    pub voice: VoiceConfig,

    /// Audio player
    pub playback: PlaybackConfig,

    /// Startup volume
    pub mixer: MixerConfig,

    /// Directory for the rolling log file
    pub log_dir: PathBuf,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Cooldown, active hours, and polling cadence
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum interval between two cycle starts
    pub cooldown: Duration,

    /// Hours during which motion is honored
    pub active_hours: ActiveHours,

    /// Pause between sensor reads
    pub poll_interval: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            active_hours: ActiveHours::new(16, 18).unwrap_or(ActiveHours::ALL_DAY),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Motion sensor backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    /// PIR sensor on a sysfs GPIO pin
    Gpio,
    /// Press Enter to simulate motion
    Manual,
}

impl FromStr for SensorKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gpio" | "pir" => Ok(Self::Gpio),
            "manual" | "keyboard" | "stdin" => Ok(Self::Manual),
            other => Err(Error::Config(format!("unknown sensor kind: {other}"))),
        }
    }
}

/// Motion sensor configuration
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Backend
    pub kind: SensorKind,

    /// BCM pin number of the PIR output
    pub pin: u32,

    /// sysfs GPIO root
    pub sysfs_root: PathBuf,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            kind: SensorKind::Gpio,
            pin: 17,
            sysfs_root: PathBuf::from("/sys/class/gpio"),
        }
    }
}

/// Text generation configuration
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Chat model identifier
    pub model: String,

    /// System instruction sent with every prompt
    pub system_prompt: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout
    pub timeout: Duration,

    /// API base URL (`/chat/completions` is appended)
    pub base_url: String,

    /// Phrases spoken when generation fails; empty aborts the cycle
    pub fallback_phrases: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            system_prompt:
                "Du är en snäll tomtenisse som pratar gammaldags svenska med mysiga nisseuttryck."
                    .to_string(),
            max_tokens: 100,
            temperature: 0.9,
            timeout: Duration::from_secs(30),
            base_url: "https://api.openai.com/v1".to_string(),
            fallback_phrases: Vec::new(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// ElevenLabs voice identifier
    pub voice_id: String,

    /// ElevenLabs model identifier
    pub model: String,

    /// Stability, similarity, style, speaker boost
    pub settings: VoiceSettings,

    /// Speaking-rate multiplier
    pub speed: Option<f32>,

    /// Request timeout
    pub timeout: Duration,

    /// API base URL
    pub base_url: String,

    /// Directory for transient audio files (system temp dir when unset)
    pub temp_dir: Option<PathBuf>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            voice_id: "DUnzBkwtjRWXPr6wRbmL".to_string(),
            model: "eleven_multilingual_v2".to_string(),
            settings: VoiceSettings::default(),
            speed: Some(0.85),
            timeout: Duration::from_secs(30),
            base_url: "https://api.elevenlabs.io".to_string(),
            temp_dir: None,
        }
    }
}

/// External audio player configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Player binary
    pub player: String,

    /// Argument template with `{device}` and `{file}` placeholders
    pub args: Vec<String>,

    /// Output device
    pub device: String,

    /// Upper bound on one playback
    pub timeout: Duration,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player: "mpg123".to_string(),
            args: ["-q", "-a", "{device}", "{file}"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            device: "hw:2,0".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Startup volume configuration
#[derive(Debug, Clone)]
pub struct MixerConfig {
    /// ALSA card index
    pub card: u32,

    /// Mixer control name
    pub control: String,

    /// Volume percentage; `None` leaves the mixer untouched
    pub volume: Option<u8>,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            card: 2,
            control: "PCM".to_string(),
            volume: Some(80),
        }
    }
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (text generation)
    pub openai: Option<SecretString>,

    /// `ElevenLabs` API key (speech synthesis)
    pub elevenlabs: Option<SecretString>,
}

/// Both service keys, guaranteed present
#[derive(Debug)]
pub struct Credentials {
    pub openai: SecretString,
    pub elevenlabs: SecretString,
}

impl ApiKeys {
    /// Require both keys
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing key
    pub fn require(&self) -> Result<Credentials> {
        let openai = self
            .openai
            .as_ref()
            .ok_or_else(|| Error::Config("OPENAI_API_KEY is missing".to_string()))?;
        let elevenlabs = self
            .elevenlabs
            .as_ref()
            .ok_or_else(|| Error::Config("ELEVENLABS_API_KEY is missing".to_string()))?;

        Ok(Credentials {
            openai: SecretString::from(openai.expose_secret().to_owned()),
            elevenlabs: SecretString::from(elevenlabs.expose_secret().to_owned()),
        })
    }
}

/// Default log directory: `~/.local/share/nisse/logs`
fn default_log_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("logs"),
        |d| d.data_dir().join("nisse").join("logs"),
    )
}

/// Read a variable, treating empty values as unset
fn env_string(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.trim().is_empty())
}

/// Read and parse a variable, warning on unparseable values
fn env_parse<T: FromStr>(env: &dyn Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env_string(env, key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment value");
            None
        }
    }
}

/// Look up a key under its conventional and its `.env`-style lowercase name
fn api_key(
    env: &dyn Fn(&str) -> Option<String>,
    key: &str,
    file_value: Option<String>,
) -> Option<SecretString> {
    env_string(env, key)
        .or_else(|| env_string(env, &key.to_lowercase()))
        .or_else(|| file_value.filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}

impl Config {
    /// Load configuration from the environment and the TOML file
    ///
    /// # Errors
    ///
    /// Returns error if a resolved value is out of range
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let fc = file::load_config_file(config_path);
        Self::from_sources(fc, &|key| std::env::var(key).ok())
    }

    /// Resolve configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a resolved value is out of range
    #[allow(clippy::too_many_lines)]
    pub fn from_sources(fc: NisseConfigFile, env: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        // Gate (env > toml > default)
        let gate_default = GateConfig::default();
        let cooldown = env_parse::<u64>(env, "NISSE_COOLDOWN_SECS")
            .or(fc.gate.cooldown_secs)
            .map_or(gate_default.cooldown, Duration::from_secs);
        let active_start = env_parse(env, "NISSE_ACTIVE_START")
            .or(fc.gate.active_start)
            .unwrap_or_else(|| gate_default.active_hours.start());
        let active_end = env_parse(env, "NISSE_ACTIVE_END")
            .or(fc.gate.active_end)
            .unwrap_or_else(|| gate_default.active_hours.end());
        let gate = GateConfig {
            cooldown,
            active_hours: ActiveHours::new(active_start, active_end)?,
            poll_interval: fc
                .gate
                .poll_interval_ms
                .map_or(gate_default.poll_interval, Duration::from_millis),
        };

        // Sensor
        let sensor_default = SensorConfig::default();
        let kind = match env_string(env, "NISSE_SENSOR").or(fc.sensor.kind) {
            Some(kind) => kind.parse()?,
            None => sensor_default.kind,
        };
        let sensor = SensorConfig {
            kind,
            pin: env_parse(env, "NISSE_GPIO_PIN")
                .or(fc.sensor.pin)
                .unwrap_or(sensor_default.pin),
            sysfs_root: fc
                .sensor
                .sysfs_root
                .map_or(sensor_default.sysfs_root, PathBuf::from),
        };

        // Theme
        let theme_default = ThemeConfig::default();
        let letters_path = env_string(env, "NISSE_LETTERS_PATH")
            .or(fc.theme.letters_path)
            .map_or(theme_default.letters_path, |p| Some(PathBuf::from(p)));
        let theme = ThemeConfig {
            personality: fc.theme.personality.unwrap_or(theme_default.personality),
            general_theme: fc.theme.general_theme.unwrap_or(theme_default.general_theme),
            names: fc.theme.names.unwrap_or(theme_default.names),
            styles: fc.theme.styles.unwrap_or(theme_default.styles),
            lengths: fc.theme.lengths.unwrap_or(theme_default.lengths),
            letters_path,
            general_theme_rate: fc
                .theme
                .general_theme_rate
                .unwrap_or(theme_default.general_theme_rate),
            name_mention_rate: fc
                .theme
                .name_mention_rate
                .unwrap_or(theme_default.name_mention_rate),
        };

        // Generation
        let gen_default = GenerationConfig::default();
        let generation = GenerationConfig {
            model: env_string(env, "NISSE_LLM_MODEL")
                .or(fc.generation.model)
                .unwrap_or(gen_default.model),
            system_prompt: fc
                .generation
                .system_prompt
                .unwrap_or(gen_default.system_prompt),
            max_tokens: fc.generation.max_tokens.unwrap_or(gen_default.max_tokens),
            temperature: fc.generation.temperature.unwrap_or(gen_default.temperature),
            timeout: fc
                .generation
                .timeout_secs
                .map_or(gen_default.timeout, Duration::from_secs),
            base_url: fc.generation.base_url.unwrap_or(gen_default.base_url),
            fallback_phrases: fc
                .generation
                .fallback_phrases
                .unwrap_or(gen_default.fallback_phrases),
        };

        // Voice
        let voice_default = VoiceConfig::default();
        let settings_default = voice_default.settings;
        let voice = VoiceConfig {
            voice_id: env_string(env, "NISSE_TTS_VOICE")
                .or(fc.voice.voice_id)
                .unwrap_or(voice_default.voice_id),
            model: fc.voice.model.unwrap_or(voice_default.model),
            settings: VoiceSettings {
                stability: fc.voice.stability.unwrap_or(settings_default.stability),
                similarity_boost: fc
                    .voice
                    .similarity_boost
                    .unwrap_or(settings_default.similarity_boost),
                style: fc.voice.style.unwrap_or(settings_default.style),
                use_speaker_boost: fc
                    .voice
                    .use_speaker_boost
                    .unwrap_or(settings_default.use_speaker_boost),
            },
            speed: fc.voice.speed.or(voice_default.speed),
            timeout: fc
                .voice
                .timeout_secs
                .map_or(voice_default.timeout, Duration::from_secs),
            base_url: fc.voice.base_url.unwrap_or(voice_default.base_url),
            temp_dir: fc.voice.temp_dir.map(PathBuf::from),
        };

        // Playback
        let playback_default = PlaybackConfig::default();
        let playback = PlaybackConfig {
            player: env_string(env, "NISSE_PLAYER")
                .or(fc.playback.player)
                .unwrap_or(playback_default.player),
            args: fc.playback.args.unwrap_or(playback_default.args),
            device: env_string(env, "NISSE_AUDIO_DEVICE")
                .or(fc.playback.device)
                .unwrap_or(playback_default.device),
            timeout: fc
                .playback
                .timeout_secs
                .map_or(playback_default.timeout, Duration::from_secs),
        };

        // Mixer
        let mixer_default = MixerConfig::default();
        let mixer = MixerConfig {
            card: fc.mixer.card.unwrap_or(mixer_default.card),
            control: fc.mixer.control.unwrap_or(mixer_default.control),
            volume: env_parse(env, "NISSE_VOLUME")
                .or(fc.mixer.volume)
                .or(mixer_default.volume),
        };

        let log_dir = env_string(env, "NISSE_LOG_DIR")
            .or(fc.logging.dir)
            .map_or_else(default_log_dir, PathBuf::from);

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            openai: api_key(env, "OPENAI_API_KEY", fc.api_keys.openai),
            elevenlabs: api_key(env, "ELEVENLABS_API_KEY", fc.api_keys.elevenlabs),
        };

        let config = Self {
            gate,
            sensor,
            theme,
            generation,
            voice,
            playback,
            mixer,
            log_dir,
            api_keys,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the type system does not
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first bad value
    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("theme.general_theme_rate", self.theme.general_theme_rate),
            ("theme.name_mention_rate", self.theme.name_mention_rate),
        ];
        for (name, rate) in rates {
            if !(0.0..=1.0).contains(&rate) {
                return Err(Error::Config(format!("{name} must be within 0..=1, got {rate}")));
            }
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(format!(
                "generation.temperature must be within 0..=2, got {}",
                self.generation.temperature
            )));
        }

        if let Some(volume) = self.mixer.volume.filter(|v| *v > 100) {
            return Err(Error::Config(format!(
                "mixer.volume must be a percentage, got {volume}"
            )));
        }

        if self.playback.player.trim().is_empty() {
            return Err(Error::Config("playback.player must not be empty".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::file::parse_config_file;
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_sources(NisseConfigFile::default(), &env_from(&[])).unwrap();

        assert_eq!(config.gate.cooldown, Duration::from_secs(25));
        assert_eq!(config.gate.active_hours, ActiveHours::new(16, 18).unwrap());
        assert_eq!(config.gate.poll_interval, Duration::from_millis(100));
        assert_eq!(config.sensor.kind, SensorKind::Gpio);
        assert_eq!(config.sensor.pin, 17);
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert_eq!(config.generation.max_tokens, 100);
        assert!(config.generation.fallback_phrases.is_empty());
        assert_eq!(config.voice.model, "eleven_multilingual_v2");
        assert_eq!(config.voice.speed, Some(0.85));
        assert_eq!(config.theme.names, vec!["Livia", "Juni"]);
        assert_eq!(config.playback.player, "mpg123");
        assert_eq!(config.playback.device, "hw:2,0");
        assert_eq!(config.playback.timeout, Duration::from_secs(60));
        assert_eq!(config.mixer.volume, Some(80));
        assert!(config.api_keys.openai.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let fc = parse_config_file(
            r#"
            [gate]
            cooldown_secs = 40
            active_start = 8
            active_end = 20

            [playback]
            device = "hw:1,0"
            "#,
        )
        .unwrap();
        let env = env_from(&[("NISSE_COOLDOWN_SECS", "10"), ("NISSE_AUDIO_DEVICE", "default")]);

        let config = Config::from_sources(fc, &env).unwrap();
        assert_eq!(config.gate.cooldown, Duration::from_secs(10));
        assert_eq!(config.gate.active_hours, ActiveHours::new(8, 20).unwrap());
        assert_eq!(config.playback.device, "default");
    }

    #[test]
    fn test_unparseable_env_value_is_ignored() {
        let env = env_from(&[("NISSE_COOLDOWN_SECS", "soon")]);
        let config = Config::from_sources(NisseConfigFile::default(), &env).unwrap();
        assert_eq!(config.gate.cooldown, DEFAULT_COOLDOWN);
    }

    #[test]
    fn test_api_keys_from_env_and_dotenv_names() {
        let env = env_from(&[("OPENAI_API_KEY", "sk-test"), ("elevenlabs_api_key", "xi-test")]);
        let config = Config::from_sources(NisseConfigFile::default(), &env).unwrap();

        let creds = config.api_keys.require().unwrap();
        assert_eq!(creds.openai.expose_secret(), "sk-test");
        assert_eq!(creds.elevenlabs.expose_secret(), "xi-test");
    }

    #[test]
    fn test_api_keys_from_file() {
        let fc = parse_config_file("[api_keys]\nopenai = \"a\"\nelevenlabs = \"b\"").unwrap();
        let config = Config::from_sources(fc, &env_from(&[])).unwrap();
        assert!(config.api_keys.require().is_ok());
    }

    #[test]
    fn test_missing_key_fails_require() {
        let env = env_from(&[("OPENAI_API_KEY", "sk-test"), ("ELEVENLABS_API_KEY", "  ")]);
        let config = Config::from_sources(NisseConfigFile::default(), &env).unwrap();

        let err = config.api_keys.require().unwrap_err();
        assert!(err.to_string().contains("ELEVENLABS_API_KEY"));

        let none = Config::from_sources(NisseConfigFile::default(), &env_from(&[])).unwrap();
        assert!(none.api_keys.require().unwrap_err().to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let env = env_from(&[("OPENAI_API_KEY", "sk-very-secret")]);
        let config = Config::from_sources(NisseConfigFile::default(), &env).unwrap();
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }

    #[test]
    fn test_bad_hours_rejected() {
        let env = env_from(&[("NISSE_ACTIVE_END", "30")]);
        assert!(Config::from_sources(NisseConfigFile::default(), &env).is_err());
    }

    #[test]
    fn test_bad_rate_rejected() {
        let fc = parse_config_file("[theme]\nname_mention_rate = 1.5").unwrap();
        assert!(Config::from_sources(fc, &env_from(&[])).is_err());
    }

    #[test]
    fn test_bad_volume_rejected() {
        let env = env_from(&[("NISSE_VOLUME", "120")]);
        assert!(Config::from_sources(NisseConfigFile::default(), &env).is_err());
    }

    #[test]
    fn test_sensor_kind_parsing() {
        assert_eq!("GPIO".parse::<SensorKind>().unwrap(), SensorKind::Gpio);
        assert_eq!("manual".parse::<SensorKind>().unwrap(), SensorKind::Manual);
        assert!("lidar".parse::<SensorKind>().is_err());

        let env = env_from(&[("NISSE_SENSOR", "manual")]);
        let config = Config::from_sources(NisseConfigFile::default(), &env).unwrap();
        assert_eq!(config.sensor.kind, SensorKind::Manual);
    }

    #[test]
    fn test_theme_overrides() {
        let fc = parse_config_file(
            r#"
            [theme]
            names = ["Alma", "Nils"]
            lengths = ["1 mening"]
            letters_path = "/tmp/brev.json"
            "#,
        )
        .unwrap();
        let config = Config::from_sources(fc, &env_from(&[])).unwrap();
        assert_eq!(config.theme.names, vec!["Alma", "Nils"]);
        assert_eq!(config.theme.lengths, vec!["1 mening"]);
        assert_eq!(config.theme.letters_path, Some(PathBuf::from("/tmp/brev.json")));
    }

    #[test]
    fn test_empty_names_disable_name_clause() {
        let fc = parse_config_file("[theme]\nnames = []\n").unwrap();
        let config = Config::from_sources(fc, &env_from(&[])).unwrap();
        assert!(config.theme.names.is_empty());
    }
}
