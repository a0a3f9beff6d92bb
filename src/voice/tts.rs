//! Text-to-speech (TTS) processing

use std::path::PathBuf;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::AudioArtifact;
use crate::config::VoiceConfig;
use crate::{Error, Result};

/// ElevenLabs voice-settings record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// A service that turns text into MP3 bytes
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &'static str;

    /// Synthesize `text`, returning the audio body
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// Synthesizes speech via the ElevenLabs API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    voice_id: String,
    model: String,
    settings: VoiceSettings,
    speed: Option<f32>,
}

impl TextToSpeech {
    /// Create a new ElevenLabs TTS instance
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing or the HTTP client cannot be built
    pub fn new_elevenlabs(api_key: SecretString, config: &VoiceConfig) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "ElevenLabs API key required for TTS".to_string(),
            ));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model: config.model.clone(),
            settings: config.settings,
            speed: config.speed,
        })
    }
}

#[derive(Serialize)]
struct ElevenLabsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

#[async_trait]
impl SpeechProvider for TextToSpeech {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id);

        let request = ElevenLabsRequest {
            text,
            model_id: &self.model,
            voice_settings: self.settings,
            speed: self.speed,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", self.api_key.expose_secret())
            .header("Content-Type", "application/json")
            .header("Accept", "audio/mpeg")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }
}

/// Turns an utterance into a transient audio file
pub struct SpeechSynthesizer {
    provider: Box<dyn SpeechProvider>,
    temp_dir: Option<PathBuf>,
}

impl SpeechSynthesizer {
    /// Create a synthesizer writing into `temp_dir` (system temp dir when `None`)
    #[must_use]
    pub fn new(provider: Box<dyn SpeechProvider>, temp_dir: Option<PathBuf>) -> Self {
        Self { provider, temp_dir }
    }

    /// Synthesize `text` into an audio artifact
    ///
    /// # Errors
    ///
    /// Returns error on HTTP failure, timeout, empty audio, or a failed write;
    /// no file is left behind in any of these cases
    pub async fn synthesize(&self, text: &str) -> Result<AudioArtifact> {
        tracing::info!(provider = self.provider.name(), "synthesizing speech");

        let audio = self.provider.synthesize(text).await.map_err(|e| match e {
            Error::Http(e) if e.is_timeout() => Error::Tts(format!("request timed out: {e}")),
            other => other,
        })?;

        if audio.is_empty() {
            return Err(Error::Tts("empty audio response".to_string()));
        }

        let artifact = AudioArtifact::write(&audio, self.temp_dir.as_deref())?;
        tracing::info!(
            path = %artifact.path().display(),
            bytes = artifact.len(),
            "audio saved"
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSpeech(Vec<u8>);

    #[async_trait]
    impl SpeechProvider for StaticSpeech {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSpeech;

    #[async_trait]
    impl SpeechProvider for BrokenSpeech {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
            Err(Error::Tts("ElevenLabs TTS error 401 Unauthorized".to_string()))
        }
    }

    fn dir_entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_request_body_shape() {
        let request = ElevenLabsRequest {
            text: "Ho ho!",
            model_id: "eleven_multilingual_v2",
            voice_settings: VoiceSettings::default(),
            speed: Some(0.85),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["text"], "Ho ho!");
        assert_eq!(json["model_id"], "eleven_multilingual_v2");
        assert_eq!(json["voice_settings"]["stability"], 0.5);
        assert_eq!(json["voice_settings"]["similarity_boost"], 0.75);
        assert_eq!(json["voice_settings"]["style"], 0.0);
        assert_eq!(json["voice_settings"]["use_speaker_boost"], true);
        assert!((json["speed"].as_f64().unwrap() - 0.85).abs() < 1e-6);
    }

    #[test]
    fn test_speed_omitted_when_unset() {
        let request = ElevenLabsRequest {
            text: "Ho ho!",
            model_id: "m",
            voice_settings: VoiceSettings::default(),
            speed: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("speed").is_none());
    }

    #[test]
    fn test_empty_key_rejected() {
        let key = SecretString::from(String::new());
        let result = TextToSpeech::new_elevenlabs(key, &VoiceConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_synthesize_writes_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::new(
            Box::new(StaticSpeech(b"ID3audio".to_vec())),
            Some(dir.path().to_path_buf()),
        );

        let artifact = synth.synthesize("Ho ho").await.unwrap();
        assert!(artifact.path().starts_with(dir.path()));
        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"ID3audio");
    }

    #[tokio::test]
    async fn test_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::new(Box::new(BrokenSpeech), Some(dir.path().to_path_buf()));

        assert!(matches!(synth.synthesize("Ho ho").await, Err(Error::Tts(_))));
        assert_eq!(dir_entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn test_empty_audio_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let synth = SpeechSynthesizer::new(
            Box::new(StaticSpeech(Vec::new())),
            Some(dir.path().to_path_buf()),
        );

        assert!(synth.synthesize("Ho ho").await.is_err());
        assert_eq!(dir_entries(dir.path()), 0);
    }
}
