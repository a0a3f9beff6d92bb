//! One trigger-to-speech cycle: compose, generate, synthesize, play

use std::fmt;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rand::Rng;

use crate::config::{Config, Credentials};
use crate::prompt::PromptComposer;
use crate::voice::{
    Generation, OpenAiCompletions, PhraseGenerator, PlaybackManager, PlaybackStatus,
    SpeechSynthesizer, TextToSpeech,
};
use crate::Result;

/// Progress of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    Idle,
    Composed,
    Generated,
    Synthesized,
    Played,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Composed => "composed",
            Self::Generated => "generated",
            Self::Synthesized => "synthesized",
            Self::Played => "played",
        };
        f.write_str(name)
    }
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The utterance reached the player
    Played {
        utterance: String,
        status: PlaybackStatus,
        elapsed: Duration,
    },
    /// The cycle stopped before `stage` was reached
    Aborted {
        stage: CycleStage,
        reason: String,
        elapsed: Duration,
    },
}

impl CycleOutcome {
    /// Wall time of the cycle
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        match self {
            Self::Played { elapsed, .. } | Self::Aborted { elapsed, .. } => *elapsed,
        }
    }

    /// `Played`, or the stage an aborted cycle failed to reach
    #[must_use]
    pub const fn stage(&self) -> CycleStage {
        match self {
            Self::Played { .. } => CycleStage::Played,
            Self::Aborted { stage, .. } => *stage,
        }
    }
}

/// The four stages wired together
pub struct Pipeline {
    composer: PromptComposer,
    generator: PhraseGenerator,
    synthesizer: SpeechSynthesizer,
    playback: PlaybackManager,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        composer: PromptComposer,
        generator: PhraseGenerator,
        synthesizer: SpeechSynthesizer,
        playback: PlaybackManager,
    ) -> Self {
        Self {
            composer,
            generator,
            synthesizer,
            playback,
        }
    }

    /// Build the production pipeline against `OpenAI` and `ElevenLabs`
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built
    pub fn from_config(config: &Config, credentials: Credentials) -> Result<Self> {
        let completions = OpenAiCompletions::new(credentials.openai, &config.generation)?;
        let speech = TextToSpeech::new_elevenlabs(credentials.elevenlabs, &config.voice)?;

        Ok(Self::new(
            PromptComposer::new(config.theme.clone()),
            PhraseGenerator::new(
                Box::new(completions),
                config.generation.system_prompt.clone(),
                config.generation.fallback_phrases.clone(),
            ),
            SpeechSynthesizer::new(Box::new(speech), config.voice.temp_dir.clone()),
            PlaybackManager::new(&config.playback),
        ))
    }

    /// Prompt composer
    #[must_use]
    pub const fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Run one full cycle for `today`
    ///
    /// Never fails: every error ends the cycle as [`CycleOutcome::Aborted`].
    pub async fn run_cycle<R: Rng + Send + ?Sized>(
        &self,
        rng: &mut R,
        today: NaiveDate,
    ) -> CycleOutcome {
        let started = Instant::now();
        tracing::info!("cycle started");

        let prompt = self.composer.compose(rng, today);
        tracing::info!(
            theme = %prompt.theme_source,
            style = %prompt.style,
            length = %prompt.length,
            names = prompt.name_clause.is_some(),
            "prompt composed"
        );

        let utterance = match self.generator.generate(&prompt.render(), rng).await {
            Generation::Failed(reason) => {
                return Self::abort(CycleStage::Generated, reason, started);
            }
            Generation::Spoken(text) | Generation::Fallback { text, .. } => text,
        };

        let artifact = match self.synthesizer.synthesize(&utterance).await {
            Ok(artifact) => artifact,
            Err(e) => return Self::abort(CycleStage::Synthesized, e.to_string(), started),
        };

        match self.playback.play(artifact).await {
            Ok(status) => {
                let elapsed = started.elapsed();
                tracing::info!(elapsed = ?elapsed, status = ?status, "cycle complete");
                CycleOutcome::Played {
                    utterance,
                    status,
                    elapsed,
                }
            }
            Err(e) => Self::abort(CycleStage::Played, e.to_string(), started),
        }
    }

    /// Synthesize and play `text` directly, skipping composition and generation
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    pub async fn speak(&self, text: &str) -> Result<PlaybackStatus> {
        let artifact = self.synthesizer.synthesize(text).await?;
        self.playback.play(artifact).await
    }

    fn abort(stage: CycleStage, reason: String, started: Instant) -> CycleOutcome {
        let elapsed = started.elapsed();
        tracing::error!(
            stage = %stage,
            reason = %reason,
            elapsed = ?elapsed,
            "cycle aborted"
        );
        CycleOutcome::Aborted {
            stage,
            reason,
            elapsed,
        }
    }
}
