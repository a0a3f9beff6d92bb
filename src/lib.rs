//! Nisse - a motion-triggered talking Christmas elf
//!
//! This library provides the core of the nisse daemon:
//! - Motion sensing (PIR on a sysfs GPIO pin, or a keyboard stand-in)
//! - Trigger gating (cooldown and active hours)
//! - Prompt composition from personality, themes and dated letters
//! - Phrase generation, speech synthesis and playback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   Motion Sensor                      │
//! │              PIR (sysfs GPIO)  │  Manual             │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Daemon                          │
//! │   Sensor Gate  │  Prompt Composer  │  Pipeline       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                      Voice                           │
//! │   OpenAI (phrase)  │  ElevenLabs (speech)  │  mpg123 │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod daemon;
pub mod error;
pub mod gate;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod sensor;
pub mod theme;
pub mod voice;

pub use config::{Config, Credentials};
pub use daemon::Daemon;
pub use error::{Error, Result};
pub use gate::{ActiveHours, GateDecision, SensorGate};
pub use pipeline::{CycleOutcome, CycleStage, Pipeline};
pub use prompt::{ComposedPrompt, PromptComposer, ThemeSource};
pub use sensor::MotionSensor;
pub use theme::{Letter, LetterStore, ThemeConfig};
