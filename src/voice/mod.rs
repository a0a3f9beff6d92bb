//! Voice output: phrase generation, speech synthesis, playback
//!
//! Generation and synthesis sit behind provider traits so the pipeline can run
//! against fakes; playback shells out to an external player.

mod artifact;
mod generator;
pub mod mixer;
mod playback;
mod tts;

pub use artifact::AudioArtifact;
pub use generator::{
    CompletionProvider, Generation, OpenAiCompletions, PhraseGenerator, clean_utterance,
};
pub use playback::{PlaybackManager, PlaybackStatus};
pub use tts::{SpeechProvider, SpeechSynthesizer, TextToSpeech, VoiceSettings};
