//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use nisse::config::PlaybackConfig;
use nisse::voice::{
    CompletionProvider, PhraseGenerator, PlaybackManager, SpeechProvider, SpeechSynthesizer,
};
use nisse::{Error, MotionSensor, Pipeline, PromptComposer, Result, ThemeConfig};

/// What a fake service does when called
#[derive(Clone)]
pub enum Behavior {
    Reply(String),
    Fail(String),
}

/// Completion provider that counts calls
pub struct FakeCompletions {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl FakeCompletions {
    pub fn new(behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                behavior,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl CompletionProvider for FakeCompletions {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail(reason) => Err(Error::Generation(reason.clone())),
        }
    }
}

/// Speech provider that counts calls
pub struct FakeSpeech {
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl FakeSpeech {
    pub fn new(behavior: Behavior) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                behavior,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl SpeechProvider for FakeSpeech {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reply(audio) => Ok(audio.as_bytes().to_vec()),
            Behavior::Fail(reason) => Err(Error::Tts(reason.clone())),
        }
    }
}

/// Sensor that replays a fixed script, then reports no motion
///
/// `None` entries are read errors.
pub struct ScriptedSensor {
    script: VecDeque<Option<bool>>,
    released: Arc<AtomicBool>,
}

impl ScriptedSensor {
    pub fn new(script: &[Option<bool>]) -> (Self, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        (
            Self {
                script: script.iter().copied().collect(),
                released: Arc::clone(&released),
            },
            released,
        )
    }
}

#[async_trait]
impl MotionSensor for ScriptedSensor {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn motion_detected(&mut self) -> Result<bool> {
        match self.script.pop_front() {
            Some(Some(motion)) => Ok(motion),
            Some(None) => Err(Error::Sensor("scripted read failure".to_string())),
            None => Ok(false),
        }
    }

    fn release(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

/// Input that blocks until its sender is dropped, like an idle terminal
pub struct IdleInput(std::sync::mpsc::Receiver<()>);

impl IdleInput {
    /// The input and the handle that keeps it open
    pub fn new() -> (Self, std::sync::mpsc::Sender<()>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (Self(rx), tx)
    }
}

impl Read for IdleInput {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

/// Log writer that keeps formatted output for assertions
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a subscriber writing into this capture on the current thread
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines containing `needle` at `level`
    pub fn count(&self, level: &str, needle: &str) -> usize {
        self.text()
            .lines()
            .filter(|line| line.contains(level) && line.contains(needle))
            .count()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Theme configuration that never touches the letter store
pub fn test_theme() -> ThemeConfig {
    ThemeConfig {
        names: vec!["Alma".to_string(), "Nils".to_string()],
        letters_path: None,
        ..ThemeConfig::default()
    }
}

/// Playback configuration for an arbitrary player program
pub fn player(program: &str, args: &[&str]) -> PlaybackConfig {
    PlaybackConfig {
        player: program.to_string(),
        args: args.iter().map(ToString::to_string).collect(),
        device: "hw:2,0".to_string(),
        timeout: Duration::from_secs(5),
    }
}

/// Wire a pipeline from fakes, writing audio into `temp_dir`
pub fn pipeline(
    completions: impl CompletionProvider + 'static,
    speech: impl SpeechProvider + 'static,
    playback: &PlaybackConfig,
    temp_dir: &Path,
) -> Pipeline {
    Pipeline::new(
        PromptComposer::new(test_theme()),
        PhraseGenerator::new(
            Box::new(completions),
            "Du är en tomtenisse.".to_string(),
            Vec::new(),
        ),
        SpeechSynthesizer::new(Box::new(speech), Some(temp_dir.to_path_buf())),
        PlaybackManager::new(playback),
    )
}

/// Number of entries in `dir`
pub fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map_or(0, Iterator::count)
}
