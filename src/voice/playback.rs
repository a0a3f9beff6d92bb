//! Audio playback through an external player process

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use super::AudioArtifact;
use crate::config::PlaybackConfig;
use crate::{Error, Result};

/// How a playback that ran to the end went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Player exited with code 0
    Completed,
    /// Player exited with a non-zero code (or was killed by a signal, -1)
    ExitedWithCode(i32),
}

/// Plays audio artifacts and deletes them afterwards
#[derive(Debug, Clone)]
pub struct PlaybackManager {
    player: String,
    args: Vec<String>,
    device: String,
    timeout: Duration,
}

impl PlaybackManager {
    /// Create a playback manager from configuration
    #[must_use]
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            player: config.player.clone(),
            args: config.args.clone(),
            device: config.device.clone(),
            timeout: config.timeout,
        }
    }

    /// Player arguments for `file`
    #[must_use]
    pub fn render_args(&self, file: &Path) -> Vec<String> {
        let file = file.display().to_string();
        self.args
            .iter()
            .map(|arg| arg.replace("{device}", &self.device).replace("{file}", &file))
            .collect()
    }

    /// Play `artifact`, then delete it whatever the outcome
    ///
    /// A non-zero player exit is reported as [`PlaybackStatus::ExitedWithCode`],
    /// not as an error.
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, the player is not installed, the
    /// player times out, or the process cannot be run
    pub async fn play(&self, artifact: AudioArtifact) -> Result<PlaybackStatus> {
        if !artifact.path().exists() {
            tracing::error!(path = %artifact.path().display(), "no audio file to play");
            return Err(Error::Playback("no audio file to play".to_string()));
        }

        let outcome = self.run_player(artifact.path()).await;
        artifact.discard();
        outcome
    }

    async fn run_player(&self, file: &Path) -> Result<PlaybackStatus> {
        tracing::info!(
            player = %self.player,
            device = %self.device,
            path = %file.display(),
            "playing audio"
        );

        let child = Command::new(&self.player)
            .args(self.render_args(file))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(
                    player = %self.player,
                    "audio player is not installed (try: sudo apt install {})",
                    self.player
                );
                return Err(Error::PlayerMissing(self.player.clone()));
            }
            Err(e) => return Err(Error::Playback(format!("failed to start player: {e}"))),
        };

        // Dropping the wait future on timeout kills the child
        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::error!(timeout = ?self.timeout, "playback took too long");
                Error::PlaybackTimeout(self.timeout)
            })?
            .map_err(|e| Error::Playback(format!("player failed: {e}")))?;

        if output.status.success() {
            tracing::info!("playback complete");
            return Ok(PlaybackStatus::Completed);
        }

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            player = %self.player,
            code,
            stderr = %stderr.trim(),
            "player exited with non-zero status"
        );
        Ok(PlaybackStatus::ExitedWithCode(code))
    }
}
