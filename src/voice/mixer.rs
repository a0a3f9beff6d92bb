//! One-shot output volume setup via `amixer`

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::config::MixerConfig;
use crate::{Error, Result};

const MIXER_TIMEOUT: Duration = Duration::from_secs(5);

/// Arguments for `amixer`, or `None` when no volume is configured
#[must_use]
pub fn amixer_args(config: &MixerConfig) -> Option<Vec<String>> {
    let volume = config.volume?;
    Some(vec![
        "-c".to_string(),
        config.card.to_string(),
        "set".to_string(),
        config.control.clone(),
        format!("{volume}%"),
    ])
}

/// Set the output volume
///
/// Does nothing when no volume is configured.
///
/// # Errors
///
/// Returns error if `amixer` cannot be run or exits non-zero
pub async fn set_volume(config: &MixerConfig) -> Result<()> {
    set_volume_with(config, "amixer").await
}

async fn set_volume_with(config: &MixerConfig, program: &str) -> Result<()> {
    let Some(args) = amixer_args(config) else {
        tracing::debug!("no volume configured, leaving mixer untouched");
        return Ok(());
    };

    let output = timeout(
        MIXER_TIMEOUT,
        Command::new(program).args(&args).kill_on_drop(true).output(),
    )
    .await
    .map_err(|_| Error::Mixer(format!("{program} timed out")))?
    .map_err(|e| Error::Mixer(format!("failed to run {program}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Mixer(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    tracing::info!(
        card = config.card,
        control = %config.control,
        volume = ?config.volume,
        "volume set"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amixer_args() {
        let args = amixer_args(&MixerConfig::default()).unwrap();
        assert_eq!(args, vec!["-c", "2", "set", "PCM", "80%"]);
    }

    #[test]
    fn test_no_volume_no_args() {
        let config = MixerConfig {
            volume: None,
            ..MixerConfig::default()
        };
        assert!(amixer_args(&config).is_none());
    }

    #[tokio::test]
    async fn test_missing_binary_is_mixer_error() {
        let result = set_volume_with(&MixerConfig::default(), "nisse-no-such-amixer").await;
        assert!(matches!(result, Err(Error::Mixer(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_mixer_error() {
        let result = set_volume_with(&MixerConfig::default(), "false").await;
        assert!(matches!(result, Err(Error::Mixer(_))));
    }

    #[tokio::test]
    async fn test_unset_volume_skips() {
        let config = MixerConfig {
            volume: None,
            ..MixerConfig::default()
        };
        assert!(set_volume_with(&config, "nisse-no-such-amixer").await.is_ok());
    }
}
