//! Keyboard stand-in for the PIR sensor
//!
//! Lines are read on a dedicated OS thread and handed over through a channel,
//! so a pending read never holds up runtime shutdown.

use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::MotionSensor;
use crate::{Error, Result};

/// Reports motion each time a line arrives on the input
pub struct ManualTrigger {
    lines: mpsc::Receiver<std::io::Result<String>>,
    prompt: bool,
    closed: bool,
}

impl ManualTrigger {
    /// Read from stdin, prompting before each wait
    #[must_use]
    pub fn new() -> Self {
        Self::spawn(std::io::stdin(), true)
    }

    /// Read from an arbitrary source without prompting
    #[must_use]
    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::spawn(reader, false)
    }

    fn spawn<R: Read + Send + 'static>(reader: R, prompt: bool) -> Self {
        let (tx, rx) = mpsc::channel(1);

        // Never joined; a read blocked on an idle terminal dies with the process
        std::thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        Self {
            lines: rx,
            prompt,
            closed: false,
        }
    }
}

impl Default for ManualTrigger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MotionSensor for ManualTrigger {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn motion_detected(&mut self) -> Result<bool> {
        if self.closed {
            tokio::time::sleep(Duration::from_secs(1)).await;
            return Ok(false);
        }

        if self.prompt {
            println!("Press Enter to simulate motion (Ctrl+C to quit)...");
        }

        match self.lines.recv().await {
            Some(Ok(_)) => Ok(true),
            Some(Err(e)) => Err(Error::Sensor(format!("failed to read input: {e}"))),
            None => {
                tracing::debug!("manual trigger input closed");
                self.closed = true;
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(false)
            }
        }
    }

    fn release(&mut self) {
        self.lines.close();
    }
}
