//! Motion sensors
//!
//! A PIR sensor on a sysfs GPIO pin, or a keyboard stand-in when no hardware
//! is available.

mod manual;
mod sysfs;

use async_trait::async_trait;

pub use manual::ManualTrigger;
pub use sysfs::SysfsMotionSensor;

use crate::Result;
use crate::config::{SensorConfig, SensorKind};

/// A binary motion signal
#[async_trait]
pub trait MotionSensor: Send {
    /// Sensor name for logs
    fn name(&self) -> &'static str;

    /// Whether motion is currently asserted
    async fn motion_detected(&mut self) -> Result<bool>;

    /// Release the underlying hardware; called once on shutdown
    fn release(&mut self) {}
}

/// Open the configured sensor, falling back to the manual trigger
///
/// `force_manual` skips hardware entirely.
#[must_use]
pub fn open(config: &SensorConfig, force_manual: bool) -> Box<dyn MotionSensor> {
    if force_manual || config.kind == SensorKind::Manual {
        tracing::info!("using manual trigger");
        return Box::new(ManualTrigger::new());
    }

    match SysfsMotionSensor::open(&config.sysfs_root, config.pin) {
        Ok(sensor) => {
            tracing::info!(pin = config.pin, "GPIO initialized, PIR sensor ready");
            Box::new(sensor)
        }
        Err(e) => {
            tracing::warn!(
                pin = config.pin,
                error = %e,
                "GPIO unavailable, running in test mode with manual trigger"
            );
            Box::new(ManualTrigger::new())
        }
    }
}
