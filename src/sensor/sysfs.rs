//! PIR sensor read through the Linux sysfs GPIO interface
//!
//! Configured pins are BCM numbers. Newer kernels number sysfs lines globally,
//! with the SoC chip starting at a non-zero base (512 on recent Raspberry Pi
//! OS), so the chip base is added before exporting.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::MotionSensor;
use crate::{Error, Result};

/// Label prefix of the SoC pin controller (`pinctrl-bcm2835`, `pinctrl-bcm2711`, `pinctrl-rp1`)
const SOC_CHIP_LABEL: &str = "pinctrl-";

/// A sysfs `gpiochipN` entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct GpioChip {
    base: u32,
    ngpio: u32,
    label: String,
}

impl GpioChip {
    fn read(dir: &Path) -> Option<Self> {
        let field = |name: &str| std::fs::read_to_string(dir.join(name)).ok();
        Some(Self {
            base: field("base")?.trim().parse().ok()?,
            ngpio: field("ngpio")?.trim().parse().ok()?,
            label: field("label").unwrap_or_default().trim().to_string(),
        })
    }
}

/// Find the SoC GPIO chip under `root`
///
/// Prefers a `pinctrl-*` chip; otherwise the chip with the lowest base.
/// `None` when no chip is listed.
fn soc_chip(root: &Path) -> Option<GpioChip> {
    let chips: Vec<GpioChip> = std::fs::read_dir(root)
        .ok()?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("gpiochip"))
        .filter_map(|entry| GpioChip::read(&entry.path()))
        .collect();

    chips
        .iter()
        .filter(|chip| chip.label.starts_with(SOC_CHIP_LABEL))
        .min_by_key(|chip| chip.base)
        .or_else(|| chips.iter().min_by_key(|chip| chip.base))
        .cloned()
}

/// Global sysfs line number for BCM `pin`
///
/// # Errors
///
/// Returns error if `pin` is beyond the SoC chip's line count
fn sysfs_line(root: &Path, pin: u32) -> Result<u32> {
    let Some(chip) = soc_chip(root) else {
        return Ok(pin);
    };

    if pin >= chip.ngpio {
        return Err(Error::Sensor(format!(
            "GPIO {pin} out of range for {} ({} lines)",
            chip.label, chip.ngpio
        )));
    }

    tracing::debug!(pin, base = chip.base, label = %chip.label, "resolved GPIO chip");
    Ok(chip.base + pin)
}

/// A PIR sensor wired to one GPIO input pin
#[derive(Debug)]
pub struct SysfsMotionSensor {
    root: PathBuf,
    pin: u32,
    line: u32,
    value_path: PathBuf,
    exported: bool,
    released: bool,
}

impl SysfsMotionSensor {
    /// Export BCM `pin` under `root` (if needed) and configure it as an input
    ///
    /// # Errors
    ///
    /// Returns error if the pin cannot be exported, configured, or read
    pub fn open(root: &Path, pin: u32) -> Result<Self> {
        let line = sysfs_line(root, pin)?;
        let pin_dir = root.join(format!("gpio{line}"));
        let mut exported = false;

        if !pin_dir.exists() {
            std::fs::write(root.join("export"), line.to_string()).map_err(|e| {
                Error::Sensor(format!("failed to export GPIO {pin} (line {line}): {e}"))
            })?;
            exported = true;
        }

        std::fs::write(pin_dir.join("direction"), "in")
            .map_err(|e| Error::Sensor(format!("failed to set GPIO {pin} direction: {e}")))?;

        let value_path = pin_dir.join("value");
        std::fs::read_to_string(&value_path)
            .map_err(|e| Error::Sensor(format!("failed to read GPIO {pin}: {e}")))?;

        Ok(Self {
            root: root.to_path_buf(),
            pin,
            line,
            value_path,
            exported,
            released: false,
        })
    }

    /// BCM pin number
    #[must_use]
    pub const fn pin(&self) -> u32 {
        self.pin
    }

    /// Global sysfs line number
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }
}

#[async_trait]
impl MotionSensor for SysfsMotionSensor {
    fn name(&self) -> &'static str {
        "pir"
    }

    async fn motion_detected(&mut self) -> Result<bool> {
        let value = tokio::fs::read_to_string(&self.value_path)
            .await
            .map_err(|e| Error::Sensor(format!("failed to read GPIO {}: {e}", self.pin)))?;
        Ok(value.trim() == "1")
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.exported {
            if let Err(e) = std::fs::write(self.root.join("unexport"), self.line.to_string()) {
                tracing::warn!(pin = self.pin, error = %e, "failed to unexport GPIO");
                return;
            }
        }
        tracing::info!(pin = self.pin, "GPIO released");
    }
}

impl Drop for SysfsMotionSensor {
    fn drop(&mut self) {
        self.release();
    }
}
