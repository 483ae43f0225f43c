//! Push button on a GPIO line through the sysfs interface

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, warn};

use crate::application::ports::{ButtonError, ButtonEvents};

/// Root of the legacy GPIO sysfs interface
pub const GPIO_SYSFS_ROOT: &str = "/sys/class/gpio";

const POLL_INTERVAL: StdDuration = StdDuration::from_millis(10);
const STABLE_SAMPLES: u32 = 3;
const EXPORT_WAIT: StdDuration = StdDuration::from_secs(1);
/// Highest BCM pin pulled up at reset; higher pins default to pull-down
const LAST_PULLED_UP_PIN: u8 = 8;
/// Header GPIO controllers by preference: Pi 5 first, then the older SoCs
const HEADER_CHIP_LABELS: &[&str] = &["pinctrl-rp1", "pinctrl-bcm"];

/// Active-low push button.
///
/// Expects the button to short the pin to ground against a pull-up; BCM
/// pins 0-8 are pulled up by default on the Pi. Sysfs cannot change the
/// bias, so higher pins need an external pull-up resistor.
pub struct SysfsButton {
    root: PathBuf,
    pin: u8,
    /// Global sysfs line number (chip base + BCM pin)
    line: u32,
    value_path: PathBuf,
    exported_here: bool,
}

impl SysfsButton {
    /// Open BCM `pin` under `/sys/class/gpio`
    pub async fn open(pin: u8) -> Result<Self, ButtonError> {
        Self::open_at(Path::new(GPIO_SYSFS_ROOT), pin).await
    }

    /// Open BCM `pin` under an arbitrary sysfs-style root
    pub async fn open_at(root: &Path, pin: u8) -> Result<Self, ButtonError> {
        if !root.is_dir() {
            return Err(ButtonError::Unavailable(format!(
                "{} does not exist",
                root.display()
            )));
        }

        if pin > LAST_PULLED_UP_PIN {
            warn!(pin, "GPIO has no default pull-up; wire an external pull-up resistor");
        }

        let line = header_chip_base(root).await + u32::from(pin);
        let pin_dir = root.join(format!("gpio{}", line));
        let mut exported_here = false;

        if !pin_dir.is_dir() {
            fs::write(root.join("export"), line.to_string())
                .await
                .map_err(|e| {
                    ButtonError::Unavailable(format!("cannot export GPIO{} (line {}): {}", pin, line, e))
                })?;
            exported_here = true;
            if !wait_for_dir(&pin_dir, EXPORT_WAIT).await {
                return Err(ButtonError::Unavailable(format!(
                    "GPIO{} did not appear after export",
                    pin
                )));
            }
        }

        if let Err(e) = fs::write(pin_dir.join("direction"), "in").await {
            // Already an input on most images; only the value file matters
            warn!(pin, error = %e, "Could not set GPIO direction");
        }

        let value_path = pin_dir.join("value");
        if !value_path.exists() {
            return Err(ButtonError::Unavailable(format!(
                "{} is missing",
                value_path.display()
            )));
        }

        debug!(pin, line, exported_here, "GPIO button ready");
        Ok(Self {
            root: root.to_path_buf(),
            pin,
            line,
            value_path,
            exported_here,
        })
    }

    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// True when the line reads low
    async fn is_pressed(&self) -> Result<bool, ButtonError> {
        let raw = fs::read_to_string(&self.value_path)
            .await
            .map_err(|e| ButtonError::ReadFailed(e.to_string()))?;
        Ok(raw.trim() == "0")
    }

    /// Block until the line has read `pressed` for enough consecutive samples
    async fn wait_for_level(&mut self, pressed: bool) -> Result<(), ButtonError> {
        let mut stable = 0;
        loop {
            if self.is_pressed().await? == pressed {
                stable += 1;
                if stable >= STABLE_SAMPLES {
                    return Ok(());
                }
            } else {
                stable = 0;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ButtonEvents for SysfsButton {
    async fn wait_for_press(&mut self) -> Result<(), ButtonError> {
        self.wait_for_level(true).await
    }

    async fn wait_for_release(&mut self) -> Result<(), ButtonError> {
        self.wait_for_level(false).await
    }
}

impl Drop for SysfsButton {
    fn drop(&mut self) {
        if self.exported_here {
            let _ = std::fs::write(self.root.join("unexport"), self.line.to_string());
        }
    }
}

/// Sysfs base of the controller that drives the 40-pin header.
///
/// Kernels since 6.6 number lines from 512 upwards; older ones start at 0,
/// which is also the answer when no known controller is listed.
async fn header_chip_base(root: &Path) -> u32 {
    let mut chips = Vec::new();
    if let Ok(mut entries) = fs::read_dir(root).await {
        while let Ok(Some(entry)) = entries.next_entry().await {
            if !entry.file_name().to_string_lossy().starts_with("gpiochip") {
                continue;
            }
            let label = fs::read_to_string(entry.path().join("label")).await;
            let base = fs::read_to_string(entry.path().join("base")).await;
            if let (Ok(label), Ok(base)) = (label, base) {
                if let Ok(base) = base.trim().parse::<u32>() {
                    chips.push((label.trim().to_string(), base));
                }
            }
        }
    }

    HEADER_CHIP_LABELS
        .iter()
        .find_map(|prefix| {
            chips
                .iter()
                .filter(|(label, _)| label.starts_with(prefix))
                .map(|(_, base)| *base)
                .min()
        })
        .unwrap_or(0)
}

/// Udev needs a moment to create the pin directory after export
async fn wait_for_dir(dir: &Path, limit: StdDuration) -> bool {
    let step = StdDuration::from_millis(50);
    let mut waited = StdDuration::ZERO;
    while !dir.is_dir() {
        if waited >= limit {
            return false;
        }
        tokio::time::sleep(step).await;
        waited += step;
    }
    true
}
