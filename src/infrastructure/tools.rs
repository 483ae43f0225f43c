//! Detection of the external tools the recorder shells out to

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use super::audio::ARECORD;
use super::button::GPIO_SYSFS_ROOT;
use super::capture::RPICAM_STILL;

/// One line of the startup checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub name: &'static str,
    pub available: bool,
    /// Shown when the tool is missing
    pub install_hint: &'static str,
}

/// Results of all checks
#[derive(Debug, Clone, Default)]
pub struct DependencyReport {
    pub checks: Vec<ToolCheck>,
}

impl DependencyReport {
    pub fn all_available(&self) -> bool {
        self.checks.iter().all(|c| c.available)
    }

    pub fn missing(&self) -> impl Iterator<Item = &ToolCheck> {
        self.checks.iter().filter(|c| !c.available)
    }
}

/// Check if a tool binary is available using `which`
pub async fn is_tool_available(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check the camera and audio tools, plus GPIO when a real button is used
pub async fn check_dependencies(with_gpio: bool) -> DependencyReport {
    let mut checks = vec![
        ToolCheck {
            name: RPICAM_STILL,
            available: is_tool_available(RPICAM_STILL).await,
            install_hint: "sudo apt install rpicam-apps",
        },
        ToolCheck {
            name: ARECORD,
            available: is_tool_available(ARECORD).await,
            install_hint: "sudo apt install alsa-utils",
        },
    ];

    if with_gpio {
        checks.push(ToolCheck {
            name: "gpio sysfs",
            available: Path::new(GPIO_SYSFS_ROOT).is_dir(),
            install_hint: "enable the legacy GPIO sysfs interface (CONFIG_GPIO_SYSFS)",
        });
    }

    DependencyReport { checks }
}
