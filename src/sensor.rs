//! CPU temperature collaborator for the status snapshot.

use std::fs;
use std::path::PathBuf;

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Reported when the sysfs node is unavailable (non-Pi hosts, tests).
const MOCK_TEMP: f32 = 42.0;

pub struct CpuTempSensor {
    path: PathBuf,
}

impl CpuTempSensor {
    pub fn new() -> Self {
        Self {
            path: THERMAL_ZONE.into(),
        }
    }

    #[cfg(test)]
    fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Degrees Celsius. The kernel exposes millidegrees; unreadable or
    /// unparsable nodes fall back to the mock reading.
    pub fn read(&self) -> f32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| raw.trim().parse::<f32>().ok())
            .map(|milli| milli / 1000.0)
            .unwrap_or(MOCK_TEMP)
    }
}

impl Default for CpuTempSensor {
    fn default() -> Self {
        Self::new()
    }
}
