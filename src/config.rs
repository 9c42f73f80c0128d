//! Environment-driven configuration.
//!
//! All state lives in memory; the environment only selects the port, the
//! startup mode and the per-status webhook URLs. A `.env` file next to the
//! binary is honored if present.

use crate::controller::Status;
use std::env;

pub const DEFAULT_PORT: u16 = 5000;

#[derive(Clone, Debug, Default)]
pub struct WebhookUrls {
    pub available: Option<String>,
    pub busy: Option<String>,
    pub away: Option<String>,
    pub off: Option<String>,
    pub rainbow: Option<String>,
}

impl WebhookUrls {
    pub fn for_status(&self, status: Status) -> Option<&str> {
        match status {
            Status::Available => self.available.as_deref(),
            Status::Busy => self.busy.as_deref(),
            Status::Away => self.away.as_deref(),
            Status::Off => self.off.as_deref(),
            Status::Rainbow => self.rainbow.as_deref(),
            Status::Unknown => None,
        }
    }
}

/// Mode the display is brought into on process start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StartupMode {
    Off,
    Available,
    Busy,
    Away,
    #[default]
    Rainbow,
}

impl StartupMode {
    /// Case-insensitive; unknown values fall back to the rainbow default.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "OFF" => Self::Off,
            "AVAILABLE" => Self::Available,
            "BUSY" => Self::Busy,
            "AWAY" => Self::Away,
            "RAINBOW" => Self::Rainbow,
            other => {
                tracing::warn!("unknown STARTUP_MODE {other:?}, defaulting to rainbow");
                Self::Rainbow
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub startup_mode: StartupMode,
    pub webhooks: WebhookUrls,
}

impl Config {
    /// Read configuration from the process environment, loading `.env`
    /// first if one exists.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            startup_mode: env::var("STARTUP_MODE")
                .map(|v| StartupMode::parse(&v))
                .unwrap_or_default(),
            webhooks: WebhookUrls {
                available: webhook_var("WEBHOOK_AVAILABLE"),
                busy: webhook_var("WEBHOOK_BUSY"),
                away: webhook_var("WEBHOOK_AWAY"),
                off: webhook_var("WEBHOOK_OFF"),
                rainbow: webhook_var("WEBHOOK_RAINBOW"),
            },
        }
    }
}

/// An empty value means "not configured", same as an absent one.
fn webhook_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("OFF", StartupMode::Off)]
    #[case("off", StartupMode::Off)]
    #[case("Available", StartupMode::Available)]
    #[case("BUSY", StartupMode::Busy)]
    #[case("away", StartupMode::Away)]
    #[case("RAINBOW", StartupMode::Rainbow)]
    #[case("party", StartupMode::Rainbow)]
    #[case("", StartupMode::Rainbow)]
    fn test_startup_mode_parse(#[case] input: &str, #[case] expected: StartupMode) {
        assert_eq!(StartupMode::parse(input), expected);
    }

    #[test]
    fn for_status_maps_each_configured_hook() {
        let urls = WebhookUrls {
            available: Some("http://hook/available".into()),
            busy: Some("http://hook/busy".into()),
            away: None,
            off: Some("http://hook/off".into()),
            rainbow: None,
        };
        assert_eq!(urls.for_status(Status::Available), Some("http://hook/available"));
        assert_eq!(urls.for_status(Status::Busy), Some("http://hook/busy"));
        assert_eq!(urls.for_status(Status::Away), None);
        assert_eq!(urls.for_status(Status::Off), Some("http://hook/off"));
        assert_eq!(urls.for_status(Status::Rainbow), None);
        assert_eq!(urls.for_status(Status::Unknown), None);
    }
}
