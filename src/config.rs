//! Configuration management for Schedule Relay

use std::env;

use serde::Deserialize;

use crate::error::{AppError, Result};

/// Default date phrase of the bulletin header: "...учебных занятий на 25.12.2024 (среда)"
pub const DEFAULT_DATE_PATTERN: &str = r"учебных занятий на (\d{2}\.\d{2}\.\d{4}) \((.*?)\)";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub poller: PollerConfig,
    pub database: DatabaseConfig,
    pub analyzer: AnalyzerConfig,
    pub calibration: CropCalibration,
    pub groups: GroupConfig,
    pub ledger: LedgerConfig,
    pub cloudinary: CloudinaryConfig,
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Upstream URL; `{code}` is replaced with the sequence code
    pub url_template: String,
    /// First sequence code to probe
    pub sequence_code: u64,
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
    /// Upper bound on one upload call
    pub publish_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzerConfig {
    /// Regex whose first capture is a `dd.mm.yyyy` date and whose optional
    /// second capture is the weekday label
    pub date_pattern: String,
}

/// Crop geometry fitted to the known bulletin layout.
///
/// The label anchor is moved by `(offset_x, offset_y)` and a
/// `width` x `height` box is cut from there; the negative height makes the
/// box extend downwards from the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CropCalibration {
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    /// Pixels per page unit
    pub scale: f32,
}

impl Default for CropCalibration {
    fn default() -> Self {
        Self {
            offset_x: -15.0,
            offset_y: 19.0,
            width: 49.0,
            height: -174.0,
            scale: 4.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupConfig {
    /// Specialty prefixes, e.g. `РП`
    pub prefixes: Vec<String>,
    /// Number of concurrent cohort years
    pub cohorts: u32,
    pub suffix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    pub availability_window_days: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            poller: PollerConfig {
                url_template: "https://permaviat.ru/_engine/get_file.php?f={code}&d=_res/fs/&p=file.pdf"
                    .to_string(),
                sequence_code: 0,
                interval_secs: 30,
                request_timeout_secs: 20,
                publish_timeout_secs: 60,
            },
            database: DatabaseConfig {
                url: "sqlite:./schedule.db".to_string(),
            },
            analyzer: AnalyzerConfig {
                date_pattern: DEFAULT_DATE_PATTERN.to_string(),
            },
            calibration: CropCalibration::default(),
            groups: GroupConfig {
                prefixes: vec!["РП".to_string()],
                cohorts: 4,
                suffix: "1".to_string(),
            },
            ledger: LedgerConfig {
                availability_window_days: 5,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: String::new(),
                api_key: String::new(),
                api_secret: String::new(),
                api_base: "https://api.cloudinary.com/v1_1".to_string(),
            },
            telegram: TelegramConfig {
                bot_token: String::new(),
                api_base: "https://api.telegram.org".to_string(),
            },
        }
    }
}

impl Config {
    /// Load from environment variables.
    ///
    /// Credentials are required; everything else falls back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let cal = defaults.calibration;
        let parse = |name: &str| var(name).and_then(|v| v.trim().parse::<u64>().ok());
        let parse_f32 = |name: &str| var(name).and_then(|v| v.trim().parse::<f32>().ok());
        let parse_u32 = |name: &str| var(name).and_then(|v| v.trim().parse::<u32>().ok());
        let required = |name: &str| {
            var(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::Config(format!("{} is not set", name)))
        };

        Ok(Config {
            poller: PollerConfig {
                url_template: var("POLL_URL_TEMPLATE").unwrap_or(defaults.poller.url_template),
                sequence_code: parse("SEQUENCE_CODE").unwrap_or(defaults.poller.sequence_code),
                interval_secs: parse("POLL_INTERVAL_SECS").unwrap_or(defaults.poller.interval_secs),
                request_timeout_secs: parse("POLL_TIMEOUT_SECS")
                    .unwrap_or(defaults.poller.request_timeout_secs),
                publish_timeout_secs: parse("PUBLISH_TIMEOUT_SECS")
                    .unwrap_or(defaults.poller.publish_timeout_secs),
            },
            database: DatabaseConfig {
                url: var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            analyzer: AnalyzerConfig {
                date_pattern: var("DATE_PATTERN").unwrap_or(defaults.analyzer.date_pattern),
            },
            calibration: CropCalibration {
                offset_x: parse_f32("CROP_OFFSET_X").unwrap_or(cal.offset_x),
                offset_y: parse_f32("CROP_OFFSET_Y").unwrap_or(cal.offset_y),
                width: parse_f32("CROP_WIDTH").unwrap_or(cal.width),
                height: parse_f32("CROP_HEIGHT").unwrap_or(cal.height),
                scale: parse_f32("CROP_SCALE").unwrap_or(cal.scale),
            },
            groups: GroupConfig {
                prefixes: var("GROUP_PREFIXES")
                    .map(|v| split_list(&v))
                    .unwrap_or(defaults.groups.prefixes),
                cohorts: parse_u32("GROUP_COHORTS").unwrap_or(defaults.groups.cohorts),
                suffix: var("GROUP_SUFFIX").unwrap_or(defaults.groups.suffix),
            },
            ledger: LedgerConfig {
                availability_window_days: parse_u32("AVAILABILITY_WINDOW_DAYS")
                    .unwrap_or(defaults.ledger.availability_window_days),
            },
            cloudinary: CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                api_base: var("CLOUDINARY_API_BASE").unwrap_or(defaults.cloudinary.api_base),
            },
            telegram: TelegramConfig {
                bot_token: required("TELEGRAM_BOT_TOKEN")?,
                api_base: var("TELEGRAM_API_BASE").unwrap_or(defaults.telegram.api_base),
            },
        })
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_default_calibration_matches_bulletin_layout() {
        let cal = CropCalibration::default();
        assert_eq!(cal.offset_x, -15.0);
        assert_eq!(cal.offset_y, 19.0);
        assert_eq!(cal.width, 49.0);
        assert_eq!(cal.height, -174.0);
        assert_eq!(cal.scale, 4.0);
    }

    #[test]
    fn test_default_url_template_has_placeholder() {
        assert!(Config::default().poller.url_template.contains("{code}"));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("РП, ТО ,,КС"), vec!["РП", "ТО", "КС"]);
        assert!(split_list("").is_empty());
    }

    fn lookup(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    const CREDENTIALS: &[(&str, &str)] = &[
        ("CLOUDINARY_CLOUD_NAME", "demo"),
        ("CLOUDINARY_API_KEY", "1234"),
        ("CLOUDINARY_API_SECRET", "secret"),
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
    ];

    #[test]
    fn test_from_lookup_keeps_overrides() {
        let mut vars = lookup(CREDENTIALS);
        vars.extend(lookup(&[
            ("SEQUENCE_CODE", "4512"),
            ("DATABASE_URL", "sqlite:/var/lib/relay.db"),
            ("CROP_OFFSET_X", "-12.5"),
        ]));

        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();

        assert_eq!(config.poller.sequence_code, 4512);
        assert_eq!(config.database.url, "sqlite:/var/lib/relay.db");
        assert_eq!(config.calibration.offset_x, -12.5);
        assert_eq!(config.calibration.height, -174.0);
        assert_eq!(config.cloudinary.cloud_name, "demo");
    }

    #[test]
    fn test_missing_credential_is_an_error() {
        let mut vars = lookup(CREDENTIALS);
        vars.insert("SEQUENCE_CODE".to_string(), "4512".to_string());
        vars.remove("CLOUDINARY_CLOUD_NAME");

        let result = Config::from_lookup(|name| vars.get(name).cloned());

        match result {
            Err(AppError::Config(message)) => assert!(message.contains("CLOUDINARY_CLOUD_NAME")),
            other => panic!(
                "expected config error, got {:?}",
                other.map(|c| c.poller.sequence_code)
            ),
        }
    }

    #[test]
    fn test_empty_credential_is_an_error() {
        let mut vars = lookup(CREDENTIALS);
        vars.insert("TELEGRAM_BOT_TOKEN".to_string(), String::new());

        assert!(Config::from_lookup(|name| vars.get(name).cloned()).is_err());
    }
}
