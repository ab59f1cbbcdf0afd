//! Runtime configuration read from the environment (and `.env`).
//!
//! Every setting has a default; a value that fails to parse is logged and the
//! default is used instead.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::budget::numbering::DEFAULT_COUNTER_SEED;
use crate::pdf::ChromeConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_CONCURRENT_RENDERS: usize = 4;
pub const DEFAULT_QUEUE_TIMEOUT_SECS: u64 = 30;

/// Directory shipped with the crate holding the brand fonts.
pub fn default_fonts_dir() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static/fonts"))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub chrome_path: Option<PathBuf>,
    pub launch_timeout: Duration,
    pub render_timeout: Duration,
    pub max_concurrent_renders: usize,
    pub queue_timeout: Duration,
    pub no_sandbox: bool,
    pub budget_counter_seed: u64,
    pub fonts_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let chrome = ChromeConfig::default();
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            host: text("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            environment: text("APP_ENV").unwrap_or_else(|| "development".to_string()),
            chrome_path: text("CHROME_PATH").map(PathBuf::from),
            launch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PDF_LAUNCH_TIMEOUT_SECS",
                chrome.launch_timeout.as_secs(),
            )),
            render_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PDF_RENDER_TIMEOUT_SECS",
                chrome.render_timeout.as_secs(),
            )),
            max_concurrent_renders: parse_or(
                &lookup,
                "PDF_MAX_CONCURRENT_RENDERS",
                DEFAULT_MAX_CONCURRENT_RENDERS,
            ),
            queue_timeout: Duration::from_secs(parse_or(
                &lookup,
                "PDF_QUEUE_TIMEOUT_SECS",
                DEFAULT_QUEUE_TIMEOUT_SECS,
            )),
            no_sandbox: parse_flag(&lookup, "PDF_NO_SANDBOX", chrome.no_sandbox),
            budget_counter_seed: parse_or(&lookup, "BUDGET_COUNTER_SEED", DEFAULT_COUNTER_SEED),
            fonts_dir: text("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| default_fonts_dir().to_path_buf()),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn chrome_config(&self) -> ChromeConfig {
        ChromeConfig {
            executable: self.chrome_path.clone(),
            launch_timeout: self.launch_timeout,
            render_timeout: self.render_timeout,
            no_sandbox: self.no_sandbox,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {}={:?}, using the default", key, raw);
            default
        }),
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|raw| raw.trim().to_ascii_lowercase()) {
        None => default,
        Some(value) => match value.as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                log::warn!("Ignoring invalid {}={:?}, using the default", key, value);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.launch_timeout, Duration::from_secs(30));
        assert_eq!(config.render_timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_renders, 4);
        assert_eq!(config.budget_counter_seed, 1000);
        assert!(config.no_sandbox);
        assert!(config.chrome_path.is_none());
        assert!(config.fonts_dir.ends_with("static/fonts"));
        assert!(!config.is_production());
    }

    #[test]
    fn test_default_fonts_dir_is_shipped() {
        let dir = default_fonts_dir();
        assert!(dir.is_dir(), "{} is missing", dir.display());
        assert!(crate::budget::TemplateAssets::with_fonts_dir(dir).is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("APP_ENV", "production"),
            ("CHROME_PATH", "/usr/bin/chromium"),
            ("PDF_RENDER_TIMEOUT_SECS", "15"),
            ("PDF_NO_SANDBOX", "false"),
            ("BUDGET_COUNTER_SEED", "5000"),
        ]);
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.budget_counter_seed, 5000);

        let chrome = config.chrome_config();
        assert_eq!(chrome.executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(chrome.render_timeout, Duration::from_secs(15));
        assert!(!chrome.no_sandbox);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[
            ("PORT", "not-a-port"),
            ("PDF_NO_SANDBOX", "maybe"),
            ("CHROME_PATH", "   "),
        ]);
        assert_eq!(config.port, 3000);
        assert!(config.no_sandbox);
        assert!(config.chrome_path.is_none());
    }
}
