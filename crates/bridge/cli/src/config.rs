//! Layered daemon settings: defaults, TOML file, environment, command line

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{OptionExt, ensure};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::{Figment, Provider};
use nfc_bridge_core::{BridgeConfig, DEFAULT_READER_FILTER, DEFAULT_WAIT_TIMEOUT};
use nfc_bridge_http::DEFAULT_PORT;
use nfc_bridge_pcsc::PcscConfig;
use serde::{Deserialize, Serialize};

/// Prefix of environment variables overriding the config file
const ENV_PREFIX: &str = "NFC_BRIDGE_";

/// Effective daemon settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// Address the API listens on; must be loopback
    pub(crate) host: Ipv4Addr,
    /// Port the API listens on
    pub(crate) port: u16,
    /// Reader name fragments the bridge binds; empty accepts any reader
    pub(crate) readers: Vec<String>,
    /// Deadline for each wait request
    pub(crate) timeout_ms: u64,
    /// PC/SC status poll interval
    pub(crate) poll_interval_ms: u64,
    /// Whether the bridge starts enabled
    pub(crate) start_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let pcsc = PcscConfig::default();
        Self {
            host: Ipv4Addr::LOCALHOST,
            port: DEFAULT_PORT,
            readers: vec![DEFAULT_READER_FILTER.to_string()],
            timeout_ms: DEFAULT_WAIT_TIMEOUT.as_millis() as u64,
            poll_interval_ms: pcsc.poll_interval.as_millis() as u64,
            start_enabled: true,
        }
    }
}

/// Values given on the command line; unset fields leave lower layers alone
#[derive(Debug, Default, Clone, Serialize)]
pub(crate) struct Overrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) host: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) readers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) poll_interval_ms: Option<u64>,
}

impl Settings {
    /// Load settings from `path`, or from the default config file if present
    ///
    /// A `path` given explicitly must exist.
    pub(crate) fn load(path: Option<PathBuf>, overrides: &Overrides) -> eyre::Result<Self> {
        let path = match path {
            Some(path) => {
                ensure!(path.is_file(), "config file {} not found", path.display());
                path
            }
            None => default_config_file()?,
        };
        Self::from_layers(Toml::file(path), overrides)
    }

    fn from_layers(file: impl Provider, overrides: &Overrides) -> eyre::Result<Self> {
        let settings: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> eyre::Result<()> {
        ensure!(self.timeout_ms > 0, "timeout_ms must be greater than zero");
        ensure!(
            self.poll_interval_ms > 0,
            "poll_interval_ms must be greater than zero"
        );
        ensure!(
            self.host.is_loopback(),
            "host {} is not a loopback address",
            self.host
        );
        Ok(())
    }

    /// Bridge core configuration
    pub(crate) fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig::new()
            .with_allowed_readers(self.readers.iter().cloned())
            .with_wait_timeout(Duration::from_millis(self.timeout_ms))
            .with_start_enabled(self.start_enabled)
    }

    /// PC/SC driver configuration
    pub(crate) fn pcsc_config(&self) -> PcscConfig {
        PcscConfig::new().with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

/// `~/.nfc-bridge/bridge.toml`
fn default_config_file() -> eyre::Result<PathBuf> {
    Ok(std::env::home_dir()
        .ok_or_eyre("home directory not found")?
        .join(".nfc-bridge")
        .join("bridge.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(toml: &str, overrides: &Overrides) -> eyre::Result<Settings> {
        Settings::from_layers(Toml::string(toml), overrides)
    }

    #[test]
    fn test_defaults() {
        let settings = from_toml("", &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.port, 3333);
        assert_eq!(settings.readers, vec!["ACR122".to_string()]);

        let bridge = settings.bridge_config();
        assert_eq!(bridge.wait_timeout, Duration::from_secs(5));
        assert!(bridge.start_enabled);
        assert_eq!(
            settings.pcsc_config().poll_interval,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_file_values_apply() {
        let settings = from_toml(
            r#"
            port = 4000
            readers = ["ACR122", "ACR1252"]
            timeout_ms = 10000
            start_enabled = false
            "#,
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.port, 4000);
        assert_eq!(settings.readers.len(), 2);
        assert!(settings.bridge_config().accepts_reader("ACS ACR1252 1S CL Reader"));
        assert_eq!(
            settings.bridge_config().wait_timeout,
            Duration::from_secs(10)
        );
        assert!(!settings.start_enabled);
        // untouched keys keep their defaults
        assert_eq!(settings.host, Ipv4Addr::LOCALHOST);
    }

    #[test]
    fn test_command_line_wins_over_file() {
        let overrides = Overrides {
            port: Some(5000),
            readers: Some(vec!["Identiv".to_string()]),
            ..Default::default()
        };
        let settings = from_toml("port = 4000\nreaders = []", &overrides).unwrap();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.readers, vec!["Identiv".to_string()]);
    }

    #[test]
    fn test_empty_reader_list_accepts_any() {
        let settings = from_toml("readers = []", &Overrides::default()).unwrap();
        assert!(settings.bridge_config().accepts_reader("Generic Reader 0"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(from_toml("timeout_ms = 0", &Overrides::default()).is_err());
    }

    #[test]
    fn test_rejects_public_host() {
        let overrides = Overrides {
            host: Some(Ipv4Addr::UNSPECIFIED),
            ..Default::default()
        };
        assert!(from_toml("", &overrides).is_err());
    }

    #[test]
    fn test_missing_explicit_config_file_is_an_error() {
        let path = std::env::temp_dir().join("nfc-bridge-no-such-dir/bridge.toml");
        let err = Settings::load(Some(path), &Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_rejects_malformed_file() {
        assert!(from_toml("port = \"not a port\"", &Overrides::default()).is_err());
    }

    #[test]
    fn test_settings_render_as_toml() {
        let rendered = toml::to_string(&Settings::default()).unwrap();
        let parsed = from_toml(&rendered, &Overrides::default()).unwrap();
        assert_eq!(parsed, Settings::default());
    }
}
