//! Agent configuration.
//!
//! The agent needs three dashboard-provisioned credentials (username,
//! password and client id), the broker address, a MAC-style device identity
//! and a handful of timing knobs. Configuration can be built in code, parsed
//! from a JSON blob (for example one stored in flash by a provisioning tool),
//! or, with the `std` feature, read from the environment.
//!
//! ```rust
//! use iotagent::config::AgentConfig;
//!
//! let config = AgentConfig::from_json(r#"{
//!     "credentials": {
//!         "username": "MQTT_USERNAME",
//!         "password": "MQTT_PASSWORD",
//!         "client_id": "CLIENT_ID"
//!     },
//!     "publish_interval_ms": 10000
//! }"#).unwrap();
//!
//! assert_eq!(config.server.host.as_str(), "mqtt.mydevices.com");
//! assert_eq!(config.server.port, 1883);
//! assert_eq!(config.publish_interval_ms, 10000);
//! ```

use heapless::String;
use serde::Deserialize;

use crate::network::error::Error;

/// Default Cayenne MQTT broker host.
pub const DEFAULT_HOST: &str = "mqtt.mydevices.com";
/// Default Cayenne MQTT broker port.
pub const DEFAULT_PORT: u16 = 1883;
/// Default time slice spent processing inbound messages per cycle.
pub const DEFAULT_YIELD_BUDGET_MS: u32 = 1000;
/// Default telemetry publishing period.
pub const DEFAULT_PUBLISH_INTERVAL_MS: u32 = 5000;
/// Default delay between reconnect attempts.
pub const DEFAULT_BACKOFF_MS: u32 = 2000;
/// Default MQTT keep-alive.
pub const DEFAULT_KEEP_ALIVE_SECONDS: u16 = 60;

/// Maximum length of each credential.
pub const MAX_CREDENTIAL_LEN: usize = 64;
/// Maximum length of the broker host name.
pub const MAX_HOST_LEN: usize = 64;

/// A MAC-style hardware identity.
pub type MacAddress = [u8; 6];

/// Cayenne credentials, obtained from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Credentials {
    /// MQTT username.
    pub username: String<MAX_CREDENTIAL_LEN>,
    /// MQTT password.
    pub password: String<MAX_CREDENTIAL_LEN>,
    /// MQTT client id, also the device id in topic paths.
    pub client_id: String<MAX_CREDENTIAL_LEN>,
}

impl Credentials {
    /// Build credentials from borrowed strings.
    pub fn new(username: &str, password: &str, client_id: &str) -> Result<Self, Error> {
        Ok(Self {
            username: String::try_from(username).map_err(|_| Error::BufferOverflow)?,
            password: String::try_from(password).map_err(|_| Error::BufferOverflow)?,
            client_id: String::try_from(client_id).map_err(|_| Error::BufferOverflow)?,
        })
    }

    fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.client_id.is_empty()
    }
}

/// Broker address.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Broker host name.
    #[serde(default = "default_host")]
    pub host: String<MAX_HOST_LEN>,
    /// Broker TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
        }
    }
}

/// Device descriptors published on the `sys/*` topics after each connect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceInfo {
    /// Firmware/agent version, published on `sys/version`.
    #[serde(default = "default_version")]
    pub version: String<16>,
    /// Device model, published on `sys/model`.
    #[serde(default = "default_model")]
    pub model: String<32>,
    /// CPU model, published on `sys/cpu/model` when set.
    #[serde(default)]
    pub cpu_model: Option<String<32>>,
    /// CPU speed in Hz, published on `sys/cpu/speed` when set.
    #[serde(default)]
    pub cpu_speed: Option<String<16>>,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: default_model(),
            cpu_model: None,
            cpu_speed: None,
        }
    }
}

/// Delay policy between reconnect attempts.
///
/// The delay for attempt `n` (zero-based) is `initial_ms * multiplier^n`,
/// capped at `max_ms`. The default is a fixed two second delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackoffConfig {
    /// Delay after the first failure.
    pub initial_ms: u32,
    /// Upper bound for the delay.
    pub max_ms: u32,
    /// Growth factor; `1` keeps the delay constant.
    pub multiplier: u32,
}

impl BackoffConfig {
    /// A constant delay.
    pub const fn fixed(delay_ms: u32) -> Self {
        Self {
            initial_ms: delay_ms,
            max_ms: delay_ms,
            multiplier: 1,
        }
    }

    /// Delay to wait after the `attempt`-th consecutive failure.
    pub fn delay_for(&self, attempt: u32) -> u32 {
        let mut delay = self.initial_ms;
        for _ in 0..attempt {
            if delay >= self.max_ms {
                break;
            }
            delay = delay.saturating_mul(self.multiplier);
        }
        delay.min(self.max_ms)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::fixed(DEFAULT_BACKOFF_MS)
    }
}

/// Complete agent configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentConfig {
    /// Broker credentials.
    pub credentials: Credentials,
    /// Broker address.
    #[serde(default)]
    pub server: ServerConfig,
    /// Descriptors published after connecting.
    #[serde(default)]
    pub device: DeviceInfo,
    /// Hardware identity handed to the link driver.
    #[serde(default = "default_identity")]
    pub identity: MacAddress,
    /// Time spent processing inbound messages per loop cycle.
    #[serde(default = "default_yield_budget")]
    pub yield_budget_ms: u32,
    /// Telemetry publishing period.
    #[serde(default = "default_publish_interval")]
    pub publish_interval_ms: u32,
    /// MQTT keep-alive; `0` disables pings.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_seconds: u16,
    /// Reconnect delay policy.
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl AgentConfig {
    /// Configuration with the given credentials and defaults for everything else.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            server: ServerConfig::default(),
            device: DeviceInfo::default(),
            identity: default_identity(),
            yield_budget_ms: DEFAULT_YIELD_BUDGET_MS,
            publish_interval_ms: DEFAULT_PUBLISH_INTERVAL_MS,
            keep_alive_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
            backoff: BackoffConfig::default(),
        }
    }

    /// Parse and validate a JSON configuration blob.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let (config, _) =
            serde_json_core::from_str::<Self>(json).map_err(|_| Error::InvalidConfig)?;
        config.validate()?;
        Ok(config)
    }

    /// Read the configuration from the environment.
    ///
    /// `CAYENNE_USERNAME`, `CAYENNE_PASSWORD` and `CAYENNE_CLIENT_ID` are
    /// required; `CAYENNE_HOST` and `CAYENNE_PORT` override the broker.
    #[cfg(feature = "std")]
    pub fn from_env() -> Result<Self, Error> {
        fn var(name: &str) -> Result<std::string::String, Error> {
            std::env::var(name).map_err(|_| Error::InvalidConfig)
        }

        let credentials = Credentials::new(
            &var("CAYENNE_USERNAME")?,
            &var("CAYENNE_PASSWORD")?,
            &var("CAYENNE_CLIENT_ID")?,
        )?;
        let mut config = Self::new(credentials);
        if let Ok(host) = var("CAYENNE_HOST") {
            config.server.host = String::try_from(host.as_str()).map_err(|_| Error::BufferOverflow)?;
        }
        if let Ok(port) = var("CAYENNE_PORT") {
            config.server.port = port.parse().map_err(|_| Error::InvalidConfig)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration can be used to connect.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.credentials.is_complete()
            || self.server.host.is_empty()
            || self.server.port == 0
            || self.publish_interval_ms == 0
            || self.backoff.multiplier == 0
        {
            return Err(Error::InvalidConfig);
        }
        Ok(())
    }
}

fn default_host() -> String<MAX_HOST_LEN> {
    String::try_from(DEFAULT_HOST).unwrap_or_default()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_version() -> String<16> {
    String::try_from(env!("CARGO_PKG_VERSION")).unwrap_or_default()
}

fn default_model() -> String<32> {
    String::try_from(env!("CARGO_PKG_NAME")).unwrap_or_default()
}

fn default_identity() -> MacAddress {
    [0xFE, 0x08, 0xDC, 0x12, 0x34, 0x56]
}

fn default_yield_budget() -> u32 {
    DEFAULT_YIELD_BUDGET_MS
}

fn default_publish_interval() -> u32 {
    DEFAULT_PUBLISH_INTERVAL_MS
}

fn default_keep_alive() -> u16 {
    DEFAULT_KEEP_ALIVE_SECONDS
}
