//! Agent and broker configuration.

use crate::error::{Result, TelemetryError};
use lapin::uri::{AMQPAuthority, AMQPScheme, AMQPUri, AMQPUserInfo};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default queue snapshots are published to.
pub const DEFAULT_QUEUE_NAME: &str = "turtlebot.telemetry";

/// Default battery pack capacity in watt-hours.
pub const DEFAULT_BATTERY_CAPACITY_WH: f64 = 19.98;

/// Default tick period in seconds.
pub const DEFAULT_TICK_INTERVAL_SECS: u64 = 5;

/// AMQP heartbeat requested from the broker, in seconds.
pub const BROKER_HEARTBEAT_SECS: u16 = 30;

/// Configuration of the telemetry agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Robot identifier stamped on every snapshot
    pub robot_name: String,
    /// Battery pack capacity in watt-hours
    pub battery_capacity_wh: f64,
    /// Seconds between snapshots
    pub tick_interval_secs: u64,
    /// Durable queue to publish to
    pub queue_name: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            robot_name: resolve_robot_name(None),
            battery_capacity_wh: DEFAULT_BATTERY_CAPACITY_WH,
            tick_interval_secs: DEFAULT_TICK_INTERVAL_SECS,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}

impl AgentConfig {
    /// Create a configuration for the named robot with default settings.
    pub fn new(robot_name: impl Into<String>) -> Self {
        Self {
            robot_name: robot_name.into().to_lowercase(),
            ..Default::default()
        }
    }

    /// Set the robot identifier.
    pub fn with_robot_name(mut self, robot_name: impl Into<String>) -> Self {
        self.robot_name = robot_name.into().to_lowercase();
        self
    }

    /// Set the battery capacity in watt-hours.
    pub fn with_battery_capacity_wh(mut self, capacity: f64) -> Self {
        self.battery_capacity_wh = capacity;
        self
    }

    /// Set the tick period in seconds.
    pub fn with_tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    /// Set the destination queue.
    pub fn with_queue_name(mut self, queue: impl Into<String>) -> Self {
        self.queue_name = queue.into();
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }

    /// Check the configuration for values the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.robot_name.trim().is_empty() {
            return Err(TelemetryError::config_error("robot name must not be empty"));
        }
        if !self.battery_capacity_wh.is_finite() || self.battery_capacity_wh <= 0.0 {
            return Err(TelemetryError::config_error(format!(
                "battery capacity must be a positive number of Wh, got {}",
                self.battery_capacity_wh
            )));
        }
        if self.tick_interval_secs == 0 {
            return Err(TelemetryError::config_error("tick interval must be at least 1 second"));
        }
        if self.queue_name.is_empty() {
            return Err(TelemetryError::config_error("queue name must not be empty"));
        }
        Ok(())
    }
}

/// Robot identifier: the explicit name if given, else the host name,
/// lower-cased either way.
pub fn resolve_robot_name(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .filter(|name| !name.trim().is_empty())
        .or_else(|| {
            hostname::get()
                .ok()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
        .to_lowercase()
}

/// Raw broker settings as read from the environment or command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerSettings {
    pub uri: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub vhost: Option<String>,
}

fn required<T>(value: Option<T>, name: &str) -> Result<T> {
    value.ok_or_else(|| TelemetryError::config_error(format!("{} is not set", name)))
}

impl BrokerSettings {
    /// Resolve into a complete broker configuration.
    ///
    /// A URI, when present, takes precedence over the individual settings.
    /// Otherwise host, port, user and password are all required.
    pub fn resolve(self) -> Result<BrokerConfig> {
        if let Some(uri) = self.uri.filter(|uri| !uri.is_empty()) {
            return BrokerConfig::from_uri(&uri);
        }

        Ok(BrokerConfig {
            host: required(self.host, "RABBITMQ_HOST")?,
            port: required(self.port, "RABBITMQ_PORT")?,
            user: required(self.user, "RABBITMQ_USER")?,
            password: required(self.password, "RABBITMQ_PASS")?,
            vhost: self.vhost.unwrap_or_else(|| "/".to_string()),
            tls: false,
        })
    }
}

/// Complete broker connection parameters.
#[derive(Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub vhost: String,
    /// Connect with `amqps`
    pub tls: bool,
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("vhost", &self.vhost)
            .field("tls", &self.tls)
            .finish()
    }
}

impl BrokerConfig {
    /// Parse an `amqp://` or `amqps://` URI.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let parsed: AMQPUri = uri
            .parse()
            .map_err(|e| TelemetryError::config_error(format!("Invalid RABBITMQ_URI: {}", e)))?;

        Ok(Self {
            host: parsed.authority.host,
            port: parsed.authority.port,
            user: parsed.authority.userinfo.username,
            password: parsed.authority.userinfo.password,
            vhost: parsed.vhost,
            tls: matches!(parsed.scheme, AMQPScheme::AMQPS),
        })
    }

    /// Connection URI with the heartbeat applied.
    pub fn amqp_uri(&self) -> AMQPUri {
        let mut uri = AMQPUri {
            scheme: if self.tls {
                AMQPScheme::AMQPS
            } else {
                AMQPScheme::AMQP
            },
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: self.user.clone(),
                    password: self.password.clone(),
                },
                host: self.host.clone(),
                port: self.port,
            },
            vhost: self.vhost.clone(),
            ..Default::default()
        };
        uri.query.heartbeat = Some(BROKER_HEARTBEAT_SECS);
        uri
    }

    /// Connection summary safe for logs.
    pub fn describe(&self) -> String {
        format!(
            "host={}  port={}  user={}  vhost={}",
            self.host, self.port, self.user, self.vhost
        )
    }
}
