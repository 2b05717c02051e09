// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Scenario configuration.
//!
//! A scenario describes the sources competing for one endpoint and a timed
//! list of messages they send. It drives the `simulate` command.
//!
//! ```toml
//! name = "two-sources"
//! endpoint = "/port1"
//!
//! [[sources]]
//! name = "/a"
//! level = 10.0
//! time = 2.0
//!
//! [[events]]
//! at = 0.0
//! source = "/a"
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::priority::ArrivalPolicy;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name (for reports).
    #[serde(default = "default_scenario_name")]
    pub name: String,

    /// Receiving port every source connects to.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base carrier under the priority modifier.
    #[serde(default = "default_carrier")]
    pub carrier: String,

    /// Competing sources.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    /// Messages, in any order; replayed sorted by time.
    #[serde(default)]
    pub events: Vec<EventConfig>,
}

fn default_scenario_name() -> String {
    "scenario".to_string()
}

fn default_endpoint() -> String {
    "/port1".to_string()
}

fn default_carrier() -> String {
    "tcp".to_string()
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: default_scenario_name(),
            endpoint: default_endpoint(),
            carrier: default_carrier(),
            sources: Vec::new(),
            events: Vec::new(),
        }
    }
}

impl ScenarioConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Two sources of unequal priority, plus an inhibitory stop source.
    pub fn example() -> Self {
        Self {
            name: "two-sources".to_string(),
            sources: vec![
                SourceConfig::new("/a", 10.0, 2.0),
                SourceConfig::new("/b", 5.0, 2.0),
                SourceConfig::new("/stop", 50.0, 1.0).inhibit(true),
            ],
            events: vec![
                EventConfig::new(0.0, "/a"),
                EventConfig::new(0.1, "/b"),
                EventConfig::new(0.5, "/a"),
                EventConfig::new(2.6, "/b"),
                EventConfig::new(3.0, "/stop"),
                EventConfig::new(3.2, "/b"),
                EventConfig::new(4.5, "/b"),
            ],
            ..Default::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Invalid("Endpoint is empty".into()));
        }
        if self.carrier.is_empty() || self.carrier.contains('+') {
            return Err(ConfigError::Invalid(format!(
                "Carrier '{}' must be a bare carrier name",
                self.carrier
            )));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("No sources configured".into()));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Source '{}' is declared twice",
                    source.name
                )));
            }
        }

        for (i, event) in self.events.iter().enumerate() {
            if !event.at.is_finite() || event.at < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "Event {} has invalid time {}",
                    i, event.at
                )));
            }
            if !names.contains(event.source.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Event {} refers to unknown source '{}'",
                    i, event.source
                )));
            }
        }

        Ok(())
    }

    /// Look up a source by port name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Carrier specification for `source`.
    pub fn carrier_spec(&self, source: &SourceConfig) -> String {
        source.carrier_spec(&self.carrier)
    }
}

/// One competing source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Sending port name.
    pub name: String,

    /// Peak priority.
    #[serde(default)]
    pub level: f64,

    /// Decay time constant in seconds.
    #[serde(default)]
    pub time: f64,

    /// Suppress peers instead of delivering.
    #[serde(default)]
    pub inhibit: bool,

    /// Arrival stamping policy (`observed` or `admitted`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival: Option<String>,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, level: f64, time: f64) -> Self {
        Self {
            name: name.into(),
            level,
            time,
            inhibit: false,
            arrival: None,
        }
    }

    #[must_use]
    pub fn inhibit(mut self, enabled: bool) -> Self {
        self.inhibit = enabled;
        self
    }

    #[must_use]
    pub fn arrival(mut self, policy: ArrivalPolicy) -> Self {
        self.arrival = Some(policy.token().to_string());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid("Source with empty name".into()));
        }
        if !self.level.is_finite() || self.level < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Source '{}' has invalid level {}",
                self.name, self.level
            )));
        }
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Source '{}' has invalid time {}",
                self.name, self.time
            )));
        }
        if self.inhibit && self.time <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Inhibitory source '{}' needs a positive time",
                self.name
            )));
        }
        if let Some(arrival) = &self.arrival {
            if ArrivalPolicy::from_token(arrival).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "Source '{}' has unknown arrival policy '{}'",
                    self.name, arrival
                )));
            }
        }
        Ok(())
    }

    /// `<carrier>+recv.priority+level.<L>+time.<T>[+inhibit][+arrival.<P>]`
    pub fn carrier_spec(&self, carrier: &str) -> String {
        let mut spec = format!(
            "{}+recv.priority+level.{}+time.{}",
            carrier, self.level, self.time
        );
        if self.inhibit {
            spec.push_str("+inhibit");
        }
        if let Some(arrival) = &self.arrival {
            spec.push_str("+arrival.");
            spec.push_str(arrival);
        }
        spec
    }
}

/// One message sent by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventConfig {
    /// Send time, seconds from scenario start.
    pub at: f64,

    /// Sending port name.
    pub source: String,

    /// Message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl EventConfig {
    pub fn new(at: f64, source: impl Into<String>) -> Self {
        Self {
            at,
            source: source.into(),
            payload: None,
        }
    }

    /// Body bytes; defaults to the source name.
    pub fn payload_bytes(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&self.source).as_bytes()
    }
}
