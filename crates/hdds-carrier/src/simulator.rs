// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Offline replay of a [`ScenarioConfig`].
//!
//! Every source gets a real [`InboundConnection`] built by the default
//! factory; a [`ManualClock`] is stepped to each event time before the
//! message is offered to its connection.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::carrier::{CarrierFactory, Route};
use crate::clock::ManualClock;
use crate::config::{ConfigError, ScenarioConfig};
use crate::connection::InboundConnection;
use crate::error::CarrierError;
use crate::priority::{PriorityElection, PriorityState};

/// Simulation errors.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source '{port}' refused: {error}")]
    Refused {
        port: String,
        #[source]
        error: CarrierError,
    },
}

/// Result of one replayed message.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub at: f64,
    pub source: String,
    pub delivered: bool,
    /// Score of every source right after the event, in declaration order.
    pub scores: Vec<(String, f64)>,
}

/// Outcome of a whole scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub name: String,
    pub endpoint: String,
    pub outcomes: Vec<EventOutcome>,
}

impl SimulationReport {
    /// Delivered flags, in replay order.
    pub fn delivered(&self) -> Vec<bool> {
        self.outcomes.iter().map(|o| o.delivered).collect()
    }

    /// Number of delivered messages from `source`.
    pub fn delivered_from(&self, source: &str) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.delivered && o.source == source)
            .count()
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario '{}' on {}", self.name, self.endpoint)?;
        for outcome in &self.outcomes {
            write!(
                f,
                "  t={:>8.3}  {:<16} {:<9}",
                outcome.at,
                outcome.source,
                if outcome.delivered { "delivered" } else { "dropped" }
            )?;
            for (name, score) in &outcome.scores {
                write!(f, "  {}={:.3}", name, score)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Replay `config` and report which messages got through.
pub fn run(config: &ScenarioConfig) -> Result<SimulationReport, SimulationError> {
    config.validate()?;

    let peers = Arc::new(PriorityElection::new());
    let clock = Arc::new(ManualClock::new(0.0));
    let factory = CarrierFactory::with_defaults(Arc::clone(&peers), clock.clone());

    let mut connections = HashMap::with_capacity(config.sources.len());
    for source in &config.sources {
        let route = Route::new(
            source.name.clone(),
            config.endpoint.clone(),
            config.carrier_spec(source),
        );
        let conn = InboundConnection::open(&factory, route).map_err(|error| {
            SimulationError::Refused {
                port: source.name.clone(),
                error,
            }
        })?;
        connections.insert(source.name.as_str(), conn);
    }

    let mut events: Vec<_> = config.events.iter().collect();
    events.sort_by(|a, b| a.at.total_cmp(&b.at));

    let mut outcomes = Vec::with_capacity(events.len());
    for event in events {
        clock.set(event.at);
        let delivered = connections
            .get_mut(event.source.as_str())
            .is_some_and(|conn| conn.deliver(event.payload_bytes()).is_some());

        let snapshot = peers
            .lookup(&config.endpoint)
            .map(|group| group.snapshot(event.at))
            .unwrap_or_default();
        let scores = config
            .sources
            .iter()
            .map(|source| {
                let score = snapshot
                    .iter()
                    .find(|peer| peer.source_name == source.name)
                    .map_or(0.0, |peer| peer.score);
                (source.name.clone(), score)
            })
            .collect();

        tracing::debug!(
            "[Simulator] t={} {} -> {}",
            event.at,
            event.source,
            if delivered { "delivered" } else { "dropped" }
        );

        outcomes.push(EventOutcome {
            at: event.at,
            source: event.source.clone(),
            delivered,
            scores,
        });
    }

    Ok(SimulationReport {
        name: config.name.clone(),
        endpoint: config.endpoint.clone(),
        outcomes,
    })
}

/// Sample the decay curve of a source seen at t=0.
///
/// Returns `steps + 1` points evenly spread over `[0, 1.2 * time]`, so the
/// floor after one time constant is visible.
pub fn decay_curve(level: f64, time: f64, steps: usize) -> Vec<(f64, f64)> {
    let mut state = PriorityState::new("curve", level, time);
    state.observe(0.0);

    let steps = steps.max(1);
    let span = if time > 0.0 { time * 1.2 } else { 1.0 };
    (0..=steps)
        .map(|i| {
            let t = span * i as f64 / steps as f64;
            (t, state.actual_priority(t))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventConfig, SourceConfig};

    #[test]
    fn test_example_scenario() {
        let report = run(&ScenarioConfig::example()).expect("run");

        assert_eq!(
            report.delivered(),
            vec![true, false, true, true, false, false, true]
        );
        assert_eq!(report.delivered_from("/a"), 2);
        assert_eq!(report.delivered_from("/stop"), 0);

        // After /b's message at t=0.1, /a is still near its peak.
        let scores = &report.outcomes[1].scores;
        assert_eq!(scores[0].0, "/a");
        assert!(scores[0].1 > 9.9);
        assert!(scores[1].1 > 4.9 && scores[1].1 < 5.0);
    }

    #[test]
    fn test_events_replayed_in_time_order() {
        let config = ScenarioConfig {
            sources: vec![
                SourceConfig::new("/a", 10.0, 2.0),
                SourceConfig::new("/b", 5.0, 2.0),
            ],
            events: vec![EventConfig::new(0.1, "/b"), EventConfig::new(0.0, "/a")],
            ..Default::default()
        };
        let report = run(&config).expect("run");

        assert_eq!(report.outcomes[0].source, "/a");
        assert_eq!(report.delivered(), vec![true, false]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ScenarioConfig::default();
        assert!(matches!(run(&config), Err(SimulationError::Config(_))));
    }

    #[test]
    fn test_report_display() {
        let report = run(&ScenarioConfig::example()).expect("run");
        let text = report.to_string();

        assert!(text.starts_with("Scenario 'two-sources' on /port1"));
        assert!(text.contains("dropped"));
        assert_eq!(text.lines().count(), 1 + report.outcomes.len());
    }

    #[test]
    fn test_decay_curve() {
        let curve = decay_curve(10.0, 2.0, 12);

        assert_eq!(curve.len(), 13);
        assert!((curve[0].1 - 10.0 * (1.0 - (-5.0f64).exp())).abs() < 1e-9);
        assert_eq!(curve[11].1, 0.0);
        assert_eq!(curve[12].1, 0.0);
        assert!(curve[1].1 < curve[0].1);

        assert!(decay_curve(3.0, 0.0, 4).iter().all(|&(_, p)| p == 0.0));
    }
}
