// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-source priority state and the decay function.
//!
//! ```text
//! P(t) = Pi * (1 - exp(5 * (t - Ta - Tc) / Tc))     for 0 <= t - Ta <= Tc
//! P(t) = 0                                          otherwise
//!
//! Pi: priority level, Tc: time constant, Ta: last arrival
//! ```
//!
//! At the instant of arrival the score is `Pi * (1 - e^-5)`, about 99.33% of
//! the declared level; it falls to exactly zero one time constant later and
//! stays there.

/// Exponent scale of the decay curve.
pub const DECAY_STEEPNESS: f64 = 5.0;

/// When a source's arrival time is refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrivalPolicy {
    /// Every inbound message refreshes the arrival, admitted or not.
    #[default]
    Observed,
    /// Only admitted messages refresh the arrival.
    Admitted,
}

impl ArrivalPolicy {
    /// Parse the `arrival.<token>` modifier value.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "observed" => Some(Self::Observed),
            "admitted" => Some(Self::Admitted),
            _ => None,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Observed => "observed",
            Self::Admitted => "admitted",
        }
    }
}

/// Priority parameters and arrival history of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityState {
    /// Sending port name.
    pub source_name: String,
    /// Declared peak priority (>= 0).
    pub priority_level: f64,
    /// Decay time constant in seconds; `<= 0` disables decay.
    pub time_constant: f64,
    /// Time of the last refreshing message; `None` if never seen.
    pub time_arrival: Option<f64>,
    /// Never forwards data, only suppresses weaker peers.
    pub inhibitory: bool,
    pub arrival_policy: ArrivalPolicy,
}

impl PriorityState {
    pub fn new(source_name: impl Into<String>, priority_level: f64, time_constant: f64) -> Self {
        Self {
            source_name: source_name.into(),
            priority_level,
            time_constant,
            time_arrival: None,
            inhibitory: false,
            arrival_policy: ArrivalPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_inhibitory(mut self, inhibitory: bool) -> Self {
        self.inhibitory = inhibitory;
        self
    }

    #[must_use]
    pub fn with_arrival_policy(mut self, policy: ArrivalPolicy) -> Self {
        self.arrival_policy = policy;
        self
    }

    /// Whether decay-based comparison applies to this source.
    pub fn decays(&self) -> bool {
        self.time_constant > 0.0
    }

    /// Record a message at time `t`.
    pub fn observe(&mut self, t: f64) {
        self.time_arrival = Some(t);
    }

    /// Whether a message seen at `t` refreshes the arrival before arbitration.
    pub fn stamps_on_observe(&self) -> bool {
        self.inhibitory || self.arrival_policy == ArrivalPolicy::Observed
    }

    /// Decayed score at time `t`.
    ///
    /// Zero for never-seen sources, sources without decay, and once more
    /// than one time constant has elapsed.
    pub fn actual_priority(&self, t: f64) -> f64 {
        let Some(arrival) = self.time_arrival else {
            return 0.0;
        };
        if !self.decays() {
            return 0.0;
        }

        let dt = t - arrival;
        if dt > self.time_constant {
            return 0.0;
        }

        let tc = self.time_constant;
        let score = self.priority_level * (1.0 - (DECAY_STEEPNESS * (dt - tc) / tc).exp());
        score.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn seen(level: f64, tc: f64, at: f64) -> PriorityState {
        let mut state = PriorityState::new("/src", level, tc);
        state.observe(at);
        state
    }

    #[test]
    fn test_score_at_arrival_is_near_peak() {
        for &(level, tc) in &[(1.0, 1.0), (10.0, 2.0), (15.0, 0.25), (0.5, 30.0)] {
            let state = seen(level, tc, 100.0);
            let expected = level * (1.0 - (-5.0f64).exp());
            assert!((state.actual_priority(100.0) - expected).abs() < EPS);
            assert!((state.actual_priority(100.0) / level - 0.993_262).abs() < 1e-6);
        }
    }

    #[test]
    fn test_score_is_zero_at_time_constant() {
        let state = seen(10.0, 2.0, 5.0);
        assert_eq!(state.actual_priority(7.0), 0.0);
    }

    #[test]
    fn test_score_is_zero_after_time_constant() {
        let state = seen(10.0, 2.0, 5.0);
        assert_eq!(state.actual_priority(7.000_001), 0.0);
        assert_eq!(state.actual_priority(1_000.0), 0.0);
    }

    #[test]
    fn test_score_strictly_decreasing_within_window() {
        let state = seen(10.0, 2.0, 0.5);
        let mut previous = f64::INFINITY;
        for step in 0..=200 {
            let t = 0.5 + 2.0 * f64::from(step) / 200.0;
            let score = state.actual_priority(t);
            assert!(score < previous, "not decreasing at t={}", t);
            previous = score;
        }
    }

    #[test]
    fn test_never_seen_source_is_floor() {
        let state = PriorityState::new("/src", 10.0, 2.0);
        assert_eq!(state.time_arrival, None);
        assert_eq!(state.actual_priority(0.0), 0.0);
        assert_eq!(state.actual_priority(42.0), 0.0);
    }

    #[test]
    fn test_no_time_constant_is_floor() {
        let state = seen(10.0, 0.0, 1.0);
        assert!(!state.decays());
        assert_eq!(state.actual_priority(1.0), 0.0);
    }

    #[test]
    fn test_two_source_scores() {
        let a = seen(10.0, 2.0, 0.0);
        let b = seen(5.0, 2.0, 0.0);

        let sa = a.actual_priority(0.1);
        let sb = b.actual_priority(0.1);
        assert!(sa > 9.5 && sa < 10.0);
        assert!(sb > 4.75 && sb < 5.0);

        assert_eq!(a.actual_priority(2.1), 0.0);
        assert_eq!(b.actual_priority(2.1), 0.0);
    }

    #[test]
    fn test_stamps_on_observe() {
        let observed = PriorityState::new("/a", 1.0, 1.0);
        let admitted = observed.clone().with_arrival_policy(ArrivalPolicy::Admitted);
        let inhibitory = admitted.clone().with_inhibitory(true);

        assert!(observed.stamps_on_observe());
        assert!(!admitted.stamps_on_observe());
        assert!(inhibitory.stamps_on_observe());
    }

    #[test]
    fn test_arrival_policy_tokens() {
        assert_eq!(ArrivalPolicy::from_token("observed"), Some(ArrivalPolicy::Observed));
        assert_eq!(ArrivalPolicy::from_token("admitted"), Some(ArrivalPolicy::Admitted));
        assert_eq!(ArrivalPolicy::from_token("always"), None);
        assert_eq!(ArrivalPolicy::Admitted.token(), "admitted");
    }
}
