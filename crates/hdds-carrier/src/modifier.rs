// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Carrier modifier strings.
//!
//! A connection names its carrier with a base token followed by `+`-separated
//! suffixes:
//!
//! ```text
//! tcp+recv.priority+level.15+time.2+inhibit
//! ^^^ ^^^^^^^^^^^^^ ^^^^^^^^ ^^^^^^ ^^^^^^^
//! base  modifier    key.value        flag
//! ```
//!
//! Each suffix splits at its first `.`, so `time.0.5` is key `time` with
//! value `0.5`. `recv.<name>` and `send.<name>` select the modifier carriers
//! installed on the receiving and sending side of the connection.
//!
//! Unknown keys are kept but never interpreted here: they belong to whichever
//! carrier in the chain understands them.

use std::fmt;

/// Side of a connection a modifier is installed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Recv,
    Send,
}

impl Direction {
    /// Key used in modifier strings (`recv` / `send`).
    pub const fn token(self) -> &'static str {
        match self {
            Self::Recv => "recv",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Parsed modifier string: a base carrier plus ordered key/value parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModifierConfig {
    base: String,
    params: Vec<(String, Option<String>)>,
}

impl ModifierConfig {
    /// Parse a modifier string. Never fails; empty suffixes are skipped.
    pub fn parse(spec: &str) -> Self {
        let mut tokens = spec.split('+').map(str::trim);
        let base = tokens.next().unwrap_or_default().to_string();

        let params = tokens
            .filter(|token| !token.is_empty())
            .map(|token| match token.split_once('.') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (token.to_string(), None),
            })
            .collect();

        Self { base, params }
    }

    /// Base carrier token (`tcp` in `tcp+recv.priority`).
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Value of `key`. Later suffixes override earlier ones.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// True if `key` appears at all, with or without a value.
    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k == key)
    }

    /// Numeric parameter, failing closed.
    ///
    /// Absent keys yield `default` silently. Present keys that do not parse
    /// to a finite number yield `default` and log a warning.
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        if !self.has(key) {
            return default;
        }

        match self.get(key).map(str::parse::<f64>) {
            Some(Ok(value)) if value.is_finite() => value,
            Some(Ok(value)) => {
                tracing::warn!(
                    "Modifier '{}' is not finite ({}); using default {}",
                    key,
                    value,
                    default
                );
                default
            }
            Some(Err(e)) => {
                tracing::warn!(
                    "Modifier '{}' has invalid value: {}; using default {}",
                    key,
                    e,
                    default
                );
                default
            }
            None => {
                tracing::warn!(
                    "Modifier '{}' given without a value; using default {}",
                    key,
                    default
                );
                default
            }
        }
    }

    /// Modifier carrier names requested for one side, in declaration order.
    pub fn modifiers_for(&self, direction: Direction) -> impl Iterator<Item = &str> + '_ {
        let token = direction.token();
        self.params
            .iter()
            .filter(move |(k, _)| k == token)
            .filter_map(|(_, v)| v.as_deref())
    }

    /// All parameters in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of suffix parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for ModifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for (key, value) in &self.params {
            match value {
                Some(value) => write!(f, "+{}.{}", key, value)?,
                None => write!(f, "+{}", key)?,
            }
        }
        Ok(())
    }
}
