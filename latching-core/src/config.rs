// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Registry configuration.

use crate::strategy::BUILTIN_STRATEGIES;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration for a [`Latching`](crate::Latching) registry.
///
/// # Example JSON Configuration
///
/// ```json
/// {
///     "seed_builtins": true,
///     "trace_invocations": false,
///     "max_callbacks_per_hook": 64,
///     "aliases": { "all": "and", "any": "or" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatchingConfig {
    /// Pre-register the built-in reduction strategies.
    #[serde(default = "default_seed_builtins")]
    pub seed_builtins: bool,

    /// Emit a trace event for every callback step of a hook invocation.
    #[serde(default)]
    pub trace_invocations: bool,

    /// Upper bound on callbacks latched into a single hook.
    #[serde(default)]
    pub max_callbacks_per_hook: Option<usize>,

    /// Extra strategy names, mapped to the strategy they stand for.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
}

fn default_seed_builtins() -> bool {
    true
}

impl Default for LatchingConfig {
    fn default() -> Self {
        Self {
            seed_builtins: default_seed_builtins(),
            trace_invocations: false,
            max_callbacks_per_hook: None,
            aliases: BTreeMap::new(),
        }
    }
}

impl LatchingConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Set the per-hook callback limit.
    pub fn with_max_callbacks_per_hook(mut self, max: usize) -> Self {
        self.max_callbacks_per_hook = Some(max);
        self
    }

    /// Enable or disable per-step tracing.
    pub fn with_trace_invocations(mut self, enabled: bool) -> Self {
        self.trace_invocations = enabled;
        self
    }

    /// Add a strategy alias.
    pub fn with_alias(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), target.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_callbacks_per_hook == Some(0) {
            return Err(ConfigError::Invalid(
                "max_callbacks_per_hook must be at least 1".to_string(),
            ));
        }

        for (alias, target) in &self.aliases {
            if alias.trim().is_empty() || target.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "empty strategy alias: \"{alias}\" -> \"{target}\""
                )));
            }
            // Aliases may only chain onto builtins or onto each other
            let known = (self.seed_builtins && BUILTIN_STRATEGIES.contains(&target.as_str()))
                || self.aliases.contains_key(target);
            if !known || self.alias_cycles(alias) {
                return Err(ConfigError::Invalid(format!(
                    "alias \"{alias}\" does not resolve to a known strategy"
                )));
            }
        }

        Ok(())
    }

    /// Aliases ordered so every alias comes after the alias it points to.
    pub(crate) fn ordered_aliases(&self) -> Vec<(&str, &str)> {
        let mut ordered: Vec<(&str, &str)> = Vec::with_capacity(self.aliases.len());
        let mut pending: Vec<(&str, &str)> = self
            .aliases
            .iter()
            .map(|(a, t)| (a.as_str(), t.as_str()))
            .collect();

        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|&(alias, target)| {
                let ready = !self.aliases.contains_key(target)
                    || ordered.iter().any(|&(done, _)| done == target);
                if ready {
                    ordered.push((alias, target));
                }
                !ready
            });
            if pending.len() == before {
                // Cycles are rejected by validate
                break;
            }
        }
        ordered
    }

    fn alias_cycles(&self, start: &str) -> bool {
        let mut current = start;
        for _ in 0..=self.aliases.len() {
            match self.aliases.get(current) {
                Some(next) if next == start => return true,
                Some(next) => current = next,
                None => return false,
            }
        }
        true
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
