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

//! Latching error types

use crate::hooks::LatchId;
use thiserror::Error;

/// Result type for latching operations
pub type LatchingResult<T> = Result<T, LatchingError>;

/// Errors that can occur while registering strategies, latching callbacks
/// or invoking hooks
#[derive(Debug, Error)]
pub enum LatchingError {
    // Argument errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Lookup errors
    #[error("No such hook: \"{0}\"")]
    UnknownHook(String),

    #[error("No latched callback {id} on hook \"{hook}\"")]
    UnknownCallback { hook: String, id: LatchId },

    #[error("No such reduction strategy: \"{0}\"")]
    UnknownStrategy(String),

    // Invocation errors
    #[error("Reduction strategy \"{strategy}\" failed: {source}")]
    Strategy {
        strategy: String,
        #[source]
        source: StrategyError,
    },

    #[error("Callback {id} on hook \"{hook}\" failed: {source}")]
    Callback {
        hook: String,
        id: LatchId,
        #[source]
        source: anyhow::Error,
    },
}

/// Errors raised by a reduction strategy's `step` function
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("numeric result is not representable: {0}")]
    NotRepresentable(String),

    #[error("{0}")]
    Other(String),
}

impl StrategyError {
    /// Build a type mismatch error describing the offending value
    pub fn type_mismatch(expected: &'static str, actual: &serde_json::Value) -> Self {
        StrategyError::TypeMismatch {
            expected,
            actual: crate::value::type_name(actual).to_string(),
        }
    }
}

impl LatchingError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid(message: impl Into<String>) -> Self {
        LatchingError::InvalidArgument(message.into())
    }
}
