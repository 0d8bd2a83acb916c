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

//! Plugin error types

use latching_core::{LatchId, LatchingError};
use thiserror::Error;

/// Result type for plugin operations
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while attaching or detaching plugins
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No such plugin: {0}")]
    UnknownPlugin(LatchId),

    #[error("Plugin \"{plugin}\" failed to {stage}: {source}")]
    Lifecycle {
        plugin: String,
        stage: LifecycleStage,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Latching(#[from] LatchingError),
}

/// Plugin lifecycle stage, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Use,
    Unuse,
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleStage::Use => f.write_str("attach"),
            LifecycleStage::Unuse => f.write_str("detach"),
        }
    }
}
