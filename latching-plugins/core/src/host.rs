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

//! Plugin host - attaches plugins to a latching registry
//!
//! Owns the registry together with the plugins currently attached to it.
//! Plugin identifiers are drawn from the registry's own counter, so they
//! never collide with latched callback identifiers.

use crate::error::{LifecycleStage, PluginError, PluginResult};
use crate::plugin::{LatchingPlugin, PluginSource};
use latching_core::{LatchId, Latching};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attached plugin record
struct PluginRecord {
    plugin: Box<dyn LatchingPlugin>,
}

/// A latching registry plus the plugins attached to it
pub struct PluginHost {
    /// Registry the plugins latch into
    latching: Latching,
    /// Attached plugins by id, in attach order
    plugins: BTreeMap<LatchId, PluginRecord>,
}

impl Default for PluginHost {
    fn default() -> Self {
        Self::new(Latching::new())
    }
}

impl PluginHost {
    /// Create a host around an existing registry
    pub fn new(latching: Latching) -> Self {
        Self {
            latching,
            plugins: BTreeMap::new(),
        }
    }

    /// The underlying registry
    pub fn latching(&self) -> &Latching {
        &self.latching
    }

    /// Mutable access to the underlying registry
    pub fn latching_mut(&mut self) -> &mut Latching {
        &mut self.latching
    }

    /// Give up the host and keep the registry. Attached plugins are dropped
    /// without running `on_unuse`.
    pub fn into_inner(self) -> Latching {
        self.latching
    }

    /// Attach a plugin.
    ///
    /// `options` must be an object or absent; absent options are passed to the
    /// plugin as an empty object. If the plugin's `on_use` fails the plugin is
    /// not recorded, although the identifier it was given stays consumed.
    pub fn use_plugin(&mut self, source: PluginSource, options: Option<Value>) -> PluginResult<LatchId> {
        let options = match options {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(obj @ Value::Object(_)) => obj,
            Some(other) => {
                return Err(PluginError::InvalidArgument(format!(
                    "plugin options must be an object, got {}",
                    latching_core::value::type_name(&other)
                )))
            }
        };

        let mut plugin = source.into_plugin();
        let id = self.latching.next_id();

        plugin
            .on_use(&mut self.latching, &options)
            .map_err(|source| PluginError::Lifecycle {
                plugin: plugin.name().to_string(),
                stage: LifecycleStage::Use,
                source,
            })?;

        tracing::debug!(plugin = %plugin.name(), id = %id, "Plugin attached");
        self.plugins.insert(id, PluginRecord { plugin });

        Ok(id)
    }

    /// Detach a plugin by the identifier `use_plugin` returned.
    ///
    /// The plugin is removed even if its `on_unuse` fails.
    pub fn unuse_plugin(&mut self, id: LatchId) -> PluginResult<&mut Self> {
        let PluginRecord { mut plugin } = self
            .plugins
            .remove(&id)
            .ok_or(PluginError::UnknownPlugin(id))?;

        plugin
            .on_unuse(&mut self.latching)
            .map_err(|source| PluginError::Lifecycle {
                plugin: plugin.name().to_string(),
                stage: LifecycleStage::Unuse,
                source,
            })?;

        tracing::debug!(plugin = %plugin.name(), id = %id, "Plugin detached");
        Ok(self)
    }

    /// Number of attached plugins
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    /// Identifiers of attached plugins, in attach order
    pub fn plugin_ids(&self) -> Vec<LatchId> {
        self.plugins.keys().copied().collect()
    }

    /// Name of an attached plugin
    pub fn plugin_name(&self, id: LatchId) -> Option<&str> {
        self.plugins.get(&id).map(|record| record.plugin.name())
    }

    /// Check whether a plugin is attached
    pub fn is_attached(&self, id: LatchId) -> bool {
        self.plugins.contains_key(&id)
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("latching", &self.latching)
            .field("plugins", &self.plugin_ids())
            .finish()
    }
}
