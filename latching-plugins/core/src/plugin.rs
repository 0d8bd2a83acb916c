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

//! Plugin trait and plugin sources.

use latching_core::Latching;
use serde_json::Value;
use std::fmt;

/// A bundle of hook registrations that can be attached to and detached from
/// a [`Latching`] registry as one unit.
///
/// `on_use` is mandatory; `on_unuse` defaults to doing nothing. A plugin that
/// latches callbacks typically keeps the returned identifiers and unlatches
/// them again in `on_unuse`.
pub trait LatchingPlugin: Send {
    /// Plugin name, used in logs and errors.
    fn name(&self) -> &str;

    /// Attach the plugin. `options` is always an object (empty when the
    /// caller passed none).
    fn on_use(&mut self, latching: &mut Latching, options: &Value) -> anyhow::Result<()>;

    /// Detach the plugin.
    fn on_unuse(&mut self, _latching: &mut Latching) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Boxed plugin factory.
pub type PluginFactory = Box<dyn FnOnce() -> Box<dyn LatchingPlugin> + Send>;

/// How a plugin is handed to [`PluginHost::use_plugin`](crate::PluginHost::use_plugin).
pub enum PluginSource {
    /// A ready-made plugin instance.
    Instance(Box<dyn LatchingPlugin>),
    /// A factory invoked once to construct the plugin.
    Factory(PluginFactory),
}

impl PluginSource {
    /// Wrap a plugin instance.
    pub fn instance(plugin: impl LatchingPlugin + 'static) -> Self {
        PluginSource::Instance(Box::new(plugin))
    }

    /// Wrap a factory function.
    pub fn factory<P, F>(factory: F) -> Self
    where
        P: LatchingPlugin + 'static,
        F: FnOnce() -> P + Send + 'static,
    {
        PluginSource::Factory(Box::new(move || Box::new(factory()) as Box<dyn LatchingPlugin>))
    }

    /// Produce the plugin, running the factory if needed.
    pub fn into_plugin(self) -> Box<dyn LatchingPlugin> {
        match self {
            PluginSource::Instance(plugin) => plugin,
            PluginSource::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::Instance(plugin) => f.debug_tuple("Instance").field(&plugin.name()).finish(),
            PluginSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}
