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

//! Latching Plugin System
//!
//! Bundles of hook registrations attached to a
//! [`Latching`](latching_core::Latching) registry through a
//! `use`/`unuse` lifecycle.
//!
//! # Example
//!
//! ```rust
//! use latching_core::{LatchId, Latching};
//! use latching_plugins::{LatchingPlugin, PluginHost, PluginSource};
//! use serde_json::{json, Value};
//!
//! #[derive(Default)]
//! struct Audit {
//!     latched: Option<LatchId>,
//! }
//!
//! impl LatchingPlugin for Audit {
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//!
//!     fn on_use(&mut self, latching: &mut Latching, options: &Value) -> anyhow::Result<()> {
//!         let level = options.get("level").cloned().unwrap_or(json!("info"));
//!         self.latched = Some(latching.latch("log-level", move |_| Ok(level.clone()))?);
//!         Ok(())
//!     }
//!
//!     fn on_unuse(&mut self, latching: &mut Latching) -> anyhow::Result<()> {
//!         if let Some(id) = self.latched.take() {
//!             latching.unlatch("log-level", id)?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut host = PluginHost::default();
//! let id = host.use_plugin(PluginSource::factory(Audit::default), Some(json!({"level": "debug"})))?;
//! assert_eq!(host.latching().hook("log-level", "pass", &[])?, json!("debug"));
//!
//! host.unuse_plugin(id)?;
//! assert_eq!(host.latching().hook("log-level", "pass", &[])?, Value::Null);
//! # Ok::<(), latching_plugins::PluginError>(())
//! ```

pub mod error;
pub mod host;
pub mod plugin;

// Re-exports
pub use error::{LifecycleStage, PluginError, PluginResult};
pub use host::PluginHost;
pub use plugin::{LatchingPlugin, PluginFactory, PluginSource};
