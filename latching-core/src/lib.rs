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

//! Latching Core
//!
//! Run-time hook latching: named extension points ("hooks") into which any
//! number of callbacks can be latched. Invoking a hook runs its callbacks in
//! order and folds their return values into a single result using a named
//! reduction strategy.
//!
//! # Architecture
//!
//! - **Strategy table**: named (`init`, `step`) pairs, seeded with built-ins
//!   such as `and`, `or`, `add`, `push` and `assign`
//! - **Hook registry**: ordered callbacks per hook name, append or prepend,
//!   removal by identifier, cancellation from inside a callback
//!
//! Everything is synchronous. Hook arguments, callback results and hook
//! results are [`serde_json::Value`]s.
//!
//! # Example
//!
//! ```rust
//! use latching_core::Latching;
//! use serde_json::json;
//!
//! let mut latching = Latching::new();
//! for n in 1..=3 {
//!     latching.latch("numbers", move |_| Ok(json!(n)))?;
//! }
//! assert_eq!(latching.hook("numbers", "push", &[])?, json!([1, 2, 3]));
//! assert_eq!(latching.hook("numbers", "add", &[])?, json!(6));
//! # Ok::<(), latching_core::LatchingError>(())
//! ```

pub mod config;
pub mod error;
pub mod hooks;
pub mod strategy;
pub mod value;

// Re-exports
pub use config::{ConfigError, LatchingConfig};
pub use error::{LatchingError, LatchingResult, StrategyError};
pub use hooks::{HookCall, HookCallback, LatchId, LatchOptions, Latching};
pub use strategy::{ReductionStrategy, StrategyTable, BUILTIN_STRATEGIES};
