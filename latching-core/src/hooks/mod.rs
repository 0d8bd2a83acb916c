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

//! Hook latching infrastructure.
//!
//! Callbacks are latched into named hooks and run, in order, whenever the
//! hook is invoked:
//!
//! - **Latch**: append (or prepend) a callback, receiving a [`LatchId`]
//! - **Unlatch**: remove exactly that callback again
//! - **Hook**: run every callback, folding the results with a reduction strategy
//!
//! # Example
//!
//! ```rust
//! use latching_core::hooks::{Latching, LatchOptions};
//! use serde_json::json;
//!
//! let mut latching = Latching::new();
//! latching.latch("render", |_| Ok(json!("<body>")))?;
//! latching.latch_with("render", |_| Ok(json!("<head>")), LatchOptions::new().prepend())?;
//!
//! assert_eq!(latching.hook("render", "append", &[])?, json!("<head><body>"));
//! # Ok::<(), latching_core::LatchingError>(())
//! ```

mod callback;
mod registry;

pub use callback::{HookCall, HookCallback, LatchId, LatchOptions, LatchedCallback, SharedCallback};
pub use registry::Latching;
