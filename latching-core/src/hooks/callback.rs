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

//! Latched callback traits and per-call state.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Identifier handed out for every latched callback (and every plugin).
///
/// Identifiers come from a single counter per registry and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LatchId(pub u64);

impl fmt::Display for LatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// State handed to a callback for one step of a hook invocation.
///
/// Each callback gets its own `HookCall`, so cancelling only affects the
/// invocation that is currently running.
pub struct HookCall<'a> {
    hook: &'a str,
    args: &'a [Value],
    accumulator: &'a Value,
    context: Option<&'a Value>,
    cancelled: bool,
}

impl<'a> HookCall<'a> {
    pub(crate) fn new(
        hook: &'a str,
        args: &'a [Value],
        accumulator: &'a Value,
        context: Option<&'a Value>,
    ) -> Self {
        Self {
            hook,
            args,
            accumulator,
            context,
            cancelled: false,
        }
    }

    /// Name of the hook being invoked.
    pub fn hook(&self) -> &'a str {
        self.hook
    }

    /// Positional arguments the hook was invoked with.
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Positional argument at `index`, if supplied.
    pub fn arg(&self, index: usize) -> Option<&'a Value> {
        self.args.get(index)
    }

    /// Result accumulated by the callbacks that ran before this one.
    pub fn accumulator(&self) -> &'a Value {
        self.accumulator
    }

    /// Context value stored when the callback was latched.
    pub fn context(&self) -> Option<&'a Value> {
        self.context
    }

    /// Stop the hook invocation after this callback returns.
    ///
    /// The callback's return value is still folded into the result.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Whether [`cancel`](Self::cancel) was called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A callback that can be latched into a hook.
///
/// Implemented for every `Fn(&mut HookCall<'_>) -> anyhow::Result<Value>`
/// closure; implement it directly for callbacks that carry their own state.
pub trait HookCallback: Send + Sync {
    /// Run the callback and return its contribution to the hook result.
    fn call(&self, call: &mut HookCall<'_>) -> anyhow::Result<Value>;
}

impl<F> HookCallback for F
where
    F: Fn(&mut HookCall<'_>) -> anyhow::Result<Value> + Send + Sync,
{
    fn call(&self, call: &mut HookCall<'_>) -> anyhow::Result<Value> {
        self(call)
    }
}

/// Shared handle to a latched callback.
pub type SharedCallback = Arc<dyn HookCallback>;

/// Options for [`Latching::latch_with`](super::Latching::latch_with).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatchOptions {
    /// Context value made available to the callback on every call.
    pub context: Option<Value>,
    /// Insert the callback before every callback already latched.
    pub prepend: bool,
}

impl LatchOptions {
    /// Append without context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a context value.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Insert at the front of the hook's callback list.
    pub fn prepend(mut self) -> Self {
        self.prepend = true;
        self
    }
}

/// A callback latched into a hook slot.
#[derive(Clone)]
pub struct LatchedCallback {
    /// Identifier returned by `latch`.
    pub id: LatchId,
    /// The callback itself.
    pub callback: SharedCallback,
    /// Optional invocation context.
    pub context: Option<Value>,
}

impl fmt::Debug for LatchedCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LatchedCallback")
            .field("id", &self.id)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
