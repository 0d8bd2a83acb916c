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

//! Hook registry: latching, unlatching and invoking hooks.

use super::callback::{
    HookCall, HookCallback, LatchId, LatchOptions, LatchedCallback, SharedCallback,
};
use crate::config::LatchingConfig;
use crate::error::{LatchingError, LatchingResult};
use crate::strategy::StrategyTable;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of hooks and the callbacks latched into them.
///
/// Hooks are addressed by name and spring into existence on the first
/// [`latch`](Self::latch). Invoking a hook nobody latched into is fine: the
/// result is the seed value of the chosen reduction strategy.
///
/// # Example
///
/// ```
/// use latching_core::Latching;
/// use serde_json::json;
///
/// let mut latching = Latching::new();
/// let id = latching
///     .latch("access-allowed", |call| {
///         Ok(json!(call.arg(1) == Some(&json!("right-secret"))))
///     })
///     .unwrap();
///
/// let args = [json!("foo"), json!("wrong-secret")];
/// assert_eq!(latching.hook("access-allowed", "and", &args).unwrap(), json!(false));
///
/// latching.unlatch("access-allowed", id).unwrap();
/// assert_eq!(latching.hook("access-allowed", "and", &args).unwrap(), json!(true));
/// ```
pub struct Latching {
    /// Callbacks indexed by hook name, in invocation order.
    slots: HashMap<String, Vec<LatchedCallback>>,
    /// Reduction strategies.
    strategies: StrategyTable,
    /// Next identifier to hand out.
    next_id: u64,
    config: LatchingConfig,
}

impl Default for Latching {
    fn default() -> Self {
        Self::new()
    }
}

impl Latching {
    /// Create a registry with the default configuration.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            strategies: StrategyTable::with_builtins(),
            next_id: 0,
            config: LatchingConfig::default(),
        }
    }

    /// Create a registry from a configuration.
    pub fn with_config(config: LatchingConfig) -> LatchingResult<Self> {
        config
            .validate()
            .map_err(|e| LatchingError::invalid(e.to_string()))?;

        let mut strategies = if config.seed_builtins {
            StrategyTable::with_builtins()
        } else {
            StrategyTable::empty()
        };
        for (alias, target) in config.ordered_aliases() {
            strategies.alias(alias, target)?;
        }

        Ok(Self {
            slots: HashMap::new(),
            strategies,
            next_id: 0,
            config,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &LatchingConfig {
        &self.config
    }

    /// Reduction strategies known to this registry.
    pub fn strategies(&self) -> &StrategyTable {
        &self.strategies
    }

    /// Mutable access to the reduction strategies.
    pub fn strategies_mut(&mut self) -> &mut StrategyTable {
        &mut self.strategies
    }

    /// Define or replace a reduction strategy.
    pub fn register_strategy<I, S>(&mut self, name: &str, init: I, step: S) -> LatchingResult<&mut Self>
    where
        I: Fn(&[Value]) -> Value + Send + Sync + 'static,
        S: Fn(Value, Value) -> Result<Value, crate::StrategyError> + Send + Sync + 'static,
    {
        self.strategies.register(name, init, step)?;
        Ok(self)
    }

    /// Alias for [`register_strategy`](Self::register_strategy).
    pub fn proc<I, S>(&mut self, name: &str, init: I, step: S) -> LatchingResult<&mut Self>
    where
        I: Fn(&[Value]) -> Value + Send + Sync + 'static,
        S: Fn(Value, Value) -> Result<Value, crate::StrategyError> + Send + Sync + 'static,
    {
        self.register_strategy(name, init, step)
    }

    /// Allocate a fresh identifier from the registry's counter.
    ///
    /// Latched callbacks draw from the same counter, so an identifier
    /// obtained here never collides with one returned by `latch`.
    pub fn next_id(&mut self) -> LatchId {
        let id = LatchId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Latch a callback at the end of a hook's callback list.
    pub fn latch<F>(&mut self, name: &str, callback: F) -> LatchingResult<LatchId>
    where
        F: Fn(&mut HookCall<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.latch_shared(name, Arc::new(callback), LatchOptions::default())
    }

    /// Latch a callback with a context value and/or at the front of the list.
    pub fn latch_with<F>(
        &mut self,
        name: &str,
        callback: F,
        options: LatchOptions,
    ) -> LatchingResult<LatchId>
    where
        F: Fn(&mut HookCall<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.latch_shared(name, Arc::new(callback), options)
    }

    /// Alias for [`latch`](Self::latch).
    pub fn at<F>(&mut self, name: &str, callback: F) -> LatchingResult<LatchId>
    where
        F: Fn(&mut HookCall<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.latch(name, callback)
    }

    /// Alias for [`latch_with`](Self::latch_with).
    pub fn at_with<F>(
        &mut self,
        name: &str,
        callback: F,
        options: LatchOptions,
    ) -> LatchingResult<LatchId>
    where
        F: Fn(&mut HookCall<'_>) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.latch_with(name, callback, options)
    }

    /// Latch an already shared callback, e.g. a stateful [`HookCallback`]
    /// implementation.
    pub fn latch_shared(
        &mut self,
        name: &str,
        callback: SharedCallback,
        options: LatchOptions,
    ) -> LatchingResult<LatchId> {
        if name.is_empty() {
            return Err(LatchingError::invalid("hook name must be a non-empty string"));
        }
        if let Some(max) = self.config.max_callbacks_per_hook {
            let count = self.callback_count(name);
            if count >= max {
                return Err(LatchingError::invalid(format!(
                    "hook \"{name}\" already has {count} callbacks (max {max})"
                )));
            }
        }

        let id = self.next_id();
        let record = LatchedCallback {
            id,
            callback,
            context: options.context,
        };

        let slot = self.slots.entry(name.to_string()).or_default();
        if options.prepend {
            slot.insert(0, record);
        } else {
            slot.push(record);
        }

        tracing::debug!(
            hook = %name,
            id = %id,
            prepend = options.prepend,
            callback_count = slot.len(),
            "Callback latched"
        );

        Ok(id)
    }

    /// Remove a latched callback by the identifier `latch` returned.
    pub fn unlatch(&mut self, name: &str, id: LatchId) -> LatchingResult<&mut Self> {
        let slot = self
            .slots
            .get_mut(name)
            .ok_or_else(|| LatchingError::UnknownHook(name.to_string()))?;

        let index = slot
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| LatchingError::UnknownCallback {
                hook: name.to_string(),
                id,
            })?;
        slot.remove(index);

        tracing::debug!(hook = %name, id = %id, remaining = slot.len(), "Callback unlatched");

        Ok(self)
    }

    /// Invoke a hook.
    ///
    /// Seeds the result with the strategy's `init`, then calls every latched
    /// callback in order, folding each return value into the result with the
    /// strategy's `step`. A callback that cancels still contributes its value
    /// but no later callback runs. The first callback or strategy error aborts
    /// the invocation.
    pub fn hook(&self, name: &str, strategy: &str, args: &[Value]) -> LatchingResult<Value> {
        let strategy = self.strategies.lookup(strategy)?;
        let mut result = strategy.init(args);

        let Some(slot) = self.slots.get(name) else {
            return Ok(result);
        };
        if slot.is_empty() {
            return Ok(result);
        }

        tracing::debug!(
            hook = %name,
            strategy = %strategy.name(),
            callback_count = slot.len(),
            "Invoking hook"
        );

        for (position, record) in slot.iter().enumerate() {
            let mut call = HookCall::new(name, args, &result, record.context.as_ref());
            let value = record
                .callback
                .call(&mut call)
                .map_err(|source| LatchingError::Callback {
                    hook: name.to_string(),
                    id: record.id,
                    source,
                })?;
            let cancelled = call.is_cancelled();

            result = strategy.step(result, value)?;

            if self.config.trace_invocations {
                tracing::trace!(
                    hook = %name,
                    id = %record.id,
                    position,
                    result = %result,
                    "Hook step"
                );
            }

            if cancelled {
                tracing::debug!(
                    hook = %name,
                    id = %record.id,
                    skipped = slot.len() - position - 1,
                    "Hook invocation cancelled"
                );
                break;
            }
        }

        Ok(result)
    }

    /// Whether anything was ever latched into `name`.
    pub fn has_hook(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Number of callbacks currently latched into `name`.
    pub fn callback_count(&self, name: &str) -> usize {
        self.slots.get(name).map(Vec::len).unwrap_or(0)
    }

    /// Identifiers latched into `name`, in invocation order.
    pub fn latched_ids(&self, name: &str) -> Vec<LatchId> {
        self.slots
            .get(name)
            .map(|slot| slot.iter().map(|record| record.id).collect())
            .unwrap_or_default()
    }

    /// Names of every hook that was ever latched into, sorted.
    pub fn hook_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.slots.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for Latching {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Latching")
            .field("hooks", &self.hook_names())
            .field("strategies", &self.strategies.names())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn args(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| json!(v)).collect()
    }

    #[test]
    fn test_unlatched_hook_returns_seed() {
        let latching = Latching::new();
        assert_eq!(latching.hook("nobody", "and", &[]).unwrap(), json!(true));
        assert_eq!(latching.hook("nobody", "or", &[]).unwrap(), json!(false));
        assert_eq!(latching.hook("nobody", "add", &[]).unwrap(), json!(0));
        assert_eq!(
            latching.hook("nobody", "pass", &args(&["x"])).unwrap(),
            json!("x")
        );
        assert!(!latching.has_hook("nobody"));
    }

    #[test]
    fn test_unknown_strategy() {
        let mut latching = Latching::new();
        latching.latch("h", |_| Ok(json!(1))).unwrap();
        let err = latching.hook("h", "average", &[]).unwrap_err();
        assert!(matches!(err, LatchingError::UnknownStrategy(name) if name == "average"));
    }

    #[test]
    fn test_access_allowed_example() {
        let mut latching = Latching::new();
        latching.latch("access-allowed", |_| Ok(json!(true))).unwrap();
        let id = latching
            .latch("access-allowed", |call| {
                Ok(json!(call.arg(1) == Some(&json!("right-secret"))))
            })
            .unwrap();

        let wrong = args(&["foo", "wrong-secret"]);
        let right = args(&["foo", "right-secret"]);
        assert_eq!(latching.hook("access-allowed", "and", &wrong).unwrap(), json!(false));
        assert_eq!(latching.hook("access-allowed", "and", &right).unwrap(), json!(true));

        latching.unlatch("access-allowed", id).unwrap();
        assert_eq!(latching.hook("access-allowed", "and", &wrong).unwrap(), json!(true));
        assert_eq!(latching.hook("access-allowed", "and", &right).unwrap(), json!(true));
    }

    #[test]
    fn test_push_collects_in_order() {
        let mut latching = Latching::new();
        for n in 1..=3 {
            latching.latch("numbers", move |_| Ok(json!(n))).unwrap();
        }
        assert_eq!(latching.hook("numbers", "push", &[]).unwrap(), json!([1, 2, 3]));
    }

    #[test]
    fn test_invocation_order_with_prepend() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut latching = Latching::new();

        for name in ["A", "B"] {
            let order = order.clone();
            latching
                .latch("ordered", move |_| {
                    order.lock().push(name);
                    Ok(Value::Null)
                })
                .unwrap();
        }
        let recorder = order.clone();
        latching
            .latch_with(
                "ordered",
                move |_| {
                    recorder.lock().push("C");
                    Ok(Value::Null)
                },
                LatchOptions::new().prepend(),
            )
            .unwrap();

        latching.hook("ordered", "none", &[]).unwrap();
        assert_eq!(order.lock().as_slice(), &["C", "A", "B"]);
    }

    #[test]
    fn test_cancel_stops_later_callbacks() {
        let executed = Arc::new(AtomicUsize::new(0));
        let mut latching = Latching::new();

        latching.latch("sum", |_| Ok(json!(1))).unwrap();
        latching
            .latch("sum", |call| {
                call.cancel();
                Ok(json!(10))
            })
            .unwrap();
        let count = executed.clone();
        latching
            .latch("sum", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(json!(100))
            })
            .unwrap();

        assert_eq!(latching.hook("sum", "add", &[]).unwrap(), json!(11));
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cancellation_is_per_invocation() {
        let mut latching = Latching::new();
        latching
            .latch("maybe", |call| {
                if call.arg(0) == Some(&json!("stop")) {
                    call.cancel();
                }
                Ok(json!("a"))
            })
            .unwrap();
        latching.latch("maybe", |_| Ok(json!("b"))).unwrap();

        assert_eq!(latching.hook("maybe", "append", &args(&["stop"])).unwrap(), json!("a"));
        assert_eq!(latching.hook("maybe", "append", &args(&["go"])).unwrap(), json!("ab"));
    }

    #[test]
    fn test_callback_sees_accumulator() {
        let mut latching = Latching::new();
        latching.latch("double", |_| Ok(json!(3))).unwrap();
        latching
            .latch("double", |call| Ok(call.accumulator().clone()))
            .unwrap();
        assert_eq!(latching.hook("double", "add", &[]).unwrap(), json!(6));
    }

    #[test]
    fn test_context_passed_to_callback() {
        let mut latching = Latching::new();
        latching
            .latch_with(
                "greet",
                |call| {
                    let greeting = call
                        .context()
                        .and_then(Value::as_str)
                        .unwrap_or("hello");
                    let who = call.arg(0).map(value::to_text).unwrap_or_default();
                    Ok(json!(format!("{greeting}, {who}")))
                },
                LatchOptions::new().with_context(json!("hi")),
            )
            .unwrap();
        assert_eq!(
            latching.hook("greet", "pass", &args(&["bob"])).unwrap(),
            json!("hi, bob")
        );
    }

    #[test]
    fn test_callback_error_aborts() {
        let executed = Arc::new(AtomicUsize::new(0));
        let mut latching = Latching::new();
        let failing = latching
            .latch("fragile", |_| Err(anyhow::anyhow!("boom")))
            .unwrap();
        let count = executed.clone();
        latching
            .latch("fragile", move |_| {
                count.fetch_add(1, Ordering::SeqCst);
                Ok(json!(true))
            })
            .unwrap();

        let err = latching.hook("fragile", "and", &[]).unwrap_err();
        assert!(matches!(
            err,
            LatchingError::Callback { ref hook, id, .. } if hook == "fragile" && id == failing
        ));
        assert_eq!(executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_strategy_error_propagates() {
        let mut latching = Latching::new();
        latching.latch("total", |_| Ok(json!("not a number"))).unwrap();
        let err = latching.hook("total", "add", &[]).unwrap_err();
        assert!(matches!(err, LatchingError::Strategy { .. }));
    }

    #[test]
    fn test_unlatch_errors() {
        let mut latching = Latching::new();
        assert!(matches!(
            latching.unlatch("never", LatchId(0)),
            Err(LatchingError::UnknownHook(_))
        ));

        let id = latching.latch("h", |_| Ok(Value::Null)).unwrap();
        latching.unlatch("h", id).unwrap();
        assert!(matches!(
            latching.unlatch("h", id),
            Err(LatchingError::UnknownCallback { id: stale, .. }) if stale == id
        ));
        // Slot persists after its last callback is gone
        assert!(latching.has_hook("h"));
        assert_eq!(latching.callback_count("h"), 0);
    }

    #[test]
    fn test_unlatch_wrong_hook() {
        let mut latching = Latching::new();
        let id = latching.latch("a", |_| Ok(Value::Null)).unwrap();
        latching.latch("b", |_| Ok(Value::Null)).unwrap();
        assert!(matches!(
            latching.unlatch("b", id),
            Err(LatchingError::UnknownCallback { .. })
        ));
        assert_eq!(latching.callback_count("a"), 1);
    }

    #[test]
    fn test_unlatch_preserves_order() {
        let mut latching = Latching::new();
        let ids: Vec<LatchId> = (0..4)
            .map(|n| latching.latch("seq", move |_| Ok(json!(n))).unwrap())
            .collect();
        latching.unlatch("seq", ids[1]).unwrap();
        assert_eq!(latching.hook("seq", "push", &[]).unwrap(), json!([0, 2, 3]));
        assert_eq!(latching.latched_ids("seq"), vec![ids[0], ids[2], ids[3]]);
    }

    #[test]
    fn test_ids_unique_across_hooks() {
        let mut latching = Latching::new();
        let a = latching.latch("a", |_| Ok(Value::Null)).unwrap();
        let b = latching.at("b", |_| Ok(Value::Null)).unwrap();
        latching.unlatch("a", a).unwrap();
        let c = latching.latch("a", |_| Ok(Value::Null)).unwrap();
        let d = latching.next_id();

        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn test_empty_hook_name_rejected() {
        let mut latching = Latching::new();
        assert!(matches!(
            latching.latch("", |_| Ok(Value::Null)),
            Err(LatchingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_register_strategy_overwrites() {
        let mut latching = Latching::new();
        latching.latch("h", |_| Ok(json!(2))).unwrap();
        assert_eq!(latching.hook("h", "add", &[]).unwrap(), json!(2));

        latching
            .register_strategy("add", |_| json!(40), |acc, new| value::add(&acc, &new))
            .unwrap();
        assert_eq!(latching.hook("h", "add", &[]).unwrap(), json!(42));
    }

    #[test]
    fn test_custom_strategy_via_proc() {
        let mut latching = Latching::new();
        latching
            .proc(
                "max",
                |_| Value::Null,
                |acc, new| {
                    Ok(match (acc.as_f64(), new.as_f64()) {
                        (Some(a), Some(b)) if a >= b => acc,
                        (_, Some(_)) => new,
                        _ => acc,
                    })
                },
            )
            .unwrap();
        for n in [3, 9, 4] {
            latching.latch("scores", move |_| Ok(json!(n))).unwrap();
        }
        assert_eq!(latching.hook("scores", "max", &[]).unwrap(), json!(9));
    }

    #[test]
    fn test_config_limit() {
        let config = LatchingConfig::default().with_max_callbacks_per_hook(1);
        let mut latching = Latching::with_config(config).unwrap();
        latching.latch("one", |_| Ok(Value::Null)).unwrap();
        assert!(matches!(
            latching.latch("one", |_| Ok(Value::Null)),
            Err(LatchingError::InvalidArgument(_))
        ));
        latching.latch("other", |_| Ok(Value::Null)).unwrap();
    }

    #[test]
    fn test_config_aliases_and_bare_table() {
        let config = LatchingConfig::default()
            .with_alias("any", "or")
            .with_alias("either", "any");
        let latching = Latching::with_config(config).unwrap();
        assert_eq!(latching.hook("h", "either", &[]).unwrap(), json!(false));

        let bare = Latching::with_config(LatchingConfig {
            seed_builtins: false,
            ..LatchingConfig::default()
        })
        .unwrap();
        assert!(bare.strategies().is_empty());
        assert!(matches!(
            bare.hook("h", "and", &[]),
            Err(LatchingError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = LatchingConfig::default().with_max_callbacks_per_hook(0);
        assert!(matches!(
            Latching::with_config(config),
            Err(LatchingError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_stateful_callback_latched_shared() {
        struct Counter(AtomicUsize);

        impl HookCallback for Counter {
            fn call(&self, _call: &mut HookCall<'_>) -> anyhow::Result<Value> {
                Ok(json!(self.0.fetch_add(1, Ordering::SeqCst)))
            }
        }

        let counter = Arc::new(Counter(AtomicUsize::new(0)));
        let mut latching = Latching::new();
        latching
            .latch_shared("tick", counter.clone(), LatchOptions::new())
            .unwrap();

        assert_eq!(latching.hook("tick", "pass", &[]).unwrap(), json!(0));
        assert_eq!(latching.hook("tick", "pass", &[]).unwrap(), json!(1));
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }
}
