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

//! Reduction strategies.
//!
//! A reduction strategy decides how the values returned by every callback
//! latched into a hook collapse into the single value the hook returns. It is
//! a pair of functions: `init` produces the seed accumulator from the hook's
//! arguments and `step` folds one callback result into the accumulator.
//!
//! # Built-in strategies
//!
//! | name     | seed          | step                                      |
//! |----------|---------------|-------------------------------------------|
//! | `none`   | `null`        | discard the value                         |
//! | `pass`   | first argument| newest value wins                         |
//! | `or`     | `false`       | logical or (truthiness)                   |
//! | `and`    | `true`        | logical and (truthiness)                  |
//! | `mult`   | `1`           | numeric product                           |
//! | `add`    | `0`           | numeric sum                               |
//! | `append` | `""`          | text concatenation                        |
//! | `push`   | `[]`          | collect every value                       |
//! | `concat` | `[]`          | flatten array values                      |
//! | `insert` | `{}`          | set of values (value -> `true`)           |
//! | `assign` | `{}`          | shallow merge of objects, newest wins     |

use crate::error::{LatchingError, LatchingResult, StrategyError};
use crate::value;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Seed function: computes the initial accumulator from the hook arguments.
pub type InitFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// Merge function: folds a callback result into the accumulator.
pub type StepFn = Arc<dyn Fn(Value, Value) -> Result<Value, StrategyError> + Send + Sync>;

/// Names of the strategies every table starts with.
pub const BUILTIN_STRATEGIES: [&str; 11] = [
    "none", "pass", "or", "and", "mult", "add", "append", "push", "concat", "insert", "assign",
];

/// A named (init, step) pair.
#[derive(Clone)]
pub struct ReductionStrategy {
    name: String,
    init: InitFn,
    step: StepFn,
}

impl ReductionStrategy {
    /// Create a new strategy.
    pub fn new<I, S>(name: impl Into<String>, init: I, step: S) -> Self
    where
        I: Fn(&[Value]) -> Value + Send + Sync + 'static,
        S: Fn(Value, Value) -> Result<Value, StrategyError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            init: Arc::new(init),
            step: Arc::new(step),
        }
    }

    /// Strategy name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compute the seed accumulator for a hook invocation.
    pub fn init(&self, args: &[Value]) -> Value {
        (self.init)(args)
    }

    /// Fold a callback result into the accumulator.
    pub fn step(&self, accumulator: Value, value: Value) -> LatchingResult<Value> {
        (self.step)(accumulator, value).map_err(|source| LatchingError::Strategy {
            strategy: self.name.clone(),
            source,
        })
    }

    /// Same functions, different name.
    fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init: Arc::clone(&self.init),
            step: Arc::clone(&self.step),
        }
    }
}

impl fmt::Debug for ReductionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReductionStrategy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Table of reduction strategies indexed by name.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    strategies: HashMap<String, ReductionStrategy>,
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyTable {
    /// Create an empty table without any built-in strategies.
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create a table seeded with the built-in strategies.
    pub fn with_builtins() -> Self {
        let mut table = Self::empty();
        for strategy in builtins() {
            table.strategies.insert(strategy.name.clone(), strategy);
        }
        table
    }

    /// Register a strategy, replacing any existing strategy of the same name.
    pub fn register<I, S>(&mut self, name: &str, init: I, step: S) -> LatchingResult<&mut Self>
    where
        I: Fn(&[Value]) -> Value + Send + Sync + 'static,
        S: Fn(Value, Value) -> Result<Value, StrategyError> + Send + Sync + 'static,
    {
        self.insert(ReductionStrategy::new(name, init, step))
    }

    /// Register a prebuilt strategy under its own name.
    pub fn insert(&mut self, strategy: ReductionStrategy) -> LatchingResult<&mut Self> {
        validate_name(&strategy.name)?;
        let name = strategy.name.clone();
        let replaced = self.strategies.insert(name.clone(), strategy).is_some();
        tracing::debug!(strategy = %name, replaced, "Reduction strategy registered");
        Ok(self)
    }

    /// Make `alias` resolve to the strategy currently registered as `target`.
    pub fn alias(&mut self, alias: &str, target: &str) -> LatchingResult<&mut Self> {
        let strategy = self.lookup(target)?.renamed(alias);
        self.insert(strategy)
    }

    /// Look up a strategy by name.
    pub fn lookup(&self, name: &str) -> LatchingResult<&ReductionStrategy> {
        self.strategies
            .get(name)
            .ok_or_else(|| LatchingError::UnknownStrategy(name.to_string()))
    }

    /// Check whether a strategy is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    /// Registered strategy names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

fn validate_name(name: &str) -> LatchingResult<()> {
    if name.trim().is_empty() {
        return Err(LatchingError::invalid(
            "strategy name must be a non-empty string",
        ));
    }
    Ok(())
}

fn builtins() -> Vec<ReductionStrategy> {
    vec![
        ReductionStrategy::new("none", |_| Value::Null, |acc, _| Ok(acc)),
        ReductionStrategy::new(
            "pass",
            |args| args.first().cloned().unwrap_or(Value::Null),
            |_, new| Ok(new),
        ),
        ReductionStrategy::new(
            "or",
            |_| Value::Bool(false),
            |acc, new| Ok(Value::Bool(value::is_truthy(&acc) || value::is_truthy(&new))),
        ),
        ReductionStrategy::new(
            "and",
            |_| Value::Bool(true),
            |acc, new| Ok(Value::Bool(value::is_truthy(&acc) && value::is_truthy(&new))),
        ),
        ReductionStrategy::new("mult", |_| Value::from(1), |acc, new| value::mul(&acc, &new)),
        ReductionStrategy::new("add", |_| Value::from(0), |acc, new| value::add(&acc, &new)),
        ReductionStrategy::new("append", |_| Value::from(""), append),
        ReductionStrategy::new("push", |_| Value::Array(Vec::new()), push),
        ReductionStrategy::new("concat", |_| Value::Array(Vec::new()), concat),
        ReductionStrategy::new("insert", |_| Value::Object(Map::new()), insert),
        ReductionStrategy::new("assign", |_| Value::Object(Map::new()), assign),
    ]
}

fn append(acc: Value, new: Value) -> Result<Value, StrategyError> {
    let mut text = value::to_text(&acc);
    text.push_str(&value::to_text(&new));
    Ok(Value::String(text))
}

fn push(acc: Value, new: Value) -> Result<Value, StrategyError> {
    match acc {
        Value::Array(mut items) => {
            items.push(new);
            Ok(Value::Array(items))
        }
        other => Err(StrategyError::type_mismatch("array accumulator", &other)),
    }
}

fn concat(acc: Value, new: Value) -> Result<Value, StrategyError> {
    match acc {
        Value::Array(mut items) => {
            match new {
                Value::Array(more) => items.extend(more),
                single => items.push(single),
            }
            Ok(Value::Array(items))
        }
        other => Err(StrategyError::type_mismatch("array accumulator", &other)),
    }
}

fn insert(acc: Value, new: Value) -> Result<Value, StrategyError> {
    match acc {
        Value::Object(mut set) => {
            set.insert(value::to_text(&new), Value::Bool(true));
            Ok(Value::Object(set))
        }
        other => Err(StrategyError::type_mismatch("object accumulator", &other)),
    }
}

fn assign(acc: Value, new: Value) -> Result<Value, StrategyError> {
    let mut merged = match acc {
        Value::Object(map) => map,
        other => return Err(StrategyError::type_mismatch("object accumulator", &other)),
    };
    match new {
        Value::Object(fields) => merged.extend(fields),
        Value::Null => {}
        other => return Err(StrategyError::type_mismatch("object", &other)),
    }
    Ok(Value::Object(merged))
}
