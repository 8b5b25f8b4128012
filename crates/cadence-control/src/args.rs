// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Arguments threaded through an Action tree on every run.

use cadence_core::State;
use std::{any::Any, collections::BTreeMap, fmt, sync::Arc};

/// A dynamically typed argument value.
#[derive(Clone)]
pub enum ArgValue {
    /// A flag.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Text(String),
    /// A State of some Space.
    State(State),
    /// Any shared value, recovered with [`ArgValue::downcast`].
    Shared(Arc<dyn Any + Send + Sync>),
}

impl ArgValue {
    /// Wraps an arbitrary value.
    pub fn shared<T: Any + Send + Sync>(value: T) -> Self {
        ArgValue::Shared(Arc::new(value))
    }

    /// The flag, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ArgValue::Float(f) => Some(*f),
            ArgValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The string, if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ArgValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The State, if this is a `State`.
    pub fn as_state(&self) -> Option<&State> {
        match self {
            ArgValue::State(s) => Some(s),
            _ => None,
        }
    }

    /// The shared value, if this is a `Shared` holding a `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            ArgValue::Shared(value) => Arc::clone(value).downcast::<T>().ok(),
            _ => None,
        }
    }
}

impl fmt::Debug for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "Bool({b})"),
            ArgValue::Int(i) => write!(f, "Int({i})"),
            ArgValue::Float(x) => write!(f, "Float({x})"),
            ArgValue::Text(s) => write!(f, "Text({s:?})"),
            ArgValue::State(s) => write!(f, "State({s})"),
            ArgValue::Shared(_) => write!(f, "Shared(..)"),
        }
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Bool(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Int(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Int(value.into())
    }
}

impl From<u64> for ArgValue {
    fn from(value: u64) -> Self {
        ArgValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Float(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<State> for ArgValue {
    fn from(value: State) -> Self {
        ArgValue::State(value)
    }
}

impl From<&State> for ArgValue {
    fn from(value: &State) -> Self {
        ArgValue::State(value.clone())
    }
}

/// Positional and named arguments of one Action run.
///
/// Named arguments are merged on the way down the tree: an Action's default
/// parameters are overridden by the caller's named arguments, which are in
/// turn overridden by the Action's freshly evaluated lambdas.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Arguments by position, passed down unchanged.
    pub positional: Vec<ArgValue>,
    /// Arguments by name.
    pub named: BTreeMap<String, ArgValue>,
}

impl Args {
    /// Creates empty arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named argument, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Appends a positional argument, builder style.
    pub fn with_positional(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a named argument.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.named.insert(key.into(), value.into());
    }

    /// The named argument `key`.
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.named.get(key)
    }

    /// Returns `true` if `key` is set.
    pub fn contains(&self, key: &str) -> bool {
        self.named.contains_key(key)
    }

    /// `key` as a float; integers widen.
    pub fn float(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ArgValue::as_float)
    }

    /// `key` as an integer.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ArgValue::as_int)
    }

    /// A missing flag reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(ArgValue::as_bool).unwrap_or(false)
    }

    /// `key` as a string.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ArgValue::as_text)
    }

    /// `key` as a State.
    pub fn state(&self, key: &str) -> Option<&State> {
        self.get(key).and_then(ArgValue::as_state)
    }

    /// `key` as a shared `T`.
    pub fn shared<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key).and_then(ArgValue::downcast::<T>)
    }

    /// `defaults < self < lambdas`; positional arguments are kept as given.
    pub(crate) fn merged(
        &self,
        defaults: &BTreeMap<String, ArgValue>,
        lambdas: Vec<(String, ArgValue)>,
    ) -> Args {
        let mut named = defaults.clone();
        named.extend(self.named.iter().map(|(k, v)| (k.clone(), v.clone())));
        named.extend(lambdas);
        Args {
            positional: self.positional.clone(),
            named,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::Space;

    #[test]
    fn typed_getters() {
        let space = Space::from_names(["x"]).unwrap();
        let args = Args::new()
            .with("gain", 2.5)
            .with("steps", 3)
            .with("verbose", true)
            .with("label", "pid")
            .with("x0", space.zeros())
            .with("payload", ArgValue::shared(vec![1u8, 2, 3]));

        assert_eq!(args.float("gain"), Some(2.5));
        assert_eq!(args.float("steps"), Some(3.0));
        assert_eq!(args.int("steps"), Some(3));
        assert!(args.flag("verbose"));
        assert!(!args.flag("calltree"));
        assert_eq!(args.text("label"), Some("pid"));
        assert_eq!(args.state("x0").map(State::len), Some(1));
        assert_eq!(
            args.shared::<Vec<u8>>("payload").as_deref(),
            Some(&vec![1u8, 2, 3])
        );
        assert!(args.shared::<String>("payload").is_none());
        assert_eq!(args.int("gain"), None);
    }

    #[test]
    fn merge_precedence() {
        let mut defaults = BTreeMap::new();
        defaults.insert("a".to_string(), ArgValue::Int(1));
        defaults.insert("b".to_string(), ArgValue::Int(1));
        defaults.insert("c".to_string(), ArgValue::Int(1));

        let caller = Args::new().with("b", 2).with("c", 2).with_positional(7);
        let merged = caller.merged(&defaults, vec![("c".to_string(), ArgValue::Int(3))]);

        assert_eq!(merged.int("a"), Some(1));
        assert_eq!(merged.int("b"), Some(2));
        assert_eq!(merged.int("c"), Some(3));
        assert_eq!(merged.positional.len(), 1);
    }
}
