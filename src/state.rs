//! # World state for Goal-Oriented Action Planning (GOAP)
//!
//! A [`WorldState`] is a snapshot of facts about the world or the agent. The
//! same structure plays four roles:
//!
//! - **World state**: what is true "now", handed to the planner
//! - **Goal**: the facts the planner must make simultaneously true
//! - **Preconditions**: facts that must hold before an action can run
//! - **Effects**: facts an action writes when it succeeds
//!
//! Keys are symbolic names, values are [`Value`]s compared by exact equality.
//! During planning states are never mutated in place: every search node gets
//! its own copy produced by [`merge`], so sibling branches cannot interfere.
//!
//! ```
//! use goap_agent::{matches, merge, Value, WorldState};
//!
//! let now = WorldState::new().with("has_axe", true).with("wood", 0);
//! let chop_effects = WorldState::new().with("wood", 3);
//!
//! let after = merge(&now, &chop_effects);
//! assert_eq!(after.get("wood"), Some(&Value::Int(3)));
//! assert_eq!(now.get("wood"), Some(&Value::Int(0)));
//!
//! let goal = WorldState::new().with("wood", 3);
//! assert!(!matches(&goal, &now));
//! assert!(matches(&goal, &after));
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

/// An opaque, exactly comparable fact value.
///
/// Values of different variants never compare equal, so `Bool(true)` does not
/// match `Int(1)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// A symbolic constant such as `"town"` or `"sword"`
    Atom(String),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Atom(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Atom(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Atom(a) => write!(f, "{}", a),
        }
    }
}

/// A single `(key, value)` pair.
///
/// Two facts are equal iff both key and value are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fact {
    pub key: String,
    pub value: Value,
}

impl Fact {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.value)
    }
}

/// A set of facts with at most one value per key.
///
/// Setting a key that is already present overwrites its value. Iteration is
/// ordered by key, which keeps debug output and DOT exports stable.
///
/// # Examples
///
/// ```
/// use goap_agent::{Value, WorldState};
///
/// let mut state = WorldState::new();
/// state.set("door_open", false);
/// state.set("location", "hall");
/// state.set("door_open", true);
///
/// assert_eq!(state.len(), 2);
/// assert_eq!(state.get("door_open"), Some(&Value::Bool(true)));
/// assert_eq!(state.to_string(), "{door_open: true, location: hall}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldState {
    values: BTreeMap<String, Value>,
}

impl WorldState {
    /// Creates a new empty state.
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`WorldState::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, replacing any previous value for that key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes `key`, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.values.iter()
    }

    /// Iterates over the state as owned [`Fact`]s.
    pub fn facts(&self) -> impl Iterator<Item = Fact> + '_ {
        self.values.iter().map(|(key, value)| Fact {
            key: key.clone(),
            value: value.clone(),
        })
    }

    /// Returns `true` if every fact in `required` is present here with an
    /// equal value. Extra facts in `self` are ignored.
    ///
    /// Method form of [`matches`].
    pub fn satisfies(&self, required: &WorldState) -> bool {
        required
            .values
            .iter()
            .all(|(key, value)| self.values.get(key) == Some(value))
    }

    /// Returns a copy of this state with `changes` written over it.
    ///
    /// Method form of [`merge`].
    pub fn merged(&self, changes: &WorldState) -> WorldState {
        let mut state = self.clone();
        state.apply(changes);
        state
    }

    /// Writes every fact of `changes` into this state in place.
    pub fn apply(&mut self, changes: &WorldState) {
        for (key, value) in changes.values.iter() {
            self.values.insert(key.clone(), value.clone());
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = WorldState::new();
        state.extend(iter);
        state
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for WorldState {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

impl FromIterator<Fact> for WorldState {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        iter.into_iter().map(|fact| (fact.key, fact.value)).collect()
    }
}

impl<'a> IntoIterator for &'a WorldState {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// Derives a new state from `base` with `changes` applied.
///
/// Keys present in `changes` take the new value whether or not `base` had
/// them; keys untouched by `changes` are carried over. `base` is not modified.
pub fn merge(base: &WorldState, changes: &WorldState) -> WorldState {
    base.merged(changes)
}

/// Returns `true` iff every fact of `required` appears in `state` with the
/// same key and the same value. A missing key and a different value are both
/// a mismatch.
pub fn matches(required: &WorldState, state: &WorldState) -> bool {
    state.satisfies(required)
}
