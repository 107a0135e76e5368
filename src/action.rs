//! # Actions for Goal-Oriented Action Planning (GOAP)
//!
//! An action is split into two halves:
//!
//! * [`Action`]: the immutable definition the planner reasons about (name,
//!   cost, preconditions, effects, whether the agent must be in range).
//! * [`Behavior`]: the domain hooks that decide whether the action can run
//!   for a given agent right now, and that actually perform it.
//!
//! Anything that changes between planning attempts (the bound target and the
//! in-range flag) lives in a [`Binding`], one per catalog entry, owned by the
//! caller. Definitions can therefore be shared freely; only bindings and
//! behaviors are per agent.
//!
//! ```
//! use goap_agent::{Action, ActionCatalog, Binding, Behavior, Bindings, Target};
//!
//! struct Field {
//!     wheat_at: Option<u64>,
//! }
//!
//! struct CollectWheat;
//!
//! impl Behavior<Field> for CollectWheat {
//!     fn can_be_performed(&mut self, field: &Field, binding: &mut Binding) -> bool {
//!         match field.wheat_at {
//!             Some(id) => {
//!                 binding.bind(Target(id));
//!                 true
//!             }
//!             None => false,
//!         }
//!     }
//!
//!     fn perform(&mut self, _field: &mut Field, _binding: &Binding) -> bool {
//!         true
//!     }
//!
//!     fn is_done(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let collect = Action::named("collect_wheat")
//!     .unwrap()
//!     .with_effect("has_wheat", true)
//!     .requiring_range();
//!
//! let mut catalog = ActionCatalog::new();
//! let id = catalog.register(collect, CollectWheat).unwrap();
//!
//! let mut bindings = Bindings::new();
//! let usable = catalog.prepare(&Field { wheat_at: Some(7) }, &mut bindings);
//! assert_eq!(usable, vec![id]);
//! assert_eq!(bindings.get(id).and_then(|b| b.target), Some(Target(7)));
//! ```

use std::fmt;

use crate::{GoapError, Result, Value, WorldState};

/// Cost used by [`Action::named`]
pub const DEFAULT_COST: f32 = 1.0;

/// Position of an action inside the slice or catalog it was planned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(usize);

impl ActionId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a world entity an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target(pub u64);

/// Per-attempt execution state of one action.
///
/// Cleared before every planning attempt; `target` may be filled by
/// [`Behavior::can_be_performed`], `in_range` is set once the motion
/// controller reports arrival.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Binding {
    pub target: Option<Target>,
    pub in_range: bool,
}

impl Binding {
    pub fn bind(&mut self, target: Target) {
        self.target = Some(target);
    }

    pub fn reset(&mut self) {
        self.target = None;
        self.in_range = false;
    }
}

/// Bindings for every entry of a catalog, indexed by [`ActionId`].
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    slots: Vec<Binding>,
}

impl Bindings {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Discards every binding and allocates `len` fresh ones.
    pub fn reset(&mut self, len: usize) {
        self.slots.clear();
        self.slots.resize(len, Binding::default());
    }

    pub fn get(&self, id: ActionId) -> Option<&Binding> {
        self.slots.get(id.0)
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut Binding> {
        self.slots.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The planning-visible definition of an action.
///
/// # Examples
///
/// ```
/// use goap_agent::{Action, WorldState};
///
/// let mut buy_food = Action::new("buy_food", 2.0).unwrap();
/// buy_food.preconditions.set("at_store", true);
/// buy_food.preconditions.set("has_money", true);
/// buy_food.effects.set("has_food", true);
///
/// let state = WorldState::new().with("at_store", true).with("has_money", true);
/// assert!(buy_food.can_perform(&state));
/// assert!(!buy_food.can_perform(&WorldState::new()));
///
/// // Negative costs are rejected
/// assert!(Action::new("invalid", -1.0).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub name: String,
    /// Non-negative cost added to the running cost of any plan using this action
    pub cost: f32,
    /// Facts that must hold exactly before the action can be chosen
    pub preconditions: WorldState,
    /// Facts written over the state when the action succeeds
    pub effects: WorldState,
    /// The agent must reach the bound target before performing
    pub requires_in_range: bool,
}

impl Action {
    /// Creates an action with no preconditions or effects.
    ///
    /// # Errors
    ///
    /// Returns `GoapError::EmptyActionName` for an empty name and
    /// `GoapError::InvalidActionCost` if `cost` is negative, NaN or infinite.
    /// A zero cost is allowed.
    pub fn new(name: impl Into<String>, cost: f32) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(GoapError::EmptyActionName);
        }
        if !cost.is_finite() || cost < 0.0 {
            return Err(GoapError::InvalidActionCost(cost));
        }

        Ok(Self {
            name,
            cost,
            preconditions: WorldState::new(),
            effects: WorldState::new(),
            requires_in_range: false,
        })
    }

    /// Creates an action with [`DEFAULT_COST`].
    pub fn named(name: impl Into<String>) -> Result<Self> {
        Self::new(name, DEFAULT_COST)
    }

    pub fn with_precondition(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.preconditions.set(key, value);
        self
    }

    pub fn with_effect(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.effects.set(key, value);
        self
    }

    /// Marks the action as needing the agent next to its target.
    pub fn requiring_range(mut self) -> Self {
        self.requires_in_range = true;
        self
    }

    /// Returns `true` if the preconditions hold exactly in `state`.
    pub fn can_perform(&self, state: &WorldState) -> bool {
        state.satisfies(&self.preconditions)
    }

    /// Writes the effects into `state` in place.
    pub fn apply_effects(&self, state: &mut WorldState) {
        state.apply(&self.effects);
    }

    /// Returns the state that results from applying the effects to `state`.
    pub fn outcome(&self, state: &WorldState) -> WorldState {
        state.merged(&self.effects)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Domain hooks of an action, implemented per agent type `A`.
///
/// A behavior instance belongs to exactly one agent's catalog; it may keep
/// its own progress counters between ticks.
pub trait Behavior<A> {
    /// Clears domain-specific state before a planning attempt.
    fn reset(&mut self) {}

    /// Decides whether the action is usable for this planning attempt.
    ///
    /// Actions that return `false` are excluded from the whole search.
    /// This is also where the target gets bound.
    fn can_be_performed(&mut self, agent: &A, binding: &mut Binding) -> bool;

    /// Runs one tick of the action. Returning `false` aborts the plan.
    fn perform(&mut self, agent: &mut A, binding: &Binding) -> bool;

    /// Reports whether the action has finished and the next one may start.
    fn is_done(&self) -> bool;
}

/// A behavior that is always usable and finishes after one successful perform.
#[derive(Debug, Clone, Default)]
pub struct OneShot {
    done: bool,
}

impl OneShot {
    pub fn new() -> Self {
        Self { done: false }
    }
}

impl<A> Behavior<A> for OneShot {
    fn reset(&mut self) {
        self.done = false;
    }

    fn can_be_performed(&mut self, _agent: &A, _binding: &mut Binding) -> bool {
        true
    }

    fn perform(&mut self, _agent: &mut A, _binding: &Binding) -> bool {
        self.done = true;
        true
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

/// The actions one agent can use, each paired with its behavior.
///
/// Ids are assigned in registration order; the planner visits candidates in
/// that same order.
pub struct ActionCatalog<A> {
    actions: Vec<Action>,
    behaviors: Vec<Box<dyn Behavior<A>>>,
}

impl<A> ActionCatalog<A> {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            behaviors: Vec::new(),
        }
    }

    /// Adds an action and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `GoapError::DuplicateAction` if an action with the same name
    /// is already registered.
    pub fn register(
        &mut self,
        action: Action,
        behavior: impl Behavior<A> + 'static,
    ) -> Result<ActionId> {
        self.register_boxed(action, Box::new(behavior))
    }

    pub fn register_boxed(
        &mut self,
        action: Action,
        behavior: Box<dyn Behavior<A>>,
    ) -> Result<ActionId> {
        if self.find(&action.name).is_some() {
            return Err(GoapError::DuplicateAction(action.name));
        }
        let id = ActionId(self.actions.len());
        self.actions.push(action);
        self.behaviors.push(behavior);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// All definitions, indexable by [`ActionId::index`].
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id.0)
    }

    pub fn find(&self, name: &str) -> Option<ActionId> {
        self.actions.iter().position(|a| a.name == name).map(ActionId)
    }

    pub fn ids(&self) -> impl Iterator<Item = ActionId> {
        (0..self.actions.len()).map(ActionId)
    }

    pub(crate) fn behavior_mut(&mut self, id: ActionId) -> Option<&mut Box<dyn Behavior<A>>> {
        self.behaviors.get_mut(id.0)
    }

    pub(crate) fn behavior(&self, id: ActionId) -> Option<&dyn Behavior<A>> {
        self.behaviors.get(id.0).map(|b| b.as_ref())
    }

    /// Starts a planning attempt: clears every binding, runs every
    /// behavior's `reset`, then returns the ids whose `can_be_performed`
    /// succeeds for `agent`.
    pub fn prepare(&mut self, agent: &A, bindings: &mut Bindings) -> Vec<ActionId> {
        bindings.reset(self.actions.len());
        for behavior in self.behaviors.iter_mut() {
            behavior.reset();
        }

        let mut usable = Vec::new();
        for (index, (behavior, binding)) in self
            .behaviors
            .iter_mut()
            .zip(bindings.slots.iter_mut())
            .enumerate()
        {
            if behavior.can_be_performed(agent, binding) {
                usable.push(ActionId(index));
            } else {
                log::trace!("action {} not usable this attempt", self.actions[index].name);
            }
        }
        usable
    }
}

impl<A> Default for ActionCatalog<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for ActionCatalog<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCatalog")
            .field("actions", &self.actions)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Agent {
        target: Option<u64>,
    }

    struct Probe {
        resets: Rc<Cell<usize>>,
        usable: bool,
    }

    impl Behavior<Agent> for Probe {
        fn reset(&mut self) {
            self.resets.set(self.resets.get() + 1);
        }

        fn can_be_performed(&mut self, agent: &Agent, binding: &mut Binding) -> bool {
            if let Some(id) = agent.target {
                binding.bind(Target(id));
            }
            self.usable
        }

        fn perform(&mut self, _agent: &mut Agent, _binding: &Binding) -> bool {
            true
        }

        fn is_done(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_create_valid_action() {
        let action = Action::new("test_action", 1.0).unwrap();
        assert_eq!(action.name, "test_action");
        assert_eq!(action.cost, 1.0);
        assert!(action.preconditions.is_empty());
        assert!(action.effects.is_empty());
        assert!(!action.requires_in_range);
    }

    #[test]
    fn test_zero_cost_allowed() {
        assert!(Action::new("free", 0.0).is_ok());
        assert_eq!(Action::named("default").unwrap().cost, DEFAULT_COST);
    }

    #[test]
    fn test_create_invalid_action() {
        assert!(matches!(
            Action::new("test_action", -1.0),
            Err(GoapError::InvalidActionCost(_))
        ));
        assert!(matches!(
            Action::new("test_action", f32::NAN),
            Err(GoapError::InvalidActionCost(_))
        ));
        assert!(matches!(
            Action::new("test_action", f32::INFINITY),
            Err(GoapError::InvalidActionCost(_))
        ));
        assert!(matches!(
            Action::new("", 1.0),
            Err(GoapError::EmptyActionName)
        ));
    }

    #[test]
    fn test_can_perform() {
        let action = Action::named("use_tool")
            .unwrap()
            .with_precondition("has_tool", true);

        assert!(action.can_perform(&WorldState::new().with("has_tool", true)));
        assert!(!action.can_perform(&WorldState::new().with("has_tool", false)));
        assert!(!action.can_perform(&WorldState::new()));
        assert!(Action::named("free").unwrap().can_perform(&WorldState::new()));
    }

    #[test]
    fn test_apply_effects_and_outcome() {
        let action = Action::named("finish")
            .unwrap()
            .with_effect("has_result", true)
            .with_effect("is_complete", true);

        let state = WorldState::new().with("has_result", false).with("other", 1);
        let outcome = action.outcome(&state);
        assert_eq!(
            outcome,
            WorldState::new()
                .with("has_result", true)
                .with("is_complete", true)
                .with("other", 1)
        );

        let mut in_place = state.clone();
        action.apply_effects(&mut in_place);
        assert_eq!(in_place, outcome);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut catalog: ActionCatalog<Agent> = ActionCatalog::new();
        let first = catalog
            .register(Action::named("a").unwrap(), OneShot::new())
            .unwrap();
        assert_eq!(first, ActionId::new(0));
        let result = catalog.register(Action::named("a").unwrap(), OneShot::new());
        assert!(matches!(result, Err(GoapError::DuplicateAction(name)) if name == "a"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.find("a"), Some(first));
        assert_eq!(catalog.find("b"), None);
    }

    #[test]
    fn test_prepare_resets_and_filters() {
        let resets = Rc::new(Cell::new(0));
        let mut catalog = ActionCatalog::new();
        let usable = catalog
            .register(
                Action::named("usable").unwrap(),
                Probe {
                    resets: resets.clone(),
                    usable: true,
                },
            )
            .unwrap();
        catalog
            .register(
                Action::named("unusable").unwrap(),
                Probe {
                    resets: resets.clone(),
                    usable: false,
                },
            )
            .unwrap();

        let mut bindings = Bindings::new();
        bindings.reset(5);
        if let Some(b) = bindings.get_mut(ActionId::new(0)) {
            b.in_range = true;
        }

        let agent = Agent { target: Some(42) };
        let ids = catalog.prepare(&agent, &mut bindings);
        assert_eq!(ids, vec![usable]);
        assert_eq!(bindings.len(), 2);
        assert_eq!(resets.get(), 2, "every behavior is reset, usable or not");

        let binding = bindings.get(usable).unwrap();
        assert_eq!(binding.target, Some(Target(42)));
        assert!(!binding.in_range, "in_range must be cleared by prepare");
    }

    #[test]
    fn test_one_shot_lifecycle() {
        let mut shot = OneShot::new();
        let mut agent = Agent { target: None };
        let binding = Binding::default();
        assert!(!Behavior::<Agent>::is_done(&shot));
        assert!(shot.perform(&mut agent, &binding));
        assert!(Behavior::<Agent>::is_done(&shot));
        Behavior::<Agent>::reset(&mut shot);
        assert!(!Behavior::<Agent>::is_done(&shot));
    }
}
