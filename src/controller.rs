//! Execution controller: a stack-based finite state machine that plans, then
//! walks an agent through the plan one tick at a time.
//!
//! The controller has three states:
//!
//! * `Idle`: asks the agent for its world state and goal, then plans. On
//!   success the plan is stored and `Perform` replaces `Idle`; on failure the
//!   controller stays in `Idle` and tries again on the next tick.
//! * `Perform`: drops the head action once it reports done, then either
//!   pushes `Move` (the next action needs the agent in range) or performs
//!   the action. A failed perform discards the rest of the plan and returns
//!   to `Idle`.
//! * `Move`: lets the agent's [`MotionController`] walk toward the action's
//!   target, popping back to `Perform` on arrival.
//!
//! The state on top of the stack runs exactly once per [`Controller::tick`].
//! Handlers never touch the stack; they return a [`Transition`] and
//! [`StateStack::apply`] performs it.
//!
//! The controller never changes the goal or the world state itself. If the
//! goal is unreachable it re-plans on every tick; callers should make sure
//! the world changes between attempts.

use std::collections::VecDeque;
use std::fmt;

use crate::{
    Action, ActionCatalog, ActionId, Binding, Bindings, GoapError, Plan, Planner, Target,
    WorldState,
};

/// States of the execution FSM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsmState {
    /// Planning
    Idle,
    /// Walking toward the head action's target
    Move,
    /// Performing the head action
    Perform,
}

impl fmt::Display for FsmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsmState::Idle => write!(f, "idle"),
            FsmState::Move => write!(f, "move"),
            FsmState::Perform => write!(f, "perform"),
        }
    }
}

/// A stack edit requested by a state handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep the stack as is
    Stay,
    /// Push a state on top of the current one
    Push(FsmState),
    /// Pop the current state
    Pop,
    /// Pop the current state and push another
    Replace(FsmState),
    /// Pop two states and push another
    Unwind(FsmState),
}

/// The FSM's state stack. The top is the state executed on the next tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateStack {
    states: Vec<FsmState>,
}

impl StateStack {
    pub fn new() -> Self {
        Self { states: Vec::new() }
    }

    pub fn push(&mut self, state: FsmState) {
        self.states.push(state);
    }

    pub fn pop(&mut self) -> Option<FsmState> {
        self.states.pop()
    }

    pub fn top(&self) -> Option<FsmState> {
        self.states.last().copied()
    }

    pub fn depth(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Bottom-to-top view of the stack.
    pub fn states(&self) -> &[FsmState] {
        &self.states
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    pub fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Stay => {}
            Transition::Push(state) => self.push(state),
            Transition::Pop => {
                self.pop();
            }
            Transition::Replace(state) => {
                self.pop();
                self.push(state);
            }
            Transition::Unwind(state) => {
                self.pop();
                self.pop();
                self.push(state);
            }
        }
    }
}

/// Supplies the world state and goal, and receives plan notifications.
///
/// Notifications default to no-ops.
pub trait StateProvider {
    /// Facts describing "now" for planning purposes.
    fn world_state(&self) -> WorldState;

    /// The facts the agent wants to make true.
    fn goal_state(&self) -> WorldState;

    /// No plan reaches `goal` with the currently usable actions.
    fn plan_failed(&mut self, _goal: &WorldState) {}

    /// A plan was found; `actions` are in execution order.
    fn plan_found(&mut self, _goal: &WorldState, _actions: &[&Action]) {}

    /// Every action of the plan is done.
    fn plan_finished(&mut self) {}

    /// `action` failed to perform and the rest of the plan was dropped.
    fn plan_aborted(&mut self, _action: &Action) {}
}

/// Moves the agent toward an action's target.
pub trait MotionController {
    /// Advances movement by one tick. Returns `true` once the agent has
    /// arrived; the controller then marks the action in range.
    fn move_agent(&mut self, action: &Action, target: Target) -> bool;
}

/// What a single [`Controller::tick`] did.
#[derive(Debug)]
pub enum TickOutcome {
    /// A plan was found and execution starts next tick
    PlanFound(Plan),
    /// Planning failed; the controller stays idle
    PlanFailed,
    /// The action was performed successfully this tick
    Performed(ActionId),
    /// The action needs the agent in range; `Move` was pushed
    StartedMoving(ActionId),
    /// Movement toward the action's target continues
    Moving(ActionId),
    /// The agent reached the action's target
    Arrived(ActionId),
    /// The action needs no movement; control went back to `Perform`
    InRange(ActionId),
    /// The plan queue is exhausted
    PlanFinished,
    /// The action failed and the plan was discarded
    PlanAborted(ActionId),
    /// The plan could not be executed as configured and was discarded
    Misconfigured(GoapError),
}

/// Drives one agent through plan/move/perform cycles.
///
/// # Examples
///
/// ```
/// use goap_agent::{
///     Action, ActionCatalog, Controller, FsmState, MotionController, OneShot, StateProvider,
///     Target, TickOutcome, WorldState,
/// };
///
/// struct Lamp {
///     lit: bool,
/// }
///
/// impl StateProvider for Lamp {
///     fn world_state(&self) -> WorldState {
///         WorldState::new().with("lit", self.lit)
///     }
///
///     fn goal_state(&self) -> WorldState {
///         WorldState::new().with("lit", true)
///     }
/// }
///
/// impl MotionController for Lamp {
///     fn move_agent(&mut self, _action: &Action, _target: Target) -> bool {
///         true
///     }
/// }
///
/// let mut catalog = ActionCatalog::new();
/// let switch_on = Action::named("switch_on")
///     .unwrap()
///     .with_precondition("lit", false)
///     .with_effect("lit", true);
/// let id = catalog.register(switch_on, OneShot::new()).unwrap();
///
/// let mut controller = Controller::new(catalog);
/// let mut lamp = Lamp { lit: false };
///
/// assert!(matches!(controller.tick(&mut lamp), TickOutcome::PlanFound(_)));
/// assert_eq!(controller.state(), Some(FsmState::Perform));
/// assert!(matches!(controller.tick(&mut lamp), TickOutcome::Performed(x) if x == id));
/// assert!(matches!(controller.tick(&mut lamp), TickOutcome::PlanFinished));
/// assert_eq!(controller.state(), Some(FsmState::Idle));
/// ```
#[derive(Debug)]
pub struct Controller<A> {
    catalog: ActionCatalog<A>,
    bindings: Bindings,
    planner: Planner,
    stack: StateStack,
    queue: VecDeque<ActionId>,
}

impl<A> Controller<A> {
    /// Creates a controller in `Idle` using the default planner.
    pub fn new(catalog: ActionCatalog<A>) -> Self {
        Self::with_planner(catalog, Planner::new())
    }

    pub fn with_planner(catalog: ActionCatalog<A>, planner: Planner) -> Self {
        let mut stack = StateStack::new();
        stack.push(FsmState::Idle);
        Self {
            bindings: Bindings::new(),
            catalog,
            planner,
            stack,
            queue: VecDeque::new(),
        }
    }

    /// The state that runs on the next tick.
    pub fn state(&self) -> Option<FsmState> {
        self.stack.top()
    }

    pub fn stack(&self) -> &StateStack {
        &self.stack
    }

    /// Remaining plan steps, head first.
    pub fn plan(&self) -> impl ExactSizeIterator<Item = ActionId> + '_ {
        self.queue.iter().copied()
    }

    pub fn has_plan(&self) -> bool {
        !self.queue.is_empty()
    }

    /// The head action of the current plan.
    pub fn current_action(&self) -> Option<&Action> {
        self.queue.front().and_then(|&id| self.catalog.action(id))
    }

    pub fn catalog(&self) -> &ActionCatalog<A> {
        &self.catalog
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub fn binding(&self, id: ActionId) -> Option<&Binding> {
        self.bindings.get(id)
    }

    /// Drops the current plan and returns to `Idle`.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.stack.clear();
        self.stack.push(FsmState::Idle);
    }

    fn name(&self, id: ActionId) -> &str {
        self.catalog.action(id).map_or("<unknown>", |a| a.name.as_str())
    }

    fn abandon(&mut self, error: GoapError, transition: Transition) -> (Transition, TickOutcome) {
        log::error!("{}; abandoning plan", error);
        self.queue.clear();
        (transition, TickOutcome::Misconfigured(error))
    }
}

impl<A: StateProvider + MotionController> Controller<A> {
    /// Runs the state on top of the stack once.
    pub fn tick(&mut self, agent: &mut A) -> TickOutcome {
        let state = match self.stack.top() {
            Some(state) => state,
            None => {
                self.stack.push(FsmState::Idle);
                FsmState::Idle
            }
        };

        let (transition, outcome) = match state {
            FsmState::Idle => self.idle(agent),
            FsmState::Move => self.move_to_target(agent),
            FsmState::Perform => self.perform(agent),
        };
        self.stack.apply(transition);
        if transition != Transition::Stay {
            log::info!("{} -> {:?}, now {:?}", state, transition, self.stack.states());
        }
        outcome
    }

    fn idle(&mut self, agent: &mut A) -> (Transition, TickOutcome) {
        let world = agent.world_state();
        let goal = agent.goal_state();

        let found = self
            .planner
            .plan_for(&*agent, &mut self.catalog, &mut self.bindings, &world, &goal);
        match found {
            Some(plan) => {
                self.queue = plan.steps().iter().copied().collect();
                let actions: Vec<&Action> = plan.actions(self.catalog.actions()).collect();
                log::info!(
                    "plan found for {}: {} (cost {})",
                    goal,
                    actions
                        .iter()
                        .map(|a| a.name.as_str())
                        .collect::<Vec<_>>()
                        .join(" -> "),
                    plan.cost()
                );
                agent.plan_found(&goal, &actions);
                (
                    Transition::Replace(FsmState::Perform),
                    TickOutcome::PlanFound(plan),
                )
            }
            None => {
                log::warn!("no plan for goal {} from {}", goal, world);
                agent.plan_failed(&goal);
                (Transition::Replace(FsmState::Idle), TickOutcome::PlanFailed)
            }
        }
    }

    fn perform(&mut self, agent: &mut A) -> (Transition, TickOutcome) {
        let Some(&head) = self.queue.front() else {
            return self.finish(agent, Transition::Replace(FsmState::Idle));
        };
        let Some(behavior) = self.catalog.behavior(head) else {
            let error = GoapError::UnknownAction(head.index());
            return self.abandon(error, Transition::Replace(FsmState::Idle));
        };
        if behavior.is_done() {
            log::debug!("action {} done", self.name(head));
            self.queue.pop_front();
        }

        let Some(&id) = self.queue.front() else {
            return self.finish(agent, Transition::Replace(FsmState::Idle));
        };
        let Some(requires_in_range) = self.catalog.action(id).map(|a| a.requires_in_range) else {
            let error = GoapError::UnknownAction(id.index());
            return self.abandon(error, Transition::Replace(FsmState::Idle));
        };
        let in_range = self.bindings.get(id).map_or(false, |b| b.in_range);
        if requires_in_range && !in_range {
            log::debug!("action {} needs the agent in range", self.name(id));
            return (
                Transition::Push(FsmState::Move),
                TickOutcome::StartedMoving(id),
            );
        }

        let unbound = Binding::default();
        let binding = self.bindings.get(id).unwrap_or(&unbound);
        let Some(behavior) = self.catalog.behavior_mut(id) else {
            let error = GoapError::UnknownAction(id.index());
            return self.abandon(error, Transition::Replace(FsmState::Idle));
        };

        if behavior.perform(agent, binding) {
            return (Transition::Stay, TickOutcome::Performed(id));
        }

        log::warn!("action {} failed; plan aborted", self.name(id));
        self.queue.clear();
        if let Some(action) = self.catalog.action(id) {
            agent.plan_aborted(action);
        }
        (
            Transition::Replace(FsmState::Idle),
            TickOutcome::PlanAborted(id),
        )
    }

    fn move_to_target(&mut self, agent: &mut A) -> (Transition, TickOutcome) {
        let Some(&id) = self.queue.front() else {
            return self.finish(agent, Transition::Unwind(FsmState::Idle));
        };
        let Some(action) = self.catalog.action(id) else {
            let error = GoapError::UnknownAction(id.index());
            return self.abandon(error, Transition::Unwind(FsmState::Idle));
        };

        let target = self.bindings.get(id).and_then(|b| b.target);
        let target = match target {
            Some(target) => target,
            None if action.requires_in_range => {
                let error = GoapError::MissingTarget(action.name.clone());
                return self.abandon(error, Transition::Unwind(FsmState::Idle));
            }
            None => {
                log::debug!("action {} has no range requirement", action.name);
                return (Transition::Pop, TickOutcome::InRange(id));
            }
        };

        if !agent.move_agent(action, target) {
            return (Transition::Stay, TickOutcome::Moving(id));
        }

        log::debug!("arrived at {:?} for {}", target, action.name);
        if let Some(binding) = self.bindings.get_mut(id) {
            binding.in_range = true;
        }
        (Transition::Pop, TickOutcome::Arrived(id))
    }

    fn finish(&mut self, agent: &mut A, transition: Transition) -> (Transition, TickOutcome) {
        log::info!("plan finished");
        self.queue.clear();
        agent.plan_finished();
        (transition, TickOutcome::PlanFinished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_push_pop() {
        let mut stack = StateStack::new();
        assert!(stack.is_empty());
        assert_eq!(stack.top(), None);

        stack.push(FsmState::Perform);
        stack.push(FsmState::Move);
        assert_eq!(stack.top(), Some(FsmState::Move));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), Some(FsmState::Move));
        assert_eq!(stack.top(), Some(FsmState::Perform));
    }

    #[test]
    fn test_transitions() {
        let mut stack = StateStack::new();
        stack.push(FsmState::Idle);

        stack.apply(Transition::Stay);
        assert_eq!(stack.states(), &[FsmState::Idle]);

        stack.apply(Transition::Replace(FsmState::Perform));
        assert_eq!(stack.states(), &[FsmState::Perform]);

        stack.apply(Transition::Push(FsmState::Move));
        assert_eq!(stack.states(), &[FsmState::Perform, FsmState::Move]);

        stack.apply(Transition::Pop);
        assert_eq!(stack.states(), &[FsmState::Perform]);

        stack.apply(Transition::Push(FsmState::Move));
        stack.apply(Transition::Unwind(FsmState::Idle));
        assert_eq!(stack.states(), &[FsmState::Idle]);
    }

    #[test]
    fn test_unwind_on_shallow_stack() {
        let mut stack = StateStack::new();
        stack.push(FsmState::Move);
        stack.apply(Transition::Unwind(FsmState::Idle));
        assert_eq!(stack.states(), &[FsmState::Idle]);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(FsmState::Idle.to_string(), "idle");
        assert_eq!(FsmState::Move.to_string(), "move");
        assert_eq!(FsmState::Perform.to_string(), "perform");
    }

    struct Inert;

    impl StateProvider for Inert {
        fn world_state(&self) -> WorldState {
            WorldState::new()
        }

        fn goal_state(&self) -> WorldState {
            WorldState::new().with("goal", true)
        }
    }

    impl MotionController for Inert {
        fn move_agent(&mut self, _action: &Action, _target: Target) -> bool {
            true
        }
    }

    #[test]
    fn test_new_controller_starts_idle() {
        let controller: Controller<Inert> = Controller::new(ActionCatalog::new());
        assert_eq!(controller.state(), Some(FsmState::Idle));
        assert!(!controller.has_plan());
        assert!(controller.current_action().is_none());
    }

    #[test]
    fn test_empty_catalog_keeps_idle() {
        let mut controller = Controller::new(ActionCatalog::new());
        let mut agent = Inert;
        for _ in 0..3 {
            assert!(matches!(controller.tick(&mut agent), TickOutcome::PlanFailed));
            assert_eq!(controller.stack().states(), &[FsmState::Idle]);
        }
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut controller: Controller<Inert> = Controller::new(ActionCatalog::new());
        controller.stack.apply(Transition::Replace(FsmState::Perform));
        controller.stack.apply(Transition::Push(FsmState::Move));
        controller.queue.push_back(ActionId::new(0));
        controller.reset();
        assert_eq!(controller.stack().states(), &[FsmState::Idle]);
        assert!(!controller.has_plan());
    }

    #[test]
    fn test_move_without_range_requirement_returns_to_perform() {
        let mut catalog = ActionCatalog::new();
        let id = catalog
            .register(
                Action::named("wave").unwrap().with_effect("goal", true),
                crate::OneShot::new(),
            )
            .unwrap();
        let mut controller = Controller::new(catalog);
        controller.stack.apply(Transition::Replace(FsmState::Perform));
        controller.stack.apply(Transition::Push(FsmState::Move));
        controller.queue.push_back(id);

        let mut agent = Inert;
        assert!(matches!(
            controller.tick(&mut agent),
            TickOutcome::InRange(x) if x == id
        ));
        assert_eq!(controller.stack().states(), &[FsmState::Perform]);
        assert_eq!(controller.plan().collect::<Vec<_>>(), vec![id]);
        assert!(matches!(
            controller.tick(&mut agent),
            TickOutcome::Performed(x) if x == id
        ));
    }
}
