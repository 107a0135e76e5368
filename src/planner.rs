//! # Planner for Goal-Oriented Action Planning (GOAP)
//!
//! The planner finds the cheapest ordered sequence of actions that turns the
//! current world state into one satisfying the goal:
//!
//! 1. Every binding is cleared and every behavior reset
//! 2. Actions whose [`Behavior::can_be_performed`] fails are dropped for the
//!    whole attempt
//! 3. The complete search tree is built (see [`crate::search`])
//! 4. The leaf with the lowest running cost is selected
//! 5. The plan is read back from the leaf to the root
//!
//! Steps 1 and 2 need behaviors and an agent, so they only run in
//! [`Planner::plan_for`]. [`Planner::plan`] runs steps 3 to 5 over plain
//! definitions, which is handy for tests and tools.
//!
//! Not finding a plan is a normal outcome and is reported as `None`.
//!
//! ## Basic Usage
//!
//! ```
//! use goap_agent::{Action, Planner, WorldState};
//!
//! let actions = vec![
//!     Action::new("direct", 5.0).unwrap().with_effect("goal", true),
//!     Action::new("two_step_1", 1.0).unwrap().with_effect("x", true),
//!     Action::new("two_step_2", 1.0)
//!         .unwrap()
//!         .with_precondition("x", true)
//!         .with_effect("goal", true),
//! ];
//!
//! let planner = Planner::new();
//! let goal = WorldState::new().with("goal", true);
//! let plan = planner.plan(&WorldState::new(), &goal, &actions).unwrap();
//!
//! let names: Vec<_> = plan.actions(&actions).map(|a| a.name.as_str()).collect();
//! assert_eq!(names, ["two_step_1", "two_step_2"]);
//! assert_eq!(plan.cost(), 2.0);
//! ```
//!
//! [`Behavior::can_be_performed`]: crate::Behavior::can_be_performed

use crate::search::SearchTree;
use crate::{Action, ActionCatalog, ActionId, Bindings, PlannerConfig, WorldState};

/// An ordered sequence of actions reaching the goal, with its total cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    steps: Vec<ActionId>,
    cost: f32,
}

impl Plan {
    pub fn new(steps: Vec<ActionId>, cost: f32) -> Self {
        Self { steps, cost }
    }

    pub fn steps(&self) -> &[ActionId] {
        &self.steps
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn first(&self) -> Option<ActionId> {
        self.steps.first().copied()
    }

    /// Resolves the steps against the slice the plan was computed from.
    pub fn actions<'a>(&'a self, actions: &'a [Action]) -> impl Iterator<Item = &'a Action> + 'a {
        self.steps.iter().filter_map(move |id| actions.get(id.index()))
    }

    pub fn into_steps(self) -> Vec<ActionId> {
        self.steps
    }
}

/// Exhaustive, cost-optimal GOAP planner.
///
/// The planner holds only its configuration; every call builds and discards
/// its own search tree. The search runs to completion: there is no timeout
/// and no early exit.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    /// Creates a planner with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    /// # Examples
    ///
    /// ```
    /// use goap_agent::{Planner, PlannerConfig, TieBreak};
    ///
    /// let planner = Planner::with_config(
    ///     PlannerConfig::default().with_tie_break(TieBreak::FewestActions),
    /// );
    /// assert_eq!(planner.config().tie_break, TieBreak::FewestActions);
    /// ```
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans over every action in `actions`.
    ///
    /// Step ids index into `actions`. Returns `None` when no sequence of
    /// actions reaches the goal. The initial state alone never counts as a
    /// solution: a plan always contains at least one action.
    pub fn plan(
        &self,
        initial: &WorldState,
        goal: &WorldState,
        actions: &[Action],
    ) -> Option<Plan> {
        let usable: Vec<ActionId> = (0..actions.len()).map(ActionId::new).collect();
        let tree = self.explore(initial, goal, actions, &usable);
        self.select(&tree)
    }

    /// Runs a full planning attempt for `agent` against its catalog.
    ///
    /// Clears `bindings` and resets every behavior, keeps only the actions
    /// whose `can_be_performed` succeeds (which may bind targets into
    /// `bindings`), then searches. Step ids index into the catalog.
    pub fn plan_for<A>(
        &self,
        agent: &A,
        catalog: &mut ActionCatalog<A>,
        bindings: &mut Bindings,
        initial: &WorldState,
        goal: &WorldState,
    ) -> Option<Plan> {
        let usable = catalog.prepare(agent, bindings);
        log::debug!(
            "planning with {} of {} actions usable",
            usable.len(),
            catalog.len()
        );
        let tree = self.explore(initial, goal, catalog.actions(), &usable);
        self.select(&tree)
    }

    /// Builds the whole search tree without selecting a plan.
    pub fn explore(
        &self,
        initial: &WorldState,
        goal: &WorldState,
        actions: &[Action],
        usable: &[ActionId],
    ) -> SearchTree {
        let tree = SearchTree::build(actions, usable, initial, goal);
        log::debug!(
            "search tree built: {} nodes, {} leaves",
            tree.len(),
            tree.leaves().len()
        );
        tree
    }

    /// Picks the cheapest leaf of `tree` and reconstructs its plan.
    pub fn select(&self, tree: &SearchTree) -> Option<Plan> {
        let Some(leaf) = tree.cheapest_leaf(self.config.tie_break) else {
            log::debug!("no plan: goal unreachable with the usable actions");
            return None;
        };
        let cost = tree.node(leaf).map_or(0.0, |n| n.cost);
        let plan = Plan::new(tree.path(leaf), cost);
        log::debug!("selected plan of {} actions, cost {}", plan.len(), cost);
        Some(plan)
    }
}
