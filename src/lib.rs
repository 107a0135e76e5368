//! Goal-Oriented Action Planning for game agents.
//!
//! An agent owns an [`ActionCatalog`] of [`Action`] definitions paired with
//! [`Behavior`] implementations. The [`Planner`] finds the cheapest sequence
//! of actions turning the agent's [`WorldState`] into one satisfying its
//! goal, and the [`Controller`] executes that sequence tick by tick, moving
//! the agent into range when an action requires it and re-planning when an
//! action fails.

mod action;
mod config;
mod controller;
mod error;
mod planner;
pub mod search;
mod state;
mod visualizer;

pub use action::{
    Action, ActionCatalog, ActionId, Behavior, Binding, Bindings, OneShot, Target, DEFAULT_COST,
};
pub use config::{PlannerConfig, TieBreak};
pub use controller::{
    Controller, FsmState, MotionController, StateProvider, StateStack, TickOutcome, Transition,
};
pub use error::{GoapError, Result};
pub use planner::{Plan, Planner};
pub use search::{SearchNode, SearchTree};
pub use state::{matches, merge, Fact, Value, WorldState};
pub use visualizer::GoapVisualizer;
