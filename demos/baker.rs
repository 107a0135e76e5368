//! Baker Example
//!
//! A baker on a one-dimensional road wants bread. They have to walk to the
//! wheat field, collect wheat, walk back to the mill, grind flour and then
//! bake. Collecting wheat sometimes fails, in which case the controller
//! drops the plan and re-plans on the next tick.
//!
//! Run with `RUST_LOG=debug cargo run --example baker` to see the planner.

use std::error::Error;

use goap_agent::{
    Action, ActionCatalog, Behavior, Binding, Controller, GoapVisualizer, MotionController,
    Planner, StateProvider, Target, TickOutcome, WorldState,
};

const FIELD: u64 = 6;
const MILL: u64 = 2;

struct Baker {
    position: u64,
    wheat: u32,
    flour: u32,
    bread: u32,
    /// Fails every n-th harvest, to show re-planning
    bad_luck_every: u32,
    harvests: u32,
}

impl Baker {
    fn new() -> Self {
        Self {
            position: 0,
            wheat: 0,
            flour: 0,
            bread: 0,
            bad_luck_every: 2,
            harvests: 0,
        }
    }
}

impl StateProvider for Baker {
    fn world_state(&self) -> WorldState {
        WorldState::new()
            .with("has_wheat", self.wheat > 0)
            .with("has_flour", self.flour > 0)
            .with("has_bread", self.bread > 0)
    }

    fn goal_state(&self) -> WorldState {
        WorldState::new().with("has_bread", true)
    }

    fn plan_failed(&mut self, goal: &WorldState) {
        println!("Baker can't reach {}", goal);
    }

    fn plan_found(&mut self, _goal: &WorldState, actions: &[&Action]) {
        let names: Vec<&str> = actions.iter().map(|a| a.name.as_str()).collect();
        println!("Baker plans: {}", names.join(" -> "));
    }

    fn plan_finished(&mut self) {
        println!("Baker finished the plan");
    }

    fn plan_aborted(&mut self, action: &Action) {
        println!("Baker gave up on {}", action.name);
    }
}

impl MotionController for Baker {
    fn move_agent(&mut self, action: &Action, target: Target) -> bool {
        if self.position < target.0 {
            self.position += 1;
        } else if self.position > target.0 {
            self.position -= 1;
        }
        println!(
            "Baker walks toward {} for {} (now at {})",
            target.0, action.name, self.position
        );
        self.position == target.0
    }
}

/// Binds a fixed location and finishes after a single perform.
struct AtPlace {
    place: u64,
    work: fn(&mut Baker) -> bool,
    done: bool,
}

impl AtPlace {
    fn new(place: u64, work: fn(&mut Baker) -> bool) -> Self {
        Self {
            place,
            work,
            done: false,
        }
    }
}

impl Behavior<Baker> for AtPlace {
    fn reset(&mut self) {
        self.done = false;
    }

    fn can_be_performed(&mut self, _agent: &Baker, binding: &mut Binding) -> bool {
        binding.bind(Target(self.place));
        true
    }

    fn perform(&mut self, agent: &mut Baker, _binding: &Binding) -> bool {
        self.done = (self.work)(agent);
        self.done
    }

    fn is_done(&self) -> bool {
        self.done
    }
}

fn collect_wheat(baker: &mut Baker) -> bool {
    baker.harvests += 1;
    if baker.harvests % baker.bad_luck_every == 1 {
        println!("The wheat isn't ripe yet");
        return false;
    }
    baker.wheat += 1;
    true
}

fn grind_flour(baker: &mut Baker) -> bool {
    baker.wheat -= 1;
    baker.flour += 1;
    true
}

fn bake_bread(baker: &mut Baker) -> bool {
    baker.flour -= 1;
    baker.bread += 1;
    true
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let collect = Action::new("collect_wheat", 2.0)?
        .with_effect("has_wheat", true)
        .requiring_range();
    let grind = Action::named("grind_flour")?
        .with_precondition("has_wheat", true)
        .with_effect("has_wheat", false)
        .with_effect("has_flour", true)
        .requiring_range();
    let bake = Action::named("bake_bread")?
        .with_precondition("has_flour", true)
        .with_effect("has_flour", false)
        .with_effect("has_bread", true);
    let buy = Action::new("buy_bread", 20.0)?.with_effect("has_bread", true);

    // Write the full search tree once, before anything runs
    let definitions = [collect.clone(), grind.clone(), bake.clone(), buy.clone()];
    let planner = Planner::new();
    let goal = WorldState::new().with("has_bread", true);
    let usable: Vec<_> = (0..definitions.len())
        .map(goap_agent::ActionId::new)
        .collect();
    let tree = planner.explore(&Baker::new().world_state(), &goal, &definitions, &usable);
    GoapVisualizer::new().save_tree(&tree, &definitions, "baker_tree.dot")?;
    println!(
        "Search tree with {} nodes written to baker_tree.dot",
        tree.len()
    );

    let mut catalog = ActionCatalog::new();
    catalog.register(collect, AtPlace::new(FIELD, collect_wheat))?;
    catalog.register(grind, AtPlace::new(MILL, grind_flour))?;
    catalog.register(bake, AtPlace::new(0, bake_bread))?;
    // Buying is possible but never attractive
    catalog.register(buy, AtPlace::new(0, |_| false))?;

    let mut controller = Controller::with_planner(catalog, planner);
    let mut baker = Baker::new();

    for tick in 1..=40 {
        match controller.tick(&mut baker) {
            TickOutcome::PlanFinished if baker.bread > 0 => {
                println!("Bread after {} ticks", tick);
                return Ok(());
            }
            TickOutcome::Misconfigured(e) => return Err(e.into()),
            _ => {}
        }
    }

    println!("No bread today");
    Ok(())
}
