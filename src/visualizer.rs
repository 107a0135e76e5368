use crate::search::SearchTree;
use crate::{Action, Plan, Result, TieBreak, WorldState};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Renders search trees and plans as Graphviz DOT
#[derive(Debug, Clone, Default)]
pub struct GoapVisualizer {
    tie_break: TieBreak,
}

impl GoapVisualizer {
    /// Create a new GOAP visualizer
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `tie_break` when picking the chosen leaf to highlight. Should
    /// match the planner's configuration.
    pub fn with_tie_break(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }

    /// Write the whole search tree.
    ///
    /// Every node is labelled with the action that produced it and its
    /// running cost. Leaves are filled green and the branch of the chosen
    /// leaf is drawn in red.
    pub fn write_tree<W: Write>(
        &self,
        tree: &SearchTree,
        actions: &[Action],
        out: &mut W,
    ) -> Result<()> {
        let chosen = tree
            .cheapest_leaf(self.tie_break)
            .map(|leaf| tree.branch(leaf))
            .unwrap_or_default();

        writeln!(out, "digraph GOAP {{")?;
        writeln!(out, "    rankdir=TB;")?;
        writeln!(out, "    node [shape=box, style=filled, fillcolor=white];")?;
        writeln!(out, "    edge [fontsize=10];")?;

        for (idx, node) in tree.nodes().iter().enumerate() {
            let label = match node.action {
                None => format!("start\\n{}", Self::state_to_string(&node.state)),
                Some(id) => {
                    let name = actions.get(id.index()).map_or("?", |a| a.name.as_str());
                    format!("{}\\ncost: {}", escape(name), node.cost)
                }
            };
            let fill = if chosen.contains(&idx) {
                "lightcoral"
            } else if tree.leaves().contains(&idx) {
                "lightgreen"
            } else if node.action.is_none() {
                "lightblue"
            } else {
                "white"
            };
            writeln!(out, "    n{} [label=\"{}\", fillcolor={}];", idx, label, fill)?;
        }

        for (idx, node) in tree.nodes().iter().enumerate() {
            let Some(parent) = node.parent else {
                continue;
            };
            if chosen.contains(&idx) {
                writeln!(out, "    n{} -> n{} [color=red, penwidth=2.0];", parent, idx)?;
            } else {
                writeln!(out, "    n{} -> n{};", parent, idx)?;
            }
        }

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Write a plan as a chain from the initial state to the goal.
    pub fn write_plan<W: Write>(
        &self,
        plan: &Plan,
        actions: &[Action],
        initial: &WorldState,
        goal: &WorldState,
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "digraph GOAP {{")?;
        writeln!(out, "    rankdir=LR;")?;
        writeln!(
            out,
            "    node [shape=box, style=filled, fillcolor=lightblue];"
        )?;

        writeln!(
            out,
            "    initial [label=\"Initial State\\n{}\", fillcolor=lightgreen];",
            Self::state_to_string(initial)
        )?;
        writeln!(
            out,
            "    goal [label=\"Goal State\\n{}\", fillcolor=lightpink];",
            Self::state_to_string(goal)
        )?;

        let mut previous = String::from("initial");
        for (step, action) in plan.actions(actions).enumerate() {
            writeln!(
                out,
                "    step_{} [label=\"{}\\nCost: {}\\nPre: {}\\nEff: {}\"];",
                step,
                escape(&action.name),
                action.cost,
                Self::state_to_string(&action.preconditions),
                Self::state_to_string(&action.effects)
            )?;
            writeln!(out, "    {} -> step_{};", previous, step)?;
            previous = format!("step_{}", step);
        }
        writeln!(
            out,
            "    {} -> goal [label=\"total cost: {}\"];",
            previous,
            plan.cost()
        )?;

        writeln!(out, "}}")?;
        Ok(())
    }

    /// Write the search tree to a DOT file at `path`.
    pub fn save_tree(
        &self,
        tree: &SearchTree,
        actions: &[Action],
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_tree(tree, actions, &mut file)?;
        file.flush()?;
        Ok(())
    }

    fn state_to_string(state: &WorldState) -> String {
        state
            .iter()
            .map(|(key, value)| escape(&format!("{}: {}", key, value)))
            .collect::<Vec<_>>()
            .join("\\n")
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
