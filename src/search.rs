//! Exhaustive forward search over action sequences.
//!
//! Starting from the initial state, every usable action whose preconditions
//! hold is applied, producing a child node. A child whose state satisfies the
//! goal is recorded as a leaf and not expanded further; any other child is
//! expanded with the remaining actions, so no action appears twice on a
//! branch. The whole tree is built: finding a cheap leaf early does not stop
//! the exploration of sibling branches.
//!
//! There is no visited-state deduplication, so the tree can grow with the
//! number of permutations of the usable actions. This is meant for catalogs
//! of a handful to a few dozen actions per agent.

use crate::config::TieBreak;
use crate::{Action, ActionId, WorldState};

/// One node of the search tree.
#[derive(Debug, Clone)]
pub struct SearchNode {
    /// Index of the parent node, `None` for the root
    pub parent: Option<usize>,
    /// Action that produced this node, `None` for the root
    pub action: Option<ActionId>,
    /// Sum of action costs from the root
    pub cost: f32,
    /// Number of actions from the root
    pub depth: usize,
    /// State after applying every action on the path
    pub state: WorldState,
}

/// Pending expansion of one node: the candidates still to try from it.
struct Frame {
    node: usize,
    candidates: Vec<ActionId>,
    cursor: usize,
}

/// The complete tree built by one planning attempt.
///
/// Node `0` is always the root. Nodes are stored in creation order, which is
/// the depth-first pre-order of the search.
#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
    leaves: Vec<usize>,
}

impl SearchTree {
    /// Builds the full tree.
    ///
    /// `usable` lists the ids (indices into `actions`) the search may use, in
    /// the order they are tried. Ids that do not index into `actions` are
    /// ignored.
    pub fn build(
        actions: &[Action],
        usable: &[ActionId],
        initial: &WorldState,
        goal: &WorldState,
    ) -> Self {
        let mut tree = SearchTree {
            nodes: vec![SearchNode {
                parent: None,
                action: None,
                cost: 0.0,
                depth: 0,
                state: initial.clone(),
            }],
            leaves: Vec::new(),
        };

        // Explicit work-list in place of recursion; visits nodes in the same
        // order a recursive expansion would.
        let mut stack = vec![Frame {
            node: 0,
            candidates: usable.to_vec(),
            cursor: 0,
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(&id) = frame.candidates.get(frame.cursor) else {
                stack.pop();
                continue;
            };
            frame.cursor += 1;

            let Some(action) = actions.get(id.index()) else {
                continue;
            };
            let parent_idx = frame.node;
            let parent = &tree.nodes[parent_idx];
            if !parent.state.satisfies(&action.preconditions) {
                continue;
            }

            let child = SearchNode {
                parent: Some(parent_idx),
                action: Some(id),
                cost: parent.cost + action.cost,
                depth: parent.depth + 1,
                state: parent.state.merged(&action.effects),
            };
            let reached = child.state.satisfies(goal);
            let child_idx = tree.nodes.len();
            tree.nodes.push(child);

            if reached {
                tree.leaves.push(child_idx);
            } else {
                let candidates: Vec<ActionId> = frame
                    .candidates
                    .iter()
                    .copied()
                    .filter(|&candidate| candidate != id)
                    .collect();
                stack.push(Frame {
                    node: child_idx,
                    candidates,
                    cursor: 0,
                });
            }
        }

        tree
    }

    pub fn nodes(&self) -> &[SearchNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> Option<&SearchNode> {
        self.nodes.get(idx)
    }

    pub fn root(&self) -> &SearchNode {
        &self.nodes[0]
    }

    /// Indices of the nodes whose state satisfies the goal, in discovery order.
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether at least one leaf was recorded.
    pub fn found(&self) -> bool {
        !self.leaves.is_empty()
    }

    /// Picks the leaf with the strictly lowest running cost, resolving ties
    /// with `tie_break`.
    pub fn cheapest_leaf(&self, tie_break: TieBreak) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &leaf in &self.leaves {
            best = match best {
                Some(incumbent) if !self.beats(leaf, incumbent, tie_break) => Some(incumbent),
                _ => Some(leaf),
            };
        }
        best
    }

    fn beats(&self, candidate: usize, incumbent: usize, tie_break: TieBreak) -> bool {
        let (c, i) = (&self.nodes[candidate], &self.nodes[incumbent]);
        if c.cost < i.cost {
            return true;
        }
        match tie_break {
            TieBreak::FirstFound => false,
            TieBreak::FewestActions => c.cost == i.cost && c.depth < i.depth,
        }
    }

    /// Node indices from the root down to `node`, inclusive.
    pub fn branch(&self, node: usize) -> Vec<usize> {
        let mut branch = Vec::new();
        let mut current = Some(node);
        while let Some(idx) = current {
            let Some(n) = self.nodes.get(idx) else {
                break;
            };
            branch.push(idx);
            current = n.parent;
        }
        branch.reverse();
        branch
    }

    /// Actions on the path from the root to `node`, in execution order.
    pub fn path(&self, node: usize) -> Vec<ActionId> {
        self.branch(node)
            .into_iter()
            .filter_map(|idx| self.nodes[idx].action)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_action(
        name: &str,
        cost: f32,
        pre: Vec<(&str, bool)>,
        eff: Vec<(&str, bool)>,
    ) -> Action {
        let mut action = Action::new(name, cost).unwrap();
        for (k, v) in pre {
            action.preconditions.set(k, v);
        }
        for (k, v) in eff {
            action.effects.set(k, v);
        }
        action
    }

    fn all_ids(actions: &[Action]) -> Vec<ActionId> {
        (0..actions.len()).map(ActionId::new).collect()
    }

    /// Straightforward recursive expansion, used as the reference order.
    fn recursive_order(
        actions: &[Action],
        usable: &[ActionId],
        state: &WorldState,
        goal: &WorldState,
        out: &mut Vec<Vec<ActionId>>,
        path: &mut Vec<ActionId>,
    ) {
        for &id in usable {
            let action = &actions[id.index()];
            if !state.satisfies(&action.preconditions) {
                continue;
            }
            let next = state.merged(&action.effects);
            path.push(id);
            out.push(path.clone());
            if !next.satisfies(goal) {
                let subset: Vec<ActionId> = usable.iter().copied().filter(|&c| c != id).collect();
                recursive_order(actions, &subset, &next, goal, out, path);
            }
            path.pop();
        }
    }

    #[test]
    fn test_root_node() {
        let initial = WorldState::new().with("start", true);
        let tree = SearchTree::build(&[], &[], &initial, &WorldState::new().with("goal", true));
        assert_eq!(tree.len(), 1);
        let root = tree.root();
        assert_eq!(root.cost, 0.0);
        assert!(root.action.is_none());
        assert!(root.parent.is_none());
        assert_eq!(root.state, initial);
        assert!(!tree.found());
    }

    #[test]
    fn test_root_is_never_a_leaf() {
        let initial = WorldState::new().with("goal", true);
        let goal = WorldState::new().with("goal", true);
        let tree = SearchTree::build(&[], &[], &initial, &goal);
        assert!(!tree.found());
    }

    #[test]
    fn test_full_permutation_tree() {
        // Three always-applicable actions that never reach the goal:
        // 1 root + 3 + 3*2 + 3*2*1 nodes.
        let actions = vec![
            make_action("a", 1.0, vec![], vec![("a", true)]),
            make_action("b", 1.0, vec![], vec![("b", true)]),
            make_action("c", 1.0, vec![], vec![("c", true)]),
        ];
        let goal = WorldState::new().with("never", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &WorldState::new(), &goal);
        assert_eq!(tree.len(), 16);
        assert!(!tree.found());
    }

    #[test]
    fn test_cost_monotonic_along_edges() {
        let actions = vec![
            make_action("a", 2.0, vec![], vec![("a", true)]),
            make_action("b", 0.0, vec![("a", true)], vec![("b", true)]),
            make_action("c", 1.5, vec![], vec![("c", true)]),
            make_action("d", 3.0, vec![("b", true), ("c", true)], vec![("goal", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &WorldState::new(), &goal);

        for node in tree.nodes().iter().skip(1) {
            let parent = &tree.nodes()[node.parent.unwrap()];
            let action = &actions[node.action.unwrap().index()];
            assert_eq!(node.cost, parent.cost + action.cost);
            assert!(node.cost >= parent.cost);
            assert_eq!(node.depth, parent.depth + 1);
        }
        assert!(tree.found());
    }

    #[test]
    fn test_no_action_repeats_in_a_branch() {
        // Toggle actions that could otherwise loop forever
        let actions = vec![
            make_action("on", 1.0, vec![("lit", false)], vec![("lit", true)]),
            make_action("off", 1.0, vec![("lit", true)], vec![("lit", false)]),
            make_action("flip", 1.0, vec![], vec![("flipped", true)]),
        ];
        let initial = WorldState::new().with("lit", false);
        let goal = WorldState::new().with("never", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &initial, &goal);

        for idx in 0..tree.len() {
            let path = tree.path(idx);
            let unique: HashSet<_> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "repeat in branch {:?}", path);
        }
    }

    #[test]
    fn test_leaves_are_not_expanded() {
        let actions = vec![
            make_action("win", 1.0, vec![], vec![("goal", true)]),
            make_action("other", 1.0, vec![], vec![("x", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &WorldState::new(), &goal);

        // root, win (leaf), other, other -> win (leaf)
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.leaves().len(), 2);
        for &leaf in tree.leaves() {
            assert!(tree.nodes().iter().all(|n| n.parent != Some(leaf)));
            assert!(tree.nodes()[leaf].state.satisfies(&goal));
        }
    }

    #[test]
    fn test_matches_recursive_traversal_order() {
        let actions = vec![
            make_action("a", 1.0, vec![], vec![("a", true)]),
            make_action("b", 1.0, vec![("a", true)], vec![("b", true)]),
            make_action("c", 1.0, vec![], vec![("c", true)]),
            make_action("g", 1.0, vec![("b", true)], vec![("goal", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let usable = all_ids(&actions);
        let tree = SearchTree::build(&actions, &usable, &WorldState::new(), &goal);

        let mut expected = Vec::new();
        recursive_order(
            &actions,
            &usable,
            &WorldState::new(),
            &goal,
            &mut expected,
            &mut Vec::new(),
        );
        let built: Vec<Vec<ActionId>> = (1..tree.len()).map(|idx| tree.path(idx)).collect();
        assert_eq!(built, expected);
    }

    #[test]
    fn test_unusable_ids_are_skipped() {
        let actions = vec![
            make_action("a", 1.0, vec![], vec![("goal", true)]),
            make_action("b", 1.0, vec![], vec![("goal", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let usable = vec![ActionId::new(1), ActionId::new(99)];
        let tree = SearchTree::build(&actions, &usable, &WorldState::new(), &goal);
        assert_eq!(tree.leaves().len(), 1);
        assert_eq!(tree.path(tree.leaves()[0]), vec![ActionId::new(1)]);
    }

    #[test]
    fn test_cheapest_leaf_and_tie_break() {
        // Equal-cost solutions: a single cost-2 action, found after a
        // two-step cost-2 path.
        let actions = vec![
            make_action("step1", 1.0, vec![], vec![("x", true)]),
            make_action("step2", 1.0, vec![("x", true)], vec![("goal", true)]),
            make_action("direct", 2.0, vec![], vec![("goal", true)]),
            make_action("pricey", 9.0, vec![], vec![("goal", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &WorldState::new(), &goal);

        let first = tree.cheapest_leaf(TieBreak::FirstFound).unwrap();
        assert_eq!(tree.path(first), vec![ActionId::new(0), ActionId::new(1)]);

        let shortest = tree.cheapest_leaf(TieBreak::FewestActions).unwrap();
        assert_eq!(tree.path(shortest), vec![ActionId::new(2)]);

        let min = tree
            .leaves()
            .iter()
            .map(|&l| tree.nodes()[l].cost)
            .fold(f32::INFINITY, f32::min);
        assert_eq!(tree.nodes()[first].cost, min);
        assert_eq!(tree.nodes()[shortest].cost, min);
    }

    #[test]
    fn test_branch_starts_at_root() {
        let actions = vec![
            make_action("a", 1.0, vec![], vec![("a", true)]),
            make_action("b", 1.0, vec![("a", true)], vec![("goal", true)]),
        ];
        let goal = WorldState::new().with("goal", true);
        let tree = SearchTree::build(&actions, &all_ids(&actions), &WorldState::new(), &goal);
        let leaf = tree.leaves()[0];
        let branch = tree.branch(leaf);
        assert_eq!(branch.first(), Some(&0));
        assert_eq!(branch.last(), Some(&leaf));
        assert_eq!(branch.len(), 3);
    }
}
