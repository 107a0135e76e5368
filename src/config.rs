//! Planner configuration.

/// How the planner chooses between solution leaves of equal running cost.
///
/// The search visits actions in catalog order, so both policies are
/// deterministic for a given catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Keep the first leaf encountered in depth-first traversal order
    #[default]
    FirstFound,
    /// Prefer the leaf with the fewest actions, then the first encountered
    FewestActions,
}

/// Configuration for the [`crate::Planner`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Policy applied when several leaves share the lowest cost
    pub tie_break: TieBreak,
}

impl PlannerConfig {
    /// Sets the policy for equal-cost leaves.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_found() {
        assert_eq!(PlannerConfig::default().tie_break, TieBreak::FirstFound);
    }

    #[test]
    fn test_with_tie_break() {
        let config = PlannerConfig::default().with_tie_break(TieBreak::FewestActions);
        assert_eq!(config.tie_break, TieBreak::FewestActions);
    }
}
