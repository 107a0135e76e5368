use thiserror::Error;

/// Errors raised while building an action catalog or driving a plan.
///
/// Failing to find a plan is not an error: the planner returns `None` and the
/// controller reports it through [`crate::StateProvider::plan_failed`].
///
/// # Examples
///
/// ```
/// use goap_agent::GoapError;
///
/// let err = GoapError::MissingTarget("collect_wheat".to_string());
/// assert_eq!(
///     err.to_string(),
///     "Action collect_wheat requires a target but none was bound"
/// );
/// ```
#[derive(Error, Debug)]
pub enum GoapError {
    /// Cost is negative, NaN or infinite
    #[error("Action cost must be a finite, non-negative number (got {0})")]
    InvalidActionCost(f32),

    #[error("Action name must not be empty")]
    EmptyActionName,

    /// An action with the same name is already registered in the catalog
    #[error("Action already in catalog: {0}")]
    DuplicateAction(String),

    /// An action id does not belong to the catalog it was used with
    #[error("Unknown action id: {0}")]
    UnknownAction(usize),

    /// The action requires proximity but `can_be_performed` never bound a target
    #[error("Action {0} requires a target but none was bound")]
    MissingTarget(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fallible GOAP operations
pub type Result<T> = std::result::Result<T, GoapError>;
