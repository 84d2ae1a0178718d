use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The centering/rebalance loop was still moving nodes when the iteration
    /// cap was reached. Callers should show a fallback rather than a
    /// half-converged tree.
    #[error("pedigree layout did not converge within {iterations} iterations")]
    Unresolved { iterations: u32 },
}
