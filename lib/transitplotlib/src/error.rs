use failure::Fail;

/// Failure surface of the drawing pipeline.
#[derive(Debug, Fail)]
pub enum PlotError {
    #[fail(display = "invalid input: {}", _0)]
    InvalidInput(String),

    #[fail(display = "no embedding found after {} tries", _0)]
    NoEmbeddingFound(usize),

    #[fail(display = "solver back-end '{}' is not linked", _0)]
    SolverUnavailable(String),

    #[fail(display = "solver reported the problem infeasible")]
    SolverInfeasible,

    #[fail(display = "solver hit the time limit of {}s", _0)]
    SolverTimeout(u64),

    /// Invariant violation. Never recoverable.
    #[fail(display = "internal error: {}", _0)]
    Internal(String),
}
