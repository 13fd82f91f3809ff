use thiserror::Error;

use crate::types::Var;

#[derive(Debug, Error)]
pub enum SolverError {
    /// `0` (or a magnitude outside the variable range) used as a literal.
    #[error("invalid literal {0}")]
    InvalidLiteral(i32),

    /// Malformed input formula, rejected before any solving starts.
    #[error("invalid formula: clause {clause}: {reason}")]
    InvalidFormula { clause: usize, reason: String },

    /// A variable was bound to the opposite of its current value.
    #[error("variable {var} is already assigned the opposite value")]
    AssignmentConflict { var: Var },

    /// A heuristic was queried while every variable is assigned.
    #[error("no unassigned variable left to branch on")]
    NoCandidate,

    #[error("internal solver error: {0}")]
    Internal(String),

    #[error("dimacs line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("invalid puzzle: {0}")]
    Puzzle(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
