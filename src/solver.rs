use std::fmt;
use std::time::{Duration, Instant};

use log::info;

use crate::branching::HeuristicKind;
use crate::cdcl::{Cdcl, ConflictAnalysis};
use crate::clause_set::ClauseSet;
use crate::dpll::Dpll;
use crate::error::Result;
use crate::model::Model;
use crate::types::Lit;
use crate::varorder::{DecisionPolicy, SignPolicy, VarOrder};

const VAR_DECAY: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Engine {
    #[default]
    Dpll,
    Cdcl,
}

/// Everything that configures one solve.
#[derive(Debug, Clone, Default)]
pub struct SolverOptions {
    pub engine: Engine,
    /// Branching heuristic of the DPLL engine.
    pub heuristic: HeuristicKind,
    pub seed: u64,
    pub timeout: Option<Duration>,
    pub analysis: ConflictAnalysis,
    pub decision: DecisionPolicy,
    pub sign: SignPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveResult {
    Satisfiable(Model),
    Unsatisfiable,
    /// The deadline passed before the search finished.
    Timeout,
}

impl SolveResult {
    pub fn is_sat(&self) -> bool {
        matches!(self, SolveResult::Satisfiable(_))
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SolveResult::Satisfiable(model) => Some(model),
            _ => None,
        }
    }
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveResult::Satisfiable(_) => write!(f, "SAT"),
            SolveResult::Unsatisfiable => write!(f, "UNSAT"),
            SolveResult::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub decisions: u64,
    pub conflicts: u64,
    /// Variables bound by unit propagation (and, in DPLL, pure literals).
    pub propagations: u64,
    pub learned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub result: SolveResult,
    pub stats: Stats,
    /// Satisfying assignment of the CDCL engine in decision stack order;
    /// empty for DPLL and for non satisfiable results.
    pub trail: Vec<Lit>,
}

/// Solves `formula` with the engine selected in `options`.
///
/// Fails with `InvalidFormula` if a clause holds the literal 0; a formula
/// with an empty clause is simply unsatisfiable.
pub fn solve(formula: &[Vec<i32>], options: &SolverOptions) -> Result<Solution> {
    let clauses = ClauseSet::from_formula(formula)?;
    let deadline = options.timeout.map(|t| Instant::now() + t);
    info!("solving {} clauses over {} variables with {:?}", clauses.len(), clauses.variables().len(), options.engine);

    let solution = match options.engine {
        Engine::Dpll => {
            let mut dpll = Dpll::new(clauses, options.heuristic, options.seed).with_deadline(deadline);
            let result = dpll.solve()?;
            Solution { result, stats: dpll.stats().clone(), trail: Vec::new() }
        }
        Engine::Cdcl => {
            let mut order = VarOrder::new(VAR_DECAY);
            order.set_policy(options.decision);
            order.set_sign_policy(options.sign, options.seed);
            let mut cdcl = Cdcl::new(&clauses, options.analysis, order).with_deadline(deadline);
            let result = cdcl.solve()?;
            let trail = if result.is_sat() { cdcl.assignment() } else { Vec::new() };
            Solution { result, stats: cdcl.stats().clone(), trail }
        }
    };

    info!("{} after {} decisions and {} conflicts", solution.result, solution.stats.decisions, solution.stats.conflicts);
    Ok(solution)
}
