use std::time::Instant;

use log::{debug, trace};

use crate::branching::{BranchingHeuristic, Heuristic, HeuristicKind};
use crate::clause_set::ClauseSet;
use crate::error::Result;
use crate::model::Model;
use crate::simplifier::{Simplifier, Status};
use crate::solver::{SolveResult, Stats};
use crate::types::Clause;

enum Branch { Sat, Unsat, Timeout }

/// Backtracking search: simplify to a fixpoint, stop on a terminal state,
/// otherwise branch on a literal chosen by the heuristic, trying the literal
/// first and its negation second.
///
/// Branches share one clause set and one model; the state before a branch
/// is restored from their journals instead of from a copy.
pub struct Dpll {
    initial: ClauseSet,
    heuristic: Heuristic,
    simplifier: Simplifier,
    deadline: Option<Instant>,
    stats: Stats,
}

impl Dpll {
    pub fn new(initial: ClauseSet, kind: HeuristicKind, seed: u64) -> Dpll {
        let heuristic = Heuristic::new(kind, &initial, seed);
        Dpll {
            initial,
            heuristic,
            simplifier: Simplifier::new(),
            deadline: None,
            stats: Stats::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Dpll {
        self.deadline = deadline;
        self.simplifier = Simplifier::with_deadline(deadline);
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn solve(&mut self) -> Result<SolveResult> {
        let mut clauses = self.initial.clone();
        let mut model = Model::new();

        let outcome = self.branch(&mut clauses, &mut model)?;
        self.stats.propagations = self.simplifier.assignments();
        debug!("dpll finished: {:?}", self.stats);

        Ok(match outcome {
            Branch::Sat => {
                model.complete(self.initial.variables());
                SolveResult::Satisfiable(model)
            }
            Branch::Unsat => SolveResult::Unsatisfiable,
            Branch::Timeout => SolveResult::Timeout,
        })
    }

    fn timed_out(&self) -> bool {
        self.deadline.map_or(false, |d| Instant::now() >= d)
    }

    fn branch(&mut self, clauses: &mut ClauseSet, model: &mut Model) -> Result<Branch> {
        if self.timed_out() {
            return Ok(Branch::Timeout);
        }

        match self.simplifier.run(clauses, model).status {
            Status::Satisfied => return Ok(Branch::Sat),
            Status::Conflict => {
                self.stats.conflicts += 1;
                return Ok(Branch::Unsat);
            }
            Status::TimedOut => return Ok(Branch::Timeout),
            Status::Undetermined => {}
        }

        let lit = self.heuristic.choose_literal(clauses, model)?;
        self.stats.decisions += 1;

        let checkpoint = (clauses.checkpoint(), model.checkpoint());
        for choice in [lit, lit.neg()] {
            trace!("trying {choice} with {} assigned", model.len());
            clauses.push(Clause::unit(choice));
            match self.branch(clauses, model)? {
                Branch::Unsat => {
                    clauses.rollback(checkpoint.0);
                    model.rollback(checkpoint.1);
                }
                done => return Ok(done),
            }
        }
        Ok(Branch::Unsat)
    }
}
