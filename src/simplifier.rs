use std::collections::BTreeSet;
use std::time::Instant;

use log::trace;

use crate::clause_set::ClauseSet;
use crate::model::Model;
use crate::types::Lit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No clause left.
    Satisfied,
    /// An empty clause is present.
    Conflict,
    /// Clauses remain and none is empty: the search has to branch.
    Undetermined,
    /// The deadline expired before the fixpoint was reached.
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Simplified {
    pub changed: bool,
    pub status: Status,
}

/// Unit propagation and pure-literal elimination over a clause set and a
/// model, run to a fixpoint.
///
/// A unit clause that contradicts the model is left in place; propagation
/// then shrinks it to the empty clause, so collisions surface as
/// `Status::Conflict` rather than as an error.
#[derive(Debug, Clone, Default)]
pub struct Simplifier {
    deadline: Option<Instant>,
    assignments: u64,
}

impl Simplifier {
    pub fn new() -> Simplifier {
        Simplifier::default()
    }

    pub fn with_deadline(deadline: Option<Instant>) -> Simplifier {
        Simplifier { deadline, assignments: 0 }
    }

    /// Number of variables bound by the unit and pure-literal rules so far.
    pub fn assignments(&self) -> u64 {
        self.assignments
    }

    pub fn run(&mut self, clauses: &mut ClauseSet, model: &mut Model) -> Simplified {
        let mut changed = self.propagate(clauses, model);

        loop {
            if self.deadline.map_or(false, |d| Instant::now() >= d) {
                return Simplified { changed, status: Status::TimedOut };
            }
            if clauses.has_empty_clause() {
                break;
            }
            let unit = self.remove_unit_clauses(clauses, model);
            changed |= unit;
            if clauses.has_empty_clause() {
                break;
            }
            let pure = self.remove_pure_literals(clauses, model);
            changed |= pure;
            if !unit && !pure {
                break;
            }
        }

        Simplified { changed, status: status_of(clauses) }
    }

    /// Binds the literal of every unit clause, then propagates.
    pub fn remove_unit_clauses(&mut self, clauses: &mut ClauseSet, model: &mut Model) -> bool {
        let units: Vec<Lit> = clauses.iter()
            .filter(|c| c.is_unit())
            .map(|c| c.lits()[0])
            .collect();

        let mut found = false;
        for lit in units {
            match model.assign(lit) {
                Ok(true) => {
                    trace!("unit {lit}");
                    self.assignments += 1;
                    found = true;
                }
                Ok(false) => {}
                Err(_) => trace!("unit {lit} collides with the model"),
            }
        }

        self.propagate(clauses, model) || found
    }

    /// Binds every variable occurring with a single polarity, then
    /// propagates.
    pub fn remove_pure_literals(&mut self, clauses: &mut ClauseSet, model: &mut Model) -> bool {
        let literals: BTreeSet<Lit> = clauses.iter()
            .flat_map(|c| c.lits().iter().copied())
            .collect();

        let mut found = false;
        for &lit in literals.iter() {
            if literals.contains(&lit.neg()) {
                continue;
            }
            if let Ok(true) = model.assign(lit) {
                trace!("pure {lit}");
                self.assignments += 1;
                found = true;
            }
        }

        self.propagate(clauses, model) || found
    }

    /// Drops tautologies and clauses with a true literal, and strips false
    /// literals from the rest.
    pub fn propagate(&self, clauses: &mut ClauseSet, model: &Model) -> bool {
        let mut changed = false;
        let mut index = clauses.len();
        while index > 0 {
            index -= 1;
            let clause = &clauses.clauses()[index];
            if clause.is_tautology() || model.satisfies_clause(clause) {
                clauses.remove_clause(index);
                changed = true;
                continue;
            }
            let mut position = clause.len();
            while position > 0 {
                position -= 1;
                let lit = clauses.clauses()[index].lits()[position];
                if model.lit_value(lit) == Some(false) {
                    clauses.remove_literal_at(index, position);
                    changed = true;
                }
            }
        }
        changed
    }
}

pub fn status_of(clauses: &ClauseSet) -> Status {
    if clauses.is_empty() {
        Status::Satisfied
    } else if clauses.has_empty_clause() {
        Status::Conflict
    } else {
        Status::Undetermined
    }
}
