use std::collections::BTreeSet;
use std::fmt;

use log::trace;

use crate::error::{Result, SolverError};
use crate::types::{Clause, Lit, Var};

// journal entries, undone in reverse order by `rollback`
#[derive(Debug, Clone, PartialEq, Eq)]
enum Edit {
    Added,
    Removed { index: usize, clause: Clause },
    Shrunk { index: usize, position: usize, lit: Lit },
}

/// Mutable CNF formula: an ordered sequence of clauses.
///
/// An empty set is a satisfied formula; a set holding an empty clause is
/// falsified. Every mutation is journaled so that a search can return to an
/// earlier `checkpoint` in time proportional to the undone edits.
#[derive(Debug, Clone, Default)]
pub struct ClauseSet {
    clauses: Vec<Clause>,
    journal: Vec<Edit>,
}

impl ClauseSet {
    pub fn new() -> ClauseSet {
        ClauseSet::default()
    }

    /// Builds a clause set from DIMACS-style integer clauses, rejecting any
    /// zero literal.
    pub fn from_formula(formula: &[Vec<i32>]) -> Result<ClauseSet> {
        let mut set = ClauseSet::new();
        for (index, raw) in formula.iter().enumerate() {
            let mut lits = Vec::with_capacity(raw.len());
            for &value in raw {
                let lit = Lit::try_from(value).map_err(|_| SolverError::InvalidFormula {
                    clause: index,
                    reason: format!("literal {value} is not a valid literal"),
                })?;
                lits.push(lit);
            }
            set.add_clause(lits);
        }
        set.journal.clear();
        Ok(set)
    }

    pub fn add_clause(&mut self, lits: Vec<Lit>) {
        self.push(Clause::from_lits(lits));
    }

    pub fn push(&mut self, clause: Clause) {
        self.clauses.push(clause);
        self.journal.push(Edit::Added);
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clause> {
        self.clauses.iter()
    }

    pub fn has_empty_clause(&self) -> bool {
        self.clauses.iter().any(Clause::is_empty)
    }

    /// Clauses mentioning `lit` with exactly this polarity.
    pub fn with_literal(&self, lit: Lit) -> impl Iterator<Item = &Clause> + '_ {
        self.clauses.iter().filter(move |c| c.contains(lit))
    }

    /// All variables mentioned by some clause, ascending.
    pub fn variables(&self) -> BTreeSet<Var> {
        self.clauses.iter().flat_map(|c| c.lits().iter().map(|l| l.var())).collect()
    }

    pub fn remove_clause(&mut self, index: usize) -> Clause {
        let clause = self.clauses.remove(index);
        self.journal.push(Edit::Removed { index, clause: clause.clone() });
        clause
    }

    pub fn remove_literal_at(&mut self, index: usize, position: usize) -> Lit {
        let lit = self.clauses[index].remove_at(position);
        self.journal.push(Edit::Shrunk { index, position, lit });
        lit
    }

    /// Strips every occurrence of `var`, in either polarity, from all clauses.
    pub fn remove_literal(&mut self, var: Var) {
        for index in 0..self.clauses.len() {
            let mut position = self.clauses[index].len();
            while position > 0 {
                position -= 1;
                if self.clauses[index].lits()[position].var() == var {
                    self.remove_literal_at(index, position);
                }
            }
        }
    }

    pub fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    /// Undoes every edit made after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: usize) {
        let undone = self.journal.len().saturating_sub(checkpoint);
        while self.journal.len() > checkpoint {
            match self.journal.pop() {
                Some(Edit::Added) => {
                    self.clauses.pop();
                }
                Some(Edit::Removed { index, clause }) => self.clauses.insert(index, clause),
                Some(Edit::Shrunk { index, position, lit }) => {
                    self.clauses[index].insert_at(position, lit)
                }
                None => break,
            }
        }
        trace!("rolled back {undone} clause edits");
    }

    pub fn to_formula(&self) -> Vec<Vec<i32>> {
        self.clauses.iter().map(Clause::to_i32s).collect()
    }
}

impl fmt::Display for ClauseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{clause}")?;
        }
        write!(f, "]")
    }
}
