use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Instant;

use log::{debug, trace, warn};

use crate::clause_set::ClauseSet;
use crate::decision_stack::{ClauseRef, DecisionStack};
use crate::error::{Result, SolverError};
use crate::model::Model;
use crate::solver::{SolveResult, Stats};
use crate::types::{Clause, Lit, Var};
use crate::varorder::VarOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConflictAnalysis {
    /// Resolve back to the first unique implication point of the current
    /// level and jump to the second highest level of the learned clause.
    #[default]
    FirstUip,
    /// Learn the conflict clause joined with the negated assignment
    /// literals it mentions, and jump to the highest level it mentions.
    /// Falls back to `FirstUip` on conflicts where this learns nothing new
    /// and undoes nothing.
    Simplified,
}

enum ClauseState { Satisfied, Conflict, Unit(Lit), Open }

/// Conflict-driven clause learning over one mutable state: an assignment
/// recorded on a decision stack, the input clauses and the learned clauses.
#[derive(Debug)]
pub struct Cdcl {
    clauses  : Vec<Clause>,
    learnt   : Vec<Clause>,
    known    : HashSet<Vec<Lit>>,   // sorted literals of every clause in the database
    vars     : Vec<Var>,
    stack    : DecisionStack,
    model    : Model,
    position : HashMap<Var, usize>, // index of each assigned variable on the stack
    order    : VarOrder,
    analysis : ConflictAnalysis,
    deadline : Option<Instant>,
    stats    : Stats,
}

fn sorted(lits: &[Lit]) -> Vec<Lit> {
    let mut key = lits.to_vec();
    key.sort_unstable();
    key
}

impl Cdcl {
    pub fn new(initial: &ClauseSet, analysis: ConflictAnalysis, mut order: VarOrder) -> Cdcl {
        let vars: Vec<Var> = initial.variables().into_iter().collect();
        for &var in vars.iter() {
            order.new_var(var);
        }

        // tautologies can never be falsified
        let clauses: Vec<Clause> = initial.iter()
            .filter(|c| !c.is_tautology())
            .cloned()
            .collect();
        let known = clauses.iter().map(|c| sorted(c.lits())).collect();

        Cdcl {
            clauses,
            learnt: Vec::new(),
            known,
            vars,
            stack: DecisionStack::new(),
            model: Model::new(),
            position: HashMap::new(),
            order,
            analysis,
            deadline: None,
            stats: Stats::default(),
        }
    }

    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Cdcl {
        self.deadline = deadline;
        self
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn decision_level(&self) -> usize {
        self.stack.level()
    }

    pub fn decision_stack(&self) -> &DecisionStack {
        &self.stack
    }

    pub fn learnt(&self) -> &[Clause] {
        &self.learnt
    }

    /// The current assignment, in the order it was made.
    pub fn assignment(&self) -> Vec<Lit> {
        self.stack.literals()
    }

    fn clause(&self, cref: ClauseRef) -> &Clause {
        if cref < self.clauses.len() {
            &self.clauses[cref]
        } else {
            &self.learnt[cref - self.clauses.len()]
        }
    }

    fn n_clauses(&self) -> usize {
        self.clauses.len() + self.learnt.len()
    }

    fn level_of(&self, var: Var) -> Result<usize> {
        self.position.get(&var)
            .map(|&i| self.stack.get(i).level)
            .ok_or_else(|| SolverError::Internal(format!("variable {var} is not assigned")))
    }

    fn assign(&mut self, lit: Lit, reason: Option<ClauseRef>) -> Result<()> {
        self.model.assign(lit)?;
        self.position.insert(lit.var(), self.stack.len());
        match reason {
            Some(cref) => self.stack.imply(lit, cref),
            None => self.stack.decide(lit),
        }
        Ok(())
    }

    fn clause_state(&self, cref: ClauseRef) -> ClauseState {
        let mut unassigned = None;
        let mut count = 0;
        for &lit in self.clause(cref).lits() {
            match self.model.lit_value(lit) {
                Some(true) => return ClauseState::Satisfied,
                Some(false) => {}
                None => {
                    count += 1;
                    unassigned = Some(lit);
                }
            }
        }
        match (count, unassigned) {
            (0, _) => ClauseState::Conflict,
            (1, Some(lit)) => ClauseState::Unit(lit),
            _ => ClauseState::Open,
        }
    }

    /// Scans the clause database until nothing is forced any more. Returns
    /// the first clause found with every literal false.
    pub fn propagate(&mut self) -> Result<Option<ClauseRef>> {
        loop {
            let mut changed = false;
            for cref in 0..self.n_clauses() {
                match self.clause_state(cref) {
                    ClauseState::Conflict => return Ok(Some(cref)),
                    ClauseState::Unit(lit) => {
                        trace!("propagating {lit} from clause {cref}");
                        self.assign(lit, Some(cref))?;
                        self.stats.propagations += 1;
                        changed = true;
                    }
                    ClauseState::Satisfied | ClauseState::Open => {}
                }
            }
            if !changed {
                return Ok(None);
            }
        }
    }

    /// The conflict clause together with the negations of the assigned
    /// literals it mentions, sorted.
    pub fn analyze_conflict(&self, conflict: &[Lit]) -> Vec<Lit> {
        let mut learned: BTreeSet<Lit> = conflict.iter().copied().collect();
        for entry in self.stack.iter() {
            if conflict.contains(&entry.lit.neg()) {
                learned.insert(entry.lit.neg());
            }
        }
        learned.into_iter().collect()
    }

    /// Highest decision level among the variables of `clause`, 0 if none is
    /// assigned.
    pub fn backjump_level(&self, clause: &[Lit]) -> usize {
        clause.iter()
            .filter_map(|l| self.level_of(l.var()).ok())
            .max()
            .unwrap_or(0)
    }

    /// First-UIP learning. Returns the learned clause, asserting literal
    /// first, and the level to jump back to.
    pub fn analyze_first_uip(&mut self, conflict: ClauseRef) -> Result<(Vec<Lit>, usize)> {
        let current = self.stack.level();
        let mut seen: HashSet<Var> = HashSet::new();
        let mut learned: Vec<Lit> = Vec::new();
        let mut counter = 0usize;
        let mut reason: Vec<Lit> = self.clause(conflict).lits().to_vec();
        let mut index = self.stack.len();

        let uip = loop {
            for &lit in reason.iter() {
                let var = lit.var();
                if !seen.insert(var) {
                    continue;
                }
                let level = self.level_of(var)?;
                self.order.bump(var);
                if level == current {
                    counter += 1;
                } else if level > 0 {
                    learned.push(lit);
                }
            }

            if counter == 0 {
                return Err(SolverError::Internal("conflict has no literal at the current level".to_owned()));
            }
            let entry = loop {
                if index == 0 {
                    return Err(SolverError::Internal("no implication point on the stack".to_owned()));
                }
                index -= 1;
                let entry = self.stack.get(index);
                if seen.contains(&entry.lit.var()) {
                    break entry;
                }
            };

            counter -= 1;
            if counter == 0 {
                break entry.lit;
            }
            let cref = entry.reason.ok_or_else(|| {
                SolverError::Internal(format!("implied literal {} has no reason", entry.lit))
            })?;
            reason = self.clause(cref).lits().to_vec();
        };

        learned.insert(0, uip.neg());
        let mut level = 0;
        for lit in learned[1..].iter() {
            level = level.max(self.level_of(lit.var())?);
        }
        Ok((learned, level))
    }

    /// Adds `clause` to the learned clauses unless the database has it.
    pub fn learn(&mut self, clause: Vec<Lit>) -> bool {
        if !self.known.insert(sorted(&clause)) {
            return false;
        }
        debug!("learned {:?}", clause.iter().map(|l| l.to_i32()).collect::<Vec<i32>>());
        self.learnt.push(Clause::from_lits(clause));
        self.stats.learned += 1;
        true
    }

    fn is_known(&self, clause: &[Lit]) -> bool {
        self.known.contains(&sorted(clause))
    }

    /// Undoes every assignment made above `level`.
    pub fn backtrack_to_level(&mut self, level: usize) {
        let undone = self.stack.backtrack_to(level);
        self.model.rollback(self.stack.len());
        for lit in undone.iter() {
            self.position.remove(&lit.var());
        }
        trace!("back to level {level}, undid {} literals", undone.len());
    }

    pub fn all_variables_assigned(&self) -> bool {
        self.vars.iter().all(|&v| self.model.contains(v))
    }

    /// Assigns the next variable of the order and opens a new level.
    pub fn make_decision(&mut self) -> Result<Lit> {
        let model = &self.model;
        let lit = self.order.pick(|v| model.contains(v)).ok_or(SolverError::NoCandidate)?;
        self.assign(lit, None)?;
        self.stats.decisions += 1;
        trace!("decided {lit} at level {}", self.stack.level());
        Ok(lit)
    }

    fn resolve(&mut self, conflict: ClauseRef) -> Result<()> {
        let before = self.stack.level();
        let (learned, level) = match self.analysis {
            ConflictAnalysis::FirstUip => self.analyze_first_uip(conflict)?,
            ConflictAnalysis::Simplified => {
                let learned = self.analyze_conflict(self.clause(conflict).lits());
                let level = self.backjump_level(&learned);
                if self.is_known(&learned) && level >= before {
                    warn!("simplified analysis is stuck at level {before}, using first UIP");
                    self.analyze_first_uip(conflict)?
                } else {
                    (learned, level)
                }
            }
        };
        debug_assert!(level <= before);
        debug!("conflict at level {before}, jumping to {level}");
        self.backtrack_to_level(level);
        self.learn(learned);
        self.order.decay();
        Ok(())
    }

    pub fn solve(&mut self) -> Result<SolveResult> {
        loop {
            if self.deadline.map_or(false, |d| Instant::now() >= d) {
                return Ok(SolveResult::Timeout);
            }

            if let Some(conflict) = self.propagate()? {
                self.stats.conflicts += 1;
                if self.stack.level() == 0 {
                    debug!("cdcl finished: {:?}", self.stats);
                    return Ok(SolveResult::Unsatisfiable);
                }
                self.resolve(conflict)?;
            } else if self.all_variables_assigned() {
                debug!("cdcl finished: {:?}", self.stats);
                return Ok(SolveResult::Satisfiable(self.model.clone()));
            } else {
                self.make_decision()?;
            }
        }
    }
}
