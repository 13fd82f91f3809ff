use std::cmp::Reverse;
use std::collections::BTreeMap;

use log::trace;

use crate::clause_set::ClauseSet;
use crate::error::{Result, SolverError};
use crate::model::Model;
use crate::types::{Lit, Sign, Var};

/// Picks the next decision literal of a DPLL search.
///
/// Only called when some variable is still unassigned; `NoCandidate` means
/// the caller broke that contract.
pub trait BranchingHeuristic {
    fn choose_literal(&mut self, clauses: &ClauseSet, model: &Model) -> Result<Lit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum HeuristicKind {
    Random,
    #[default]
    Dlis,
    #[value(name = "jw")]
    JeroslowWang,
}

/// Uniform choice among the variables of the initial formula that the model
/// does not bind yet, with a random polarity.
#[derive(Debug, Clone)]
pub struct RandomBranching {
    vars: Vec<Var>,
    rng: fastrand::Rng,
}

impl RandomBranching {
    pub fn new(initial: &ClauseSet, seed: u64) -> RandomBranching {
        RandomBranching {
            vars: initial.variables().into_iter().collect(),
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl BranchingHeuristic for RandomBranching {
    fn choose_literal(&mut self, _clauses: &ClauseSet, model: &Model) -> Result<Lit> {
        let candidates: Vec<Var> = self.vars.iter()
            .copied()
            .filter(|&v| !model.contains(v))
            .collect();
        if candidates.is_empty() {
            return Err(SolverError::NoCandidate);
        }
        let var = candidates[self.rng.usize(..candidates.len())];
        Ok(var.to_lit(Sign::from_bool(self.rng.bool())))
    }
}

/// Dynamic Largest Individual Sum: the literal occurring most often in the
/// current clause set. Ties go to the lowest variable id, then to the
/// positive literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dlis;

impl Dlis {
    pub fn new(_initial: &ClauseSet) -> Dlis {
        Dlis
    }

    pub fn counts(clauses: &ClauseSet, model: &Model) -> BTreeMap<Lit, usize> {
        let mut counts: BTreeMap<Lit, usize> = BTreeMap::new();
        for lit in clauses.iter().flat_map(|c| c.lits().iter()) {
            if !model.contains(lit.var()) {
                *counts.entry(*lit).or_insert(0) += 1;
            }
        }
        counts
    }
}

impl BranchingHeuristic for Dlis {
    fn choose_literal(&mut self, clauses: &ClauseSet, model: &Model) -> Result<Lit> {
        Dlis::counts(clauses, model)
            .into_iter()
            .max_by_key(|&(lit, count)| (count, Reverse(lit.var()), lit.is_positive()))
            .map(|(lit, _)| lit)
            .ok_or(SolverError::NoCandidate)
    }
}

/// Jeroslow-Wang: a static weight per variable, the sum of `2^-len` over the
/// initial clauses mentioning it. The heaviest free variable is branched on
/// positively; ties go to the lowest id.
#[derive(Debug, Clone)]
pub struct JeroslowWang {
    weights: Vec<(Var, f64)>,
}

impl JeroslowWang {
    pub fn new(initial: &ClauseSet) -> JeroslowWang {
        let mut weights: BTreeMap<Var, f64> = BTreeMap::new();
        for clause in initial.iter() {
            let weight = 0.5f64.powi(clause.len() as i32);
            let mut vars: Vec<Var> = clause.lits().iter().map(|l| l.var()).collect();
            vars.sort_unstable();
            vars.dedup();
            for var in vars {
                *weights.entry(var).or_insert(0.0) += weight;
            }
        }
        JeroslowWang { weights: weights.into_iter().collect() }
    }

    pub fn weight(&self, var: Var) -> Option<f64> {
        self.weights.iter().find(|(v, _)| *v == var).map(|&(_, w)| w)
    }
}

impl BranchingHeuristic for JeroslowWang {
    fn choose_literal(&mut self, _clauses: &ClauseSet, model: &Model) -> Result<Lit> {
        let mut best: Option<(Var, f64)> = None;
        for &(var, weight) in self.weights.iter() {
            if model.contains(var) {
                continue;
            }
            if best.map_or(true, |(_, w)| weight > w) {
                best = Some((var, weight));
            }
        }
        best.map(|(var, _)| var.to_lit(Sign::Pos)).ok_or(SolverError::NoCandidate)
    }
}

/// The branching strategy of one solve, fixed at construction.
#[derive(Debug, Clone)]
pub enum Heuristic {
    Random(RandomBranching),
    Dlis(Dlis),
    JeroslowWang(JeroslowWang),
}

impl Heuristic {
    pub fn new(kind: HeuristicKind, initial: &ClauseSet, seed: u64) -> Heuristic {
        match kind {
            HeuristicKind::Random => Heuristic::Random(RandomBranching::new(initial, seed)),
            HeuristicKind::Dlis => Heuristic::Dlis(Dlis::new(initial)),
            HeuristicKind::JeroslowWang => Heuristic::JeroslowWang(JeroslowWang::new(initial)),
        }
    }
}

impl BranchingHeuristic for Heuristic {
    fn choose_literal(&mut self, clauses: &ClauseSet, model: &Model) -> Result<Lit> {
        let lit = match self {
            Heuristic::Random(h) => h.choose_literal(clauses, model),
            Heuristic::Dlis(h) => h.choose_literal(clauses, model),
            Heuristic::JeroslowWang(h) => h.choose_literal(clauses, model),
        }?;
        trace!("branching on {lit}");
        Ok(lit)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cnf(formula: &[Vec<i32>]) -> ClauseSet {
        ClauseSet::from_formula(formula).unwrap()
    }

    #[test]
    fn test_dlis_picks_most_frequent_literal() {
        let set = cnf(&[vec![1, -2], vec![-2, 3], vec![-2, -3], vec![1, 3]]);
        let lit = Dlis.choose_literal(&set, &Model::new()).unwrap();
        assert_eq!(lit, Lit::from_i32(-2));
    }

    #[test]
    fn test_dlis_ties_break_on_lowest_var_then_positive() {
        let set = cnf(&[vec![3, -3, 2, -2]]);
        let lit = Dlis.choose_literal(&set, &Model::new()).unwrap();
        assert_eq!(lit, Lit::from_i32(2));
    }

    #[test]
    fn test_dlis_skips_assigned_vars() {
        let set = cnf(&[vec![1, 2], vec![1, 3], vec![1, -3]]);
        let mut model = Model::new();
        model.set(Var::from_u32(1), false).unwrap();
        let lit = Dlis.choose_literal(&set, &model).unwrap();
        assert_eq!(lit, Lit::from_i32(2));
    }

    #[test]
    fn test_jw_weights() {
        let set = cnf(&[vec![1], vec![1, 2], vec![2, 3, 4]]);
        let jw = JeroslowWang::new(&set);
        assert_eq!(jw.weight(Var::from_u32(1)), Some(0.75));
        assert_eq!(jw.weight(Var::from_u32(2)), Some(0.375));
        assert_eq!(jw.weight(Var::from_u32(4)), Some(0.125));
    }

    #[test]
    fn test_jw_is_static_and_skips_assigned() {
        let set = cnf(&[vec![1], vec![1, 2], vec![2, 3, 4]]);
        let mut jw = JeroslowWang::new(&set);
        let mut model = Model::new();
        assert_eq!(jw.choose_literal(&set, &model).unwrap(), Lit::from_i32(1));
        model.set(Var::from_u32(1), true).unwrap();
        assert_eq!(jw.choose_literal(&cnf(&[vec![3, 4]]), &model).unwrap(), Lit::from_i32(2));
    }

    #[test]
    fn test_jw_ties_go_to_lowest_var() {
        let set = cnf(&[vec![5, 2], vec![-5, -2]]);
        let mut jw = JeroslowWang::new(&set);
        assert_eq!(jw.choose_literal(&set, &Model::new()).unwrap(), Lit::from_i32(2));
    }

    #[test]
    fn test_random_is_reproducible() {
        let set = cnf(&[vec![1, 2, 3, 4, 5, 6, 7, 8]]);
        let mut a = RandomBranching::new(&set, 42);
        let mut b = RandomBranching::new(&set, 42);
        let model = Model::new();
        for _ in 0..10 {
            assert_eq!(a.choose_literal(&set, &model).unwrap(), b.choose_literal(&set, &model).unwrap());
        }
    }

    #[test]
    fn test_random_only_picks_free_vars() {
        let set = cnf(&[vec![1, 2, 3]]);
        let mut random = RandomBranching::new(&set, 7);
        let mut model = Model::new();
        model.set(Var::from_u32(1), true).unwrap();
        model.set(Var::from_u32(3), true).unwrap();
        for _ in 0..10 {
            assert_eq!(random.choose_literal(&set, &model).unwrap().var(), Var::from_u32(2));
        }
    }

    #[test]
    fn test_no_candidate() {
        let set = cnf(&[vec![1]]);
        let mut model = Model::new();
        model.set(Var::from_u32(1), true).unwrap();
        for kind in [HeuristicKind::Random, HeuristicKind::Dlis, HeuristicKind::JeroslowWang] {
            let mut heuristic = Heuristic::new(kind, &set, 0);
            let empty = ClauseSet::new();
            assert!(matches!(heuristic.choose_literal(&empty, &model), Err(SolverError::NoCandidate)));
        }
    }
}
