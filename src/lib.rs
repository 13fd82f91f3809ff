pub mod types;
pub mod error;
pub mod model;
pub mod clause_set;
pub mod simplifier;
pub mod branching;
pub mod dpll;
pub mod decision_stack;
pub mod varorder;
pub mod cdcl;
pub mod solver;
pub mod dimacs;
pub mod sudoku;

pub use error::{Result, SolverError};
pub use model::Model;
pub use solver::{solve, Engine, Solution, SolveResult, SolverOptions, Stats};

#[cfg(test)]
mod test {
    use super::*;
    use crate::branching::HeuristicKind;
    use crate::cdcl::ConflictAnalysis;
    use crate::varorder::{DecisionPolicy, SignPolicy};

    fn random_formula(rng: &fastrand::Rng, nvars: i32, nclauses: usize) -> Vec<Vec<i32>> {
        (0..nclauses)
            .map(|_| {
                let len = rng.usize(1..=3);
                (0..len)
                    .map(|_| {
                        let var = rng.i32(1..=nvars);
                        if rng.bool() { var } else { -var }
                    })
                    .collect()
            })
            .collect()
    }

    fn brute_force(formula: &[Vec<i32>], nvars: i32) -> bool {
        (0u32..1 << nvars).any(|bits| {
            formula.iter().all(|clause| {
                clause.iter().any(|&lit| {
                    let value = bits & (1 << (lit.abs() - 1)) != 0;
                    value == (lit > 0)
                })
            })
        })
    }

    fn all_options() -> Vec<SolverOptions> {
        let mut options = Vec::new();
        for heuristic in [HeuristicKind::Random, HeuristicKind::Dlis, HeuristicKind::JeroslowWang] {
            options.push(SolverOptions { heuristic, seed: 5, ..SolverOptions::default() });
        }
        for analysis in [ConflictAnalysis::FirstUip, ConflictAnalysis::Simplified] {
            for decision in [DecisionPolicy::LowestIndex, DecisionPolicy::Vsids] {
                for sign in [SignPolicy::Pos, SignPolicy::Rnd] {
                    options.push(SolverOptions {
                        engine: Engine::Cdcl,
                        analysis,
                        decision,
                        sign,
                        seed: 5,
                        ..SolverOptions::default()
                    });
                }
            }
        }
        options
    }

    #[test]
    fn test_agrees_with_truth_table() {
        let rng = fastrand::Rng::with_seed(2023);
        let options = all_options();
        for round in 0..150 {
            let nvars = rng.i32(1..=8);
            let nclauses = rng.usize(1..=(4 * nvars as usize));
            let formula = random_formula(&rng, nvars, nclauses);
            let expected = brute_force(&formula, nvars);

            for opts in options.iter() {
                let solution = solve(&formula, opts).unwrap();
                match &solution.result {
                    SolveResult::Satisfiable(model) => {
                        assert!(expected, "round {round}: {formula:?} is unsat, {opts:?} said sat");
                        assert!(model.satisfies(&formula), "round {round}: bad model for {formula:?} with {opts:?}");
                    }
                    SolveResult::Unsatisfiable => {
                        assert!(!expected, "round {round}: {formula:?} is sat, {opts:?} said unsat");
                    }
                    SolveResult::Timeout => panic!("no deadline was set"),
                }
            }
        }
    }

    #[test]
    fn test_model_covers_every_variable() {
        let formula = vec![vec![1, 2, 3], vec![4, -4], vec![-1, 5], vec![5, 6]];
        for opts in all_options() {
            let solution = solve(&formula, &opts).unwrap();
            let model = solution.result.model().unwrap();
            assert_eq!(model.len(), 6, "{opts:?}");
        }
    }

    #[test]
    fn test_learned_clause_needs_backjump() {
        // p cnf 4 5 with a conflict below the first decision
        let formula = vec![vec![-1, 2], vec![-2, 3], vec![-2, -3, 4], vec![-2, -3, -4], vec![1, 4]];
        let opts = SolverOptions { engine: Engine::Cdcl, ..SolverOptions::default() };
        let solution = solve(&formula, &opts).unwrap();
        let model = solution.result.model().unwrap();
        assert!(model.satisfies(&formula));
        assert_eq!(model.get(crate::types::Var::from_u32(1)), Some(false));
        assert!(solution.stats.learned >= 1);
    }

    #[test]
    fn test_pigeonhole_is_unsat() {
        // three pigeons, two holes: var 2 * p + h
        let var = |p: i32, h: i32| 2 * p + h + 1;
        let mut formula: Vec<Vec<i32>> = (0..3).map(|p| vec![var(p, 0), var(p, 1)]).collect();
        for h in 0..2 {
            for p in 0..3 {
                for q in (p + 1)..3 {
                    formula.push(vec![-var(p, h), -var(q, h)]);
                }
            }
        }
        for opts in all_options() {
            assert_eq!(solve(&formula, &opts).unwrap().result, SolveResult::Unsatisfiable, "{opts:?}");
        }
    }

    #[test]
    fn test_zero_timeout() {
        let formula = vec![vec![1, 2], vec![-1, 2]];
        for engine in [Engine::Dpll, Engine::Cdcl] {
            let opts = SolverOptions { engine, timeout: Some(std::time::Duration::ZERO), ..SolverOptions::default() };
            assert_eq!(solve(&formula, &opts).unwrap().result, SolveResult::Timeout);
        }
    }
}
