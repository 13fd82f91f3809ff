use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, SolverError};
use crate::types::{Clause, Lit, Sign, Var};

/// Partial assignment of variables to booleans.
///
/// Bindings are recorded on a trail so that a search can take a
/// `checkpoint` before branching and `rollback` to it afterwards. Along one
/// branch the model only grows: rebinding a variable to the other value is
/// reported as `SolverError::AssignmentConflict` instead of overwriting it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
    values: HashMap<Var, bool>,
    trail: Vec<Var>,
}

impl Model {
    pub fn new() -> Model {
        Model::default()
    }

    pub fn get(&self, var: Var) -> Option<bool> {
        self.values.get(&var).copied()
    }

    /// Binds `var` to `value`. Returns `Ok(true)` for a new binding and
    /// `Ok(false)` if it already held that value.
    pub fn set(&mut self, var: Var, value: bool) -> Result<bool> {
        match self.values.get(&var) {
            Some(&current) if current == value => Ok(false),
            Some(_) => Err(SolverError::AssignmentConflict { var }),
            None => {
                self.values.insert(var, value);
                self.trail.push(var);
                Ok(true)
            }
        }
    }

    /// Binds the variable of `lit` so that `lit` becomes true.
    pub fn assign(&mut self, lit: Lit) -> Result<bool> {
        self.set(lit.var(), lit.is_positive())
    }

    /// `Some(true)` if `lit` is true, `Some(false)` if false, `None` if its
    /// variable is unbound.
    pub fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.get(lit.var()).map(|v| lit.eval(v))
    }

    pub fn contains(&self, var: Var) -> bool {
        self.values.contains_key(&var)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn checkpoint(&self) -> usize {
        self.trail.len()
    }

    /// Forgets every binding made after `checkpoint`.
    pub fn rollback(&mut self, checkpoint: usize) {
        while self.trail.len() > checkpoint {
            if let Some(var) = self.trail.pop() {
                self.values.remove(&var);
            }
        }
    }

    /// Binds every variable of `vars` that is still free to `false`.
    pub fn complete<I: IntoIterator<Item = Var>>(&mut self, vars: I) {
        for var in vars {
            if !self.contains(var) {
                self.values.insert(var, false);
                self.trail.push(var);
            }
        }
    }

    /// Bound variables in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        let mut vars: Vec<Var> = self.values.keys().copied().collect();
        vars.sort_unstable();
        vars.into_iter().map(move |v| (v, self.values[&v]))
    }

    /// The model as signed literals, ascending by variable.
    pub fn literals(&self) -> Vec<Lit> {
        self.iter().map(|(v, b)| v.to_lit(Sign::from_bool(b))).collect()
    }

    pub fn satisfies_clause(&self, clause: &Clause) -> bool {
        clause.lits().iter().any(|&l| self.lit_value(l) == Some(true))
    }

    /// True if every clause of `formula` has a literal that is true here.
    pub fn satisfies(&self, formula: &[Vec<i32>]) -> bool {
        formula.iter().all(|clause| {
            clause.iter().any(|&raw| {
                Lit::try_from(raw).map_or(false, |l| self.lit_value(l) == Some(true))
            })
        })
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (var, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{var}: {value}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn var(id: u32) -> Var {
        Var::from_u32(id)
    }

    #[test]
    fn test_set_and_get() {
        let mut model = Model::new();
        assert_eq!(model.get(var(1)), None);
        assert_eq!(model.set(var(1), true).unwrap(), true);
        assert_eq!(model.get(var(1)), Some(true));
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let mut model = Model::new();
        model.set(var(2), false).unwrap();
        assert_eq!(model.set(var(2), false).unwrap(), false);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_set_opposite_value_conflicts() {
        let mut model = Model::new();
        model.set(var(3), true).unwrap();
        match model.set(var(3), false) {
            Err(SolverError::AssignmentConflict { var: v }) => assert_eq!(v, var(3)),
            other => panic!("expected a conflict, got {other:?}"),
        }
        assert_eq!(model.get(var(3)), Some(true));
    }

    #[test]
    fn test_rollback() {
        let mut model = Model::new();
        model.set(var(1), true).unwrap();
        let cp = model.checkpoint();
        model.set(var(2), true).unwrap();
        model.set(var(3), false).unwrap();
        model.rollback(cp);
        assert_eq!(model.len(), 1);
        assert_eq!(model.get(var(2)), None);
        assert_eq!(model.set(var(3), true).unwrap(), true);
    }

    #[test]
    fn test_lit_value_and_satisfies() {
        let mut model = Model::new();
        model.assign(Lit::from_i32(-1)).unwrap();
        model.assign(Lit::from_i32(2)).unwrap();
        assert_eq!(model.lit_value(Lit::from_i32(1)), Some(false));
        assert_eq!(model.lit_value(Lit::from_i32(-1)), Some(true));
        assert_eq!(model.lit_value(Lit::from_i32(5)), None);
        assert!(model.satisfies(&[vec![1, 2], vec![-1]]));
        assert!(!model.satisfies(&[vec![1, -2]]));
    }

    #[test]
    fn test_complete_and_literals() {
        let mut model = Model::new();
        model.set(var(2), true).unwrap();
        model.complete([var(1), var(2), var(3)]);
        assert_eq!(model.literals(), vec![Lit::from_i32(-1), Lit::from_i32(2), Lit::from_i32(-3)]);
        assert_eq!(format!("{model}"), "{1: false, 2: true, 3: false}");
    }
}
