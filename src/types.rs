use std::fmt;

use crate::error::SolverError;

/// A propositional variable, identified by a positive integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(u32);

/// A variable or its negation, in DIMACS convention: the magnitude is the
/// variable id and the sign is the polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(i32);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Sign { Pos, Neg }

impl Sign {
    pub fn from_bool(value: bool) -> Sign {
        if value { Sign::Pos } else { Sign::Neg }
    }

    pub fn as_bool(self) -> bool {
        self == Sign::Pos
    }
}

impl Var {
    /// Panics on 0, which is not a variable.
    pub fn from_u32(id: u32) -> Var {
        assert!(id != 0 && id <= i32::MAX as u32, "invalid variable id {id}");
        Var(id)
    }

    pub fn id(self) -> u32 {
        self.0
    }

    pub fn to_lit(self, sign: Sign) -> Lit {
        match sign {
            Sign::Pos => Lit(self.0 as i32),
            Sign::Neg => Lit(-(self.0 as i32)),
        }
    }
}

impl Lit {
    /// Panics on 0, which is not a literal. Use `Lit::try_from` for
    /// unchecked input.
    pub fn from_i32(value: i32) -> Lit {
        assert!(value != 0 && value != i32::MIN, "invalid literal {value}");
        Lit(value)
    }

    pub fn to_i32(self) -> i32 {
        self.0
    }

    pub fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    pub fn sign(self) -> Sign {
        if self.0 > 0 { Sign::Pos } else { Sign::Neg }
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn neg(self) -> Lit {
        Lit(-self.0)
    }

    /// Truth value of the literal when its variable is bound to `value`.
    pub fn eval(self, value: bool) -> bool {
        self.is_positive() == value
    }
}

impl TryFrom<i32> for Lit {
    type Error = SolverError;

    fn try_from(value: i32) -> Result<Lit, SolverError> {
        if value == 0 || value == i32::MIN {
            return Err(SolverError::InvalidLiteral(value));
        }
        Ok(Lit(value))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A disjunction of literals. Duplicate literals are collapsed on
/// construction, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Clause {
    lits: Vec<Lit>,
}

impl Clause {
    pub fn from_lits(lits: Vec<Lit>) -> Clause {
        let mut out: Vec<Lit> = Vec::with_capacity(lits.len());
        for lit in lits {
            if !out.contains(&lit) {
                out.push(lit);
            }
        }
        Clause { lits: out }
    }

    pub fn unit(lit: Lit) -> Clause {
        Clause { lits: vec![lit] }
    }

    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn is_unit(&self) -> bool {
        self.lits.len() == 1
    }

    pub fn contains(&self, lit: Lit) -> bool {
        self.lits.contains(&lit)
    }

    pub fn contains_var(&self, var: Var) -> bool {
        self.lits.iter().any(|l| l.var() == var)
    }

    /// A clause holding some literal together with its negation.
    pub fn is_tautology(&self) -> bool {
        self.lits.iter().any(|&l| self.lits.contains(&l.neg()))
    }

    pub(crate) fn remove_at(&mut self, position: usize) -> Lit {
        self.lits.remove(position)
    }

    pub(crate) fn insert_at(&mut self, position: usize, lit: Lit) {
        self.lits.insert(position, lit);
    }

    pub fn to_i32s(&self) -> Vec<i32> {
        self.lits.iter().map(|l| l.to_i32()).collect()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, lit) in self.lits.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{lit}")?;
        }
        write!(f, "]")
    }
}
