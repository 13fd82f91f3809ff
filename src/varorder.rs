use std::collections::HashMap;

use crate::types::{Lit, Sign, Var};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, clap::ValueEnum)]
pub enum SignPolicy { #[default] Pos, Neg, Rnd }

impl SignPolicy {
    fn pick_sign(&self, rng: &mut fastrand::Rng) -> Sign {
        match self {
            SignPolicy::Pos => Sign::Pos,
            SignPolicy::Neg => Sign::Neg,
            SignPolicy::Rnd => Sign::from_bool(rng.bool()),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, clap::ValueEnum)]
pub enum DecisionPolicy {
    /// The free variable with the lowest id.
    #[default]
    LowestIndex,
    /// The free variable with the highest activity; ties go to the lowest id.
    Vsids,
}

/// Decision variable order of the CDCL engine.
///
/// Activities are bumped for variables met during conflict analysis and
/// decay geometrically per conflict (implemented by growing the bump).
#[derive(Debug, Clone)]
pub struct VarOrder {
    vars        : Vec<Var>,             // ascending
    activity    : HashMap<Var, f64>,
    bump        : f64,                  // initialized to 1.0
    inv_decay   : f64,
    policy      : DecisionPolicy,
    sign        : SignPolicy,           // default: choose only positive literals
    rng         : fastrand::Rng,
}

impl VarOrder {
    pub fn new(decay: f64) -> VarOrder {
        VarOrder {
            vars: Vec::new(),
            activity: HashMap::new(),
            bump: 1.0,
            inv_decay: 1.0 / decay,
            policy: DecisionPolicy::LowestIndex,
            sign: SignPolicy::Pos,
            rng: fastrand::Rng::with_seed(0),
        }
    }

    pub fn set_policy(&mut self, policy: DecisionPolicy) {
        self.policy = policy;
    }

    pub fn set_sign_policy(&mut self, sign: SignPolicy, seed: u64) {
        self.sign = sign;
        self.rng = fastrand::Rng::with_seed(seed);
    }

    pub fn set_decay(&mut self, decay: f64) {
        self.inv_decay = 1.0 / decay;
    }

    pub fn new_var(&mut self, var: Var) {
        if !self.activity.contains_key(&var) {
            let at = self.vars.partition_point(|&v| v < var);
            self.vars.insert(at, var);
            self.activity.insert(var, 0.0);
        }
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn activity(&self, var: Var) -> f64 {
        self.activity.get(&var).copied().unwrap_or(0.0)
    }

    pub fn bump(&mut self, var: Var) {
        if let Some(val) = self.activity.get_mut(&var) {
            *val += self.bump;
            if *val > 1e100 {
                self.rescale();
            }
        }
    }

    fn rescale(&mut self) {
        for val in self.activity.values_mut() {
            *val *= 1e-100;
        }
        self.bump *= 1e-100;
    }

    pub fn decay(&mut self) {
        self.bump *= self.inv_decay;
    }

    /// Next decision literal among the variables for which `assigned` is
    /// false, or `None` if there is none.
    pub fn pick<F: Fn(Var) -> bool>(&mut self, assigned: F) -> Option<Lit> {
        let mut free = self.vars.iter().copied().filter(|&v| !assigned(v));
        let var = match self.policy {
            DecisionPolicy::LowestIndex => free.next(),
            DecisionPolicy::Vsids => {
                let mut best: Option<(Var, f64)> = None;
                for v in free {
                    let act = self.activity(v);
                    if best.map_or(true, |(_, a)| act > a) {
                        best = Some((v, act));
                    }
                }
                best.map(|(v, _)| v)
            }
        }?;
        Some(var.to_lit(self.sign.pick_sign(&mut self.rng)))
    }
}
