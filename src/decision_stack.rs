use std::fmt;

use crate::types::Lit;

/// Index of a clause in the CDCL clause database (original clauses first,
/// learned clauses after them).
pub type ClauseRef = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub lit: Lit,
    pub level: usize,
    /// The clause that forced `lit`; `None` for decisions.
    pub reason: Option<ClauseRef>,
}

/// Assigned literals in assignment order, tagged with the decision level in
/// effect when they were assigned. `lim[i]` is the stack height at which
/// level `i + 1` starts.
#[derive(Debug, Clone, Default)]
pub struct DecisionStack {
    entries: Vec<Entry>,
    lim: Vec<usize>,
}

impl DecisionStack {
    pub fn new() -> DecisionStack {
        DecisionStack::default()
    }

    pub fn level(&self) -> usize {
        self.lim.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Entry {
        self.entries[index]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Opens a new decision level with `lit` as its decision.
    pub fn decide(&mut self, lit: Lit) {
        self.lim.push(self.entries.len());
        let level = self.level();
        self.entries.push(Entry { lit, level, reason: None });
    }

    /// Records `lit` as forced by `reason` at the current level.
    pub fn imply(&mut self, lit: Lit, reason: ClauseRef) {
        let level = self.level();
        self.entries.push(Entry { lit, level, reason: Some(reason) });
    }

    /// Pops every entry above `level` and returns them, most recent first.
    pub fn backtrack_to(&mut self, level: usize) -> Vec<Lit> {
        if level >= self.level() {
            return Vec::new();
        }
        let keep = self.lim[level];
        self.lim.truncate(level);
        self.entries.drain(keep..).rev().map(|e| e.lit).collect()
    }

    /// The assignment as an ordered sequence of literals.
    pub fn literals(&self) -> Vec<Lit> {
        self.entries.iter().map(|e| e.lit).collect()
    }
}

impl fmt::Display for DecisionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut level = None;
        for entry in self.entries.iter() {
            if level != Some(entry.level) {
                if level.is_some() {
                    writeln!(f, "]")?;
                }
                write!(f, "{}: [", entry.level)?;
                level = Some(entry.level);
            }
            match entry.reason {
                Some(_) => write!(f, "{}, ", entry.lit)?,
                None => write!(f, "{}*, ", entry.lit)?,
            }
        }
        if level.is_some() {
            write!(f, "]")?;
        }
        Ok(())
    }
}
