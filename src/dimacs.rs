use std::io::BufRead;

use crate::error::{Result, SolverError};
use crate::model::Model;

/// A formula read from a DIMACS CNF file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimacs {
    pub num_vars: usize,
    pub clauses: Vec<Vec<i32>>,
}

fn parse_error(line: usize, message: impl Into<String>) -> SolverError {
    SolverError::Parse { line, message: message.into() }
}

fn parse_header(line: &str, lineno: usize) -> Result<(usize, usize)> {
    let elems: Vec<&str> = line.split_whitespace().collect();
    match elems.as_slice() {
        ["p", "cnf", nvars, nclauses] => {
            let nvars = nvars.parse().map_err(|_| parse_error(lineno, format!("bad variable count {nvars:?}")))?;
            let nclauses = nclauses.parse().map_err(|_| parse_error(lineno, format!("bad clause count {nclauses:?}")))?;
            Ok((nvars, nclauses))
        }
        _ => Err(parse_error(lineno, "expected `p cnf <variables> <clauses>`")),
    }
}

/// Reads a CNF formula. Clauses end with `0` and may span several lines;
/// `c` lines are comments and a `%` line ends the input.
pub fn parse<R: BufRead>(reader: R) -> Result<Dimacs> {
    let mut header: Option<(usize, usize)> = None;
    let mut clauses: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = index + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') {
            continue;
        } else if trimmed.starts_with('%') {
            break;
        } else if trimmed.starts_with('p') {
            if header.is_some() {
                return Err(parse_error(lineno, "duplicate problem line"));
            }
            header = Some(parse_header(trimmed, lineno)?);
            continue;
        }

        let (nvars, _) = header.ok_or_else(|| parse_error(lineno, "clause before the problem line"))?;
        for token in trimmed.split_whitespace() {
            let lit: i32 = token.parse().map_err(|_| parse_error(lineno, format!("bad literal {token:?}")))?;
            if lit == 0 {
                clauses.push(std::mem::take(&mut current));
            } else if lit.unsigned_abs() as usize > nvars {
                return Err(parse_error(lineno, format!("literal {lit} exceeds the {nvars} declared variables")));
            } else {
                current.push(lit);
            }
        }
    }

    let (num_vars, nclauses) = header.ok_or_else(|| parse_error(0, "missing problem line"))?;
    if !current.is_empty() {
        clauses.push(current);
    }
    if clauses.len() != nclauses {
        return Err(parse_error(0, format!("declared {nclauses} clauses, found {}", clauses.len())));
    }
    Ok(Dimacs { num_vars, clauses })
}

pub fn parse_str(input: &str) -> Result<Dimacs> {
    parse(input.as_bytes())
}

/// The model as a DIMACS solution line: `v` followed by one literal per
/// variable and a terminating `0`.
pub fn model_line(model: &Model) -> String {
    let mut line = String::from("v");
    for lit in model.literals() {
        line.push_str(&format!(" {lit}"));
    }
    line.push_str(" 0");
    line
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Var;

    #[test]
    fn test_parse() {
        let input = "c example\np cnf 3 2\n1 -3 0\n2 3 -1 0\n";
        let dimacs = parse_str(input).unwrap();
        assert_eq!(dimacs.num_vars, 3);
        assert_eq!(dimacs.clauses, vec![vec![1, -3], vec![2, 3, -1]]);
    }

    #[test]
    fn test_clause_spanning_lines() {
        let input = "p cnf 4 2\n1 2\n-3 0 4\n0\n%\n0\n";
        let dimacs = parse_str(input).unwrap();
        assert_eq!(dimacs.clauses, vec![vec![1, 2, -3], vec![4]]);
    }

    #[test]
    fn test_missing_terminator() {
        let dimacs = parse_str("p cnf 2 2\n1 0\n-2").unwrap();
        assert_eq!(dimacs.clauses, vec![vec![1], vec![-2]]);
    }

    #[test]
    fn test_clause_count_mismatch() {
        let err = parse_str("p cnf 2 3\n1 0\n2 0\n").unwrap_err();
        assert!(matches!(err, SolverError::Parse { .. }));
    }

    #[test]
    fn test_variable_out_of_range() {
        let err = parse_str("p cnf 2 1\n1 3 0\n").unwrap_err();
        assert!(matches!(err, SolverError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_bad_header_and_token() {
        assert!(matches!(parse_str("p dnf 2 1\n1 0\n"), Err(SolverError::Parse { line: 1, .. })));
        assert!(matches!(parse_str("p cnf 2 1\n1 x 0\n"), Err(SolverError::Parse { line: 2, .. })));
        assert!(matches!(parse_str("1 2 0\n"), Err(SolverError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_model_line() {
        let mut model = Model::new();
        model.set(Var::from_u32(2), false).unwrap();
        model.set(Var::from_u32(1), true).unwrap();
        assert_eq!(model_line(&model), "v 1 -2 0");
    }
}
