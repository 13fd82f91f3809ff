use std::fmt;

use crate::error::{Result, SolverError};
use crate::model::Model;

const SIZES: [usize; 3] = [4, 9, 16];

/// Positional base of the cell encoding.
fn base(size: usize) -> i32 {
    if size == 16 { 17 } else { 10 }
}

/// Variable id of "cell (`row`, `column`) holds `value`", all 1-based.
pub fn encode_literal(row: usize, column: usize, value: usize, size: usize) -> i32 {
    let base = base(size);
    value as i32 + base * (column as i32 + base * row as i32)
}

/// Inverse of `encode_literal`: `(row, column, value)`.
pub fn decode_literal(var: i32, size: usize) -> (usize, usize, usize) {
    let base = base(size);
    let var = var.abs();
    let value = var % base;
    let rest = var / base;
    ((rest / base) as usize, (rest % base) as usize, value as usize)
}

fn value_char(value: usize) -> char {
    match value {
        1..=9 => (b'0' + value as u8) as char,
        _ => (b'A' + (value - 10) as u8) as char,
    }
}

fn char_value(c: char) -> Option<usize> {
    match c {
        '1'..='9' => Some(c as usize - '0' as usize),
        'A'..='G' => Some(c as usize - 'A' as usize + 10),
        'a'..='g' => Some(c as usize - 'a' as usize + 10),
        _ => None,
    }
}

/// A square grid of side 4, 9 or 16, stored row-major; `None` is a blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sudoku {
    size: usize,
    cells: Vec<Option<usize>>,
}

impl Sudoku {
    /// Reads a puzzle of `size * size` characters, row by row. `.` and `0`
    /// are blanks, `1`-`9` and `A`-`G` are values.
    pub fn parse(input: &str) -> Result<Sudoku> {
        let chars: Vec<char> = input.trim().chars().collect();
        let size = SIZES.iter()
            .copied()
            .find(|&s| s * s == chars.len())
            .ok_or_else(|| SolverError::Puzzle(format!("{} cells is not a 4x4, 9x9 or 16x16 grid", chars.len())))?;

        let mut cells = Vec::with_capacity(chars.len());
        for (i, &c) in chars.iter().enumerate() {
            let cell = match c {
                '.' | '0' => None,
                _ => match char_value(c) {
                    Some(value) if value <= size => Some(value),
                    _ => return Err(SolverError::Puzzle(format!("bad cell {c:?} at position {i}"))),
                },
            };
            cells.push(cell);
        }
        Ok(Sudoku { size, cells })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Value at 1-based (`row`, `column`).
    pub fn get(&self, row: usize, column: usize) -> Option<usize> {
        self.cells[(row - 1) * self.size + (column - 1)]
    }

    pub fn givens(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    fn box_size(&self) -> usize {
        match self.size {
            4 => 2,
            9 => 3,
            _ => 4,
        }
    }

    /// The 1-based cells of every row, column and box.
    fn groups(&self) -> Vec<Vec<(usize, usize)>> {
        let n = self.size;
        let b = self.box_size();
        let mut groups = Vec::with_capacity(3 * n);
        for i in 1..=n {
            groups.push((1..=n).map(|j| (i, j)).collect());
            groups.push((1..=n).map(|j| (j, i)).collect());
        }
        for br in 0..b {
            for bc in 0..b {
                let mut cells = Vec::with_capacity(n);
                for r in 0..b {
                    for c in 0..b {
                        cells.push((br * b + r + 1, bc * b + c + 1));
                    }
                }
                groups.push(cells);
            }
        }
        groups
    }

    /// The puzzle as CNF: every cell holds exactly one value, every row,
    /// column and box holds each value exactly once, and givens are units.
    pub fn to_cnf(&self) -> Vec<Vec<i32>> {
        let n = self.size;
        let lit = |r: usize, c: usize, v: usize| encode_literal(r, c, v, n);
        let mut formula: Vec<Vec<i32>> = Vec::new();

        for r in 1..=n {
            for c in 1..=n {
                formula.push((1..=n).map(|v| lit(r, c, v)).collect());
                for v in 1..=n {
                    for w in (v + 1)..=n {
                        formula.push(vec![-lit(r, c, v), -lit(r, c, w)]);
                    }
                }
            }
        }

        for group in self.groups() {
            for v in 1..=n {
                formula.push(group.iter().map(|&(r, c)| lit(r, c, v)).collect());
                for (i, &(r1, c1)) in group.iter().enumerate() {
                    for &(r2, c2) in group[i + 1..].iter() {
                        formula.push(vec![-lit(r1, c1, v), -lit(r2, c2, v)]);
                    }
                }
            }
        }

        for r in 1..=n {
            for c in 1..=n {
                if let Some(v) = self.get(r, c) {
                    formula.push(vec![lit(r, c, v)]);
                }
            }
        }
        formula
    }

    /// Reads the grid back from the true variables of `model`.
    pub fn from_model(size: usize, model: &Model) -> Result<Sudoku> {
        if !SIZES.contains(&size) {
            return Err(SolverError::Puzzle(format!("unsupported grid size {size}")));
        }
        let mut cells = vec![None; size * size];
        for (var, value) in model.iter() {
            if !value {
                continue;
            }
            let (r, c, v) = decode_literal(var.id() as i32, size);
            if !(1..=size).contains(&r) || !(1..=size).contains(&c) || !(1..=size).contains(&v) {
                return Err(SolverError::Puzzle(format!("variable {var} is not a cell of a {size}x{size} grid")));
            }
            let cell = &mut cells[(r - 1) * size + (c - 1)];
            if let Some(old) = cell {
                return Err(SolverError::Puzzle(format!("cell ({r}, {c}) holds both {old} and {v}")));
            }
            *cell = Some(v);
        }
        Ok(Sudoku { size, cells })
    }

    /// True if every cell is filled and no row, column or box repeats a value.
    pub fn is_solved(&self) -> bool {
        if self.cells.iter().any(|c| c.is_none()) {
            return false;
        }
        self.groups().iter().all(|group| {
            let mut seen = vec![false; self.size + 1];
            group.iter().all(|&(r, c)| match self.get(r, c) {
                Some(v) if !seen[v] => {
                    seen[v] = true;
                    true
                }
                _ => false,
            })
        })
    }

    /// True if `self` keeps every given of `puzzle`.
    pub fn extends(&self, puzzle: &Sudoku) -> bool {
        self.size == puzzle.size
            && puzzle.cells.iter()
                .zip(self.cells.iter())
                .all(|(given, cell)| given.is_none() || given == cell)
    }

    /// The grid in its one-line puzzle form.
    pub fn to_line(&self) -> String {
        self.cells.iter().map(|c| c.map_or('.', value_char)).collect()
    }
}

impl fmt::Display for Sudoku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.size).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.map_or('.', value_char))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cdcl::ConflictAnalysis;
    use crate::solver::{solve, Engine, SolveResult, SolverOptions};

    const PUZZLE_4: &str = "12.4.41..14.4..1";

    #[test]
    fn test_encoding() {
        assert_eq!(encode_literal(1, 1, 1, 9), 111);
        assert_eq!(encode_literal(9, 8, 7, 9), 987);
        assert_eq!(encode_literal(2, 3, 4, 4), 234);
        assert_eq!(encode_literal(16, 16, 16, 16), 16 + 17 * (16 + 17 * 16));
        assert_eq!(decode_literal(987, 9), (9, 8, 7));
        assert_eq!(decode_literal(-234, 4), (2, 3, 4));
        assert_eq!(decode_literal(encode_literal(12, 5, 16, 16), 16), (12, 5, 16));
    }

    #[test]
    fn test_parse() {
        let sudoku = Sudoku::parse(PUZZLE_4).unwrap();
        assert_eq!(sudoku.size(), 4);
        assert_eq!(sudoku.get(1, 2), Some(2));
        assert_eq!(sudoku.get(1, 3), None);
        assert_eq!(sudoku.givens(), 9);
        assert_eq!(sudoku.to_line(), PUZZLE_4);

        let big = Sudoku::parse(&format!("G{}", "0".repeat(255))).unwrap();
        assert_eq!(big.get(1, 1), Some(16));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(Sudoku::parse("123"), Err(SolverError::Puzzle(_))));
        assert!(matches!(Sudoku::parse("12.5.41..14.4..1"), Err(SolverError::Puzzle(_))));
        assert!(matches!(Sudoku::parse("12.4.41..14.4..x"), Err(SolverError::Puzzle(_))));
    }

    #[test]
    fn test_cnf_size() {
        let sudoku = Sudoku::parse(PUZZLE_4).unwrap();
        // cells: 16 * (1 + 6); groups: 12 * 4 * (1 + 6); givens: 9
        assert_eq!(sudoku.to_cnf().len(), 16 * 7 + 12 * 4 * 7 + 9);
    }

    #[test]
    fn test_is_solved() {
        let solved = Sudoku::parse("1234341221434321").unwrap();
        assert!(solved.is_solved());
        assert!(solved.extends(&Sudoku::parse(PUZZLE_4).unwrap()));
        assert!(!Sudoku::parse(PUZZLE_4).unwrap().is_solved());
        assert!(!Sudoku::parse("1234341221433421").unwrap().is_solved());
    }

    #[test]
    fn test_solve_4x4() {
        let puzzle = Sudoku::parse(PUZZLE_4).unwrap();
        let formula = puzzle.to_cnf();
        let engines = [
            SolverOptions::default(),
            SolverOptions { engine: Engine::Cdcl, ..SolverOptions::default() },
            SolverOptions { engine: Engine::Cdcl, analysis: ConflictAnalysis::Simplified, ..SolverOptions::default() },
        ];
        for options in engines {
            let solution = solve(&formula, &options).unwrap();
            let model = solution.result.model().unwrap();
            let grid = Sudoku::from_model(4, model).unwrap();
            assert!(grid.is_solved());
            assert!(grid.extends(&puzzle));
            assert_eq!(grid.to_line(), "1234341221434321");
        }
    }

    #[test]
    fn test_4x4_solution_is_unique() {
        let puzzle = Sudoku::parse(PUZZLE_4).unwrap();
        let mut formula = puzzle.to_cnf();
        let solution = solve(&formula, &SolverOptions::default()).unwrap();
        let grid = Sudoku::from_model(4, solution.result.model().unwrap()).unwrap();

        let mut blocking = Vec::new();
        for r in 1..=4 {
            for c in 1..=4 {
                if let Some(v) = grid.get(r, c) {
                    blocking.push(-encode_literal(r, c, v, 4));
                }
            }
        }
        formula.push(blocking);
        let result = solve(&formula, &SolverOptions::default()).unwrap().result;
        assert_eq!(result, SolveResult::Unsatisfiable);
    }

    #[test]
    fn test_display() {
        let sudoku = Sudoku::parse(PUZZLE_4).unwrap();
        assert_eq!(sudoku.to_string(), "12.4\n.41.\n.14.\n4..1");
    }
}
