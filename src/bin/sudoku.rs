use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use cpu_time::ProcessTime;
use log::warn;

use sat_lib::branching::HeuristicKind;
use sat_lib::cdcl::ConflictAnalysis;
use sat_lib::sudoku::Sudoku;
use sat_lib::varorder::{DecisionPolicy, SignPolicy};
use sat_lib::{solve, Engine, SolveResult, SolverError, SolverOptions};

/// Solves every sudoku of a file, one puzzle per line.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    file: PathBuf,

    #[arg(short, long, value_enum, default_value_t = Engine::Dpll)]
    engine: Engine,

    #[arg(long, value_enum, default_value_t = HeuristicKind::Dlis)]
    heuristic: HeuristicKind,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Seconds allowed per puzzle
    #[arg(short, long)]
    timeout: Option<f64>,

    #[arg(long, value_enum, default_value_t = ConflictAnalysis::FirstUip)]
    analysis: ConflictAnalysis,

    #[arg(long, value_enum, default_value_t = DecisionPolicy::LowestIndex)]
    decision: DecisionPolicy,

    #[arg(long, value_enum, default_value_t = SignPolicy::Pos)]
    sign: SignPolicy,

    /// Print decisions, conflicts and cpu time after each grid
    #[arg(long)]
    stats: bool,
}

fn main() -> Result<(), SolverError> {
    env_logger::builder()
        .format_timestamp(None)
        .format_level(false)
        .format_module_path(false)
        .init();

    let args = Args::parse();
    let options = SolverOptions {
        engine: args.engine,
        heuristic: args.heuristic,
        seed: args.seed,
        timeout: args.timeout.map(Duration::from_secs_f64),
        analysis: args.analysis,
        decision: args.decision,
        sign: args.sign,
    };

    let reader = BufReader::new(File::open(&args.file)?);
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let puzzle = Sudoku::parse(&line)?;

        let start = ProcessTime::now();
        let solution = solve(&puzzle.to_cnf(), &options)?;
        let elapsed = start.elapsed();

        println!("puzzle {}:", index + 1);
        match &solution.result {
            SolveResult::Satisfiable(model) => {
                let grid = Sudoku::from_model(puzzle.size(), model)?;
                if !grid.is_solved() || !grid.extends(&puzzle) {
                    warn!("puzzle {}: decoded grid is not a valid solution", index + 1);
                }
                println!("{grid}");
            }
            other => println!("{other}"),
        }

        if args.stats {
            println!(
                "decisions: {}, conflicts: {}, learned: {}, cpu time: {:.3}s",
                solution.stats.decisions,
                solution.stats.conflicts,
                solution.stats.learned,
                elapsed.as_secs_f64(),
            );
        }
        println!();
    }

    Ok(())
}
