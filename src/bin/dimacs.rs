use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use cpu_time::ProcessTime;

use sat_lib::branching::HeuristicKind;
use sat_lib::cdcl::ConflictAnalysis;
use sat_lib::dimacs;
use sat_lib::varorder::{DecisionPolicy, SignPolicy};
use sat_lib::{solve, Engine, SolveResult, SolverError, SolverOptions};

/// Solves a CNF formula in DIMACS format.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Input file; reads stdin when omitted
    file: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Engine::Dpll)]
    engine: Engine,

    /// Branching heuristic of the dpll engine
    #[arg(long, value_enum, default_value_t = HeuristicKind::Dlis)]
    heuristic: HeuristicKind,

    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Give up after this many seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    #[arg(long, value_enum, default_value_t = ConflictAnalysis::FirstUip)]
    analysis: ConflictAnalysis,

    #[arg(long, value_enum, default_value_t = DecisionPolicy::LowestIndex)]
    decision: DecisionPolicy,

    #[arg(long, value_enum, default_value_t = SignPolicy::Pos)]
    sign: SignPolicy,

    /// Print the search counters
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

    let reader: Box<dyn BufRead> = match &args.file {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };
    let input = dimacs::parse(reader)?;

    let options = SolverOptions {
        engine: args.engine,
        heuristic: args.heuristic,
        seed: args.seed,
        timeout: args.timeout.map(Duration::from_secs_f64),
        analysis: args.analysis,
        decision: args.decision,
        sign: args.sign,
    };

    let start = ProcessTime::now();
    let solution = solve(&input.clauses, &options)?;
    let elapsed = start.elapsed();

    match &solution.result {
        SolveResult::Satisfiable(model) => {
            println!("s SATISFIABLE");
            println!("{}", dimacs::model_line(model));
        }
        SolveResult::Unsatisfiable => println!("s UNSATISFIABLE"),
        SolveResult::Timeout => println!("s UNKNOWN"),
    }

    if args.stats {
        let stats = &solution.stats;
        println!("c decisions    : {}", stats.decisions);
        println!("c conflicts    : {}", stats.conflicts);
        println!("c propagations : {}", stats.propagations);
        println!("c learned      : {}", stats.learned);
        println!("c cpu time     : {:.3}s", elapsed.as_secs_f64());
    }

    Ok(())
}
