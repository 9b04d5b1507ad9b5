//! Command line front end for the evalbox binary.

use crate::check::checker::OutputChecker;
use crate::config::types::{Result as EvalResult, RunConfig, TrialSet};
use crate::discovery;
use crate::exec::relay::SignalRelay;
use crate::report::json::JsonReport;
use crate::report::timer::Timer;
use crate::runner::evaluator::Evaluator;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Run a program across test-case files, timing every trial and grading
/// its output against expected results.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The executable to evaluate, followed by its arguments (exec'd
    /// directly, no shell, no PATH search). Harness options go before it;
    /// every token after it is passed through untouched.
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "PROGRAM"
    )]
    command: Vec<String>,

    /// Directory scanned for input files
    #[arg(short = 'd', long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Directory scanned for expected output files
    #[arg(short = 'D', long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Suffix identifying input files, e.g. ".in"
    #[arg(short = 'e', long, value_name = "SUFFIX")]
    input_ext: Option<String>,

    /// Suffix identifying expected output files, e.g. ".out"
    #[arg(short = 'E', long, value_name = "SUFFIX")]
    output_ext: Option<String>,

    /// Explicit input file; "--input=--" means the harness's own stdin;
    /// repeatable
    #[arg(long = "input", value_name = "FILE", allow_hyphen_values = true)]
    inputs: Vec<String>,

    /// Explicit expected output file, paired with --input in order; repeatable
    #[arg(long = "output", value_name = "FILE")]
    outputs: Vec<String>,

    /// Trials per test case
    #[arg(short = 'n', long, default_value_t = 1, value_name = "COUNT")]
    trials: u32,

    /// CPU time limit per trial in seconds (0 = unlimited)
    #[arg(long, default_value_t = 0, value_name = "SECS")]
    cpu_limit: u64,

    /// Wall clock limit per trial in seconds (0 = unlimited)
    #[arg(long, default_value_t = 0, value_name = "SECS")]
    wall_limit: u64,

    /// Only check outputs, skip the timing report
    #[arg(short = 's', long, conflicts_with = "time_only")]
    test_only: bool,

    /// Only time, skip output checking
    #[arg(short = 'm', long)]
    time_only: bool,

    /// Check every trial's output instead of only the first trial's
    #[arg(long)]
    compare_every_trial: bool,

    /// Ignore whitespace when comparing output
    #[arg(short = 'w', long)]
    ignore_whitespace: bool,

    /// Ignore this character when comparing output; repeatable
    #[arg(long = "ignore-char", value_name = "CHAR")]
    ignore_chars: Vec<char>,

    /// Tolerate extra output beyond the expected text
    #[arg(long)]
    ignore_extra: bool,

    /// Tolerate output that stops short of the expected text
    #[arg(long)]
    ignore_truncation: bool,

    /// Digits after the decimal point in timing tables
    #[arg(long, default_value_t = 4, value_name = "DIGITS")]
    precision: usize,

    /// Report only the per-case averages
    #[arg(long, conflicts_with = "no_avg")]
    avg_only: bool,

    /// Report only the individual trials, no averages
    #[arg(long)]
    no_avg: bool,

    /// Add a row of per-trial exit codes to each timing table
    #[arg(long)]
    exit_codes: bool,

    /// Emit a JSON report instead of the human-readable output
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// First command token. Parsing requires at least one value, so the
    /// index is always in bounds.
    fn program(&self) -> &str {
        &self.command[0]
    }

    fn args(&self) -> Vec<String> {
        self.command[1..].to_vec()
    }
}

pub fn run() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let relay = SignalRelay::install()?;

    let (inputs, outputs) = match assemble_matrix(&cli)? {
        Some(matrix) => matrix,
        None => {
            eprintln!("No test cases found");
            return Ok(());
        }
    };

    let config = RunConfig {
        program: PathBuf::from(cli.program()),
        args: cli.args(),
        trials: cli.trials,
        cpu_limit_secs: cli.cpu_limit,
        wall_limit_secs: cli.wall_limit,
        run_tests: !cli.time_only,
        run_timing: !cli.test_only,
        compare_every_trial: cli.compare_every_trial,
        announce_checks: !cli.json,
    };

    let evaluator = Evaluator::new(config.clone(), build_checker(&cli), &relay);
    let sets = evaluator.run(&inputs, &outputs)?;

    if cli.json {
        println!("{}", JsonReport::build(&config, &sets).to_pretty()?);
    } else if config.run_timing {
        build_timer(&cli).print(&sets);
    }
    if !cli.json {
        print_tally(&config, &sets);
    }

    if run_failed(&sets) {
        std::process::exit(1);
    }
    Ok(())
}

/// Build the case matrix: discovered pairs first, explicit pairs after.
/// `None` means discovery was asked for and matched nothing, so there is
/// nothing to run. Only a bare invocation (no discovery flags, no explicit
/// pairs) falls back to a single case with no input and no expected output.
fn assemble_matrix(cli: &Cli) -> EvalResult<Option<(Vec<String>, Vec<String>)>> {
    let (mut inputs, mut outputs) = discover_cases(cli)?;
    append_explicit_cases(&mut inputs, &mut outputs, cli);
    if inputs.is_empty() {
        if discovery_requested(cli) {
            return Ok(None);
        }
        inputs.push(String::new());
        outputs.push(String::new());
    }
    Ok(Some((inputs, outputs)))
}

fn discovery_requested(cli: &Cli) -> bool {
    cli.input_dir.is_some()
        || cli.output_dir.is_some()
        || cli.input_ext.is_some()
        || cli.output_ext.is_some()
}

/// Scan for test files, each side only when its own flags ask for it.
/// Asking for inputs but not outputs yields cases with no expected file,
/// not a scan of the whole working directory.
fn discover_cases(cli: &Cli) -> EvalResult<(Vec<String>, Vec<String>)> {
    let ins = if cli.input_dir.is_some() || cli.input_ext.is_some() {
        let dir = cli.input_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let suffix = cli.input_ext.clone().unwrap_or_default();
        discovery::files_by_suffix(&dir, &suffix)?
    } else {
        Vec::new()
    };
    let outs = if cli.output_dir.is_some() || cli.output_ext.is_some() {
        let dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        let suffix = cli.output_ext.clone().unwrap_or_default();
        discovery::files_by_suffix(&dir, &suffix)?
    } else {
        Vec::new()
    };
    Ok(discovery::pair_stems(ins, outs))
}

/// Append --input/--output pairs after the discovered cases. The shorter
/// list is padded with the no-file sentinel.
fn append_explicit_cases(inputs: &mut Vec<String>, outputs: &mut Vec<String>, cli: &Cli) {
    let extra = cli.inputs.len().max(cli.outputs.len());
    for k in 0..extra {
        inputs.push(cli.inputs.get(k).cloned().unwrap_or_default());
        outputs.push(cli.outputs.get(k).cloned().unwrap_or_default());
    }
}

fn build_checker(cli: &Cli) -> OutputChecker {
    let mut checker = OutputChecker::new();
    if cli.ignore_whitespace {
        checker = checker.ignore_whitespace();
    }
    for &c in &cli.ignore_chars {
        checker = checker.ignore_char(c);
    }
    if cli.ignore_extra {
        checker = checker.ignore_extra_output();
    }
    if cli.ignore_truncation {
        checker = checker.ignore_truncated_output();
    }
    checker
}

fn build_timer(cli: &Cli) -> Timer {
    let mut timer = Timer::new().precision(cli.precision);
    if cli.avg_only {
        timer = timer.only_avg();
    }
    if cli.no_avg {
        timer = timer.no_avg();
    }
    if cli.exit_codes {
        timer = timer.show_exit_codes();
    }
    timer
}

/// Tally over every case, so a case whose trials all errored still counts
/// against the total instead of silently shrinking it.
fn tally_line(config: &RunConfig, sets: &[TrialSet]) -> Option<String> {
    if !config.run_tests || sets.is_empty() {
        return None;
    }
    let passed = sets.iter().filter(|s| s.passed == Some(true)).count();
    Some(format!("Passed {passed} of {} test cases", sets.len()))
}

fn print_tally(config: &RunConfig, sets: &[TrialSet]) {
    if let Some(line) = tally_line(config, sets) {
        println!("{line}");
    }
    let errored: u32 = sets.iter().map(|s| s.errored_trials).sum();
    if errored > 0 {
        eprintln!("{errored} trial(s) did not complete");
    }
}

fn run_failed(sets: &[TrialSet]) -> bool {
    sets.iter()
        .any(|s| s.passed == Some(false) || s.errored_trials > 0)
}
