//! Rollup Reports: streaming subtotal toolkit for session reports.
//!
//! Usage: rollup <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use rollup_reports::commands::{
    verify_grouped, verify_grouped_reader, GenerateCommand, StreamingSubtotalCommand,
    SubtotalCommand, SummaryCommand,
};
use rollup_reports::report::{ReportError, ReportReader};

#[derive(Parser)]
#[command(name = "rollup")]
#[command(version)]
#[command(about = "Rollup: single-pass subtotal aggregation for grouped session reports", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Also strip space and no-break-space digit grouping from measure
    /// fields. By default only comma grouping is stripped, so a lone
    /// space inside a number stays a parse error.
    #[arg(long, global = true)]
    space_grouping: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert subtotal rows after each contiguous key run
    Subtotal {
        /// Input report file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Append a grand total row after the last subtotal
        #[arg(long)]
        grand_total: bool,

        /// Report session counts on subtotal and total rows
        #[arg(short = 'c', long)]
        count: bool,

        /// Drop subtotal and total rows already present in the input
        /// instead of failing
        #[arg(long)]
        skip_subtotals: bool,

        /// Use in-memory mode (loads all rows before writing)
        #[arg(long)]
        in_memory: bool,

        /// Print streaming statistics to stderr
        #[arg(long)]
        stats: bool,

        /// Skip grouped validation (faster for pre-grouped input)
        #[arg(long)]
        assume_grouped: bool,
    },

    /// Print report-wide totals without per-group subtotals
    Summary {
        /// Input report file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Drop subtotal and total rows already present in the input
        /// instead of failing
        #[arg(long)]
        skip_subtotals: bool,
    },

    /// Check that a report is grouped (equal keys contiguous)
    Check {
        /// Input report file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Generate a synthetic grouped session report
    Generate {
        /// Output report file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of session rows
        #[arg(short = 'n', long, default_value = "1000")]
        rows: usize,

        /// Number of distinct films
        #[arg(long, default_value = "20")]
        films: usize,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Must be set before any measure parsing occurs
    if cli.space_grouping {
        rollup_reports::config::set_space_grouping(true);
    }

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .expect("Failed to initialize thread pool");
    }

    let result = match cli.command {
        Commands::Subtotal {
            input,
            grand_total,
            count,
            skip_subtotals,
            in_memory,
            stats,
            assume_grouped,
        } => run_subtotal(
            input,
            grand_total,
            count,
            skip_subtotals,
            in_memory,
            stats,
            assume_grouped,
        ),

        Commands::Summary {
            input,
            skip_subtotals,
        } => run_summary(input, skip_subtotals),

        Commands::Check { input } => run_check(input),

        Commands::Generate {
            output,
            rows,
            films,
            seed,
            force,
        } => run_generate(output, rows, films, seed, force),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_subtotal(
    input: Option<PathBuf>,
    grand_total: bool,
    count: bool,
    skip_subtotals: bool,
    in_memory: bool,
    stats: bool,
    assume_grouped: bool,
) -> Result<(), ReportError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    if in_memory {
        // In-memory mode loads all rows before writing, so a parse
        // failure produces no partial output
        let cmd = SubtotalCommand::new()
            .with_count(count)
            .with_grand_total(grand_total)
            .with_skip_subtotals(skip_subtotals);

        match input {
            Some(path) if path.to_string_lossy() != "-" => {
                if !assume_grouped {
                    validate_grouped(&path)?;
                }
                cmd.run(&path, &mut handle)
            }
            _ => {
                let stdin = io::stdin();
                let buffer = if assume_grouped {
                    let mut buf = Vec::new();
                    io::Read::read_to_end(&mut stdin.lock(), &mut buf)?;
                    buf
                } else {
                    verify_grouped_reader(stdin.lock()).map_err(|e| {
                        ReportError::InvalidFormat(format!(
                            "stdin is not grouped: {}\n\n\
                             Fix: Group your input by (film, dimension) before piping.\n\
                             Or use '--assume-grouped' if you know the input is grouped.",
                            e
                        ))
                    })?
                };
                let reader = ReportReader::new(std::io::Cursor::new(buffer));
                let rows = reader.rows().collect::<Result<Vec<_>, _>>()?;
                cmd.run_rows(rows, &mut handle)
            }
        }
    } else {
        // Streaming mode (default), holds only the active run in memory
        let cmd = StreamingSubtotalCommand::new()
            .with_count(count)
            .with_grand_total(grand_total)
            .with_skip_subtotals(skip_subtotals);

        let result = if let Some(path) = input {
            if path.to_string_lossy() == "-" {
                // Stdin: validate by buffering, then process
                if !assume_grouped {
                    let stdin = io::stdin();
                    let buffer = verify_grouped_reader(stdin.lock()).map_err(|e| {
                        ReportError::InvalidFormat(format!(
                            "stdin is not grouped: {}\n\n\
                             Fix: Group your input by (film, dimension) before piping.\n\
                             Or use '--assume-grouped' if you know the input is grouped.",
                            e
                        ))
                    })?;
                    let cursor = std::io::Cursor::new(buffer);
                    let reader = ReportReader::new(cursor);
                    cmd.run_streaming(reader, &mut handle)?
                } else {
                    cmd.run_stdin(&mut handle)?
                }
            } else {
                // File: validate before processing
                if !assume_grouped {
                    validate_grouped(&path)?;
                }
                cmd.run(&path, &mut handle)?
            }
        } else {
            // No path specified: read from stdin
            if !assume_grouped {
                let stdin = io::stdin();
                let buffer = verify_grouped_reader(stdin.lock()).map_err(|e| {
                    ReportError::InvalidFormat(format!(
                        "stdin is not grouped: {}\n\n\
                         Fix: Group your input by (film, dimension) before piping.\n\
                         Or use '--assume-grouped' if you know the input is grouped.",
                        e
                    ))
                })?;
                let cursor = std::io::Cursor::new(buffer);
                let reader = ReportReader::new(cursor);
                cmd.run_streaming(reader, &mut handle)?
            } else {
                cmd.run_stdin(&mut handle)?
            }
        };

        if stats {
            eprintln!("Streaming subtotal stats: {}", result);
        }

        Ok(())
    }
}

/// Helper to validate that a report file is grouped.
fn validate_grouped(path: &PathBuf) -> Result<(), ReportError> {
    verify_grouped(path).map_err(|e| {
        ReportError::InvalidFormat(format!(
            "Input is not grouped: {}\n\n\
             Fix: Sort or group '{}' by (film, dimension) first.\n\
             Or use '--assume-grouped' if you know the input is grouped.",
            e,
            path.display()
        ))
    })
}

fn run_summary(input: Option<PathBuf>, skip_subtotals: bool) -> Result<(), ReportError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let cmd = SummaryCommand::new().with_skip_subtotals(skip_subtotals);

    if let Some(path) = input {
        if path.to_string_lossy() == "-" {
            cmd.run_stdin(&mut handle)
        } else {
            cmd.run(&path, &mut handle)
        }
    } else {
        cmd.run_stdin(&mut handle)
    }
}

fn run_check(input: Option<PathBuf>) -> Result<(), ReportError> {
    match input {
        Some(path) if path.to_string_lossy() != "-" => verify_grouped(&path)?,
        _ => {
            let stdin = io::stdin();
            verify_grouped_reader(stdin.lock())?;
        }
    }
    eprintln!("OK: input is grouped");
    Ok(())
}

fn run_generate(
    output: PathBuf,
    rows: usize,
    films: usize,
    seed: u64,
    force: bool,
) -> Result<(), ReportError> {
    let cmd = GenerateCommand {
        output,
        rows,
        films,
        seed,
        force,
    };
    let stats = cmd.run()?;
    eprintln!("Generated: {}", stats);
    Ok(())
}
