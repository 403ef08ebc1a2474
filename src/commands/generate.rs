//! Generate synthetic session reports for benchmarking.
//!
//! Produces deterministic (seeded) reports with contiguous key runs so
//! the subtotal commands can be benchmarked and fixtures regenerated
//! without shipping real box-office data.

use crate::report::{ReportError, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Buffer size for report generation (1MB).
const BUF_SIZE: usize = 1024 * 1024;

const DIMENSIONS: [&str; 2] = ["2D", "3D"];

/// Generate command configuration.
#[derive(Debug, Clone)]
pub struct GenerateCommand {
    /// Output report path
    pub output: PathBuf,
    /// Total number of session rows
    pub rows: usize,
    /// Number of distinct films
    pub films: usize,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Overwrite an existing output file
    pub force: bool,
}

impl GenerateCommand {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            rows: 1000,
            films: 20,
            seed: 42,
            force: false,
        }
    }

    /// Execute generation, returning the number of rows written.
    pub fn run(&self) -> Result<GenerateStats> {
        if self.films == 0 {
            return Err(ReportError::InvalidFormat(
                "Need at least one film to generate".to_string(),
            ));
        }
        if self.output.exists() && !self.force {
            return Err(ReportError::InvalidFormat(format!(
                "Output file {} exists (use --force to overwrite)",
                self.output.display()
            )));
        }

        let file = File::create(&self.output)?;
        let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
        let mut rng = SmallRng::seed_from_u64(self.seed);

        writeln!(writer, "film\tdimension\tinvitations\tviewers\tgross")?;

        let mut stats = GenerateStats::default();
        let mut written = 0usize;

        // One pass over films x dimensions, each pair visited exactly
        // once so no key can reappear after its run has closed. The row
        // count is split evenly across pairs, remainder to the front.
        let pairs = self.films * DIMENSIONS.len();
        let base = self.rows / pairs;
        let extra = self.rows % pairs;
        let mut pair_idx = 0usize;

        for film_idx in 0..self.films {
            for dimension in DIMENSIONS {
                let run_len = base + usize::from(pair_idx < extra);
                pair_idx += 1;
                if run_len == 0 {
                    continue;
                }

                for _ in 0..run_len {
                    let viewers: u32 = rng.gen_range(5..400);
                    let invitations: u32 = rng.gen_range(0..20);
                    // Whole-cent gross per viewer
                    let cents: u64 = viewers as u64 * rng.gen_range(500..2500);
                    writeln!(
                        writer,
                        "Film_{:03}\t{}\t{}\t{}\t{}.{:02}",
                        film_idx + 1,
                        dimension,
                        invitations,
                        viewers,
                        cents / 100,
                        cents % 100
                    )?;
                    written += 1;
                }
                stats.runs += 1;
            }
        }

        writer.flush()?;
        stats.rows = written;
        Ok(stats)
    }
}

/// Statistics from report generation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    /// Session rows written
    pub rows: usize,
    /// Key runs written
    pub runs: usize,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rows: {}, Runs: {}", self.rows, self.runs)
    }
}
