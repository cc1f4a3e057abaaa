//! Appended-CSV benchmark sink: one row per completed run.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// CSV header, written once when the file is created.
const HEADER: &str = "timestamp,n,procs,threads_per_proc,length,time_s,states,description";

/// One benchmark row. `length` is `-1` when the run found no ruler within
/// its cap.
#[derive(Clone, Debug)]
pub struct BenchmarkRow<'a> {
    /// Ruler order searched.
    pub n: usize,
    /// Rank count.
    pub procs: usize,
    /// Worker threads per rank.
    pub threads_per_proc: usize,
    /// Resulting length, or `-1` for an empty result.
    pub length: i32,
    /// Wall-clock seconds.
    pub time_s: f64,
    /// Frames visited across the whole run.
    pub states: u64,
    /// Free-form run description.
    pub description: &'a str,
}

/// Append-only CSV log at a fixed path.
#[derive(Clone, Debug)]
pub struct BenchmarkLog {
    path: PathBuf,
}

impl BenchmarkLog {
    /// Creates a logger for `path`; nothing is written until [`Self::append`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one row, creating the file (and writing the header) first if
    /// needed.
    ///
    /// # Errors
    /// Propagates filesystem errors.
    pub fn append(&self, row: &BenchmarkRow<'_>) -> io::Result<()> {
        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if fresh {
            writeln!(file, "{HEADER}")?;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(
            file,
            "{timestamp},{},{},{},{},{:.5},{},\"{}\"",
            row.n,
            row.procs,
            row.threads_per_proc,
            row.length,
            row.time_s,
            row.states,
            row.description
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("golomb_bench_{tag}_{}.csv", std::process::id()))
    }

    #[test]
    fn header_is_written_exactly_once() {
        let path = scratch_path("header");
        let _ = std::fs::remove_file(&path);

        let log = BenchmarkLog::new(&path);
        let row = BenchmarkRow {
            n: 6,
            procs: 1,
            threads_per_proc: 4,
            length: 17,
            time_s: 0.125,
            states: 12345,
            description: "unit",
        };
        log.append(&row).unwrap();
        log.append(&row).unwrap();

        assert_eq!(log.path(), path.as_path());
        let text = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].contains(",6,1,4,17,0.12500,12345,\"unit\""));
        // Identical rows modulo the timestamp field.
        let strip = |line: &str| line.split_once(',').unwrap().1.to_string();
        assert_eq!(strip(lines[1]), strip(lines[2]));

        std::fs::remove_file(log.path()).unwrap();
    }

    #[test]
    fn empty_result_logs_negative_length() {
        let path = scratch_path("empty");
        let _ = std::fs::remove_file(&path);

        let log = BenchmarkLog::new(&path);
        log.append(&BenchmarkRow {
            n: 5,
            procs: 1,
            threads_per_proc: 1,
            length: -1,
            time_s: 0.001,
            states: 0,
            description: "",
        })
        .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert!(text.lines().nth(1).unwrap().contains(",-1,"));

        std::fs::remove_file(log.path()).unwrap();
    }
}
