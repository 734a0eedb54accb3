//! Plain-text trace files.
//!
//! One record per line: `<address in hex> <R|W>`, whitespace separated. The
//! `0x` prefix is optional on input and always written on output. Loading stops
//! at the first malformed line, before any simulation cycle runs.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::common::{TraceError, Transaction};

/// Reads a trace file from disk.
///
/// # Arguments
///
/// * `path` - Trace file path.
///
/// # Returns
///
/// The transactions in file order, or the I/O or parse failure.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Vec<Transaction>, TraceError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trace = parse_trace(BufReader::new(file)).map_err(|e| match e {
        TraceError::Io { source, .. } => TraceError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    tracing::info!(path = %path.display(), transactions = trace.len(), "loaded trace");
    Ok(trace)
}

/// Parses trace records from any buffered reader. Blank lines are skipped.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<Transaction>, TraceError> {
    let mut trace = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| TraceError::Io {
            path: PathBuf::new(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        trace.push(parse_line(idx + 1, &line)?);
    }
    Ok(trace)
}

fn parse_line(line_no: usize, line: &str) -> Result<Transaction, TraceError> {
    let malformed = |reason| TraceError::Malformed {
        line: line_no,
        content: line.trim().to_string(),
        reason,
    };

    let mut fields = line.split_whitespace();
    let addr = fields.next().ok_or_else(|| malformed("missing address"))?;
    let op = fields.next().ok_or_else(|| malformed("missing R/W token"))?;
    if fields.next().is_some() {
        return Err(malformed("trailing fields"));
    }

    let digits = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    let address = u64::from_str_radix(digits, 16).map_err(|_| malformed("invalid hex address"))?;

    let is_write = match op {
        "R" | "r" => false,
        "W" | "w" => true,
        _ => return Err(malformed("expected R or W")),
    };
    Ok(Transaction::new(address, is_write))
}

/// Formats one transaction as a trace record (without newline).
pub fn format_record(t: &Transaction) -> String {
    format!("0x{:08x} {}", t.address, t.access().token())
}

/// Writes a trace file, creating parent directories as needed.
pub fn write_trace(path: impl AsRef<Path>, trace: &[Transaction]) -> Result<(), TraceError> {
    let path = path.as_ref();
    let io_err = |source| TraceError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    for t in trace {
        writeln!(out, "{}", format_record(t)).map_err(io_err)?;
    }
    out.flush().map_err(io_err)?;
    tracing::info!(path = %path.display(), transactions = trace.len(), "trace written");
    Ok(())
}
