//! Run statistics and reporting.
//!
//! This module summarizes a finished run. It provides:
//! 1. **Summary:** Cycles, simulated time and transaction counts.
//! 2. **Latency:** Mean, minimum and maximum request latency.
//! 3. **Channels:** Requests admitted per real channel.
//! 4. **Memory banner:** Bus and burst geometry of the memory system, printed before a run.

use crate::common::constants::CHANNELS;
use crate::memory::MemorySystem;
use crate::sim::RunReport;

const RULE: &str = "==========================================================";
const THIN_RULE: &str = "----------------------------------------------------------";

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"latency"`, `"channels"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "latency", "channels"];

/// Aggregate statistics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    /// Cycles until the last completion.
    pub cycles: u64,
    /// Simulated time in nanoseconds.
    pub elapsed_ns: f64,
    /// Total transactions.
    pub transactions: usize,
    /// Read transactions.
    pub reads: usize,
    /// Write transactions.
    pub writes: usize,
    /// Mean latency in cycles.
    pub avg_latency: f64,
    /// Smallest latency in cycles.
    pub min_latency: u64,
    /// Largest latency in cycles.
    pub max_latency: u64,
    /// Admissions per real channel.
    pub per_channel: [u64; CHANNELS],
}

impl RunStats {
    /// Derives the statistics of `report`.
    pub fn from_report(report: &RunReport) -> Self {
        let writes = report.transactions.iter().filter(|t| t.is_write).count();
        Self {
            cycles: report.cycles,
            elapsed_ns: report.elapsed_ns(),
            transactions: report.transactions.len(),
            reads: report.transactions.len() - writes,
            writes,
            avg_latency: report.average_latency(),
            min_latency: report.latencies().min().unwrap_or(0),
            max_latency: report.latencies().max().unwrap_or(0),
            per_channel: report.admitted_per_channel,
        }
    }

    /// Renders the requested sections.
    ///
    /// Each element of `sections` should be one of `"summary"`, `"latency"` or
    /// `"channels"`. An empty slice renders every section.
    pub fn render_sections(&self, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut lines: Vec<String> = Vec::new();

        if want("summary") {
            lines.push(format!("\n{RULE}"));
            lines.push("DRAM TRACE SIMULATION STATISTICS".to_string());
            lines.push(RULE.to_string());
            lines.push(format!("sim_cycles               {}", self.cycles));
            lines.push(format!("sim_time                 {:.2} ns", self.elapsed_ns));
            lines.push(format!("sim_transactions         {}", self.transactions));
            lines.push(format!("sim_reads                {}", self.reads));
            lines.push(format!("sim_writes               {}", self.writes));
            lines.push(THIN_RULE.to_string());
        }
        if want("latency") {
            lines.push("LATENCY".to_string());
            lines.push(format!("  lat.avg                {:.2} cycles", self.avg_latency));
            lines.push(format!("  lat.min                {} cycles", self.min_latency));
            lines.push(format!("  lat.max                {} cycles", self.max_latency));
            lines.push(THIN_RULE.to_string());
        }
        if want("channels") {
            let total = self.transactions.max(1) as f64;
            lines.push("CHANNEL DISTRIBUTION".to_string());
            for (ch, count) in self.per_channel.iter().enumerate() {
                lines.push(format!(
                    "  ch[{ch}].admitted         {count} ({:.2}%)",
                    *count as f64 / total * 100.0
                ));
            }
        }
        lines.push(RULE.to_string());
        lines.join("\n")
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        println!("{}", self.render_sections(sections));
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}

/// One line per transaction: `R|W 0x<address> latency: <n> cycles`.
pub fn render_transactions(report: &RunReport) -> String {
    report
        .transactions
        .iter()
        .map(|t| {
            format!(
                "{} 0x{:08x} latency: {} cycles",
                t.access().token(),
                t.address,
                t.latency().unwrap_or(0)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prints every transaction of `report` with its latency.
pub fn print_transactions(report: &RunReport) {
    println!("{}", render_transactions(report));
}

/// Bus and burst geometry of `mem`.
pub fn memory_banner(mem: &dyn MemorySystem) -> String {
    [
        RULE.to_string(),
        "MEMORY CONFIGURATION".to_string(),
        format!("  bus_bits               {}", mem.bus_bits()),
        format!("  burst_length           {}", mem.burst_length()),
        format!("  burst_size             {} bytes", mem.burst_size()),
        format!("  tck                    {:.3} ns", mem.tck_ns()),
        RULE.to_string(),
    ]
    .join("\n")
}
