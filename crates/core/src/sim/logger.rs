//! Event logger.
//!
//! Writes issue and return events to three streams (`log.txt` with everything,
//! `issue.txt` and `return.txt`). Each stream remembers the last cycle it
//! stamped: the first event of a cycle gets a `[+] <cycle>` prefix, later
//! events in the same cycle get blank padding so they group visually.
//!
//! Console echo is selected by `Verbosity`.

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Deserialize;

use crate::common::Transaction;

/// Width of the cycle prefix, matched by the continuation padding.
const PREFIX_WIDTH: usize = 8;

const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// Which event streams are echoed to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Files only.
    #[default]
    None,
    /// Cycle progress and issue events.
    Issue,
    /// Cycle progress and return events.
    Return,
    /// Cycle progress, issue and return events.
    All,
}

impl Verbosity {
    /// Whether issue events are echoed.
    pub const fn echo_issue(self) -> bool {
        matches!(self, Self::Issue | Self::All)
    }

    /// Whether return events are echoed.
    pub const fn echo_return(self) -> bool {
        matches!(self, Self::Return | Self::All)
    }

    /// Whether the cycle progress line is shown.
    pub const fn echo_cycle(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Issue => "issue",
            Self::Return => "return",
            Self::All => "all",
        };
        f.write_str(name)
    }
}

/// One output stream and the last cycle stamped on it.
struct Stream {
    out: Box<dyn Write>,
    last_cycle: Option<u64>,
}

impl Stream {
    fn new(out: Box<dyn Write>) -> Self {
        Self {
            out,
            last_cycle: None,
        }
    }

    fn emit(&mut self, cycle: u64, line: &str) -> io::Result<()> {
        if self.last_cycle == Some(cycle) {
            write!(self.out, "{:PREFIX_WIDTH$}", "")?;
        } else {
            write!(self.out, "[+] {cycle:<5}")?;
            self.last_cycle = Some(cycle);
        }
        writeln!(self.out, "{line}")
    }
}

/// Three-stream, cycle-deduplicated event log.
pub struct EventLogger {
    all: Stream,
    issue: Stream,
    ret: Stream,
    console: Option<Box<dyn Write>>,
    verbosity: Verbosity,
    current_cycle: u64,
    shown_cycle: Option<u64>,
}

impl EventLogger {
    /// Creates `dir` if needed and opens `log.txt`, `issue.txt` and `return.txt`
    /// in it, echoing to stdout according to `verbosity`.
    pub fn create(dir: impl AsRef<Path>, verbosity: Verbosity) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let open = |name: &str| -> io::Result<Box<dyn Write>> {
            Ok(Box::new(BufWriter::new(File::create(dir.join(name))?)))
        };
        let logger = Self::from_writers(
            open("log.txt")?,
            open("issue.txt")?,
            open("return.txt")?,
            Some(Box::new(io::stdout())),
            verbosity,
        );
        tracing::info!(dir = %dir.display(), %verbosity, "event log opened");
        Ok(logger)
    }

    /// Builds a logger over arbitrary writers.
    ///
    /// # Arguments
    ///
    /// * `all` - Receives every event.
    /// * `issue` - Receives issue events.
    /// * `ret` - Receives return events.
    /// * `console` - Echo target; `None` disables echo regardless of `verbosity`.
    /// * `verbosity` - Which events are echoed.
    pub fn from_writers(
        all: Box<dyn Write>,
        issue: Box<dyn Write>,
        ret: Box<dyn Write>,
        console: Option<Box<dyn Write>>,
        verbosity: Verbosity,
    ) -> Self {
        Self {
            all: Stream::new(all),
            issue: Stream::new(issue),
            ret: Stream::new(ret),
            console,
            verbosity,
            current_cycle: 0,
            shown_cycle: None,
        }
    }

    /// Console verbosity.
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Cycle that subsequent events are attributed to.
    pub const fn cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Sets the current cycle and refreshes the console progress line.
    pub fn set_cycle(&mut self, cycle: u64) -> io::Result<()> {
        self.current_cycle = cycle;
        if self.verbosity.echo_cycle() && self.shown_cycle != Some(cycle) {
            self.shown_cycle = Some(cycle);
            if let Some(console) = self.console.as_mut() {
                write!(console, "{CYAN}[+] {cycle:<5}{RESET}\r")?;
                console.flush()?;
            }
        }
        Ok(())
    }

    /// Records the admission of `t`.
    pub fn log_issue(&mut self, t: &Transaction) -> io::Result<()> {
        let line = format!(
            "\t\t[*] (Issue)  Type: {:<15} | Addr: 0x{:08x}",
            t.access().to_string(),
            t.address
        );
        if self.verbosity.echo_issue() {
            self.echo(GREEN, &line)?;
        }
        let cycle = self.current_cycle;
        self.all.emit(cycle, &line)?;
        self.issue.emit(cycle, &line)
    }

    /// Records the completion of `t`.
    pub fn log_return(&mut self, t: &Transaction) -> io::Result<()> {
        let line = format!(
            "\t\t[=] (Return) Type: {:<15} | Addr: 0x{:08x} | Added: {:>5}, Done: {:>5}, Latency: {:>5}",
            t.access().to_string(),
            t.address,
            t.issue_cycle,
            t.complete_cycle,
            t.complete_cycle.saturating_sub(t.issue_cycle)
        );
        if self.verbosity.echo_return() {
            self.echo(BLUE, &line)?;
        }
        let cycle = self.current_cycle;
        self.all.emit(cycle, &line)?;
        self.ret.emit(cycle, &line)
    }

    /// Flushes all three streams and the console.
    pub fn flush(&mut self) -> io::Result<()> {
        self.all.out.flush()?;
        self.issue.out.flush()?;
        self.ret.out.flush()?;
        if let Some(console) = self.console.as_mut() {
            console.flush()?;
        }
        Ok(())
    }

    fn echo(&mut self, color: &str, line: &str) -> io::Result<()> {
        match self.console.as_mut() {
            Some(console) => writeln!(console, "{color}{line}{RESET}"),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for EventLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLogger")
            .field("verbosity", &self.verbosity)
            .field("current_cycle", &self.current_cycle)
            .field("last_all", &self.all.last_cycle)
            .field("last_issue", &self.issue.last_cycle)
            .field("last_return", &self.ret.last_cycle)
            .finish_non_exhaustive()
    }
}
