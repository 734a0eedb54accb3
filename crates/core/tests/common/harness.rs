use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use dramtrace_core::common::Transaction;
use dramtrace_core::sim::{ChannelQueue, EventLogger, Verbosity};

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("dramtrace_core=debug")
        .try_init();
}

/// Builds a trace from `(address, is_write)` pairs.
pub fn trace_of(records: &[(u64, bool)]) -> Vec<Transaction> {
    records
        .iter()
        .map(|&(address, is_write)| Transaction::new(address, is_write))
        .collect()
}

/// Eight channel queues with `trace` on channel 0 and the rest empty.
pub fn single_channel(trace: &[Transaction]) -> Vec<ChannelQueue> {
    let mut queues = vec![ChannelQueue::new(); 8];
    queues[0].extend(trace.iter().copied());
    queues
}

/// In-memory writer whose contents stay readable after it is boxed.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Logger over four shared buffers: all, issue, return and console.
pub struct CapturedLogger {
    pub logger: EventLogger,
    pub all: SharedBuffer,
    pub issue: SharedBuffer,
    pub ret: SharedBuffer,
    pub console: SharedBuffer,
}

impl CapturedLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        let all = SharedBuffer::new();
        let issue = SharedBuffer::new();
        let ret = SharedBuffer::new();
        let console = SharedBuffer::new();
        let logger = EventLogger::from_writers(
            Box::new(all.clone()),
            Box::new(issue.clone()),
            Box::new(ret.clone()),
            Some(Box::new(console.clone())),
            verbosity,
        );
        Self {
            logger,
            all,
            issue,
            ret,
            console,
        }
    }
}
