//! Log capture for assertions on diagnostics.
//!
//! The capturing logger is installed process-wide once; records are kept per
//! thread so tests running in parallel do not see each other's output.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static RECORDS: RefCell<Vec<CapturedRecord>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records.borrow_mut().push(CapturedRecord {
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
            });
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Installs the capturing logger (once) and clears this thread's records.
pub fn capture_logs() -> LogCapture {
    INSTALL.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    RECORDS.with(|records| records.borrow_mut().clear());
    LogCapture { _private: () }
}

/// View over the records logged on the current thread.
#[derive(Debug)]
pub struct LogCapture {
    _private: (),
}

impl LogCapture {
    pub fn records(&self) -> Vec<CapturedRecord> {
        RECORDS.with(|records| records.borrow().clone())
    }

    /// Records at exactly `level`.
    pub fn at(&self, level: Level) -> Vec<CapturedRecord> {
        RECORDS.with(|records| {
            records
                .borrow()
                .iter()
                .filter(|record| record.level == level)
                .cloned()
                .collect()
        })
    }

    /// Records at `Warn` or more severe.
    pub fn diagnostics(&self) -> Vec<CapturedRecord> {
        RECORDS.with(|records| {
            records
                .borrow()
                .iter()
                .filter(|record| record.level <= Level::Warn)
                .cloned()
                .collect()
        })
    }

    pub fn clear(&self) {
        RECORDS.with(|records| records.borrow_mut().clear());
    }
}
