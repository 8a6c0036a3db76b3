//! Testing utilities and harness for lazyimg

pub mod document;
pub mod logging;
pub mod page;

pub use document::{FakeDocument, NodeId};
pub use logging::{capture_logs, CapturedRecord, LogCapture};
pub use page::TestPage;

pub mod prelude {
    pub use crate::document::*;
    pub use crate::logging::*;
    pub use crate::page::*;
    pub use lazyimg_core::Dom;
}
