//! Host abstraction over the document the dispatcher manages.

use std::fmt;
use std::rc::Rc;
use web_time::{Duration, Instant};

/// Identifies a scroll listener installed with [`Dom::listen_scroll`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey(u64);

impl ListenerKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Identifies a timer armed with [`Dom::set_timeout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(i64);

impl TimeoutHandle {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Everything the dispatcher needs from a document and its event loop.
///
/// Callbacks handed to the host (`listen_scroll`, `set_timeout`,
/// `load_image`) must run later from the event loop, never from inside the
/// call that received them: the dispatcher holds its state borrowed while it
/// talks to the host.
pub trait Dom: 'static {
    /// Handle to one element. Equality is element identity.
    type Node: Clone + PartialEq + fmt::Debug + 'static;

    fn query_selector_all(&self, selector: &str) -> Vec<Self::Node>;

    fn query_selector(&self, selector: &str) -> Option<Self::Node> {
        self.query_selector_all(selector).into_iter().next()
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Upper-case tag name, e.g. `IMG`.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn add_class(&self, node: &Self::Node, class: &str);

    fn remove_class(&self, node: &Self::Node, class: &str);

    /// Top edge of `node` relative to the document, in px.
    fn offset_top(&self, node: &Self::Node) -> f64;

    /// Visible height of `node` including padding, in px.
    fn inner_height(&self, node: &Self::Node) -> f64;

    /// Whether `node` is `container` or one of its descendants.
    fn contains(&self, container: &Self::Node, node: &Self::Node) -> bool;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

    fn set_style(&self, node: &Self::Node, property: &str, value: &str);

    /// Calls `callback` on every scroll of `target` until removed.
    fn listen_scroll(&self, target: &Self::Node, callback: Rc<dyn Fn()>) -> ListenerKey;

    fn unlisten_scroll(&self, key: ListenerKey);

    fn now(&self) -> Instant;

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutHandle;

    fn clear_timeout(&self, handle: TimeoutHandle);

    /// Fetches `url` off-document and calls `on_load` with the resolved
    /// source once it has loaded. A failed load never calls back.
    fn load_image(&self, url: &str, on_load: Box<dyn FnOnce(String)>);
}
