//! In-memory document implementing [`Dom`].
//!
//! Time only moves when [`FakeDocument::advance`] is called, scroll events
//! only happen through [`FakeDocument::scroll`] and image probes only finish
//! through [`FakeDocument::complete_image`]. Tests therefore control every
//! suspension point of the dispatcher.

use indexmap::IndexMap;
use lazyimg_core::{Dom, ListenerKey, TimeoutHandle};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use web_time::{Duration, Instant};

/// Element handle in a [`FakeDocument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<node {}>", self.0)
    }
}

struct NodeData {
    tag: String,
    parent: Option<NodeId>,
    classes: Vec<String>,
    attributes: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    offset_top: f64,
    inner_height: f64,
}

struct Listener {
    key: ListenerKey,
    target: NodeId,
    callback: Rc<dyn Fn()>,
}

struct Timer {
    handle: TimeoutHandle,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

struct PendingImage {
    url: String,
    on_load: Box<dyn FnOnce(String)>,
}

struct DocumentState {
    nodes: Vec<NodeData>,
    listeners: Vec<Listener>,
    timers: Vec<Timer>,
    images: Vec<PendingImage>,
    requested: Vec<String>,
    origin: Instant,
    elapsed: Duration,
    next_key: u64,
    next_timer: i64,
}

/// Cloneable handle to a headless document and its event loop.
#[derive(Clone)]
pub struct FakeDocument {
    state: Rc<RefCell<DocumentState>>,
}

impl FakeDocument {
    /// Creates a document holding only a `<body>`.
    pub fn new() -> Self {
        let body = NodeData {
            tag: "body".into(),
            parent: None,
            classes: Vec::new(),
            attributes: IndexMap::new(),
            styles: IndexMap::new(),
            offset_top: 0.0,
            inner_height: 0.0,
        };
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                nodes: vec![body],
                listeners: Vec::new(),
                timers: Vec::new(),
                images: Vec::new(),
                requested: Vec::new(),
                origin: Instant::now(),
                elapsed: Duration::ZERO,
                next_key: 1,
                next_timer: 1,
            })),
        }
    }

    pub fn body(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a new `tag` element under `parent`.
    pub fn append(&self, parent: NodeId, tag: &str) -> NodeId {
        let mut state = self.state.borrow_mut();
        assert!(parent.0 < state.nodes.len(), "unknown parent {parent}");
        let id = NodeId(state.nodes.len());
        state.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            parent: Some(parent),
            classes: Vec::new(),
            attributes: IndexMap::new(),
            styles: IndexMap::new(),
            offset_top: 0.0,
            inner_height: 0.0,
        });
        id
    }

    pub fn set_offset_top(&self, node: NodeId, offset: f64) {
        self.state.borrow_mut().nodes[node.0].offset_top = offset;
    }

    pub fn set_inner_height(&self, node: NodeId, height: f64) {
        self.state.borrow_mut().nodes[node.0].inner_height = height;
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.state.borrow().nodes[node.0]
            .classes
            .iter()
            .any(|c| c == class)
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.state.borrow().nodes[node.0].classes.clone()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.state.borrow().nodes[node.0]
            .styles
            .get(property)
            .cloned()
    }

    /// Number of scroll listeners currently installed.
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    /// Fires a scroll event on `node`.
    pub fn scroll(&self, node: NodeId) {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|listener| listener.target == node)
            .map(|listener| Rc::clone(&listener.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Time elapsed since the document was created.
    pub fn elapsed(&self) -> Duration {
        self.state.borrow().elapsed
    }

    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Moves the clock forward, running due timers in order.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().elapsed + by;
        loop {
            let next = {
                let mut state = self.state.borrow_mut();
                let earliest = state
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, timer)| timer.due <= target)
                    .min_by_key(|(_, timer)| (timer.due, timer.handle.get()))
                    .map(|(index, _)| index);
                match earliest {
                    Some(index) => {
                        let timer = state.timers.remove(index);
                        state.elapsed = state.elapsed.max(timer.due);
                        Some(timer.callback)
                    }
                    None => None,
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.state.borrow_mut().elapsed = target;
    }

    /// URLs of probes that have not finished.
    pub fn pending_images(&self) -> Vec<String> {
        self.state
            .borrow()
            .images
            .iter()
            .map(|image| image.url.clone())
            .collect()
    }

    /// Every URL ever requested, in request order.
    pub fn requested_images(&self) -> Vec<String> {
        self.state.borrow().requested.clone()
    }

    /// Finishes the oldest pending probe for `url`. Returns `false` if none.
    pub fn complete_image(&self, url: &str) -> bool {
        let image = {
            let mut state = self.state.borrow_mut();
            let index = state.images.iter().position(|image| image.url == url);
            index.map(|index| state.images.remove(index))
        };
        match image {
            Some(image) => {
                (image.on_load)(image.url);
                true
            }
            None => false,
        }
    }

    /// Finishes every pending probe. Returns how many completed.
    pub fn complete_all_images(&self) -> usize {
        let images: Vec<PendingImage> = self.state.borrow_mut().images.drain(..).collect();
        let count = images.len();
        for image in images {
            (image.on_load)(image.url);
        }
        count
    }

    /// Drops the pending probe for `url` without ever calling back, the way a
    /// broken URL behaves.
    pub fn fail_image(&self, url: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.images.len();
        state.images.retain(|image| image.url != url);
        before != state.images.len()
    }

    fn matches(node: &NodeData, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|c| c == class)
        } else if let Some(id) = selector.strip_prefix('#') {
            node.attributes.get("id").is_some_and(|value| value == id)
        } else if let Some(attr) = selector
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            node.attributes.contains_key(attr)
        } else {
            node.tag.eq_ignore_ascii_case(selector)
        }
    }
}

impl Default for FakeDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FakeDocument")
            .field("nodes", &state.nodes.len())
            .field("listeners", &state.listeners.len())
            .field("timers", &state.timers.len())
            .field("images", &state.images.len())
            .field("elapsed", &state.elapsed)
            .finish()
    }
}

impl Dom for FakeDocument {
    type Node = NodeId;

    fn query_selector_all(&self, selector: &str) -> Vec<NodeId> {
        self.state
            .borrow()
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| Self::matches(node, selector))
            .map(|(index, _)| NodeId(index))
            .collect()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.state.borrow().nodes[node.0].attributes.get(name).cloned()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.state.borrow().nodes[node.0].tag.to_ascii_uppercase()
    }

    fn add_class(&self, node: &NodeId, class: &str) {
        let mut state = self.state.borrow_mut();
        let classes = &mut state.nodes[node.0].classes;
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: &NodeId, class: &str) {
        self.state.borrow_mut().nodes[node.0]
            .classes
            .retain(|c| c != class);
    }

    fn offset_top(&self, node: &NodeId) -> f64 {
        self.state.borrow().nodes[node.0].offset_top
    }

    fn inner_height(&self, node: &NodeId) -> f64 {
        self.state.borrow().nodes[node.0].inner_height
    }

    fn contains(&self, container: &NodeId, node: &NodeId) -> bool {
        let state = self.state.borrow();
        let mut current = Some(*node);
        while let Some(id) = current {
            if id == *container {
                return true;
            }
            current = state.nodes[id.0].parent;
        }
        false
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
        self.state.borrow_mut().nodes[node.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) {
        self.state.borrow_mut().nodes[node.0]
            .styles
            .insert(property.to_string(), value.to_string());
    }

    fn listen_scroll(&self, target: &NodeId, callback: Rc<dyn Fn()>) -> ListenerKey {
        let mut state = self.state.borrow_mut();
        let key = ListenerKey::new(state.next_key);
        state.next_key += 1;
        state.listeners.push(Listener {
            key,
            target: *target,
            callback,
        });
        key
    }

    fn unlisten_scroll(&self, key: ListenerKey) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|listener| listener.key != key);
    }

    fn now(&self) -> Instant {
        let state = self.state.borrow();
        state.origin + state.elapsed
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutHandle {
        let mut state = self.state.borrow_mut();
        let handle = TimeoutHandle::new(state.next_timer);
        state.next_timer += 1;
        let due = state.elapsed + delay;
        state.timers.push(Timer {
            handle,
            due,
            callback,
        });
        handle
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        self.state
            .borrow_mut()
            .timers
            .retain(|timer| timer.handle != handle);
    }

    fn load_image(&self, url: &str, on_load: Box<dyn FnOnce(String)>) {
        let mut state = self.state.borrow_mut();
        state.requested.push(url.to_string());
        state.images.push(PendingImage {
            url: url.to_string(),
            on_load,
        });
    }
}
