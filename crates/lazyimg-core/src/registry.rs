use crate::mode::{ImageTarget, Mode};
use indexmap::IndexMap;
use std::fmt;

/// Dispatcher-assigned identity of a lazy element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One element waiting for its image.
#[derive(Clone, Debug, PartialEq)]
pub struct LazyElement<N> {
    pub node: N,
    pub mode: Mode,
    pub image_url: String,
    pub target: ImageTarget,
}

/// Pending elements, one map per mode.
///
/// An id lives in at most one map and leaves it exactly once.
#[derive(Debug)]
pub(crate) struct Registry<N> {
    scroll: IndexMap<ElementId, LazyElement<N>>,
    event: IndexMap<ElementId, LazyElement<N>>,
}

impl<N: PartialEq> Registry<N> {
    pub(crate) fn new() -> Self {
        Self {
            scroll: IndexMap::new(),
            event: IndexMap::new(),
        }
    }

    fn map(&self, mode: Mode) -> &IndexMap<ElementId, LazyElement<N>> {
        match mode {
            Mode::Scroll => &self.scroll,
            Mode::Event => &self.event,
        }
    }

    fn map_mut(&mut self, mode: Mode) -> &mut IndexMap<ElementId, LazyElement<N>> {
        match mode {
            Mode::Scroll => &mut self.scroll,
            Mode::Event => &mut self.event,
        }
    }

    pub(crate) fn insert(&mut self, id: ElementId, element: LazyElement<N>) {
        debug_assert!(!self.contains(id), "element {id} registered twice");
        self.map_mut(element.mode).insert(id, element);
    }

    pub(crate) fn remove(&mut self, id: ElementId) -> Option<LazyElement<N>> {
        self.scroll
            .shift_remove(&id)
            .or_else(|| self.event.shift_remove(&id))
    }

    pub(crate) fn contains(&self, id: ElementId) -> bool {
        self.scroll.contains_key(&id) || self.event.contains_key(&id)
    }

    pub(crate) fn contains_node(&self, node: &N) -> bool {
        self.scroll
            .values()
            .chain(self.event.values())
            .any(|element| element.node == *node)
    }

    pub(crate) fn len(&self, mode: Mode) -> usize {
        self.map(mode).len()
    }

    pub(crate) fn is_empty(&self, mode: Mode) -> bool {
        self.map(mode).is_empty()
    }

    pub(crate) fn iter(&self, mode: Mode) -> impl Iterator<Item = (ElementId, &LazyElement<N>)> {
        self.map(mode).iter().map(|(id, element)| (*id, element))
    }

    pub(crate) fn clear(&mut self) {
        self.scroll.clear();
        self.event.clear();
    }
}
