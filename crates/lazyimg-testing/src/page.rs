use crate::document::{FakeDocument, NodeId};
use lazyimg_core::{BusEvent, Dom, EventBus, LazyLoad, SettingsOverrides};

/// A page laid out the way the default settings expect: a `<body>` holding a
/// `.l-page-wrap` scroll container, lazy elements marked `.js-lazy-load`.
///
/// ```rust,ignore
/// let page = TestPage::new(800.0);
/// let img = page.add_image("/a.jpg", 950.0);
/// let loader = page.init();
/// assert_eq!(page.document.pending_images(), vec!["/a.jpg"]);
/// ```
pub struct TestPage {
    pub document: FakeDocument,
    pub bus: EventBus<NodeId>,
    pub container: NodeId,
}

impl TestPage {
    /// Creates the page with a container of the given visible height.
    pub fn new(viewport_height: f64) -> Self {
        let document = FakeDocument::new();
        let container = document.append(document.body(), "div");
        document.add_class(&container, "l-page-wrap");
        document.set_inner_height(container, viewport_height);
        Self {
            document,
            bus: EventBus::new(),
            container,
        }
    }

    /// Appends a lazy `<img>` in scroll mode to the container.
    pub fn add_image(&self, url: &str, offset_top: f64) -> NodeId {
        self.add_lazy(self.container, "img", url, None, offset_top)
    }

    /// Appends a lazy element under `parent`.
    ///
    /// `mode` is written to `data-mode` when given.
    pub fn add_lazy(
        &self,
        parent: NodeId,
        tag: &str,
        url: &str,
        mode: Option<&str>,
        offset_top: f64,
    ) -> NodeId {
        let node = self.document.append(parent, tag);
        self.document.add_class(&node, "js-lazy-load");
        self.document.set_attribute(&node, "data-img-url", url);
        if let Some(mode) = mode {
            self.document.set_attribute(&node, "data-mode", mode);
        }
        self.document.set_offset_top(node, offset_top);
        node
    }

    /// Appends a plain element, e.g. a menu that holds event-mode images.
    pub fn add_container(&self, parent: NodeId, tag: &str) -> NodeId {
        self.document.append(parent, tag)
    }

    pub fn init(&self) -> LazyLoad<FakeDocument> {
        self.init_with(SettingsOverrides::default())
    }

    pub fn init_with(&self, overrides: SettingsOverrides) -> LazyLoad<FakeDocument> {
        LazyLoad::init(self.document.clone(), self.bus.clone(), overrides)
    }

    /// Scrolls the container, firing its scroll listeners.
    pub fn scroll(&self) {
        self.document.scroll(self.container);
    }

    pub fn menu_opened(&self, container: NodeId) -> usize {
        self.bus.publish(BusEvent::MenuOpened { container })
    }

    pub fn categories_changed(&self, container: NodeId) -> usize {
        self.bus.publish(BusEvent::CategoriesChanged { container })
    }
}
