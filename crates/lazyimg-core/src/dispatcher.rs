//! The lazy-load dispatcher.
//!
//! [`LazyLoad`] owns the registry of pending elements, the shared scroll
//! listener and the bus subscriptions of one instance. Bus handlers and host
//! callbacks hold a weak reference to it, so dropping the last handle tears
//! everything down and late callbacks become no-ops.

use crate::config::{Settings, SettingsOverrides};
use crate::dom::{Dom, ListenerKey, TimeoutHandle};
use crate::error::LazyLoadError;
use crate::mode::{ImageTarget, Mode};
use crate::registry::{ElementId, LazyElement, Registry};
use crate::throttle::{Throttle, ThrottleAction};
use crate::visibility::is_within_threshold;
use indexmap::IndexMap;
use lazyimg_bus::{BusEvent, EventBus, SubscriptionId};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Lifecycle of one element. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementState {
    /// Waiting in the registry for its trigger.
    Registered,
    /// Image requested; removed from the registry.
    Probing,
    /// Image swapped in. Terminal.
    Loaded,
    /// The optional probe timeout elapsed first. Terminal.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProbePhase {
    AwaitingLoad,
    Revealing,
}

/// An element whose image was requested but not yet shown.
struct Probe<N> {
    element: LazyElement<N>,
    phase: ProbePhase,
    timer: Option<TimeoutHandle>,
}

struct Inner<D: Dom> {
    this: Weak<RefCell<Inner<D>>>,
    dom: D,
    bus: EventBus<D::Node>,
    settings: Settings,
    registry: Registry<D::Node>,
    probes: IndexMap<ElementId, Probe<D::Node>>,
    states: IndexMap<ElementId, ElementState>,
    scroll_listener: Option<ListenerKey>,
    throttle: Throttle,
    trailing_timer: Option<TimeoutHandle>,
    subscriptions: IndexMap<Mode, SmallVec<[SubscriptionId; 2]>>,
    next_id: u64,
    disposed: bool,
}

/// Handle to a lazy-load dispatcher. Clones share the same instance.
pub struct LazyLoad<D: Dom> {
    inner: Rc<RefCell<Inner<D>>>,
}

impl<D: Dom> Clone for LazyLoad<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<D: Dom> LazyLoad<D> {
    /// Creates an empty dispatcher. Elements are added with [`register`](Self::register).
    pub fn new(dom: D, bus: EventBus<D::Node>, settings: Settings) -> Self {
        let throttle = Throttle::new(settings.scroll_throttle, settings.throttle_edges);
        let inner = Rc::new_cyclic(|this| {
            RefCell::new(Inner {
                this: this.clone(),
                dom,
                bus,
                settings,
                registry: Registry::new(),
                probes: IndexMap::new(),
                states: IndexMap::new(),
                scroll_listener: None,
                throttle,
                trailing_timer: None,
                subscriptions: IndexMap::new(),
                next_id: 1,
                disposed: false,
            })
        });
        Self { inner }
    }

    /// Builds a dispatcher from defaults plus `overrides` and registers every
    /// element matching the root selector. Elements that fail validation are
    /// skipped.
    pub fn init(dom: D, bus: EventBus<D::Node>, overrides: SettingsOverrides) -> Self {
        let loader = Self::new(dom, bus, Settings::merged(overrides));
        let nodes = {
            let inner = loader.inner.borrow();
            inner.dom.query_selector_all(&inner.settings.selectors.root)
        };

        let mut registered = 0usize;
        for node in &nodes {
            match loader.register(node) {
                Ok(_) => registered += 1,
                // Already reported by `register`.
                Err(LazyLoadError::InvalidMode { .. }) => {}
                Err(err) => log::debug!("lazy-load: skipped {:?}: {}", node, err),
            }
        }
        log::debug!(
            "lazy-load: registered {} of {} element(s)",
            registered,
            nodes.len()
        );
        loader
    }

    /// Registers one element.
    ///
    /// Scroll-mode elements already close to the viewport start loading
    /// before this returns.
    pub fn register(&self, node: &D::Node) -> Result<ElementId, LazyLoadError> {
        self.inner.borrow_mut().register(node)
    }

    /// Re-runs the scroll visibility rule against every pending scroll-mode
    /// element, e.g. after a layout change that did not scroll.
    pub fn check_visibility(&self) {
        self.inner.borrow_mut().handle_scroll();
    }

    /// Starts loading `id` regardless of its trigger. Returns `false` if it is
    /// no longer registered.
    pub fn load(&self, id: ElementId) -> bool {
        self.inner.borrow_mut().load(id)
    }

    /// Entry point for the host's scroll listener.
    pub fn handle_container_scroll(&self) {
        let bus = {
            let mut inner = self.inner.borrow_mut();
            if inner.disposed {
                return;
            }
            let now = inner.dom.now();
            match inner.throttle.call(now) {
                ThrottleAction::Invoke => Some(inner.bus.clone()),
                ThrottleAction::Schedule(delay) => {
                    let this = inner.this.clone();
                    let handle = inner.dom.set_timeout(
                        delay,
                        Box::new(move || {
                            if let Some(inner) = this.upgrade() {
                                LazyLoad { inner }.flush_scroll_throttle();
                            }
                        }),
                    );
                    inner.trailing_timer = Some(handle);
                    None
                }
                ThrottleAction::Skip => None,
            }
        };

        if let Some(bus) = bus {
            bus.publish(BusEvent::PageWrapScroll);
        }
    }

    fn flush_scroll_throttle(&self) {
        let bus = {
            let mut inner = self.inner.borrow_mut();
            inner.trailing_timer = None;
            let now = inner.dom.now();
            if inner.disposed || !inner.throttle.flush(now) {
                return;
            }
            inner.bus.clone()
        };
        bus.publish(BusEvent::PageWrapScroll);
    }

    /// Detaches the scroll listener, drops bus subscriptions and pending
    /// timers. Probes already in flight complete into nothing.
    pub fn dispose(&self) {
        self.inner.borrow_mut().teardown();
    }

    pub fn settings(&self) -> Settings {
        self.inner.borrow().settings.clone()
    }

    /// Number of elements of `mode` still waiting for their trigger.
    pub fn pending(&self, mode: Mode) -> usize {
        self.inner.borrow().registry.len(mode)
    }

    pub fn is_registered(&self, id: ElementId) -> bool {
        self.inner.borrow().registry.contains(id)
    }

    pub fn registered_ids(&self, mode: Mode) -> Vec<ElementId> {
        self.inner
            .borrow()
            .registry
            .iter(mode)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn state(&self, id: ElementId) -> Option<ElementState> {
        self.inner.borrow().states.get(&id).copied()
    }

    /// Whether the shared scroll listener is attached.
    pub fn is_listening(&self) -> bool {
        self.inner.borrow().scroll_listener.is_some()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().disposed
    }
}

impl<D: Dom> std::fmt::Debug for LazyLoad<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LazyLoad")
            .field("scroll", &inner.registry.len(Mode::Scroll))
            .field("event", &inner.registry.len(Mode::Event))
            .field("probing", &inner.probes.len())
            .field("listening", &inner.scroll_listener.is_some())
            .field("disposed", &inner.disposed)
            .finish()
    }
}

impl<D: Dom> Inner<D> {
    fn register(&mut self, node: &D::Node) -> Result<ElementId, LazyLoadError> {
        if self.disposed {
            return Err(LazyLoadError::Disposed);
        }
        if self.registry.contains_node(node)
            || self.probes.values().any(|probe| probe.element.node == *node)
        {
            return Err(LazyLoadError::AlreadyRegistered);
        }

        let declared = self.dom.attribute(node, &self.settings.attributes.mode);
        let mode = match Mode::resolve(declared.as_deref()) {
            Ok(mode) => mode,
            Err(err) => {
                log::error!("lazy-load: {}", err);
                return Err(err);
            }
        };

        let image_url = self
            .dom
            .attribute(node, &self.settings.attributes.image_url)
            .unwrap_or_default();
        if image_url.is_empty() {
            log::warn!(
                "lazy-load: {:?} has no {} attribute",
                node,
                self.settings.attributes.image_url
            );
        }
        let target = ImageTarget::for_tag(&self.dom.tag_name(node));

        self.dom.add_class(node, &self.settings.styles.preload);

        if mode == Mode::Scroll && self.registry.is_empty(Mode::Scroll) {
            self.attach_scroll_listener();
        }
        if self.registry.is_empty(mode) {
            self.ensure_subscribed(mode);
        }

        let id = ElementId::new(self.next_id);
        self.next_id += 1;
        self.registry.insert(
            id,
            LazyElement {
                node: node.clone(),
                mode,
                image_url,
                target,
            },
        );
        self.states.insert(id, ElementState::Registered);
        log::trace!("lazy-load: registered {} ({})", id, mode);

        if mode == Mode::Scroll {
            if let Some(viewport) = self.viewport_height() {
                if self.is_visible(node, viewport) {
                    self.load(id);
                }
            }
        }

        Ok(id)
    }

    fn attach_scroll_listener(&mut self) {
        if self.scroll_listener.is_some() {
            return;
        }
        let selector = &self.settings.selectors.page_container;
        let Some(container) = self.dom.query_selector(selector) else {
            log::warn!(
                "lazy-load: page container {} not found, scroll trigger disabled",
                selector
            );
            return;
        };

        let this = self.this.clone();
        let key = self.dom.listen_scroll(
            &container,
            Rc::new(move || {
                if let Some(inner) = this.upgrade() {
                    LazyLoad { inner }.handle_container_scroll();
                }
            }),
        );
        self.scroll_listener = Some(key);
        log::debug!("lazy-load: scroll listener attached to {}", selector);
    }

    fn detach_scroll_listener(&mut self) {
        if let Some(handle) = self.trailing_timer.take() {
            self.dom.clear_timeout(handle);
        }
        self.throttle.cancel();
        if let Some(key) = self.scroll_listener.take() {
            self.dom.unlisten_scroll(key);
            log::debug!("lazy-load: scroll listener detached");
        }
    }

    fn ensure_subscribed(&mut self, mode: Mode) {
        if self.subscriptions.contains_key(&mode) {
            return;
        }
        let ids = mode
            .topics()
            .iter()
            .map(|&topic| {
                let this = self.this.clone();
                self.bus.subscribe(topic, move |event| {
                    if let Some(inner) = this.upgrade() {
                        inner.borrow_mut().dispatch(mode, event);
                    }
                })
            })
            .collect();
        self.subscriptions.insert(mode, ids);
    }

    fn dispatch(&mut self, mode: Mode, event: &BusEvent<D::Node>) {
        if self.disposed {
            return;
        }
        match (mode, event) {
            (Mode::Scroll, BusEvent::PageWrapScroll) => self.handle_scroll(),
            (
                Mode::Event,
                BusEvent::MenuOpened { container } | BusEvent::CategoriesChanged { container },
            ) => self.handle_show(container),
            (mode, event) => {
                log::warn!(
                    "lazy-load: {} handler ignored unexpected {} event",
                    mode,
                    event.topic()
                );
            }
        }
    }

    fn handle_scroll(&mut self) {
        if self.registry.is_empty(Mode::Scroll) {
            return;
        }
        let Some(viewport) = self.viewport_height() else {
            return;
        };
        let visible: SmallVec<[ElementId; 8]> = self
            .registry
            .iter(Mode::Scroll)
            .filter(|(_, element)| self.is_visible(&element.node, viewport))
            .map(|(id, _)| id)
            .collect();
        for id in visible {
            self.load(id);
        }
    }

    fn handle_show(&mut self, container: &D::Node) {
        let revealed: SmallVec<[ElementId; 8]> = self
            .registry
            .iter(Mode::Event)
            .filter(|(_, element)| self.dom.contains(container, &element.node))
            .map(|(id, _)| id)
            .collect();
        log::trace!(
            "lazy-load: container {:?} revealed {} element(s)",
            container,
            revealed.len()
        );
        for id in revealed {
            self.load(id);
        }
    }

    fn viewport_height(&self) -> Option<f64> {
        let selector = &self.settings.selectors.page_container;
        match self.dom.query_selector(selector) {
            Some(container) => Some(self.dom.inner_height(&container)),
            None => {
                log::warn!("lazy-load: page container {} not found", selector);
                None
            }
        }
    }

    fn is_visible(&self, node: &D::Node, viewport: f64) -> bool {
        is_within_threshold(
            self.dom.offset_top(node),
            viewport,
            self.settings.scroll_threshold,
        )
    }

    fn load(&mut self, id: ElementId) -> bool {
        let Some(element) = self.registry.remove(id) else {
            return false;
        };
        let mode = element.mode;

        let this = self.this.clone();
        self.dom.load_image(
            &element.image_url,
            Box::new(move |src| {
                if let Some(inner) = this.upgrade() {
                    inner.borrow_mut().on_probe_loaded(id, src);
                }
            }),
        );

        let timer = self.settings.probe_timeout.map(|timeout| {
            let this = self.this.clone();
            self.dom.set_timeout(
                timeout,
                Box::new(move || {
                    if let Some(inner) = this.upgrade() {
                        inner.borrow_mut().on_probe_timeout(id);
                    }
                }),
            )
        });

        log::debug!("lazy-load: probing {} for {}", element.image_url, id);
        self.probes.insert(
            id,
            Probe {
                element,
                phase: ProbePhase::AwaitingLoad,
                timer,
            },
        );
        self.states.insert(id, ElementState::Probing);

        if mode == Mode::Scroll && self.registry.is_empty(Mode::Scroll) {
            self.detach_scroll_listener();
        }
        true
    }

    fn on_probe_loaded(&mut self, id: ElementId, src: String) {
        if self.disposed {
            return;
        }
        let Some(probe) = self.probes.get_mut(&id) else {
            return;
        };
        if probe.phase != ProbePhase::AwaitingLoad {
            return;
        }
        if let Some(handle) = probe.timer.take() {
            self.dom.clear_timeout(handle);
        }
        probe.phase = ProbePhase::Revealing;
        self.dom
            .add_class(&probe.element.node, &self.settings.styles.hidden);

        let this = self.this.clone();
        let handle = self.dom.set_timeout(
            self.settings.animation_length,
            Box::new(move || {
                if let Some(inner) = this.upgrade() {
                    inner.borrow_mut().reveal(id, src);
                }
            }),
        );
        probe.timer = Some(handle);
    }

    fn reveal(&mut self, id: ElementId, src: String) {
        if self.disposed {
            return;
        }
        let Some(probe) = self.probes.shift_remove(&id) else {
            return;
        };
        let node = &probe.element.node;
        match probe.element.target {
            ImageTarget::Source => self.dom.set_attribute(node, "src", &src),
            ImageTarget::Background => {
                self.dom
                    .set_style(node, "background-image", &format!("url({src})"))
            }
        }
        self.dom.remove_class(node, &self.settings.styles.hidden);
        self.dom.remove_class(node, &self.settings.styles.preload);
        self.states.insert(id, ElementState::Loaded);
        log::debug!("lazy-load: {} shows {}", id, src);
    }

    fn on_probe_timeout(&mut self, id: ElementId) {
        if self.disposed {
            return;
        }
        let waiting = self
            .probes
            .get(&id)
            .is_some_and(|probe| probe.phase == ProbePhase::AwaitingLoad);
        if !waiting {
            return;
        }
        let Some(probe) = self.probes.shift_remove(&id) else {
            return;
        };
        log::warn!(
            "lazy-load: {} timed out loading {}",
            id,
            probe.element.image_url
        );
        if let Some(class) = &self.settings.styles.failed {
            self.dom.add_class(&probe.element.node, class);
        }
        self.states.insert(id, ElementState::Failed);
    }

    fn teardown(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.detach_scroll_listener();
        for (_, ids) in self.subscriptions.drain(..) {
            for id in ids {
                self.bus.unsubscribe(id);
            }
        }
        for (_, probe) in self.probes.drain(..) {
            if let Some(handle) = probe.timer {
                self.dom.clear_timeout(handle);
            }
        }
        self.registry.clear();
        log::debug!("lazy-load: disposed");
    }
}

impl<D: Dom> Drop for Inner<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
