//! Browser implementation of [`Dom`] on top of `web-sys`.
//!
//! Element handles are plain [`web_sys::Element`]s. Scroll listener closures
//! are owned here and released when the listener is removed. Timer callbacks
//! sit in a slot that `clear_timeout` empties, so a cancelled timer only
//! leaves its tiny JS trampoline behind.

use lazyimg_core::{Dom, ListenerKey, TimeoutHandle};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlImageElement, Window};
use web_time::{Duration, Instant};

type TimerSlot = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

struct ScrollListener {
    target: Element,
    closure: Closure<dyn FnMut()>,
}

struct WebDomInner {
    window: Window,
    document: Document,
    listeners: RefCell<HashMap<u64, ScrollListener>>,
    timers: RefCell<HashMap<i32, TimerSlot>>,
    next_key: Cell<u64>,
}

/// The live browser document.
#[derive(Clone)]
pub struct WebDom {
    inner: Rc<WebDomInner>,
}

impl WebDom {
    /// Binds to the global `window` and its document.
    pub fn new() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("window has no document"))?;
        Ok(Self {
            inner: Rc::new(WebDomInner {
                window,
                document,
                listeners: RefCell::new(HashMap::new()),
                timers: RefCell::new(HashMap::new()),
                next_key: Cell::new(1),
            }),
        })
    }
}

impl std::fmt::Debug for WebDom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebDom")
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("timers", &self.inner.timers.borrow().len())
            .finish()
    }
}

fn timeout_millis(delay: Duration) -> i32 {
    delay.as_millis().min(i32::MAX as u128) as i32
}

impl Dom for WebDom {
    type Node = Element;

    fn query_selector_all(&self, selector: &str) -> Vec<Element> {
        let list = match self.inner.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                log::warn!("web: invalid selector {}: {:?}", selector, err);
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|index| list.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        match self.inner.document.query_selector(selector) {
            Ok(element) => element,
            Err(err) => {
                log::warn!("web: invalid selector {}: {:?}", selector, err);
                None
            }
        }
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn tag_name(&self, node: &Element) -> String {
        node.tag_name()
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().add_1(class) {
            log::warn!("web: add class {} failed: {:?}", class, err);
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(err) = node.class_list().remove_1(class) {
            log::warn!("web: remove class {} failed: {:?}", class, err);
        }
    }

    fn offset_top(&self, node: &Element) -> f64 {
        let scroll_y = self.inner.window.scroll_y().unwrap_or(0.0);
        node.get_bounding_client_rect().top() + scroll_y
    }

    fn inner_height(&self, node: &Element) -> f64 {
        f64::from(node.client_height())
    }

    fn contains(&self, container: &Element, node: &Element) -> bool {
        container.contains(Some(node.as_ref()))
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(err) = node.set_attribute(name, value) {
            log::warn!("web: set {} failed: {:?}", name, err);
        }
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            log::warn!("web: {} is not styleable", node.tag_name());
            return;
        };
        if let Err(err) = element.style().set_property(property, value) {
            log::warn!("web: set style {} failed: {:?}", property, err);
        }
    }

    fn listen_scroll(&self, target: &Element, callback: Rc<dyn Fn()>) -> ListenerKey {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);

        let closure = Closure::wrap(Box::new(move || callback()) as Box<dyn FnMut()>);
        if let Err(err) =
            target.add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref())
        {
            log::warn!("web: add scroll listener failed: {:?}", err);
        }
        self.inner.listeners.borrow_mut().insert(
            key,
            ScrollListener {
                target: target.clone(),
                closure,
            },
        );
        ListenerKey::new(key)
    }

    fn unlisten_scroll(&self, key: ListenerKey) {
        let listener = self.inner.listeners.borrow_mut().remove(&key.get());
        let Some(listener) = listener else {
            return;
        };
        if let Err(err) = listener.target.remove_event_listener_with_callback(
            "scroll",
            listener.closure.as_ref().unchecked_ref(),
        ) {
            log::warn!("web: remove scroll listener failed: {:?}", err);
        }
    }

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimeoutHandle {
        let slot: TimerSlot = Rc::new(RefCell::new(Some(callback)));
        let handle_cell: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

        let fire = {
            let slot = Rc::clone(&slot);
            let handle_cell = Rc::clone(&handle_cell);
            let owner = Rc::downgrade(&self.inner);
            Closure::once_into_js(move || {
                if let (Some(inner), Some(handle)) = (owner.upgrade(), handle_cell.get()) {
                    inner.timers.borrow_mut().remove(&handle);
                }
                let callback = slot.borrow_mut().take();
                if let Some(callback) = callback {
                    callback();
                }
            })
        };

        match self
            .inner
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                fire.unchecked_ref(),
                timeout_millis(delay),
            ) {
            Ok(handle) => {
                handle_cell.set(Some(handle));
                self.inner.timers.borrow_mut().insert(handle, slot);
                TimeoutHandle::new(i64::from(handle))
            }
            Err(err) => {
                log::warn!("web: setTimeout failed: {:?}", err);
                TimeoutHandle::new(-1)
            }
        }
    }

    fn clear_timeout(&self, handle: TimeoutHandle) {
        let Ok(raw) = i32::try_from(handle.get()) else {
            return;
        };
        if raw < 0 {
            return;
        }
        self.inner.window.clear_timeout_with_handle(raw);
        let slot = self.inner.timers.borrow_mut().remove(&raw);
        if let Some(slot) = slot {
            slot.borrow_mut().take();
        }
    }

    fn load_image(&self, url: &str, on_load: Box<dyn FnOnce(String)>) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                log::warn!("web: cannot create image probe for {}: {:?}", url, err);
                return;
            }
        };

        let probe = image.clone();
        let onload = Closure::once_into_js(move || on_load(probe.src()));
        image.set_onload(Some(onload.unchecked_ref()));
        image.set_src(url);
    }
}
