//! Browser entry point: installs logging, builds the page-wide dispatcher and
//! lets page scripts publish the menu and category events.

pub mod options;

#[cfg(target_arch = "wasm32")]
mod app {
    use crate::options::read_overrides;
    use lazyimg_core::{BusEvent, EventBus, LazyLoad, Mode};
    use lazyimg_platform_web::WebDom;
    use std::cell::RefCell;
    use wasm_bindgen::prelude::*;
    use web_sys::Element;

    struct App {
        bus: EventBus<Element>,
        loader: LazyLoad<WebDom>,
    }

    thread_local! {
        static APP: RefCell<Option<App>> = const { RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
        log::info!("lazy-load demo starting");
    }

    /// Scans the page and starts watching it. Calling it again replaces the
    /// previous dispatcher.
    #[wasm_bindgen]
    pub fn init(options: JsValue) -> Result<(), JsValue> {
        let overrides =
            read_overrides(&options).map_err(|err| JsValue::from_str(&err.to_string()))?;
        let dom = WebDom::new()?;
        let bus = EventBus::new();
        let loader = LazyLoad::init(dom, bus.clone(), overrides);
        log::info!(
            "lazy-load: {} scroll and {} event elements registered",
            loader.pending(Mode::Scroll),
            loader.pending(Mode::Event)
        );

        let previous = APP.with(|app| app.borrow_mut().replace(App { bus, loader }));
        if let Some(previous) = previous {
            previous.loader.dispose();
        }
        Ok(())
    }

    #[wasm_bindgen]
    pub fn notify_menu_opened(container: Element) -> u32 {
        publish(BusEvent::MenuOpened { container })
    }

    #[wasm_bindgen]
    pub fn notify_categories_changed(container: Element) -> u32 {
        publish(BusEvent::CategoriesChanged { container })
    }

    #[wasm_bindgen]
    pub fn dispose() {
        let previous = APP.with(|app| app.borrow_mut().take());
        if let Some(previous) = previous {
            previous.loader.dispose();
        }
    }

    fn publish(event: BusEvent<Element>) -> u32 {
        let bus = APP.with(|app| app.borrow().as_ref().map(|app| app.bus.clone()));
        match bus {
            Some(bus) => bus.publish(event) as u32,
            None => {
                log::warn!("lazy-load: {} published before init", event.topic());
                0
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use app::*;
