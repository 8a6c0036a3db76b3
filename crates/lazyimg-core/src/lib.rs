//! Deferred image loading for document-hosted widgets.
//!
//! A [`LazyLoad`] dispatcher scans a document for lazy elements, keeps them in
//! a per-[`Mode`] registry and swaps in the real image once an element is
//! close enough to the viewport (scroll mode) or once an application event
//! reveals the container holding it (event mode).
//!
//! The dispatcher never touches a browser API directly. Everything it needs
//! from the page goes through the [`Dom`] trait, implemented for the browser
//! by `lazyimg-platform-web` and headlessly by `lazyimg-testing`.
//!
//! ```rust,ignore
//! let bus = EventBus::new();
//! let loader = LazyLoad::init(dom, bus.clone(), SettingsOverrides::default());
//!
//! // Later, when a menu opens:
//! bus.publish(BusEvent::MenuOpened { container: menu_element });
//! ```

mod config;
mod dispatcher;
mod dom;
mod error;
mod mode;
mod registry;
mod throttle;
mod visibility;

pub use config::*;
pub use dispatcher::*;
pub use dom::*;
pub use error::*;
pub use mode::*;
pub use registry::{ElementId, LazyElement};
pub use throttle::*;
pub use visibility::*;

pub use lazyimg_bus::{BusEvent, EventBus, SubscriptionId, Topic};

/// Re-exported so hosts can implement [`Dom::now`] without a direct dependency.
pub use web_time::{Duration, Instant};
