//! Publish/subscribe bus shared by lazyimg and the application hosting it.
//!
//! The bus is single-threaded: handles are cheap `Rc` clones and handlers run
//! synchronously inside [`EventBus::publish`]. Every topic carries its own
//! payload shape through [`BusEvent`], so a handler subscribed to
//! [`Topic::MenuOpened`] never has to guess what it was given.
//!
//! Handlers may publish or (un)subscribe while they run. Delivery iterates
//! over the handlers that were subscribed when `publish` was called.

use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Named channel on the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    /// The page container scrolled (throttled).
    PageWrapScroll,
    /// A menu opened and revealed its content.
    MenuOpened,
    /// The active category filter changed.
    CategoriesChanged,
}

impl Topic {
    pub const ALL: [Topic; 3] = [
        Topic::PageWrapScroll,
        Topic::MenuOpened,
        Topic::CategoriesChanged,
    ];

    /// Stable wire name, used in logs and at the JS boundary.
    pub fn name(self) -> &'static str {
        match self {
            Topic::PageWrapScroll => "page-wrap-scroll",
            Topic::MenuOpened => "menu-opened",
            Topic::CategoriesChanged => "categories-changed",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|topic| topic.name() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Event published on the bus, tagged by topic.
///
/// `N` is the host's node handle type; domain events carry the container
/// element whose content just became visible.
#[derive(Clone, Debug, PartialEq)]
pub enum BusEvent<N> {
    PageWrapScroll,
    MenuOpened { container: N },
    CategoriesChanged { container: N },
}

impl<N> BusEvent<N> {
    pub fn topic(&self) -> Topic {
        match self {
            BusEvent::PageWrapScroll => Topic::PageWrapScroll,
            BusEvent::MenuOpened { .. } => Topic::MenuOpened,
            BusEvent::CategoriesChanged { .. } => Topic::CategoriesChanged,
        }
    }

    /// Container reference carried by domain events.
    pub fn container(&self) -> Option<&N> {
        match self {
            BusEvent::PageWrapScroll => None,
            BusEvent::MenuOpened { container } | BusEvent::CategoriesChanged { container } => {
                Some(container)
            }
        }
    }
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler<N> = Rc<dyn Fn(&BusEvent<N>)>;

struct Subscriber<N> {
    id: SubscriptionId,
    topic: Topic,
    handler: Handler<N>,
}

struct BusInner<N> {
    subscribers: Vec<Subscriber<N>>,
    next_id: u64,
}

/// Cloneable handle to a single-threaded event bus.
pub struct EventBus<N> {
    inner: Rc<RefCell<BusInner<N>>>,
}

impl<N: 'static> EventBus<N> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                subscribers: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Registers `handler` for every event published on `topic`.
    pub fn subscribe(
        &self,
        topic: Topic,
        handler: impl Fn(&BusEvent<N>) + 'static,
    ) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push(Subscriber {
            id,
            topic,
            handler: Rc::new(handler),
        });
        log::trace!("bus: subscribed {:?} to {}", id, topic);
        id
    }

    /// Removes a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|subscriber| subscriber.id != id);
        before != inner.subscribers.len()
    }

    /// Delivers `event` to every handler subscribed to its topic and returns
    /// how many handlers ran.
    pub fn publish(&self, event: BusEvent<N>) -> usize {
        let topic = event.topic();
        let handlers: SmallVec<[Handler<N>; 4]> = self
            .inner
            .borrow()
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.topic == topic)
            .map(|subscriber| Rc::clone(&subscriber.handler))
            .collect();

        log::trace!("bus: publish {} to {} handler(s)", topic, handlers.len());
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.topic == topic)
            .count()
    }
}

impl<N: 'static> Default for EventBus<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> Clone for EventBus<N> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<N> fmt::Debug for EventBus<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &inner.subscribers.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn publish_reaches_only_matching_topic() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe(Topic::MenuOpened, move |event| {
            sink.borrow_mut().push(*event.container().unwrap());
        });

        assert_eq!(bus.publish(BusEvent::PageWrapScroll), 0);
        assert_eq!(bus.publish(BusEvent::MenuOpened { container: 7 }), 1);
        assert_eq!(bus.publish(BusEvent::CategoriesChanged { container: 9 }), 0);
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: EventBus<()> = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let id = bus.subscribe(Topic::PageWrapScroll, move |_| counter.set(counter.get() + 1));

        bus.publish(BusEvent::PageWrapScroll);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(BusEvent::PageWrapScroll);

        assert_eq!(hits.get(), 1);
        assert_eq!(bus.subscriber_count(Topic::PageWrapScroll), 0);
    }

    #[test]
    fn handler_can_publish_and_subscribe_reentrantly() {
        let bus: EventBus<u8> = EventBus::new();
        let nested = Rc::new(Cell::new(0));

        let inner_bus = bus.clone();
        let nested_hits = nested.clone();
        bus.subscribe(Topic::PageWrapScroll, move |_| {
            let hits = nested_hits.clone();
            inner_bus.subscribe(Topic::MenuOpened, move |_| hits.set(hits.get() + 1));
            inner_bus.publish(BusEvent::MenuOpened { container: 1 });
        });

        assert_eq!(bus.publish(BusEvent::PageWrapScroll), 1);
        assert_eq!(nested.get(), 1);
        assert_eq!(bus.subscriber_count(Topic::MenuOpened), 1);
    }

    #[test]
    fn topic_names_round_trip() {
        for topic in Topic::ALL {
            assert_eq!(Topic::from_name(topic.name()), Some(topic));
        }
        assert_eq!(Topic::from_name("menu-closed"), None);
    }
}
