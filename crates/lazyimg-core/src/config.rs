//! Dispatcher configuration.
//!
//! [`Settings`] holds the defaults; callers override any subset of them,
//! either with the `with_*` builder methods or by merging a
//! [`SettingsOverrides`] (what the JS bootstrap produces from an options
//! object).

use crate::throttle::ThrottleEdges;
use web_time::Duration;

/// CSS selectors used to find lazy elements and the scrollable container.
#[derive(Clone, Debug, PartialEq)]
pub struct Selectors {
    /// Elements managed by the dispatcher.
    pub root: String,
    /// Scrollable page wrapper whose height defines the viewport.
    pub page_container: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            root: ".js-lazy-load".into(),
            page_container: ".l-page-wrap".into(),
        }
    }
}

/// Class names toggled during an element's lifecycle.
#[derive(Clone, Debug, PartialEq)]
pub struct Styles {
    /// Applied at registration, removed once the image is shown.
    pub preload: String,
    /// Applied while the element fades out before the swap.
    pub hidden: String,
    /// Applied when a probe times out. Only used with a probe timeout.
    pub failed: Option<String>,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            preload: "on-init".into(),
            hidden: "is-hidden".into(),
            failed: None,
        }
    }
}

/// Data attributes read from each lazy element.
#[derive(Clone, Debug, PartialEq)]
pub struct Attributes {
    pub mode: String,
    pub image_url: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            mode: "data-mode".into(),
            image_url: "data-img-url".into(),
        }
    }
}

/// Configuration of one dispatcher instance.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Delay between hiding an element and swapping its image in.
    pub animation_length: Duration,
    /// Extra distance below the viewport that still counts as visible, in px.
    pub scroll_threshold: f64,
    /// Minimum interval between two scroll-progress events.
    pub scroll_throttle: Duration,
    /// Which edges of a scroll burst publish an event.
    pub throttle_edges: ThrottleEdges,
    /// Give up on a probe after this long. `None` waits forever.
    pub probe_timeout: Option<Duration>,
    pub selectors: Selectors,
    pub styles: Styles,
    pub attributes: Attributes,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animation_length: Duration::from_millis(250),
            scroll_threshold: 200.0,
            scroll_throttle: Duration::from_millis(500),
            throttle_edges: ThrottleEdges::TRAILING,
            probe_timeout: None,
            selectors: Selectors::default(),
            styles: Styles::default(),
            attributes: Attributes::default(),
        }
    }
}

impl Settings {
    /// Defaults with `overrides` applied on top.
    pub fn merged(overrides: SettingsOverrides) -> Self {
        let mut settings = Self::default();
        settings.apply(overrides);
        settings
    }

    /// Replaces every field that `overrides` sets.
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        let SettingsOverrides {
            animation_length,
            scroll_threshold,
            scroll_throttle,
            throttle_edges,
            probe_timeout,
            root_selector,
            page_container_selector,
            preload_class,
            hidden_class,
            failed_class,
            mode_attribute,
            image_url_attribute,
        } = overrides;

        if let Some(value) = animation_length {
            self.animation_length = value;
        }
        if let Some(value) = scroll_threshold {
            self.scroll_threshold = value;
        }
        if let Some(value) = scroll_throttle {
            self.scroll_throttle = value;
        }
        if let Some(value) = throttle_edges {
            self.throttle_edges = value;
        }
        if let Some(value) = probe_timeout {
            self.probe_timeout = Some(value);
        }
        if let Some(value) = root_selector {
            self.selectors.root = value;
        }
        if let Some(value) = page_container_selector {
            self.selectors.page_container = value;
        }
        if let Some(value) = preload_class {
            self.styles.preload = value;
        }
        if let Some(value) = hidden_class {
            self.styles.hidden = value;
        }
        if let Some(value) = failed_class {
            self.styles.failed = Some(value);
        }
        if let Some(value) = mode_attribute {
            self.attributes.mode = value;
        }
        if let Some(value) = image_url_attribute {
            self.attributes.image_url = value;
        }
    }

    pub fn with_animation_length(mut self, length: Duration) -> Self {
        self.animation_length = length;
        self
    }

    pub fn with_scroll_threshold(mut self, threshold: f64) -> Self {
        self.scroll_threshold = threshold;
        self
    }

    pub fn with_scroll_throttle(mut self, interval: Duration) -> Self {
        self.scroll_throttle = interval;
        self
    }

    pub fn with_throttle_edges(mut self, edges: ThrottleEdges) -> Self {
        self.throttle_edges = edges;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn with_root_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.root = selector.into();
        self
    }

    pub fn with_page_container(mut self, selector: impl Into<String>) -> Self {
        self.selectors.page_container = selector.into();
        self
    }

    pub fn with_preload_class(mut self, class: impl Into<String>) -> Self {
        self.styles.preload = class.into();
        self
    }

    pub fn with_hidden_class(mut self, class: impl Into<String>) -> Self {
        self.styles.hidden = class.into();
        self
    }

    pub fn with_failed_class(mut self, class: impl Into<String>) -> Self {
        self.styles.failed = Some(class.into());
        self
    }
}

/// Caller-supplied partial configuration. Unset fields keep their defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsOverrides {
    pub animation_length: Option<Duration>,
    pub scroll_threshold: Option<f64>,
    pub scroll_throttle: Option<Duration>,
    pub throttle_edges: Option<ThrottleEdges>,
    pub probe_timeout: Option<Duration>,
    pub root_selector: Option<String>,
    pub page_container_selector: Option<String>,
    pub preload_class: Option<String>,
    pub hidden_class: Option<String>,
    pub failed_class: Option<String>,
    pub mode_attribute: Option<String>,
    pub image_url_attribute: Option<String>,
}
