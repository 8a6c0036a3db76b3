use crate::error::LazyLoadError;
use lazyimg_bus::Topic;
use std::fmt;
use std::str::FromStr;

/// What re-evaluates a lazy element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Loaded once the page container scrolls it close to the viewport.
    Scroll,
    /// Loaded when a domain event reveals the container holding it.
    Event,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Scroll, Mode::Event];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Scroll => "scroll",
            Mode::Event => "event",
        }
    }

    /// Bus topics whose events re-evaluate elements of this mode.
    pub fn topics(self) -> &'static [Topic] {
        match self {
            Mode::Scroll => &[Topic::PageWrapScroll],
            Mode::Event => &[Topic::MenuOpened, Topic::CategoriesChanged],
        }
    }

    /// Resolves the mode declared by an element's attribute.
    ///
    /// A missing or empty attribute means [`Mode::Scroll`].
    pub fn resolve(attribute: Option<&str>) -> Result<Self, LazyLoadError> {
        match attribute {
            None | Some("") => Ok(Mode::Scroll),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for Mode {
    type Err = LazyLoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "scroll" => Ok(Mode::Scroll),
            "event" => Ok(Mode::Event),
            other => Err(LazyLoadError::InvalidMode {
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the loaded image ends up on the element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageTarget {
    /// `<img>` elements get their `src` attribute replaced.
    Source,
    /// Every other element gets a `background-image` style.
    Background,
}

impl ImageTarget {
    pub fn for_tag(tag_name: &str) -> Self {
        if tag_name.eq_ignore_ascii_case("img") {
            ImageTarget::Source
        } else {
            ImageTarget::Background
        }
    }
}
