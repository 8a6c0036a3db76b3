//! Reads `SettingsOverrides` out of the options object handed to `init`.

use lazyimg_core::{Duration, SettingsOverrides, ThrottleEdges};
use std::fmt;

/// A value found at an options path.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Other(String),
}

impl OptionValue {
    fn kind(&self) -> &'static str {
        match self {
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "string",
            OptionValue::Bool(_) => "boolean",
            OptionValue::Other(_) => "object",
        }
    }
}

/// Anything options can be read from: a JS object in the browser, a map in tests.
pub trait OptionSource {
    /// Returns `None` for missing, `undefined` and `null` entries.
    fn lookup(&self, path: &[&str]) -> Option<OptionValue>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum OptionsError {
    WrongType {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    OutOfRange {
        key: String,
        value: f64,
    },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::WrongType {
                key,
                expected,
                found,
            } => write!(f, "option {key} must be a {expected}, got a {found}"),
            OptionsError::OutOfRange { key, value } => {
                write!(f, "option {key} is out of range: {value}")
            }
        }
    }
}

impl std::error::Error for OptionsError {}

struct Reader<'a, S: OptionSource + ?Sized> {
    source: &'a S,
}

impl<S: OptionSource + ?Sized> Reader<'_, S> {
    fn number(&self, path: &[&str]) -> Result<Option<f64>, OptionsError> {
        match self.source.lookup(path) {
            None => Ok(None),
            Some(OptionValue::Number(value)) if value.is_finite() => Ok(Some(value)),
            Some(OptionValue::Number(value)) => Err(OptionsError::OutOfRange {
                key: path.join("."),
                value,
            }),
            Some(other) => Err(wrong_type(path, "number", &other)),
        }
    }

    fn millis(&self, path: &[&str]) -> Result<Option<Duration>, OptionsError> {
        match self.number(path)? {
            None => Ok(None),
            Some(value) => Duration::try_from_secs_f64(value / 1000.0)
                .map(Some)
                .map_err(|_| OptionsError::OutOfRange {
                    key: path.join("."),
                    value,
                }),
        }
    }

    fn text(&self, path: &[&str]) -> Result<Option<String>, OptionsError> {
        match self.source.lookup(path) {
            None => Ok(None),
            Some(OptionValue::Text(value)) => Ok(Some(value)),
            Some(other) => Err(wrong_type(path, "string", &other)),
        }
    }

    fn flag(&self, path: &[&str]) -> Result<Option<bool>, OptionsError> {
        match self.source.lookup(path) {
            None => Ok(None),
            Some(OptionValue::Bool(value)) => Ok(Some(value)),
            Some(other) => Err(wrong_type(path, "boolean", &other)),
        }
    }
}

fn wrong_type(path: &[&str], expected: &'static str, found: &OptionValue) -> OptionsError {
    OptionsError::WrongType {
        key: path.join("."),
        expected,
        found: found.kind(),
    }
}

/// Builds overrides from an options object. Absent keys keep their defaults.
pub fn read_overrides<S: OptionSource + ?Sized>(
    source: &S,
) -> Result<SettingsOverrides, OptionsError> {
    let reader = Reader { source };
    let throttle_edges = reader.flag(&["throttleLeading"])?.map(|leading| {
        if leading {
            ThrottleEdges::LEADING_AND_TRAILING
        } else {
            ThrottleEdges::TRAILING
        }
    });

    Ok(SettingsOverrides {
        animation_length: reader.millis(&["animationLength"])?,
        scroll_threshold: reader.number(&["scrollThreshold"])?,
        scroll_throttle: reader.millis(&["scrollThrottle"])?,
        throttle_edges,
        probe_timeout: reader.millis(&["probeTimeout"])?,
        root_selector: reader.text(&["selectors", "root"])?,
        page_container_selector: reader.text(&["selectors", "pageContainer"])?,
        preload_class: reader.text(&["styles", "preload"])?,
        hidden_class: reader.text(&["styles", "hidden"])?,
        failed_class: reader.text(&["styles", "failed"])?,
        mode_attribute: reader.text(&["attributes", "mode"])?,
        image_url_attribute: reader.text(&["attributes", "imageUrl"])?,
    })
}

#[cfg(target_arch = "wasm32")]
mod js {
    use super::{OptionSource, OptionValue};
    use wasm_bindgen::JsValue;

    impl OptionSource for JsValue {
        fn lookup(&self, path: &[&str]) -> Option<OptionValue> {
            let mut current = self.clone();
            for key in path {
                if !current.is_object() {
                    return None;
                }
                current = js_sys::Reflect::get(&current, &JsValue::from_str(key)).ok()?;
            }
            if current.is_undefined() || current.is_null() {
                None
            } else if let Some(value) = current.as_f64() {
                Some(OptionValue::Number(value))
            } else if let Some(value) = current.as_string() {
                Some(OptionValue::Text(value))
            } else if let Some(value) = current.as_bool() {
                Some(OptionValue::Bool(value))
            } else {
                Some(OptionValue::Other(format!("{current:?}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapSource(HashMap<&'static str, OptionValue>);

    impl MapSource {
        fn with(mut self, key: &'static str, value: OptionValue) -> Self {
            self.0.insert(key, value);
            self
        }
    }

    impl OptionSource for MapSource {
        fn lookup(&self, path: &[&str]) -> Option<OptionValue> {
            self.0.get(path.join(".").as_str()).cloned()
        }
    }

    #[test]
    fn empty_options_override_nothing() {
        let overrides = read_overrides(&MapSource::default()).unwrap();
        assert_eq!(overrides, SettingsOverrides::default());
    }

    #[test]
    fn nested_keys_map_onto_overrides() {
        let source = MapSource::default()
            .with("animationLength", OptionValue::Number(100.0))
            .with("scrollThreshold", OptionValue::Number(350.0))
            .with("probeTimeout", OptionValue::Number(1500.0))
            .with("throttleLeading", OptionValue::Bool(true))
            .with("selectors.root", OptionValue::Text(".lazy".into()))
            .with("selectors.pageContainer", OptionValue::Text("#page".into()))
            .with("styles.failed", OptionValue::Text("is-broken".into()));

        let overrides = read_overrides(&source).unwrap();

        assert_eq!(overrides.animation_length, Some(Duration::from_millis(100)));
        assert_eq!(overrides.scroll_threshold, Some(350.0));
        assert_eq!(overrides.probe_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(
            overrides.throttle_edges,
            Some(ThrottleEdges::LEADING_AND_TRAILING)
        );
        assert_eq!(overrides.root_selector.as_deref(), Some(".lazy"));
        assert_eq!(overrides.page_container_selector.as_deref(), Some("#page"));
        assert_eq!(overrides.failed_class.as_deref(), Some("is-broken"));
        assert_eq!(overrides.scroll_throttle, None);
        assert_eq!(overrides.hidden_class, None);
    }

    #[test]
    fn wrong_types_are_rejected_with_the_key() {
        let source = MapSource::default().with("styles.hidden", OptionValue::Number(1.0));

        let err = read_overrides(&source).unwrap_err();

        assert_eq!(
            err,
            OptionsError::WrongType {
                key: "styles.hidden".into(),
                expected: "string",
                found: "number",
            }
        );
        assert_eq!(
            err.to_string(),
            "option styles.hidden must be a string, got a number"
        );
    }

    #[test]
    fn negative_durations_are_out_of_range() {
        let source = MapSource::default().with("scrollThrottle", OptionValue::Number(-5.0));

        assert!(matches!(
            read_overrides(&source),
            Err(OptionsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn durations_beyond_the_representable_range_are_rejected() {
        let source = MapSource::default().with("animationLength", OptionValue::Number(1e300));

        assert_eq!(
            read_overrides(&source),
            Err(OptionsError::OutOfRange {
                key: "animationLength".into(),
                value: 1e300,
            })
        );
    }
}
