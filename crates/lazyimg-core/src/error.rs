use std::fmt;

/// Failures reported by [`LazyLoad`](crate::LazyLoad) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LazyLoadError {
    /// The element's mode attribute holds neither `scroll` nor `event`.
    InvalidMode { value: String },
    /// The node is already tracked by this dispatcher.
    AlreadyRegistered,
    /// The dispatcher was disposed and no longer accepts elements.
    Disposed,
}

impl fmt::Display for LazyLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LazyLoadError::InvalidMode { value } => {
                write!(f, "wrong mode ['{value}'] set on lazy-load element")
            }
            LazyLoadError::AlreadyRegistered => f.write_str("element is already registered"),
            LazyLoadError::Disposed => f.write_str("lazy-load dispatcher was disposed"),
        }
    }
}

impl std::error::Error for LazyLoadError {}
