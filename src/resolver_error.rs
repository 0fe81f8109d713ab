use std::error::Error;
use std::fmt::{Display, Formatter, Result};

#[macro_export]
macro_rules! create_resolver_error {
     ($kind: expr, $($arg:tt)*) => {
        $crate::resolver_error::ResolverError::new($kind, format!($($arg)*))
    }
}

#[macro_export]
macro_rules! create_resolver_error_result {
     ($kind: expr, $($arg:tt)*) => {
        Err($crate::resolver_error::ResolverError::new($kind, format!($($arg)*)))
    }
}

#[macro_export]
macro_rules! info_err {
    ($($arg:tt)*) => {
        $crate::resolver_error::ResolverError::new($crate::resolver_error::ResolverErrorKind::Info, format!($($arg)*))
    }
}

pub use create_resolver_error;
pub use create_resolver_error_result;
pub use info_err;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResolverErrorKind {
    /// external metadata service unreachable or unknown id
    MetadataLookup,
    /// provider catalog listing or series detail failed
    CatalogFetch,
    FeedFetch,
    FeedParse,
    Config,
    Info,
}

impl Display for ResolverErrorKind {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "{}", match self {
            Self::MetadataLookup => "metadata lookup",
            Self::CatalogFetch => "catalog fetch",
            Self::FeedFetch => "feed fetch",
            Self::FeedParse => "feed parse",
            Self::Config => "config",
            Self::Info => "info",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ResolverError {
    pub kind: ResolverErrorKind,
    pub message: String,
}

impl ResolverError {
    pub const fn new(kind: ResolverErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
        }
    }

    pub fn is_fetch_error(&self) -> bool {
        matches!(self.kind, ResolverErrorKind::MetadataLookup | ResolverErrorKind::CatalogFetch | ResolverErrorKind::FeedFetch)
    }
}

impl Display for ResolverError {
    fn fmt(&self, f: &mut Formatter) -> Result {
        write!(f, "Resolver {} error: {}", self.kind, self.message)
    }
}

impl Error for ResolverError {}

pub fn str_to_io_error(err: &str) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err)
}

pub fn to_resolver_error<E: Display>(kind: ResolverErrorKind, err: E) -> ResolverError {
    ResolverError::new(kind, err.to_string())
}
