//! Error types and result definitions for the filter engine.
//!
//! Every fallible operation returns [`SyncerError`], which carries an [`ErrorKind`] used by the
//! calling pipeline stage to decide between aborting the task and skipping with an alarm. Errors
//! capture their callsite and a backtrace, and several errors can be aggregated into one.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::panic::Location;
use std::sync::Arc;

use syncer_config::LoadConfigError;
use syncer_config::shared::ValidationError;

/// Convenient result type for filter operations using [`SyncerError`] as the error type.
pub type SyncerResult<T> = Result<T, SyncerError>;

/// Detailed payload stored for single [`SyncerError`] instances.
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type of the filter engine.
///
/// A [`SyncerError`] is either a single error with rich metadata or an aggregation of several
/// errors, for example every invalid rule found while building a rule set.
#[derive(Debug, Clone)]
pub struct SyncerError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    Many {
        errors: Vec<SyncerError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors raised by the filter engine.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Configuration errors, fatal at task start.
    ConfigError,
    InvalidPattern,

    // Statement errors, fatal for the event being processed.
    DdlParseError,
    UnsupportedStatement,

    // Invariant violations inside the engine.
    InvalidState,

    // Downstream transport errors raised by the batch sender.
    DestinationError,
    IoError,

    Unknown,

    // Special error kinds used by tests that inject failures.
    #[cfg(feature = "failpoints")]
    WithNoRetry,
    #[cfg(feature = "failpoints")]
    WithManualRetry,
}

impl SyncerError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For multiple errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// if the error list is empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns all [`ErrorKind`]s present in this error.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => errors
                .iter()
                .flat_map(|err| err.kinds())
                .collect::<Vec<_>>(),
        }
    }

    /// Returns the detailed error information if available.
    ///
    /// For multiple errors, returns the detail of the first error that has one.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the captured backtrace for this error.
    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self.repr {
            ErrorRepr::Single(ref payload) => Some(payload.backtrace.as_ref()),
            ErrorRepr::Many { .. } => None,
        }
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified instance.
    ///
    /// Has no effect on aggregated errors, which forward their first error as source.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        SyncerError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for SyncerError {
    fn eq(&self, other: &SyncerError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (
                ErrorRepr::Many {
                    errors: errors_a, ..
                },
                ErrorRepr::Many {
                    errors: errors_b, ..
                },
            ) => {
                errors_a.len() == errors_b.len()
                    && errors_a.iter().zip(errors_b.iter()).all(|(a, b)| a == b)
            }
            _ => false,
        }
    }
}

impl Hash for SyncerError {
    /// Hashes only the kind and static description so that repeated occurrences group together.
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.repr).hash(state);
        match &self.repr {
            ErrorRepr::Single(payload) => {
                payload.kind.hash(state);
                payload.description.hash(state);
            }
            ErrorRepr::Many { errors, .. } => {
                errors.len().hash(state);
                for error in errors {
                    error.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for SyncerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                write_detail(payload.detail.as_deref(), f)?;
                write_backtrace(payload.backtrace.as_ref(), f)?;

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line(),
                    location.column()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = format!("{error}");
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for SyncerError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

fn write_backtrace(backtrace: &Backtrace, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered_backtrace = format!("{backtrace}");
    if !rendered_backtrace.trim().is_empty() {
        write!(f, "\n  Backtrace:")?;
        for line in rendered_backtrace.lines() {
            write!(f, "\n    {line}")?;
        }
    }

    Ok(())
}

fn write_detail(detail: Option<&str>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if let Some(detail) = detail {
        if detail.trim().is_empty() {
            write!(f, "\n  Detail: <empty>")?;
        } else {
            write!(f, "\n  Detail:")?;
            for line in detail.lines() {
                write!(f, "\n    {line}")?;
            }
        }
    }

    Ok(())
}

/// Creates a [`SyncerError`] from an error kind and static description.
impl From<(ErrorKind, &'static str)> for SyncerError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> SyncerError {
        SyncerError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

/// Creates a [`SyncerError`] from an error kind, static description, and dynamic detail.
impl<D> From<(ErrorKind, &'static str, D)> for SyncerError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> SyncerError {
        SyncerError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Aggregates several errors; a single error is returned unwrapped.
impl<E> From<Vec<E>> for SyncerError
where
    E: Into<SyncerError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> SyncerError {
        let location = Location::caller();

        let mut errors: Vec<SyncerError> = errors.into_iter().map(Into::into).collect();

        if errors.len() == 1 {
            return errors.pop().expect("just checked length is 1");
        }

        SyncerError {
            repr: ErrorRepr::Many { errors, location },
        }
    }
}

/// Converts [`std::io::Error`] to [`SyncerError`] with [`ErrorKind::IoError`].
impl From<std::io::Error> for SyncerError {
    #[track_caller]
    fn from(err: std::io::Error) -> SyncerError {
        let detail = err.to_string();
        SyncerError::from_components(
            ErrorKind::IoError,
            Cow::Borrowed("I/O operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`regex::Error`] to [`SyncerError`] with [`ErrorKind::InvalidPattern`].
impl From<regex::Error> for SyncerError {
    #[track_caller]
    fn from(err: regex::Error) -> SyncerError {
        let detail = err.to_string();
        SyncerError::from_components(
            ErrorKind::InvalidPattern,
            Cow::Borrowed("Regular expression compilation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`sqlparser::parser::ParserError`] to [`SyncerError`] with [`ErrorKind::DdlParseError`].
impl From<sqlparser::parser::ParserError> for SyncerError {
    #[track_caller]
    fn from(err: sqlparser::parser::ParserError) -> SyncerError {
        let detail = err.to_string();
        SyncerError::from_components(
            ErrorKind::DdlParseError,
            Cow::Borrowed("DDL statement parsing failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`ValidationError`] to [`SyncerError`] with [`ErrorKind::ConfigError`].
impl From<ValidationError> for SyncerError {
    #[track_caller]
    fn from(err: ValidationError) -> SyncerError {
        let detail = err.to_string();
        SyncerError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Invalid filter configuration"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Converts [`LoadConfigError`] to [`SyncerError`] with [`ErrorKind::ConfigError`].
impl From<LoadConfigError> for SyncerError {
    #[track_caller]
    fn from(err: LoadConfigError) -> SyncerError {
        let detail = err.to_string();
        SyncerError::from_components(
            ErrorKind::ConfigError,
            Cow::Borrowed("Filter configuration could not be loaded"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;
    use crate::{bail, syncer_error};

    #[test]
    fn test_macro_attaches_detail() {
        let err = syncer_error!(
            ErrorKind::InvalidState,
            "Rule resolution failed",
            "empty schema"
        );

        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.detail(), Some("empty schema"));
    }

    #[test]
    fn test_bail_returns_error() {
        fn fails() -> SyncerResult<()> {
            bail!(ErrorKind::ConfigError, "Bad config");
        }

        assert_eq!(fails().unwrap_err().kind(), ErrorKind::ConfigError);
    }

    #[test]
    fn test_aggregated_errors_expose_all_kinds() {
        let err = SyncerError::from(vec![
            syncer_error!(ErrorKind::InvalidPattern, "Bad glob"),
            syncer_error!(ErrorKind::ConfigError, "Bad event"),
        ]);

        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
        assert_eq!(
            err.kinds(),
            vec![ErrorKind::InvalidPattern, ErrorKind::ConfigError]
        );
        assert!(err.to_string().contains("2 errors aggregated"));
    }

    #[test]
    fn test_single_error_vec_is_unwrapped() {
        let err = SyncerError::from(vec![syncer_error!(ErrorKind::IoError, "Broken pipe")]);

        assert!(err.backtrace().is_some());
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_missing_configuration_is_config_error() {
        let err: SyncerError =
            LoadConfigError::MissingDirectory("/nonexistent/configuration".into()).into();

        assert_eq!(err.kind(), ErrorKind::ConfigError);
        assert!(err.to_string().contains("/nonexistent/configuration"));
    }

    #[test]
    fn test_regex_error_keeps_source() {
        let err: SyncerError = regex::Regex::new("(").unwrap_err().into();

        assert_eq!(err.kind(), ErrorKind::InvalidPattern);
        assert!(err.source().is_some());
    }
}
