//! Error construction shortcuts.

/// Builds a [`crate::error::SyncerError`] from a kind, a static description and an optional
/// dynamic detail and source.
///
/// ```ignore
/// syncer_error!(ErrorKind::DdlParseError, "No database selected", sql);
/// syncer_error!(ErrorKind::InvalidPattern, "Bad rule", detail = message, source: err);
/// ```
#[macro_export]
macro_rules! syncer_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::SyncerError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::SyncerError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::SyncerError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        $crate::error::SyncerError::from(($kind, $desc, $detail)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::SyncerError::from(($kind, $desc, $detail.to_string()))
    };
}

/// Returns early with a [`crate::error::SyncerError`] built by [`syncer_error!`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)+) => {
        return ::core::result::Result::Err($crate::syncer_error!($($arg)+))
    };
}

/// Returns early with a [`crate::error::SyncerError`] unless the condition holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            $crate::bail!($($arg)+);
        }
    };
}
