use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, SyncerResult};

pub const BATCH_SENDER_APPEND: &str = "batch_sender.append";
pub const BATCH_SENDER_FLUSH: &str = "batch_sender.flush";

/// Evaluates the named failpoint, turning a configured `return` action into an error.
///
/// The optional parameter selects the error kind (`no_retry` or `manual_retry`).
pub fn syncer_fail_point(name: &str) -> SyncerResult<()> {
    fail_point!(name, |parameter| {
        let error_kind = match parameter.as_deref() {
            Some("manual_retry") => ErrorKind::WithManualRetry,
            _ => ErrorKind::WithNoRetry,
        };

        bail!(
            error_kind,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
