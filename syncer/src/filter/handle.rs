use std::sync::Arc;

use metrics::counter;
use tokio::sync::watch;
use tracing::info;

use crate::error::{ErrorKind, SyncerResult};
use crate::filter::event_filter::EventFilter;
use crate::metrics::SYNCER_FILTER_RELOADS_TOTAL;
use crate::syncer_error;

/// Publishing side of the filter reconfiguration channel.
///
/// Publishing swaps the whole [`EventFilter`] at once. Evaluations already holding a snapshot
/// keep using it until they ask for the current one again.
#[derive(Debug, Clone)]
pub struct FilterTx(watch::Sender<Arc<EventFilter>>);

impl FilterTx {
    /// Replaces the filter in force.
    pub fn publish(&self, filter: EventFilter) {
        info!(task = %filter.name(), "publishing new event filter");

        // Infallible send so that a filter can be published before anyone subscribes.
        self.0.send_replace(Arc::new(filter));
        counter!(SYNCER_FILTER_RELOADS_TOTAL).increment(1);
    }

    /// Returns the filter in force.
    pub fn current(&self) -> Arc<EventFilter> {
        self.0.borrow().clone()
    }

    pub fn subscribe(&self) -> FilterRx {
        FilterRx(self.0.subscribe())
    }
}

/// Reading side of the filter reconfiguration channel.
#[derive(Debug, Clone)]
pub struct FilterRx(watch::Receiver<Arc<EventFilter>>);

impl FilterRx {
    /// Returns the filter in force and marks it as seen.
    pub fn current(&mut self) -> Arc<EventFilter> {
        self.0.borrow_and_update().clone()
    }

    /// Returns `true` if a filter was published since the last call to [`FilterRx::current`].
    pub fn has_changed(&self) -> bool {
        self.0.has_changed().unwrap_or(false)
    }

    /// Waits until a new filter is published.
    pub async fn changed(&mut self) -> SyncerResult<()> {
        self.0.changed().await.map_err(|err| {
            syncer_error!(
                ErrorKind::InvalidState,
                "Filter publisher was dropped",
                source: err
            )
        })
    }
}

/// Creates the reconfiguration channel with `filter` as the initial snapshot.
pub fn create_filter_channel(filter: EventFilter) -> (FilterTx, FilterRx) {
    let (tx, rx) = watch::channel(Arc::new(filter));
    (FilterTx(tx), FilterRx(rx))
}

#[cfg(test)]
mod tests {
    use syncer_config::shared::{BlockAllowConfig, SyncerConfig};

    use super::*;
    use crate::types::TableRef;

    fn filter_ignoring(db: &str) -> EventFilter {
        let mut config = SyncerConfig::new("reload");
        config.block_allow_list = BlockAllowConfig {
            ignore_dbs: vec![db.to_string()],
            ..Default::default()
        };
        EventFilter::new(&config).unwrap()
    }

    #[test]
    fn test_publish_swaps_snapshot() {
        let (tx, mut rx) = create_filter_channel(filter_ignoring("s1"));
        let table = TableRef::new("s1", "t");

        let before = rx.current();
        assert!(before.skip_by_table(&table));
        assert!(!rx.has_changed());

        tx.publish(filter_ignoring("s2"));

        assert!(rx.has_changed());
        // A snapshot taken earlier is unaffected.
        assert!(before.skip_by_table(&table));
        assert!(!rx.current().skip_by_table(&table));
        assert!(!tx.current().skip_by_table(&table));
    }

    #[tokio::test]
    async fn test_changed_fails_once_publisher_is_gone() {
        let (tx, mut rx) = create_filter_channel(filter_ignoring("s1"));

        tx.publish(filter_ignoring("s2"));
        rx.changed().await.unwrap();
        drop(tx);

        let err = rx.changed().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }
}
