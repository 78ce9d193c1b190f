//! Metric names emitted by the filter engine.
//!
//! The engine only records through the `metrics` facade; installing an exporter is left to the
//! embedding service.

/// Label for the event kind a decision was made for.
pub const EVENT_KIND_LABEL: &str = "event_kind";

/// Label for the reason an event was skipped.
pub const SKIP_REASON_LABEL: &str = "reason";

/// Counter for events dropped by the filter.
pub const SYNCER_FILTER_SKIPPED_EVENTS_TOTAL: &str = "syncer_filter_skipped_events_total";

/// Counter for events passed downstream by the filter.
pub const SYNCER_FILTER_KEPT_EVENTS_TOTAL: &str = "syncer_filter_kept_events_total";

/// Counter for filter snapshots published at runtime.
pub const SYNCER_FILTER_RELOADS_TOTAL: &str = "syncer_filter_reloads_total";

/// Counter for batches handed to the message stream.
pub const SYNCER_BATCH_SENDER_FLUSHES_TOTAL: &str = "syncer_batch_sender_flushes_total";
