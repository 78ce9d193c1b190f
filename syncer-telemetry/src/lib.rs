//! Telemetry setup shared by services embedding the binlog syncer.

pub mod tracing;
