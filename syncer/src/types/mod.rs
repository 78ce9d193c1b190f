//! Common types shared by every filter layer.

mod event;
mod sized;
mod table;

pub use event::*;
pub use sized::*;
pub use table::*;
