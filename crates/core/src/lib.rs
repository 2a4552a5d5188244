// crates/core/src/lib.rs
//! Shared types for plexpulse.
//!
//! Holds the wire contract between the HTTP layer and the query builder
//! (the paginated-table request/response shapes) and the event types the
//! Plex activity listener emits.

pub mod notify;
pub mod types;

pub use notify::{ActivityEvent, NotifyAction};
pub use types::{ColumnMeta, OrderInstruction, SearchBlock, SortDir, TablePage, TableRequest};
