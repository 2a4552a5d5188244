// crates/db/src/queries/mod.rs
// Per-table query modules: history, users, and library sections. Each
// builds a TableSpec for the paginated-table builder and owns the insert
// helpers its collaborators use.

pub mod history;
pub mod libraries;
pub mod users;
