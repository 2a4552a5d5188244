// crates/db/src/table/mod.rs
// Server-side-processing query builder: declarative fragments (columns,
// joins, custom where, grouping) composed into one parameterized SELECT
// that answers a paginated-table request.

pub mod grammar;
pub mod ssp;
