// crates/core/src/types.rs
//! DataTables server-side-processing contract.
//!
//! The browser widget sends a small JSON request describing the page it
//! wants (`draw`, `start`, `length`), its declared column metadata, the
//! active sort order, and a free-text search value. The server answers with
//! one page of rows plus total/filtered counts, echoing `draw` unchanged so
//! the client can discard out-of-order AJAX responses.

use serde::{Deserialize, Serialize};

/// Sort direction for one ordered column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    Desc,
}

impl Default for SortDir {
    fn default() -> Self {
        SortDir::Asc
    }
}

/// One entry of the client's `order` array: sort by the column at `column`,
/// resolved against the declared column metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderInstruction {
    pub column: usize,
    #[serde(default)]
    pub dir: SortDir,
}

/// Column metadata as declared by the client widget.
///
/// `data` is the output column name the client binds to; `searchable`
/// opts the column into free-text search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMeta {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub searchable: bool,
}

/// Free-text search block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchBlock {
    #[serde(default)]
    pub value: String,
}

fn default_length() -> u64 {
    25
}

/// A paginated-table request as received from the widget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRequest {
    /// Opaque client sequence token, echoed back unchanged.
    #[serde(default)]
    pub draw: u64,
    /// Zero-based offset of the first row.
    #[serde(default)]
    pub start: u64,
    /// Page size.
    #[serde(default = "default_length")]
    pub length: u64,
    #[serde(default)]
    pub search: SearchBlock,
    #[serde(default)]
    pub order: Vec<OrderInstruction>,
    #[serde(default)]
    pub columns: Vec<ColumnMeta>,
}

impl Default for TableRequest {
    fn default() -> Self {
        Self {
            draw: 0,
            start: 0,
            length: default_length(),
            search: SearchBlock::default(),
            order: Vec::new(),
            columns: Vec::new(),
        }
    }
}

/// One page of a server-side-processed table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablePage {
    /// Unfiltered row count of the primary table.
    #[serde(rename = "recordsTotal")]
    pub records_total: u64,
    /// Row count after search/custom-where filtering.
    #[serde(rename = "recordsFiltered")]
    pub records_filtered: u64,
    /// Row objects keyed by output column name.
    pub data: Vec<serde_json::Map<String, serde_json::Value>>,
    /// Echo of the request's `draw` token.
    pub draw: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_defaults_apply_to_missing_fields() {
        let req: TableRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.draw, 0);
        assert_eq!(req.start, 0);
        assert_eq!(req.length, 25);
        assert_eq!(req.search.value, "");
        assert!(req.order.is_empty());
        assert!(req.columns.is_empty());
    }

    #[test]
    fn request_parses_widget_shape() {
        let req: TableRequest = serde_json::from_str(
            r#"{
                "draw": 3,
                "start": 50,
                "length": 25,
                "search": {"value": "matrix"},
                "order": [{"column": 1, "dir": "desc"}],
                "columns": [
                    {"data": "date", "searchable": false},
                    {"data": "friendly_name", "searchable": true}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(req.draw, 3);
        assert_eq!(req.start, 50);
        assert_eq!(req.order.len(), 1);
        assert_eq!(req.order[0].column, 1);
        assert_eq!(req.order[0].dir, SortDir::Desc);
        assert_eq!(req.columns[1].data, "friendly_name");
        assert!(req.columns[1].searchable);
    }

    #[test]
    fn page_serializes_wire_names() {
        let page = TablePage {
            records_total: 100,
            records_filtered: 7,
            data: vec![],
            draw: 9,
        };
        let json = serde_json::to_string(&page).unwrap();
        assert!(json.contains("\"recordsTotal\":100"));
        assert!(json.contains("\"recordsFiltered\":7"));
        assert!(json.contains("\"draw\":9"));
    }
}
