// crates/db/src/table/ssp.rs
// Composition + execution of the server-side-processing query:
//
//   SELECT * FROM (
//       SELECT <columns> FROM <table> <joins> [WHERE <custom>] [GROUP BY ...]
//       [UNION SELECT <columns> FROM <union_table> [WHERE <custom>]]
//   ) [WHERE <search>] [ORDER BY ...] LIMIT ? OFFSET ?
//
// plus two count queries: COUNT(*) over the same derived table + search
// filter for recordsFiltered, and COUNT(<id>) on the bare primary table
// for recordsTotal. Pagination is pushed down to SQLite rather than
// materializing the filtered set in memory.

use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use tracing::debug;

use plexpulse_core::{TablePage, TableRequest};

use super::grammar::{
    build_custom_where, build_grouping, build_join, build_order, build_where, extract_columns,
    BindValue, JoinSpec, WhereClause,
};
use crate::{Database, DbResult};

/// Optional UNION arm of a table spec, with its own column list and
/// custom-where set.
#[derive(Debug, Clone, Default)]
pub struct UnionSpec {
    pub columns: Vec<String>,
    pub table: String,
    pub custom_where: Vec<WhereClause>,
}

/// Declarative description of one server-side-processed table.
///
/// Identifiers in a spec come only from trusted in-process callers (the
/// per-table query modules); everything originating from the browser
/// request travels through [`TableRequest`] and is validated or bound.
#[derive(Debug, Clone)]
pub struct TableSpec {
    /// Primary table name.
    pub table: String,
    /// Column used for the unfiltered `COUNT(<id>)` total.
    pub id_column: String,
    /// Ordered column expressions, each optionally `"<expr> AS <alias>"`.
    pub columns: Vec<String>,
    pub joins: Vec<JoinSpec>,
    pub custom_where: Vec<WhereClause>,
    pub group_by: Vec<String>,
    pub union: Option<UnionSpec>,
}

impl TableSpec {
    pub fn new(table: &str, id_column: &str, columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            id_column: id_column.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            joins: Vec::new(),
            custom_where: Vec::new(),
            group_by: Vec::new(),
            union: None,
        }
    }
}

impl Database {
    /// Execute a paginated-table query and shape the result for the
    /// widget's JSON contract. The request's `draw` token is echoed back
    /// unchanged.
    pub async fn ssp_query(&self, spec: &TableSpec, req: &TableRequest) -> DbResult<TablePage> {
        let columns = extract_columns(&spec.columns, None);
        let joins = build_join(&spec.joins);
        let (custom_sql, mut params) = build_custom_where(&spec.custom_where);
        let grouping = build_grouping(&spec.group_by);

        // Inner derived table
        let mut inner = format!("SELECT {} FROM {}", columns.column_string, spec.table);
        if !joins.is_empty() {
            inner.push(' ');
            inner.push_str(&joins);
        }
        if !custom_sql.is_empty() {
            inner.push_str(" WHERE ");
            inner.push_str(&custom_sql);
        }
        if !grouping.is_empty() {
            inner.push(' ');
            inner.push_str(&grouping);
        }
        if let Some(union) = &spec.union {
            let (union_where, union_params) = build_custom_where(&union.custom_where);
            inner.push_str(" UNION SELECT ");
            inner.push_str(&union.columns.join(", "));
            inner.push_str(" FROM ");
            inner.push_str(&union.table);
            if !union_where.is_empty() {
                inner.push_str(" WHERE ");
                inner.push_str(&union_where);
            }
            params.extend(union_params);
        }

        // Free-text search over the derived table
        let search_value = req.search.value.trim();
        let (search_sql, search_params) = build_where(search_value, &columns, &req.columns);
        params.extend(search_params);

        let search_clause = if search_sql.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", search_sql)
        };

        // recordsFiltered
        let count_sql = format!("SELECT COUNT(*) FROM ({}){}", inner, search_clause);
        let filtered: (i64,) = bind_params_as(sqlx::query_as(&count_sql), &params)
            .fetch_one(self.pool())
            .await?;

        // recordsTotal — unfiltered count of the primary table
        let total_sql = format!("SELECT COUNT({}) FROM {}", spec.id_column, spec.table);
        let total: (i64,) = sqlx::query_as(&total_sql).fetch_one(self.pool()).await?;

        // Page of rows
        let order = build_order(&req.order, &columns, &req.columns);
        let order_clause = if order.is_empty() {
            String::new()
        } else {
            format!(" ORDER BY {}", order)
        };
        let data_sql = format!(
            "SELECT * FROM ({}){}{} LIMIT ? OFFSET ?",
            inner, search_clause, order_clause
        );
        debug!(sql = %data_sql, "ssp query");

        let rows: Vec<SqliteRow> = bind_params(sqlx::query(&data_sql), &params)
            .bind(req.length as i64)
            .bind(req.start as i64)
            .fetch_all(self.pool())
            .await?;

        let mut data = Vec::with_capacity(rows.len());
        for row in &rows {
            let obj = row_to_json(row)?;
            // Rows that are entirely NULL are artifacts of certain OUTER
            // JOIN/UNION shapes; strip them from the page.
            if obj.values().all(|v| v.is_null()) {
                continue;
            }
            data.push(obj);
        }

        Ok(TablePage {
            records_total: total.0 as u64,
            records_filtered: filtered.0 as u64,
            data,
            draw: req.draw,
        })
    }
}

/// Bind a positional parameter list onto a row query.
fn bind_params<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    params: &[BindValue],
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = query;
    for param in params {
        query = match param {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Real(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Bind a positional parameter list onto a typed query.
fn bind_params_as<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>>,
    params: &[BindValue],
) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, sqlx::sqlite::SqliteArguments<'q>> {
    let mut query = query;
    for param in params {
        query = match param {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Real(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.clone()),
        };
    }
    query
}

/// Convert one dynamic row into a JSON object keyed by output column name.
fn row_to_json(row: &SqliteRow) -> DbResult<serde_json::Map<String, serde_json::Value>> {
    let mut obj = serde_json::Map::with_capacity(row.columns().len());
    for (i, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(i)?;
        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => row
                    .try_get::<i64, _>(i)
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
                "REAL" => row
                    .try_get::<f64, _>(i)
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null),
                // BLOB columns are not part of any table contract; anything
                // else decodes as text.
                "BLOB" => serde_json::Value::Null,
                _ => row
                    .try_get::<String, _>(i)
                    .map(serde_json::Value::from)
                    .unwrap_or(serde_json::Value::Null),
            }
        };
        obj.insert(column.name().to_string(), value);
    }
    Ok(obj)
}
