// crates/db/src/table/grammar.rs
// Query fragment assembly for the paginated-table builder.
//
// Only column/table identifiers supplied by trusted in-process table specs
// are ever interpolated into SQL text. Every literal value travels through
// a positional bind list. Caller-supplied names (sort/search columns from
// the browser widget) are validated case-insensitively against the known
// output column set first; unmatched names silently contribute nothing.
// That fail-open policy is deliberate: the widget tolerates stale
// client-side column metadata instead of surfacing query errors.

use plexpulse_core::{ColumnMeta, OrderInstruction, SortDir};

/// A literal value bound through a `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for BindValue {
    fn from(v: i64) -> Self {
        BindValue::Int(v)
    }
}

impl From<f64> for BindValue {
    fn from(v: f64) -> Self {
        BindValue::Real(v)
    }
}

impl From<&str> for BindValue {
    fn from(v: &str) -> Self {
        BindValue::Text(v.to_string())
    }
}

impl From<String> for BindValue {
    fn from(v: String) -> Self {
        BindValue::Text(v)
    }
}

/// Join type for [`JoinSpec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

impl JoinKind {
    fn sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
        }
    }
}

/// One join: `<INNER|LEFT OUTER> JOIN <table> ON <left> = <right>`.
#[derive(Debug, Clone)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: String,
    pub left: String,
    pub right: String,
}

impl JoinSpec {
    pub fn inner(table: &str, left: &str, right: &str) -> Self {
        Self {
            kind: JoinKind::Inner,
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }

    pub fn left_outer(table: &str, left: &str, right: &str) -> Self {
        Self {
            kind: JoinKind::LeftOuter,
            table: table.to_string(),
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Logical operator joining a custom-where clause to the *next* clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// The value side of a custom-where clause.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// `<col> IS NULL`, contributes no parameter.
    Null,
    /// `<col> = ?` (or `<col>= ?` when the column expression ends in a
    /// comparison operator, forming a range condition).
    Eq(BindValue),
    /// `<col> LIKE ?`, the pattern bound as given.
    Like(String),
    /// Parenthesized OR-group of the other cases over each element.
    AnyOf(Vec<WhereValue>),
}

/// One custom-where clause with an explicit combinator.
///
/// Adjacent clauses are joined pairwise in declaration order by the *first*
/// clause's combinator; no precedence re-association happens. The last
/// clause's combinator is ignored.
#[derive(Debug, Clone)]
pub struct WhereClause {
    pub column: String,
    pub value: WhereValue,
    pub combinator: Combinator,
}

impl WhereClause {
    pub fn and(column: &str, value: WhereValue) -> Self {
        Self {
            column: column.to_string(),
            value,
            combinator: Combinator::And,
        }
    }

    pub fn or(column: &str, value: WhereValue) -> Self {
        Self {
            column: column.to_string(),
            value,
            combinator: Combinator::Or,
        }
    }
}

/// Result of [`extract_columns`]: the parallel decomposition of a column
/// expression list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedColumns {
    /// Comma-joined original expressions, ready for the SELECT list.
    pub column_string: String,
    /// Expression text before any `AS`.
    pub literal: Vec<String>,
    /// Output name: text after `AS` with any `table.` prefix stripped
    /// (used for case-insensitive matching against client metadata).
    pub named: Vec<String>,
    /// Order expression: the alias as written, falling back to the
    /// full expression when there is no alias.
    pub order: Vec<String>,
}

/// Split each column expression on a case-insensitive `" as "` separator
/// into `(literal_expr, output_name, order_expr)`.
///
/// When `match_columns` is supplied, an entry is kept only if its output
/// name case-insensitively matches one of the declared `data` names —
/// this supports server-side column-subset negotiation.
pub fn extract_columns(columns: &[String], match_columns: Option<&[ColumnMeta]>) -> ExtractedColumns {
    let mut out = ExtractedColumns::default();
    let mut kept = Vec::new();

    for column in columns {
        let (literal, alias) = match split_alias(column) {
            Some((expr, alias)) => (expr.to_string(), alias.to_string()),
            None => (column.clone(), column.clone()),
        };
        // Strip any `table.` prefix for matching purposes.
        let named = alias.rsplit('.').next().unwrap_or(&alias).to_string();

        if let Some(declared) = match_columns {
            let matches = declared
                .iter()
                .any(|meta| meta.data.eq_ignore_ascii_case(&named));
            if !matches {
                continue;
            }
        }

        kept.push(column.clone());
        out.literal.push(literal);
        out.named.push(named);
        out.order.push(alias);
    }

    out.column_string = kept.join(", ");
    out
}

/// Find the last case-insensitive `" as "` in a column expression.
fn split_alias(column: &str) -> Option<(&str, &str)> {
    let lower = column.to_ascii_lowercase();
    let idx = lower.rfind(" as ")?;
    Some((&column[..idx], column[idx + 4..].trim()))
}

/// Emit `"<kind> JOIN <table> ON <left> = <right>"` for each join, space
/// separated. Empty input yields the empty string.
pub fn build_join(joins: &[JoinSpec]) -> String {
    joins
        .iter()
        .map(|j| format!("{} {} ON {} = {}", j.kind.sql(), j.table, j.left, j.right))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emit `"GROUP BY c1, c2"` or the empty string.
pub fn build_grouping(group_by: &[String]) -> String {
    if group_by.is_empty() {
        String::new()
    } else {
        format!("GROUP BY {}", group_by.join(", "))
    }
}

/// Render one condition for a (column, value) pair, pushing bound
/// parameters in order. Returns `None` for an empty `AnyOf` group
/// (the clause contributes nothing).
fn render_condition(column: &str, value: &WhereValue, params: &mut Vec<BindValue>) -> Option<String> {
    match value {
        WhereValue::Null => Some(format!("{} IS NULL", column)),
        WhereValue::Like(pattern) => {
            params.push(BindValue::Text(pattern.clone()));
            Some(format!("{} LIKE ?", column))
        }
        WhereValue::Eq(v) => {
            params.push(v.clone());
            // A column expression ending in `<` or `>` forms a range
            // comparison: "started >" renders as "started >= ?".
            let trimmed = column.trim_end();
            if trimmed.ends_with('<') || trimmed.ends_with('>') {
                Some(format!("{}= ?", trimmed))
            } else {
                Some(format!("{} = ?", column))
            }
        }
        WhereValue::AnyOf(values) => {
            let parts: Vec<String> = values
                .iter()
                .filter_map(|v| render_condition(column, v, params))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(format!("({})", parts.join(" OR ")))
            }
        }
    }
}

/// Build the custom-where fragment (without the `WHERE` keyword) and its
/// positional parameter list.
pub fn build_custom_where(clauses: &[WhereClause]) -> (String, Vec<BindValue>) {
    let mut sql = String::new();
    let mut params = Vec::new();
    let mut pending: Option<Combinator> = None;

    for clause in clauses {
        let Some(fragment) = render_condition(&clause.column, &clause.value, &mut params) else {
            continue;
        };
        if !sql.is_empty() {
            // Joined by the combinator of the first clause of the pair.
            let comb = pending.unwrap_or(Combinator::And);
            sql.push(' ');
            sql.push_str(comb.sql());
            sql.push(' ');
        }
        sql.push_str(&fragment);
        pending = Some(clause.combinator);
    }

    (sql, params)
}

/// Build the ORDER BY fragment (without the keyword) from the client's
/// order instructions.
///
/// A declared `data` name is used only if it case-insensitively matches a
/// known output column (`COLLATE NOCASE` applied); an unmatched name is
/// silently omitted. A missing or empty `data` name falls back to a
/// positional column reference.
pub fn build_order(
    order: &[OrderInstruction],
    columns: &ExtractedColumns,
    dt_columns: &[ColumnMeta],
) -> String {
    let mut parts = Vec::new();

    for instr in order {
        let direction = match instr.dir {
            SortDir::Asc => "",
            SortDir::Desc => " DESC",
        };
        match dt_columns.get(instr.column) {
            Some(meta) if !meta.data.is_empty() => {
                let known = columns
                    .named
                    .iter()
                    .any(|n| n.eq_ignore_ascii_case(&meta.data));
                if known {
                    parts.push(format!("{} COLLATE NOCASE{}", meta.data, direction));
                }
                // Unknown name: no ordering contribution (fail-open).
            }
            _ => {
                // Positional reference, 1-based. Out-of-range indexes are
                // dropped rather than raised.
                if instr.column < columns.named.len() {
                    parts.push(format!("{}{}", instr.column + 1, direction));
                }
            }
        }
    }

    parts.join(", ")
}

/// Build the free-text search fragment: every column the client flags
/// searchable (and whose `data` name validates against the known output
/// columns) is OR'd together with `LIKE ?`, binding `%value%` per column.
pub fn build_where(
    search_value: &str,
    columns: &ExtractedColumns,
    dt_columns: &[ColumnMeta],
) -> (String, Vec<BindValue>) {
    if search_value.is_empty() {
        return (String::new(), Vec::new());
    }

    let pattern = format!("%{}%", search_value);
    let mut parts = Vec::new();
    let mut params = Vec::new();

    for meta in dt_columns {
        if !meta.searchable || meta.data.is_empty() {
            continue;
        }
        let known = columns
            .named
            .iter()
            .any(|n| n.eq_ignore_ascii_case(&meta.data));
        if !known {
            continue;
        }
        parts.push(format!("{} LIKE ?", meta.data));
        params.push(BindValue::Text(pattern.clone()));
    }

    if parts.is_empty() {
        (String::new(), Vec::new())
    } else {
        (format!("({})", parts.join(" OR ")), params)
    }
}
