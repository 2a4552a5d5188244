// crates/db/src/queries/history.rs
// Playback history: inserts and the paginated history table.

use plexpulse_core::{TablePage, TableRequest};

use crate::table::grammar::{BindValue, JoinSpec, WhereClause, WhereValue};
use crate::table::ssp::TableSpec;
use crate::{Database, DbResult};

/// A playback session row to record.
///
/// `reference_id` groups resumed playback of the same item into one
/// logical session; when `None` the row references itself.
#[derive(Debug, Clone, Default)]
pub struct NewHistoryRow {
    pub reference_id: Option<i64>,
    pub user_id: i64,
    pub started: i64,
    pub stopped: Option<i64>,
    pub rating_key: i64,
    pub media_type: String,
    pub title: String,
    pub platform: String,
    pub player: String,
    pub ip_address: Option<String>,
    pub section_id: Option<i64>,
    pub paused_counter: i64,
    pub view_offset: i64,
    pub duration: i64,
    pub transcode_decision: Option<String>,
}

/// Optional server-side filters for the history table, layered on top of
/// whatever the widget request asks for.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub user_id: Option<i64>,
    pub media_types: Vec<String>,
    pub started_after: Option<i64>,
    pub started_before: Option<i64>,
}

impl HistoryFilter {
    fn to_clauses(&self) -> Vec<WhereClause> {
        let mut clauses = Vec::new();
        if let Some(user_id) = self.user_id {
            clauses.push(WhereClause::and(
                "session_history.user_id",
                WhereValue::Eq(BindValue::Int(user_id)),
            ));
        }
        match self.media_types.len() {
            0 => {}
            1 => clauses.push(WhereClause::and(
                "session_history.media_type",
                WhereValue::Eq(BindValue::from(self.media_types[0].clone())),
            )),
            _ => clauses.push(WhereClause::and(
                "session_history.media_type",
                WhereValue::AnyOf(
                    self.media_types
                        .iter()
                        .map(|m| WhereValue::Eq(BindValue::from(m.clone())))
                        .collect(),
                ),
            )),
        }
        if let Some(after) = self.started_after {
            clauses.push(WhereClause::and(
                "session_history.started >",
                WhereValue::Eq(BindValue::Int(after)),
            ));
        }
        if let Some(before) = self.started_before {
            clauses.push(WhereClause::and(
                "session_history.started <",
                WhereValue::Eq(BindValue::Int(before)),
            ));
        }
        clauses
    }
}

fn history_spec(filter: &HistoryFilter) -> TableSpec {
    let mut spec = TableSpec::new(
        "session_history",
        "id",
        &[
            "session_history.reference_id",
            "session_history.id",
            "MAX(session_history.started) AS date",
            "MIN(session_history.started) AS started",
            "MAX(session_history.stopped) AS stopped",
            "SUM(CASE WHEN session_history.stopped > 0 \
             THEN (session_history.stopped - session_history.started) \
             - session_history.paused_counter ELSE 0 END) AS duration",
            "SUM(session_history.paused_counter) AS paused_counter",
            "session_history.user_id",
            "COALESCE(users.friendly_name, users.username) AS friendly_name",
            "session_history.platform",
            "session_history.player",
            "session_history.ip_address",
            "session_history.media_type",
            "session_history.rating_key",
            "session_history.title",
            "session_history_metadata.full_title AS full_title",
            "session_history_metadata.year",
            "session_history.transcode_decision",
        ],
    );
    spec.joins = vec![
        JoinSpec::left_outer("users", "users.user_id", "session_history.user_id"),
        JoinSpec::left_outer(
            "session_history_metadata",
            "session_history_metadata.rating_key",
            "session_history.rating_key",
        ),
    ];
    spec.custom_where = filter.to_clauses();
    spec.group_by = vec!["session_history.reference_id".to_string()];
    spec
}

impl Database {
    /// Record one playback session. Returns the new row id.
    ///
    /// When `reference_id` is unset the row is updated to reference its
    /// own id, so grouped history queries see it as its own session group.
    pub async fn insert_history(&self, row: &NewHistoryRow) -> DbResult<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_history (
                reference_id, user_id, started, stopped,
                rating_key, media_type, title, platform, player,
                ip_address, section_id, paused_counter, view_offset,
                duration, transcode_decision
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(row.reference_id)
        .bind(row.user_id)
        .bind(row.started)
        .bind(row.stopped)
        .bind(row.rating_key)
        .bind(&row.media_type)
        .bind(&row.title)
        .bind(&row.platform)
        .bind(&row.player)
        .bind(&row.ip_address)
        .bind(row.section_id)
        .bind(row.paused_counter)
        .bind(row.view_offset)
        .bind(row.duration)
        .bind(&row.transcode_decision)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        if row.reference_id.is_none() {
            sqlx::query("UPDATE session_history SET reference_id = ?1 WHERE id = ?1")
                .bind(id)
                .execute(self.pool())
                .await?;
        }
        Ok(id)
    }

    /// Upsert per-rating-key media metadata.
    pub async fn insert_history_metadata(
        &self,
        rating_key: i64,
        full_title: &str,
        media_type: &str,
        year: Option<i64>,
        thumb: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO session_history_metadata (rating_key, full_title, media_type, year, thumb)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(rating_key) DO UPDATE SET
                full_title = excluded.full_title,
                media_type = excluded.media_type,
                year = excluded.year,
                thumb = excluded.thumb
            "#,
        )
        .bind(rating_key)
        .bind(full_title)
        .bind(media_type)
        .bind(year)
        .bind(thumb)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Answer a paginated history-table request.
    ///
    /// Sessions are grouped by `reference_id`; user and media metadata are
    /// joined in so the widget gets display-ready rows.
    pub async fn history_table(
        &self,
        req: &TableRequest,
        filter: &HistoryFilter,
    ) -> DbResult<TablePage> {
        self.ssp_query(&history_spec(filter), req).await
    }
}
