// crates/server/src/routes/tables.rs
//! Paginated-table endpoints. Each accepts a table request as the JSON
//! body and answers with one page of rows plus counts.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use plexpulse_core::{TablePage, TableRequest};
use plexpulse_db::HistoryFilter;

use crate::error::ApiError;
use crate::state::AppState;

/// Upper bound on one page; anything larger is a client bug.
const MAX_PAGE_LENGTH: u64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Server-side history filters, passed as query parameters alongside the
/// widget's body.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub user_id: Option<i64>,
    /// Comma-separated list, e.g. `movie,episode`.
    pub media_type: Option<String>,
    pub after: Option<i64>,
    pub before: Option<i64>,
}

impl HistoryQuery {
    fn into_filter(self) -> HistoryFilter {
        HistoryFilter {
            user_id: self.user_id,
            media_types: self
                .media_type
                .map(|types| {
                    types
                        .split(',')
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            started_after: self.after,
            started_before: self.before,
        }
    }
}

fn check_length(req: &TableRequest) -> Result<(), ApiError> {
    if req.length > MAX_PAGE_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "page length {} exceeds maximum {}",
            req.length, MAX_PAGE_LENGTH
        )));
    }
    Ok(())
}

/// POST /api/history - Paginated playback history.
pub async fn history_table(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
    Json(req): Json<TableRequest>,
) -> Result<Json<TablePage>, ApiError> {
    check_length(&req)?;
    let page = state.db.history_table(&req, &query.into_filter()).await?;
    Ok(Json(page))
}

/// POST /api/users - Paginated user list.
pub async fn users_table(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
    Json(req): Json<TableRequest>,
) -> Result<Json<TablePage>, ApiError> {
    check_length(&req)?;
    let page = state.db.users_table(&req, query.include_inactive).await?;
    Ok(Json(page))
}

/// POST /api/libraries - Paginated library-section list.
pub async fn libraries_table(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TableQuery>,
    Json(req): Json<TableRequest>,
) -> Result<Json<TablePage>, ApiError> {
    check_length(&req)?;
    let page = state
        .db
        .libraries_table(&req, query.include_inactive)
        .await?;
    Ok(Json(page))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/history", post(history_table))
        .route("/users", post(users_table))
        .route("/libraries", post(libraries_table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_list_splits_on_commas() {
        let query = HistoryQuery {
            media_type: Some("movie,episode".to_string()),
            ..HistoryQuery::default()
        };
        let filter = query.into_filter();
        assert_eq!(filter.media_types, vec!["movie", "episode"]);
    }

    #[test]
    fn empty_media_type_yields_no_filter() {
        let query = HistoryQuery {
            media_type: Some(String::new()),
            ..HistoryQuery::default()
        };
        assert!(query.into_filter().media_types.is_empty());
    }
}
