// crates/db/src/queries/users.rs
// User accounts: upserts and the paginated user list.

use plexpulse_core::{TablePage, TableRequest};

use crate::table::grammar::{BindValue, JoinSpec, WhereClause, WhereValue};
use crate::table::ssp::TableSpec;
use crate::{Database, DbResult};

/// A Plex user to upsert into the local cache table.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub user_id: i64,
    pub username: String,
    pub friendly_name: Option<String>,
    pub email: Option<String>,
    pub is_active: bool,
}

fn users_spec(include_inactive: bool) -> TableSpec {
    let mut spec = TableSpec::new(
        "users",
        "user_id",
        &[
            "users.user_id",
            "users.username",
            "COALESCE(users.friendly_name, users.username) AS friendly_name",
            "users.email",
            "users.is_active",
            "COUNT(session_history.id) AS plays",
            "MAX(session_history.started) AS last_seen",
        ],
    );
    spec.joins = vec![JoinSpec::left_outer(
        "session_history",
        "session_history.user_id",
        "users.user_id",
    )];
    if !include_inactive {
        spec.custom_where = vec![WhereClause::and(
            "users.is_active",
            WhereValue::Eq(BindValue::Int(1)),
        )];
    }
    spec.group_by = vec!["users.user_id".to_string()];
    spec
}

impl Database {
    /// Upsert a user row, preserving `friendly_name` customizations when
    /// the incoming value is unset.
    pub async fn upsert_user(&self, user: &NewUser) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, username, friendly_name, email, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                username = excluded.username,
                friendly_name = COALESCE(excluded.friendly_name, users.friendly_name),
                email = excluded.email,
                is_active = excluded.is_active
            "#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.friendly_name)
        .bind(&user.email)
        .bind(user.is_active as i64)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Answer a paginated user-list request: one row per user with play
    /// count and last-seen timestamp joined in from history.
    pub async fn users_table(
        &self,
        req: &TableRequest,
        include_inactive: bool,
    ) -> DbResult<TablePage> {
        self.ssp_query(&users_spec(include_inactive), req).await
    }
}
