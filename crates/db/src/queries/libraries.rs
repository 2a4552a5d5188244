// crates/db/src/queries/libraries.rs
// Library sections: upserts and the paginated library list.

use plexpulse_core::{TablePage, TableRequest};

use crate::table::grammar::{BindValue, JoinSpec, WhereClause, WhereValue};
use crate::table::ssp::TableSpec;
use crate::{Database, DbResult};

/// A library section to upsert into the local cache table.
#[derive(Debug, Clone, Default)]
pub struct NewLibrarySection {
    pub section_id: i64,
    pub section_name: String,
    pub section_type: String,
    pub count: i64,
    pub is_active: bool,
}

fn libraries_spec(include_inactive: bool) -> TableSpec {
    let mut spec = TableSpec::new(
        "library_sections",
        "section_id",
        &[
            "library_sections.section_id",
            "library_sections.section_name",
            "library_sections.section_type",
            "library_sections.count",
            "library_sections.is_active",
            "COUNT(session_history.id) AS plays",
            "MAX(session_history.started) AS last_accessed",
        ],
    );
    spec.joins = vec![JoinSpec::left_outer(
        "session_history",
        "session_history.section_id",
        "library_sections.section_id",
    )];
    if !include_inactive {
        spec.custom_where = vec![WhereClause::and(
            "library_sections.is_active",
            WhereValue::Eq(BindValue::Int(1)),
        )];
    }
    spec.group_by = vec!["library_sections.section_id".to_string()];
    spec
}

impl Database {
    pub async fn upsert_library_section(&self, section: &NewLibrarySection) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO library_sections (section_id, section_name, section_type, count, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(section_id) DO UPDATE SET
                section_name = excluded.section_name,
                section_type = excluded.section_type,
                count = excluded.count,
                is_active = excluded.is_active
            "#,
        )
        .bind(section.section_id)
        .bind(&section.section_name)
        .bind(&section.section_type)
        .bind(section.count)
        .bind(section.is_active as i64)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Answer a paginated library-list request: one row per section with
    /// play count and last-accessed timestamp joined in from history.
    pub async fn libraries_table(
        &self,
        req: &TableRequest,
        include_inactive: bool,
    ) -> DbResult<TablePage> {
        self.ssp_query(&libraries_spec(include_inactive), req).await
    }
}
