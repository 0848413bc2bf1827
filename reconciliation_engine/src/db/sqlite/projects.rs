use sqlx::SqliteConnection;

use crate::{
    db::traits::ReconciliationDbError,
    db_types::{Project, ProjectLookup},
};

pub async fn insert_project(project: &Project, conn: &mut SqliteConnection) -> Result<(), ReconciliationDbError> {
    sqlx::query("INSERT INTO projects (id, code, name) VALUES ($1, $2, $3)")
        .bind(project.id.as_str())
        .bind(project.code.as_deref())
        .bind(project.name.as_deref())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_project(
    lookup: &ProjectLookup,
    conn: &mut SqliteConnection,
) -> Result<Option<Project>, ReconciliationDbError> {
    // codes are matched case-insensitively
    let (filter, value) = match lookup {
        ProjectLookup::Id(id) => ("id = $1", id.as_str()),
        ProjectLookup::Code(code) => ("code = $1 COLLATE NOCASE", code.trim()),
    };
    let sql = format!("SELECT id, code, name FROM projects WHERE {filter}");
    let project = sqlx::query_as::<_, Project>(&sql).bind(value).fetch_optional(conn).await?;
    Ok(project)
}
