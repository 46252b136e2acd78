use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Turn a database file path into a sqlite URL that creates the file when missing.
/// Explicit `sqlite:` URLs are passed through untouched.
pub fn sqlite_url(path: &str) -> String {
    if path.starts_with("sqlite:") {
        path.to_string()
    } else {
        format!("sqlite://{}?mode=rwc", path)
    }
}

pub async fn get_db_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    info!("Connecting to database via Sea-ORM at: {}", database_url);
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);
    let db = Database::connect(options).await?;
    Ok(db)
}
