use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    /// Create the three tables and their indexes if they do not exist.
    /// Only runs when the operator passes the create-tables toggle.
    pub async fn create_tables(&self) -> Result<(), sqlx::Error> {
        info!(target: TARGET_DB, "Creating tables if they do not exist");

        // Postgres rejects multi-statement prepared queries, so each
        // statement runs on its own.
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGINT PRIMARY KEY,
                display_name VARCHAR(255),
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS notes (
                id BIGINT PRIMARY KEY,
                latitude INTEGER NOT NULL,
                longitude INTEGER NOT NULL,
                tile BIGINT,
                country VARCHAR(100),
                created_at TIMESTAMP WITH TIME ZONE NOT NULL,
                updated_at TIMESTAMP WITH TIME ZONE NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'open',
                closed_at TIMESTAMP WITH TIME ZONE,
                is_power_related BOOLEAN NOT NULL DEFAULT FALSE,
                power_keywords TEXT[]
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS note_comments (
                id BIGSERIAL PRIMARY KEY,
                note_id BIGINT NOT NULL REFERENCES notes(id),
                author_id BIGINT REFERENCES users(id),
                body TEXT,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL,
                event VARCHAR(20) NOT NULL,
                visible BOOLEAN DEFAULT TRUE
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_notes_updated_at ON notes(updated_at)",
            "CREATE INDEX IF NOT EXISTS idx_notes_power_related ON notes(is_power_related)",
            "CREATE INDEX IF NOT EXISTS idx_notes_country ON notes(country)",
            "CREATE INDEX IF NOT EXISTS idx_notes_tile ON notes(tile)",
            "CREATE INDEX IF NOT EXISTS idx_note_comments_note_id ON note_comments(note_id)",
            "CREATE INDEX IF NOT EXISTS idx_users_display_name ON users(display_name)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(self.pool()).await?;
        }

        info!(target: TARGET_DB, "Schema ready");
        Ok(())
    }
}
