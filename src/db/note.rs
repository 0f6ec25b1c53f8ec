use tracing::{debug, instrument};

use super::core::Database;
use crate::notes::Note;
use crate::TARGET_DB;

impl Database {
    /// Store one note with its comment thread and authors, inside a
    /// single transaction. Re-ingesting the same note id updates the
    /// mutable fields in place; it never creates a duplicate row.
    #[instrument(target = "db_query", level = "debug", skip(self, note), fields(note_id = note.id))]
    pub async fn upsert_note(&self, note: &Note) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO notes (id, latitude, longitude, tile, country, created_at, updated_at,
                               status, closed_at, is_power_related, power_keywords)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                latitude = excluded.latitude,
                longitude = excluded.longitude,
                tile = excluded.tile,
                country = excluded.country,
                updated_at = excluded.updated_at,
                status = excluded.status,
                closed_at = excluded.closed_at,
                is_power_related = excluded.is_power_related,
                power_keywords = excluded.power_keywords
            "#,
        )
        .bind(note.id)
        .bind(note.lat_e7)
        .bind(note.lon_e7)
        .bind(note.tile)
        .bind(&note.country)
        .bind(note.created_at)
        .bind(note.updated_at)
        .bind(note.status.as_str())
        .bind(note.closed_at)
        .bind(note.is_power_related)
        .bind(&note.matched_keywords)
        .execute(&mut *tx)
        .await?;

        // The upstream thread is authoritative and comments carry no
        // per-comment identity, so the thread is replaced wholesale.
        sqlx::query("DELETE FROM note_comments WHERE note_id = $1")
            .bind(note.id)
            .execute(&mut *tx)
            .await?;

        for comment in &note.comments {
            if let Some(uid) = comment.author_uid {
                // First write wins: an existing user row is never
                // overwritten.
                sqlx::query(
                    "INSERT INTO users (id, display_name) VALUES ($1, $2) \
                     ON CONFLICT (id) DO NOTHING",
                )
                .bind(uid)
                .bind(comment.author_name.as_deref())
                .execute(&mut *tx)
                .await?;
            }

            sqlx::query(
                r#"
                INSERT INTO note_comments (note_id, author_id, body, created_at, event, visible)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(note.id)
            .bind(comment.author_uid)
            .bind(&comment.body)
            .bind(comment.created_at)
            .bind(comment.event.as_str())
            .bind(comment.visible)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(
            target: TARGET_DB,
            "Stored note {} with {} comments",
            note.id,
            note.comments.len()
        );
        Ok(())
    }
}
