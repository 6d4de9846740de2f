//! SQLite-backed study set store via libsql. Implements StudyRepoPort.
//!
//! Single `study_sets` table; payloads are stored verbatim as JSON text.
//! One database file: data/studyforge.db

use crate::domain::{DomainError, StudyKind, StudySet};
use crate::ports::StudyRepoPort;
use libsql::{Database, Row, params};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const STUDY_SETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS study_sets (
    id TEXT PRIMARY KEY,
    kind TEXT NOT NULL,
    topic TEXT NOT NULL DEFAULT '',
    payload_json TEXT NOT NULL,
    used_fallback INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
)"#;
const STUDY_SETS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_study_sets_kind_created ON study_sets (kind, created_at DESC)";

/// SQLite repository. One database file (studyforge.db) in the given base directory.
pub struct SqliteRepo {
    db: Database,
    db_path: PathBuf,
}

impl SqliteRepo {
    /// Connect to (or create) the SQLite database and ensure the schema exists.
    /// Call this once at startup; the returned repo is safe to share via Arc.
    ///
    /// Sets WAL mode and synchronous=NORMAL.
    pub async fn connect(base_dir: impl AsRef<Path>) -> Result<Self, DomainError> {
        let base = base_dir.as_ref();
        std::fs::create_dir_all(base).map_err(|e| DomainError::Repo(e.to_string()))?;
        let db_path = base.join("studyforge.db");
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = db.connect().map_err(|e| DomainError::Repo(e.to_string()))?;

        // PRAGMA returns a row (new value); use query and consume rows (execute fails when rows are returned).
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            let mut rows = conn
                .query(pragma, ())
                .await
                .map_err(|e| DomainError::Repo(format!("{} failed: {}", pragma, e)))?;
            while rows
                .next()
                .await
                .map_err(|e| DomainError::Repo(e.to_string()))?
                .is_some()
            {}
        }

        conn.execute(STUDY_SETS_TABLE, ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        conn.execute(STUDY_SETS_INDEX, ())
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        info!(path = %db_path.display(), "SQLite connected with WAL mode");

        Ok(Self { db, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn row_to_set(row: &Row) -> Result<StudySet, DomainError> {
        let id: String = row.get(0).map_err(|e| DomainError::Repo(e.to_string()))?;
        let kind_str: String = row.get(1).map_err(|e| DomainError::Repo(e.to_string()))?;
        let topic: String = row.get::<String>(2).unwrap_or_default();
        let payload_json: String = row.get(3).map_err(|e| DomainError::Repo(e.to_string()))?;
        let used_fallback: i64 = row.get(4).unwrap_or(0);
        let created_at: i64 = row.get(5).map_err(|e| DomainError::Repo(e.to_string()))?;

        let kind = StudyKind::parse(&kind_str)
            .ok_or_else(|| DomainError::Repo(format!("unknown study kind '{}'", kind_str)))?;
        let payload = serde_json::from_str(&payload_json).unwrap_or_else(|e| {
            warn!(id = %id, error = %e, "stored payload is not valid JSON");
            serde_json::Value::Null
        });

        Ok(StudySet {
            id,
            kind,
            topic,
            payload,
            used_fallback: used_fallback != 0,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl StudyRepoPort for SqliteRepo {
    async fn save_set(&self, set: &StudySet) -> Result<(), DomainError> {
        let payload_json =
            serde_json::to_string(&set.payload).map_err(|e| DomainError::Repo(e.to_string()))?;
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO study_sets (id, kind, topic, payload_json, used_fallback, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                kind = excluded.kind,
                topic = excluded.topic,
                payload_json = excluded.payload_json,
                used_fallback = excluded.used_fallback,
                created_at = excluded.created_at
            "#,
            params![
                set.id.as_str(),
                set.kind.as_str(),
                set.topic.as_str(),
                payload_json,
                set.used_fallback as i64,
                set.created_at
            ],
        )
        .await
        .map_err(|e| DomainError::Repo(e.to_string()))?;

        info!(
            id = %set.id,
            kind = %set.kind,
            items = set.item_count(),
            used_fallback = set.used_fallback,
            "saved study set"
        );
        Ok(())
    }

    async fn get_set(&self, id: &str) -> Result<Option<StudySet>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut rows = conn
            .query(
                r#"
                SELECT id, kind, topic, payload_json, used_fallback, created_at
                FROM study_sets
                WHERE id = ?1
                "#,
                params![id],
            )
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?;

        match rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            Some(row) => Ok(Some(Self::row_to_set(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_sets(
        &self,
        kind: Option<StudyKind>,
        limit: u32,
    ) -> Result<Vec<StudySet>, DomainError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| DomainError::Repo(e.to_string()))?;
        let mut rows = match kind {
            Some(kind) => conn
                .query(
                    r#"
                    SELECT id, kind, topic, payload_json, used_fallback, created_at
                    FROM study_sets
                    WHERE kind = ?1
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?2
                    "#,
                    params![kind.as_str(), limit as i64],
                )
                .await,
            None => conn
                .query(
                    r#"
                    SELECT id, kind, topic, payload_json, used_fallback, created_at
                    FROM study_sets
                    ORDER BY created_at DESC, rowid DESC
                    LIMIT ?1
                    "#,
                    params![limit as i64],
                )
                .await,
        }
        .map_err(|e| DomainError::Repo(e.to_string()))?;

        let mut sets = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::Repo(e.to_string()))?
        {
            sets.push(Self::row_to_set(&row)?);
        }
        Ok(sets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_save_get_list_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepo::connect(dir.path()).await.unwrap();
        assert!(repo.path().ends_with("studyforge.db"));

        let mut older = StudySet::new(
            StudyKind::Flashcards,
            "cells",
            json!([{"question": "Q", "answer": "A"}]),
            false,
        );
        older.created_at -= 60;
        let newer = StudySet::new(StudyKind::Quiz, "cells", json!([]), true);
        repo.save_set(&older).await.unwrap();
        repo.save_set(&newer).await.unwrap();

        let loaded = repo.get_set(&older.id).await.unwrap().unwrap();
        assert_eq!(loaded, older);
        assert!(repo.get_set("missing").await.unwrap().is_none());

        let all = repo.list_sets(None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert!(all[0].used_fallback);

        let quizzes = repo.list_sets(Some(StudyKind::Quiz), 10).await.unwrap();
        assert_eq!(quizzes.len(), 1);
        assert_eq!(repo.list_sets(None, 1).await.unwrap().len(), 1);
    }
}
