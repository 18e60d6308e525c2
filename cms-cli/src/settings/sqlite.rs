//! SQLite preference store.
//!
//! The schema is versioned through `PRAGMA user_version`. Every row is read
//! into memory on open, so lookups never touch the database.

use std::path::Path;

use async_sqlite::Client;
use async_sqlite::rusqlite;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::Pref;
use super::PrefStore;
use super::SettingsError;

/// Schema steps; entry `n` upgrades `user_version` from `n` to `n + 1`.
const MIGRATIONS: &[&str] = &["CREATE TABLE IF NOT EXISTS preferences (
        scope TEXT NOT NULL,
        name TEXT NOT NULL,
        value BLOB NOT NULL,
        updated_at TEXT NOT NULL,
        PRIMARY KEY (scope, name)
    )"];

pub struct SqlitePrefs {
    client: Client,
    values: DashMap<Pref, Vec<u8>>,
}

impl SqlitePrefs {
    /// Opens (or creates) the store at `path`, upgrading its schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let client = async_sqlite::ClientBuilder::new()
            .path(path)
            .open()
            .await?;

        let version = client.conn(migrate).await?;
        log::debug!("Preference schema at version {}", version);

        let rows = client
            .conn(|conn| {
                let mut stmt = conn.prepare("SELECT scope, name, value FROM preferences")?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Vec<u8>>(2)?,
                    ))
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await?;

        let values = DashMap::new();
        for (scope, name, value) in rows {
            match Pref::from_parts(&scope, &name) {
                Some(pref) => {
                    values.insert(pref, value);
                }
                None => log::debug!("Ignoring stored preference {}.{}", scope, name),
            }
        }

        Ok(Self { client, values })
    }
}

/// Applies pending migrations and returns the resulting schema version.
fn migrate(conn: &rusqlite::Connection) -> Result<usize, rusqlite::Error> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    let current = usize::try_from(current).unwrap_or(0);

    for (step, sql) in MIGRATIONS.iter().enumerate().skip(current) {
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {}", step + 1))?;
    }

    Ok(current.max(MIGRATIONS.len()))
}

#[async_trait]
impl PrefStore for SqlitePrefs {
    async fn load(&self, pref: Pref) -> Result<Option<Vec<u8>>, SettingsError> {
        Ok(self.values.get(&pref).map(|v| v.clone()))
    }

    async fn store(&self, pref: Pref, value: Vec<u8>) -> Result<(), SettingsError> {
        let row = value.clone();
        let updated_at = Utc::now().to_rfc3339();

        self.client
            .conn(move |conn| {
                conn.execute(
                    "INSERT INTO preferences (scope, name, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(scope, name) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    rusqlite::params![pref.scope(), pref.name(), row, updated_at],
                )
            })
            .await?;

        self.values.insert(pref, value);
        Ok(())
    }

    async fn clear_scope(&self, scope: &str) -> Result<usize, SettingsError> {
        let target = scope.to_string();
        let removed = self
            .client
            .conn(move |conn| conn.execute("DELETE FROM preferences WHERE scope = ?1", [&target]))
            .await?;

        self.values.retain(|pref, _| pref.scope() != scope);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("cms-admin-{}-{}.db", name, std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[tokio::test]
    async fn test_store_and_clear_scope() {
        let store = SqlitePrefs::open(":memory:").await.unwrap();

        store.store(Pref::LastEntity, b"Tag".to_vec()).await.unwrap();
        store.store(Pref::PageSize, vec![5]).await.unwrap();
        store.store(Pref::LastEntity, b"Post".to_vec()).await.unwrap();

        assert_eq!(store.load(Pref::LastEntity).await.unwrap(), Some(b"Post".to_vec()));
        assert_eq!(store.clear_scope("other").await.unwrap(), 0);
        assert_eq!(store.clear_scope("table").await.unwrap(), 2);
        assert_eq!(store.load(Pref::PageSize).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reopen_reads_stored_rows() {
        let path = temp_db("prefs-reopen");

        let store = SqlitePrefs::open(&path).await.unwrap();
        store.store(Pref::PageSize, vec![25]).await.unwrap();
        store
            .client
            .conn(|conn| {
                conn.execute(
                    "INSERT INTO preferences VALUES ('ui', 'theme', x'01', '2024-01-01T00:00:00Z')",
                    [],
                )
            })
            .await
            .unwrap();
        drop(store);

        let reopened = SqlitePrefs::open(&path).await.unwrap();
        assert_eq!(reopened.load(Pref::PageSize).await.unwrap(), Some(vec![25]));
        assert_eq!(reopened.values.len(), 1);

        let version: i64 = reopened
            .client
            .conn(|conn| conn.query_row("PRAGMA user_version", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(version, MIGRATIONS.len() as i64);

        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
