use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, Utc};
use rusqlite::{Connection, params};
use tracing::{debug, instrument, warn};

use crate::app_info::{self, ParsedAppInfo};
use crate::error::Error;

const RETENTION_DAYS: i64 = 30;

enum Store {
    Durable { connection: Mutex<Connection> },
    Memory { connection: Mutex<Connection> },
}

impl Store {
    fn connection(&self) -> &Mutex<Connection> {
        match self {
            Store::Durable { connection } | Store::Memory { connection } => connection,
        }
    }
}

/// Durable table of `(application_id, item_identifier, timestamp)` rows,
/// answering "how often has this item been picked in the last 30 days" and
/// seeding fresh applications from their `.hud-app-info` files.
///
/// On a store open or write failure the tracker permanently falls back to
/// an in-memory store for the rest of the process lifetime: usage data is
/// best-effort and must never block a user action.
pub struct UsageTracker {
    store: Mutex<Store>,
    degraded: Mutex<bool>,
    initialised_apps: Mutex<HashSet<String>>,
    info_dir: Option<PathBuf>,
}

impl UsageTracker {
    /// Selects the store location per the `HUD_NO_STORE_USAGE_DATA` /
    /// `HUD_CACHE_DIR` / `HUD_APP_INFO_DIR` environment overrides, matching
    /// the reference implementation's "store usage data" setting.
    #[instrument(skip(store_usage_data), err)]
    pub fn new(store_usage_data: bool) -> Result<Self, Error> {
        let forced_memory = env::var("HUD_NO_STORE_USAGE_DATA").is_ok();
        let info_dir = env::var("HUD_APP_INFO_DIR").ok().map(PathBuf::from);

        let mut degraded = false;
        let store = if store_usage_data && !forced_memory {
            match Self::open_durable() {
                Ok(connection) => Store::Durable {
                    connection: Mutex::new(connection),
                },
                Err(err) => {
                    warn!(%err, "usage store failed to open, degrading to no-op");
                    degraded = true;
                    Store::Memory {
                        connection: Mutex::new(Self::open_memory()?),
                    }
                }
            }
        } else {
            // Intentional in-memory mode (settings/`HUD_NO_STORE_USAGE_DATA`):
            // fully functional for the process lifetime, not a degradation.
            Store::Memory {
                connection: Mutex::new(Self::open_memory()?),
            }
        };

        Ok(Self {
            store: Mutex::new(store),
            degraded: Mutex::new(degraded),
            initialised_apps: Mutex::new(HashSet::new()),
            info_dir,
        })
    }

    fn base_dir() -> Result<PathBuf, Error> {
        if let Ok(dir) = env::var("HUD_CACHE_DIR") {
            return Ok(PathBuf::from(dir));
        }
        dirs::cache_dir().ok_or(Error::NoCacheDir)
    }

    fn open_durable() -> Result<Connection, Error> {
        let base = Self::base_dir()?;
        let dir = base.join("indicator-appmenu");
        fs::create_dir_all(&dir).map_err(|e| Error::Open {
            path: dir.display().to_string(),
            source: rusqlite::Error::InvalidPath(PathBuf::from(e.to_string())),
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&dir, fs::Permissions::from_mode(0o700));
        }

        let db_path = dir.join("hud-usage-log.sqlite");
        debug!(path = %db_path.display(), "opening usage store");
        let connection = Connection::open(&db_path).map_err(|e| Error::Open {
            path: db_path.display().to_string(),
            source: e,
        })?;
        Self::init_schema(&connection)?;
        Ok(connection)
    }

    fn open_memory() -> Result<Connection, Error> {
        let connection = Connection::open_in_memory()?;
        Self::init_schema(&connection)?;
        Ok(connection)
    }

    fn init_schema(connection: &Connection) -> Result<(), Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS usage (
                application_id TEXT NOT NULL,
                item_identifier TEXT NOT NULL,
                timestamp DATE NOT NULL
            )",
            [],
        )?;
        connection.execute(
            "CREATE INDEX IF NOT EXISTS usage_app_item ON usage (application_id, item_identifier)",
            [],
        )?;
        connection.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        Ok(())
    }

    /// Permanently stops touching the store. Once set, `mark_usage` is a
    /// no-op and `get_usage` returns 0 for the rest of the process lifetime.
    fn degrade(&self, reason: &str) {
        let mut degraded = self.degraded.lock().unwrap();
        if *degraded {
            return;
        }
        warn!(reason, "usage store failed, degrading to no-op for the rest of the process");
        *degraded = true;
    }

    fn is_degraded(&self) -> bool {
        *self.degraded.lock().unwrap()
    }

    /// Appends a row dated today. A failure is logged and the tracker
    /// degrades; it never propagates to the caller.
    #[instrument(skip(self))]
    pub async fn mark_usage(&self, application_id: &str, item_identifier: &str) {
        if self.is_degraded() {
            return;
        }
        self.ensure_initialised(application_id).await;

        let result = {
            let store = self.store.lock().unwrap();
            store
                .connection()
                .lock()
                .unwrap()
                .execute(
                    "INSERT INTO usage (application_id, item_identifier, timestamp) VALUES (?1, ?2, date('now'))",
                    params![application_id, item_identifier],
                )
        };

        if let Err(err) = result {
            self.degrade(&err.to_string());
        }
    }

    /// Counts rows for this key within the last 30 days, seeding the
    /// application from its info file first if this is the first reference.
    #[instrument(skip(self))]
    pub async fn get_usage(&self, application_id: &str, item_identifier: &str) -> u32 {
        if self.is_degraded() {
            return 0;
        }
        self.ensure_initialised(application_id).await;

        let cutoff = (Utc::now().date_naive() - Duration::days(RETENTION_DAYS)).to_string();
        let store = self.store.lock().unwrap();
        let count: Result<i64, _> = store.connection().lock().unwrap().query_row(
            "SELECT COUNT(*) FROM usage WHERE application_id = ?1 AND item_identifier = ?2 AND timestamp >= ?3",
            params![application_id, item_identifier, cutoff],
            |row| row.get(0),
        );

        match count {
            Ok(count) => count.max(0) as u32,
            Err(err) => {
                drop(store);
                self.degrade(&err.to_string());
                0
            }
        }
    }

    /// Deletes rows older than 30 days. Idempotent: calling it twice with no
    /// intervening `mark_usage` leaves the store unchanged.
    #[instrument(skip(self))]
    pub async fn drop_stale(&self) {
        if self.is_degraded() {
            return;
        }
        let cutoff = (Utc::now().date_naive() - Duration::days(RETENTION_DAYS)).to_string();
        let result = {
            let store = self.store.lock().unwrap();
            store
                .connection()
                .lock()
                .unwrap()
                .execute("DELETE FROM usage WHERE timestamp < ?1", params![cutoff])
        };
        if let Err(err) = result {
            self.degrade(&err.to_string());
        }
    }

    /// Seeds `application_id` from `<info_dir>/<basename>.hud-app-info` the
    /// first time it is referenced in this process, if the store holds no
    /// row for it yet. A malformed file is logged and skipped.
    async fn ensure_initialised(&self, application_id: &str) {
        {
            let mut seen = self.initialised_apps.lock().unwrap();
            if !seen.insert(application_id.to_string()) {
                return;
            }
        }

        let Some(info_dir) = &self.info_dir else { return };
        let has_rows: Result<i64, _> = {
            let store = self.store.lock().unwrap();
            store.connection().lock().unwrap().query_row(
                "SELECT COUNT(*) FROM usage WHERE application_id = ?1",
                params![application_id],
                |row| row.get(0),
            )
        };
        if !matches!(has_rows, Ok(0)) {
            return;
        }

        let basename = application_id
            .rsplit('/')
            .next()
            .unwrap_or(application_id);
        let path = info_dir.join(format!("{basename}.hud-app-info"));
        let Ok(contents) = fs::read_to_string(&path) else {
            return;
        };

        match app_info::parse(&contents) {
            Ok(parsed) => self.seed(application_id, parsed).await,
            Err(err) => warn!(path = %path.display(), %err, "malformed application-info file, skipping"),
        }
    }

    async fn seed(&self, application_id: &str, parsed: ParsedAppInfo) {
        let today = Utc::now().date_naive();
        let store = self.store.lock().unwrap();
        let connection = store.connection().lock().unwrap();
        for entry in parsed.entries {
            for day in 0..entry.count {
                let timestamp = days_ago(today, day as i64);
                let _ = connection.execute(
                    "INSERT INTO usage (application_id, item_identifier, timestamp) VALUES (?1, ?2, ?3)",
                    params![application_id, entry.item_identifier, timestamp.to_string()],
                );
            }
        }
    }
}

fn days_ago(from: NaiveDate, days: i64) -> NaiveDate {
    from - Duration::days(days)
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn marking_usage_increases_the_same_day_count() {
        let tracker = UsageTracker::new(false).unwrap();
        let before = tracker.get_usage("app.desktop", "File > Print").await;
        tracker.mark_usage("app.desktop", "File > Print").await;
        let after = tracker.get_usage("app.desktop", "File > Print").await;
        assert!(after >= before + 1);
    }

    #[tokio::test]
    async fn unreferenced_items_have_zero_usage() {
        let tracker = UsageTracker::new(false).unwrap();
        assert_eq!(tracker.get_usage("app.desktop", "never seen").await, 0);
    }

    #[tokio::test]
    async fn drop_stale_is_idempotent() {
        let tracker = UsageTracker::new(false).unwrap();
        tracker.mark_usage("app.desktop", "File > Print").await;
        tracker.drop_stale().await;
        let first = tracker.get_usage("app.desktop", "File > Print").await;
        tracker.drop_stale().await;
        let second = tracker.get_usage("app.desktop", "File > Print").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn seeding_from_an_info_file_clamps_and_backdates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("myapp.hud-app-info"),
            r#"<hudappinfo>
                <desktopfile path="/usr/share/applications/myapp.desktop" />
                <menus>
                    <menu name="Edit">
                        <item name="Preferences" count="50" />
                    </menu>
                </menus>
            </hudappinfo>"#,
        )
        .unwrap();

        unsafe {
            env::set_var("HUD_APP_INFO_DIR", dir.path());
        }
        let tracker = UsageTracker::new(false).unwrap();
        let usage = tracker
            .get_usage("/usr/share/applications/myapp.desktop", "Edit > Preferences")
            .await;
        unsafe {
            env::remove_var("HUD_APP_INFO_DIR");
        }

        assert_eq!(usage, 30);
    }
}
