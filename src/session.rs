//! Login state: storing a fresh dataset and clearing everything on logout.

use std::sync::Arc;

use chrono_tz::Tz;
use log::{info, warn};
use serde_json::Value;

use crate::background::REFRESH_TASK;
use crate::calendar;
use crate::error::AppResult;
use crate::models::{Dataset, ExamEntry, WeekSchedule};
use crate::notifications::gate;
use crate::platform::{Clock, Credentials, KeyValueStore, Notifier, SystemClock, TaskRegistry};
use crate::storage::{self, keys};
use crate::utils::local_day_key;

pub struct Session {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
    registry: Option<Arc<dyn TaskRegistry>>,
    clock: Arc<dyn Clock>,
    tz: Tz,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>, tz: Tz) -> Self {
        Self {
            store,
            notifier,
            registry: None,
            clock: Arc::new(SystemClock),
            tz,
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn TaskRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn is_logged_in(&self) -> AppResult<bool> {
        storage::get_flag(self.store.as_ref(), keys::LOGGED_IN).await
    }

    /// Stored portal credentials, if both parts are present and non-empty.
    pub async fn credentials(&self) -> AppResult<Option<Credentials>> {
        let username = self.store.get(keys::USERNAME).await?;
        let password = self.store.get(keys::PASSWORD).await?;
        Ok(match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some(Credentials { username, password })
            }
            _ => None,
        })
    }

    /// Records the user and their first dataset.
    pub async fn login(&self, credentials: &Credentials, dataset: &Dataset) -> AppResult<()> {
        self.apply_dataset(dataset).await?;
        self.store.set(keys::USERNAME, &credentials.username).await?;
        self.store.set(keys::PASSWORD, &credentials.password).await?;
        storage::set_flag(self.store.as_ref(), keys::LOGGED_IN, true).await?;
        info!("User {} logged in", credentials.username);
        Ok(())
    }

    /// Replaces the stored timetable and exam list and reopens the schedule
    /// gate. Nothing is written when either payload is malformed.
    pub async fn apply_dataset(&self, dataset: &Dataset) -> AppResult<()> {
        let weeks: Vec<WeekSchedule> = calendar::decode_array(dataset.thoikhoabieu.clone(), "timetable")?;
        let exams_value = match &dataset.lichthi {
            Value::Null => Value::Array(Vec::new()),
            other => other.clone(),
        };
        let exams: Vec<ExamEntry> = calendar::decode_array(exams_value.clone(), "exam list")?;

        let now = self.clock.now();
        storage::set_json(self.store.as_ref(), keys::TIMETABLE, &dataset.thoikhoabieu).await?;
        storage::set_json(self.store.as_ref(), keys::EXAMS, &exams_value).await?;
        self.store.set(keys::LAST_RUN_DATE, &local_day_key(now, self.tz)).await?;
        self.store.set(keys::LAST_UPDATE, &now.to_rfc3339()).await?;
        let gate = gate::invalidate(self.store.as_ref()).await?;

        info!(
            "Stored dataset with {} weeks and {} exams (version {})",
            weeks.len(),
            exams.len(),
            gate.dataset_version
        );
        Ok(())
    }

    /// Clears all user data except the keep-list, drops pending
    /// notifications and unregisters the daily refresh task.
    pub async fn logout(&self) -> AppResult<()> {
        let doomed: Vec<String> = self
            .store
            .all_keys()
            .await?
            .into_iter()
            .filter(|key| !keys::KEEP_ON_LOGOUT.contains(&key.as_str()))
            .collect();
        self.store.remove_keys(&doomed).await?;
        self.notifier.cancel_all().await?;

        if let Some(registry) = &self.registry {
            if let Err(e) = registry.unregister(REFRESH_TASK).await {
                warn!("Failed to unregister refresh task on logout: {}", e);
            }
        }

        info!("Logged out, removed {} keys", doomed.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::notifications::{RecordingNotifier, ScheduleGate};
    use crate::platform::FixedClock;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use chrono_tz::Asia::Ho_Chi_Minh;
    use serde_json::json;

    fn session(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> Session {
        let now = Ho_Chi_Minh.with_ymd_and_hms(2024, 3, 9, 2, 0, 0).unwrap().with_timezone(&Utc);
        Session::new(store, notifier, Ho_Chi_Minh).with_clock(Arc::new(FixedClock::new(now)))
    }

    fn dataset() -> Dataset {
        Dataset {
            thoikhoabieu: json!([{"start_date": "04/03/2024", "data": [
                {"thu": 2, "tiet_hoc": "1 --> 3", "lop_hoc_phan": "CS101", "dia_diem": "A101"}
            ]}]),
            lichthi: Value::Null,
        }
    }

    #[tokio::test]
    async fn test_apply_dataset_stores_and_invalidates() {
        let store = Arc::new(MemoryStore::new());
        let s = session(store.clone(), Arc::new(RecordingNotifier::new()));

        s.apply_dataset(&dataset()).await.unwrap();

        let values = store.snapshot().await;
        assert!(values.contains_key(keys::TIMETABLE));
        assert_eq!(values.get(keys::EXAMS).map(String::as_str), Some("[]"));
        assert_eq!(values.get(keys::LAST_RUN_DATE).map(String::as_str), Some("2024-03-09"));
        let gate = ScheduleGate::load(store.as_ref()).await.unwrap();
        assert_eq!(gate.dataset_version, 1);
        assert!(!gate.is_current());
    }

    #[tokio::test]
    async fn test_malformed_dataset_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let s = session(store.clone(), Arc::new(RecordingNotifier::new()));
        let bad = Dataset {
            thoikhoabieu: json!({"weeks": []}),
            lichthi: Value::Null,
        };

        let err = s.apply_dataset(&bad).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedDataset(_)));
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_logout_keeps_only_keep_list() {
        let store = Arc::new(MemoryStore::with_values([
            (keys::USERNAME, "2051010001"),
            (keys::NOTES, "[]"),
            (keys::ENCRYPTION_KEY, "abcd"),
            ("@intro_completed", "true"),
        ]));
        let notifier = Arc::new(RecordingNotifier::new());
        let s = session(store.clone(), notifier.clone());

        s.logout().await.unwrap();

        let remaining: Vec<String> = store.snapshot().await.into_keys().collect();
        assert_eq!(remaining, vec!["@intro_completed".to_string(), keys::ENCRYPTION_KEY.to_string()]);
        assert_eq!(notifier.cancel_calls(), 1);
    }

    #[tokio::test]
    async fn test_credentials_require_both_parts() {
        let store = Arc::new(MemoryStore::with_values([(keys::USERNAME, "2051010001")]));
        let s = session(store.clone(), Arc::new(RecordingNotifier::new()));
        assert_eq!(s.credentials().await.unwrap(), None);

        store.set(keys::PASSWORD, "secret").await.unwrap();
        let creds = s.credentials().await.unwrap().unwrap();
        assert_eq!(creds.username, "2051010001");
    }
}
