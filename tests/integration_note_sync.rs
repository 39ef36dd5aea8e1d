use std::sync::Arc;

use chrono::{TimeZone, Utc};
use chrono_tz::Asia::Ho_Chi_Minh;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

use classchime::notifications::{messages, RecordingNotifier, ScheduleGate};
use classchime::platform::{FixedClock, KeyValueStore, RemoteDocument};
use classchime::remote::{MemoryDocumentStore, StaticConnectivity};
use classchime::storage::{keys, MemoryStore};
use classchime::sync::EncryptedBlob;
use classchime::{NoteSync, NoteSyncOutcome, NotificationService, Settings};

const USER: &str = "2051010001";
const LOCAL_KEY: &str = "k2-local-device-key";
const OTHER_KEY: &str = "k1-previous-install-key";

struct Harness {
    store: Arc<MemoryStore>,
    remote: Arc<MemoryDocumentStore>,
    connectivity: Arc<StaticConnectivity>,
    notifier: Arc<RecordingNotifier>,
    sync: NoteSync,
}

fn local_notes() -> Value {
    json!([{"title": "Ôn thi", "content": "Chương 3", "date": "2024-03-20T19:00:00+07:00", "showNotification": true}])
}

fn remote_notes() -> Value {
    json!([{"title": "Từ máy khác", "content": "", "date": "2024-03-21T07:00:00+07:00", "showNotification": false}])
}

fn harness(extra: &[(&str, &str)]) -> Harness {
    let notes = local_notes().to_string();
    let mut values: Vec<(String, String)> = vec![
        (keys::USERNAME.to_string(), USER.to_string()),
        (keys::ENCRYPTION_KEY.to_string(), LOCAL_KEY.to_string()),
        (keys::TIMETABLE.to_string(), "[]".to_string()),
        (keys::NOTES.to_string(), notes),
    ];
    values.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let store = Arc::new(MemoryStore::with_values(values));
    let remote = Arc::new(MemoryDocumentStore::new());
    let connectivity = Arc::new(StaticConnectivity::new(true));
    let notifier = Arc::new(RecordingNotifier::new());
    let now = Ho_Chi_Minh.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap().with_timezone(&Utc);
    let notifications = Arc::new(
        NotificationService::new(notifier.clone(), store.clone(), Settings::default())
            .unwrap()
            .with_clock(Arc::new(FixedClock::new(now)))
            .with_rng(StdRng::seed_from_u64(7)),
    );
    let sync = NoteSync::new(store.clone(), remote.clone(), connectivity.clone(), notifications);
    Harness {
        store,
        remote,
        connectivity,
        notifier,
        sync,
    }
}

fn sealed(value: &Value, key: &str) -> RemoteDocument {
    RemoteDocument {
        encrypted_data: EncryptedBlob::seal(value, key).unwrap().to_wire(),
    }
}

async fn remote_value(h: &Harness, key: &str) -> Value {
    let doc = h.remote.document(USER).await.unwrap();
    EncryptedBlob::parse(&doc.encrypted_data).unwrap().open(key).unwrap()
}

#[tokio::test]
async fn test_not_logged_in_does_nothing() {
    let h = harness(&[]);
    h.store.remove_keys(&[keys::USERNAME.to_string()]).await.unwrap();

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::NotLoggedIn);
    assert_eq!(h.remote.put_count(), 0);
    assert_eq!(h.notifier.schedule_calls(), 0);
}

#[tokio::test]
async fn test_offline_is_informational() {
    let h = harness(&[]);
    h.connectivity.set_online(false);

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::Offline);
    assert_eq!(h.remote.put_count(), 0);
    assert!(h.store.get(keys::SYNC_NOTES_STATUS).await.unwrap().is_none());
}

#[tokio::test]
async fn test_missing_remote_document_uploads_local() {
    let h = harness(&[]);

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::Uploaded);
    assert_eq!(remote_value(&h, LOCAL_KEY).await, local_notes());
    assert_eq!(h.store.get(keys::SYNC_NOTES_STATUS).await.unwrap().as_deref(), Some("true"));
    assert_eq!(h.store.get(keys::NOTIFICATIONS_SCHEDULED).await.unwrap().as_deref(), Some("true"));

    let requests = h.notifier.requests().await;
    assert!(requests.iter().any(|r| r.title == messages::SYNC_DONE_TITLE && r.is_immediate()));
}

#[tokio::test]
async fn test_unsynced_device_overwrites_remote() {
    let h = harness(&[]);
    h.remote.insert(USER, sealed(&remote_notes(), LOCAL_KEY)).await;

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::Uploaded);
    assert_eq!(remote_value(&h, LOCAL_KEY).await, local_notes());
    assert_eq!(h.store.get(keys::NOTES).await.unwrap().unwrap(), local_notes().to_string());
}

#[tokio::test]
async fn test_synced_device_takes_remote_changes() {
    let h = harness(&[(keys::SYNC_NOTES_STATUS, "true"), (keys::NOTIFICATIONS_SCHEDULED, "true")]);
    h.remote.insert(USER, sealed(&remote_notes(), LOCAL_KEY)).await;
    let version_before = ScheduleGate::load(h.store.as_ref()).await.unwrap().dataset_version;

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::Restored);

    let stored: Value = serde_json::from_str(&h.store.get(keys::NOTES).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored, remote_notes());
    assert_eq!(h.remote.put_count(), 0);

    let gate = ScheduleGate::load(h.store.as_ref()).await.unwrap();
    assert_eq!(gate.dataset_version, version_before + 1);
    assert!(gate.is_current());
    assert_eq!(h.notifier.cancel_calls(), 1);
}

#[tokio::test]
async fn test_in_sync_is_a_no_op() {
    let h = harness(&[(keys::SYNC_NOTES_STATUS, "true"), (keys::NOTIFICATIONS_SCHEDULED, "true")]);
    h.remote.insert(USER, sealed(&local_notes(), LOCAL_KEY)).await;

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::InSync);
    assert_eq!(h.notifier.schedule_calls(), 0);
    assert_eq!(h.notifier.cancel_calls(), 0);
}

#[tokio::test]
async fn test_in_sync_still_schedules_when_flag_missing() {
    let h = harness(&[(keys::SYNC_NOTES_STATUS, "true")]);
    h.remote.insert(USER, sealed(&local_notes(), LOCAL_KEY)).await;

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::InSync);
    assert_eq!(h.notifier.cancel_calls(), 1);
    assert_eq!(h.store.get(keys::NOTIFICATIONS_SCHEDULED).await.unwrap().as_deref(), Some("true"));
}

#[tokio::test]
async fn test_key_mismatch_leaves_everything_untouched() {
    for synced in ["true", "false"] {
        let h = harness(&[(keys::SYNC_NOTES_STATUS, synced)]);
        let foreign = sealed(&remote_notes(), OTHER_KEY);
        h.remote.insert(USER, foreign.clone()).await;
        let local_before = h.store.snapshot().await;

        let outcome = h.sync.sync_remote_notes().await.unwrap();
        assert_eq!(outcome, NoteSyncOutcome::KeyMismatch);

        assert_eq!(h.store.snapshot().await, local_before);
        assert_eq!(h.remote.document(USER).await, Some(foreign));
        assert_eq!(h.remote.put_count(), 0);
        assert_eq!(h.notifier.cancel_calls(), 0);

        let requests = h.notifier.requests().await;
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].title, messages::KEY_MISMATCH_TITLE);
        assert!(requests[0].is_immediate());
        assert_eq!(requests[1].title, messages::KEY_UPDATE_TITLE);
        assert_eq!(requests[1].trigger_seconds, Some(10));
    }
}

#[tokio::test]
async fn test_tampered_payload_is_a_key_mismatch() {
    let h = harness(&[(keys::SYNC_NOTES_STATUS, "true")]);
    let blob = EncryptedBlob::seal(&remote_notes(), LOCAL_KEY).unwrap();
    let tampered = EncryptedBlob {
        hash: blob.hash,
        payload: EncryptedBlob::seal(&local_notes(), LOCAL_KEY).unwrap().payload,
    };
    h.remote
        .insert(USER, RemoteDocument { encrypted_data: tampered.to_wire() })
        .await;

    assert_eq!(h.sync.sync_remote_notes().await.unwrap(), NoteSyncOutcome::KeyMismatch);
}
