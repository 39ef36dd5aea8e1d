//! Notification scheduling
//!
//! `NotificationService` is the entry point the app calls into: per-event
//! reminders for classes and exams, and the gated full pass that rebuilds every
//! pending reminder from the stored timetable, exam list and notes.

pub mod digest;
pub mod gate;
pub mod messages;
pub mod recording;
pub mod scheduler;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::calendar;
use crate::error::{AppError, AppResult};
use crate::models::{Note, NotificationRequest, ScheduleEvent, ScheduleReport, Settings};
use crate::platform::{Clock, KeyValueStore, Notifier, SystemClock};
use crate::storage::keys;
use crate::utils::logging::{log_schedule_pass, log_scheduling_failure};
use crate::utils::retry::{retry_with_exponential_backoff, RetryConfig};

pub use gate::ScheduleGate;
pub use recording::RecordingNotifier;
pub use scheduler::{EventScheduling, DEFAULT_LEAD_TIMES};

pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    settings: Settings,
    tz: Tz,
}

/// Everything a full pass needs, decoded before any platform call is made.
struct PassInput {
    classes: Vec<ScheduleEvent>,
    exams: Vec<ScheduleEvent>,
    notes: Vec<Note>,
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>, store: Arc<dyn KeyValueStore>, settings: Settings) -> AppResult<Self> {
        let tz = settings.tz()?;
        Ok(Self {
            notifier,
            store,
            clock: Arc::new(SystemClock),
            rng: Mutex::new(Box::new(StdRng::from_entropy())),
            settings,
            tz,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the random source used to pick filler messages.
    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lead_times(&self) -> &[u32] {
        if self.settings.lead_times_minutes.is_empty() {
            &DEFAULT_LEAD_TIMES
        } else {
            &self.settings.lead_times_minutes
        }
    }

    pub async fn schedule_class_notifications(
        &self,
        class_name: &str,
        start_time: DateTime<Utc>,
        room: &str,
    ) -> EventScheduling {
        let event = ScheduleEvent::class(class_name, room, start_time);
        scheduler::schedule_event(self.notifier.as_ref(), &event, self.lead_times(), self.now()).await
    }

    pub async fn schedule_exam_notifications(
        &self,
        exam_name: &str,
        start_time: DateTime<Utc>,
        room: &str,
        seat_number: &str,
    ) -> EventScheduling {
        let event = ScheduleEvent::exam(exam_name, room, start_time, seat_number);
        scheduler::schedule_event(self.notifier.as_ref(), &event, self.lead_times(), self.now()).await
    }

    pub async fn send_immediate(&self, title: &str, body: &str) -> AppResult<Option<String>> {
        self.notifier.schedule(NotificationRequest::immediate(title, body)).await
    }

    pub async fn schedule_in(&self, title: &str, body: &str, seconds_from_now: u64) -> AppResult<Option<String>> {
        self.notifier
            .schedule(NotificationRequest::scheduled(title, body, seconds_from_now))
            .await
    }

    /// Reopens the schedule gate so the next full pass runs again.
    pub async fn invalidate_schedule(&self) -> AppResult<()> {
        let gate = gate::invalidate(self.store.as_ref()).await?;
        debug!("Schedule gate reopened at dataset version {}", gate.dataset_version);
        Ok(())
    }

    async fn load_pass_input(&self) -> AppResult<Option<PassInput>> {
        let Some(raw_timetable) = self.store.get(keys::TIMETABLE).await? else {
            return Ok(None);
        };
        let weeks = calendar::decode_timetable(&raw_timetable)?;
        let classes = calendar::class_events(&weeks, self.tz)?;

        let exams = match self.store.get(keys::EXAMS).await? {
            Some(raw) => calendar::exam_events(&calendar::decode_exams(&raw)?, self.tz)?,
            None => Vec::new(),
        };

        let notes = match self.store.get(keys::NOTES).await? {
            Some(raw) => calendar::decode_array::<Note>(serde_json::from_str(&raw)?, "note list").unwrap_or_else(|e| {
                warn!("Skipping note reminders: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        Ok(Some(PassInput { classes, exams, notes }))
    }

    /// Full scheduling pass, gated on the dataset version.
    ///
    /// Returns immediately (no platform calls) when the current dataset has
    /// already been scheduled. Dataset problems surface before anything is
    /// cancelled or scheduled. Individual scheduling failures are logged and
    /// counted; the gate only closes once the pass has run to the end. With no
    /// timetable stored the pass only clears what is pending.
    pub async fn schedule_all_notifications(&self) -> AppResult<ScheduleReport> {
        let gate = ScheduleGate::load(self.store.as_ref()).await?;
        if gate.is_current() {
            info!("Notifications already scheduled for dataset version {}", gate.dataset_version);
            return Ok(ScheduleReport::skipped());
        }
        let pass_version = gate.dataset_version;

        let input = self.load_pass_input().await?;
        self.notifier.cancel_all().await?;
        let Some(input) = input else {
            info!("No timetable stored, nothing to schedule");
            return Ok(ScheduleReport::default());
        };

        let now = self.now();
        let mut report = ScheduleReport::default();

        let upcoming: Vec<ScheduleEvent> = input
            .classes
            .into_iter()
            .chain(input.exams)
            .filter(|event| !event.is_past(now))
            .collect();

        for event in &upcoming {
            if event.is_exam() {
                report.exam_events += 1;
            } else {
                report.class_events += 1;
            }
            let outcome = scheduler::schedule_event(self.notifier.as_ref(), event, self.lead_times(), now).await;
            report.event_requests += outcome.issued;
            report.failures += outcome.failed;
        }

        let digests = {
            let plan = digest::DigestPlan {
                horizon_days: self.settings.digest_horizon_days,
                digest_hour: self.settings.digest_hour,
                tz: self.tz,
            };
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| AppError::operation_failed("random source lock poisoned"))?;
            digest::plan_digests(&upcoming, now, plan, &mut **rng).unwrap_or_else(|e| {
                warn!("Skipping digests: {}", e);
                Vec::new()
            })
        };

        for entry in &digests {
            let Some(request) = digest::digest_request(entry, self.now()) else {
                continue;
            };
            match self.notifier.schedule(request).await {
                Ok(_) => report.digest_requests += 1,
                Err(e) => {
                    report.failures += 1;
                    log_scheduling_failure(&format!("digest {}", entry.date), &e);
                }
            }
        }

        for note in input.notes.iter().filter(|n| n.show_notification) {
            let Some(request) = note
                .remind_at()
                .and_then(|at| crate::models::seconds_until(at, now))
                .map(|secs| {
                    NotificationRequest::scheduled(
                        format!("{}{}", messages::NOTE_TITLE_PREFIX, note.title),
                        note.content.clone(),
                        secs,
                    )
                })
            else {
                continue;
            };
            match self.notifier.schedule(request).await {
                Ok(_) => report.note_requests += 1,
                Err(e) => {
                    report.failures += 1;
                    log_scheduling_failure(&format!("note '{}'", note.title), &e);
                }
            }
        }

        let gate = gate::record_scheduled(self.store.as_ref(), pass_version).await?;
        if !gate.is_current() {
            info!(
                "Dataset changed to version {} during the pass, gate stays open",
                gate.dataset_version
            );
        }
        log_schedule_pass(&report);

        if let Err(e) = self
            .send_immediate(messages::SCHEDULE_DONE_TITLE, messages::SCHEDULE_DONE_BODY)
            .await
        {
            log_scheduling_failure("pass confirmation", &e);
        }

        Ok(report)
    }

    /// Runs the full pass with bounded, exponentially backed-off retries.
    pub async fn schedule_all_with_retry(&self, retry: &RetryConfig) -> AppResult<ScheduleReport> {
        retry_with_exponential_backoff(retry, || self.schedule_all_notifications()).await
    }
}
