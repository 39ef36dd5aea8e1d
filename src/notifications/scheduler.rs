//! Per-event lead-time reminders.

use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::models::{seconds_until, NotificationRequest, ScheduleEvent};
use crate::platform::Notifier;
use crate::utils::logging::log_scheduling_failure;

/// Lead times used when none are configured.
pub const DEFAULT_LEAD_TIMES: [u32; 4] = [60, 30, 15, 0];

/// A reminder the planner decided to issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReminder {
    pub lead_minutes: u32,
    pub trigger: DateTime<Utc>,
    pub request: NotificationRequest,
}

/// Outcome of scheduling one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventScheduling {
    pub issued: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Plans one reminder per lead time whose trigger (`start - lead`) is strictly
/// after `now`. Passed lead times produce nothing.
pub fn plan_event_reminders(event: &ScheduleEvent, lead_times: &[u32], now: DateTime<Utc>) -> Vec<PlannedReminder> {
    lead_times
        .iter()
        .filter_map(|&lead| {
            let trigger = event.start_time - Duration::minutes(lead as i64);
            let offset = seconds_until(trigger, now)?;
            let (title, body) = super::messages::lead_time_message(event, lead);
            Some(PlannedReminder {
                lead_minutes: lead,
                trigger,
                request: NotificationRequest::scheduled(title, body, offset),
            })
        })
        .collect()
}

/// Issues the planned reminders one after another. A failed call is logged and
/// does not stop the remaining lead times.
pub async fn schedule_event(
    notifier: &dyn Notifier,
    event: &ScheduleEvent,
    lead_times: &[u32],
    now: DateTime<Utc>,
) -> EventScheduling {
    let planned = plan_event_reminders(event, lead_times, now);
    let mut outcome = EventScheduling {
        skipped: lead_times.len() - planned.len(),
        ..EventScheduling::default()
    };

    for reminder in planned {
        match notifier.schedule(reminder.request).await {
            Ok(_) => outcome.issued += 1,
            Err(e) => {
                outcome.failed += 1;
                log_scheduling_failure(&format!("{} -{}m", event.name, reminder.lead_minutes), &e);
            }
        }
    }

    debug!(
        "Scheduled {} reminders for '{}' ({} skipped, {} failed)",
        outcome.issued, event.name, outcome.skipped, outcome.failed
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Ho_Chi_Minh;

    fn local(h: u32, m: u32) -> DateTime<Utc> {
        Ho_Chi_Minh.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_all_lead_times_in_future() {
        let event = ScheduleEvent::class("CS101", "A101", local(8, 40));
        let planned = plan_event_reminders(&event, &DEFAULT_LEAD_TIMES, local(6, 0));

        let offsets: Vec<(u32, Option<u64>)> = planned
            .iter()
            .map(|p| (p.lead_minutes, p.request.trigger_seconds))
            .collect();
        assert_eq!(
            offsets,
            vec![(60, Some(6000)), (30, Some(7800)), (15, Some(8700)), (0, Some(9600))]
        );
        assert_eq!(planned[0].trigger, local(7, 40));
        assert_eq!(planned[1].trigger, local(8, 10));
    }

    #[test]
    fn test_passed_lead_times_are_skipped() {
        let event = ScheduleEvent::class("CS101", "A101", local(8, 40));
        // 08:10 exactly: the 30 minute trigger is not strictly in the future
        let planned = plan_event_reminders(&event, &DEFAULT_LEAD_TIMES, local(8, 10));
        let leads: Vec<u32> = planned.iter().map(|p| p.lead_minutes).collect();
        assert_eq!(leads, vec![15, 0]);
        assert!(planned.iter().all(|p| p.request.trigger_seconds.unwrap() > 0));
    }

    #[test]
    fn test_started_event_plans_nothing() {
        let event = ScheduleEvent::class("CS101", "A101", local(8, 40));
        assert!(plan_event_reminders(&event, &DEFAULT_LEAD_TIMES, local(8, 40)).is_empty());
    }

    #[test]
    fn test_offset_property_over_many_nows() {
        let start = local(12, 0);
        let event = ScheduleEvent::exam("Math", "P1", start, "9");
        for minutes_before in (0..180).step_by(7) {
            let now = start - Duration::minutes(minutes_before);
            for p in plan_event_reminders(&event, &DEFAULT_LEAD_TIMES, now) {
                let expected = (start - Duration::minutes(p.lead_minutes as i64) - now).num_seconds();
                assert!(expected > 0);
                assert_eq!(p.request.trigger_seconds, Some(expected as u64));
            }
            let issued = plan_event_reminders(&event, &DEFAULT_LEAD_TIMES, now).len();
            let expected_count = DEFAULT_LEAD_TIMES
                .iter()
                .filter(|&&l| start - Duration::minutes(l as i64) > now)
                .count();
            assert_eq!(issued, expected_count);
        }
    }
}
