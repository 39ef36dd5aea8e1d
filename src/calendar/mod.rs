// Calendar module
// Decodes stored timetable/exam payloads into resolved schedule events.

use chrono_tz::Tz;
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::{ExamEntry, ScheduleEvent, WeekSchedule};

pub mod resolver;

/// Decodes a JSON array payload. A payload that is valid JSON but not an
/// array, or whose rows do not have the expected shape, is a malformed dataset.
pub fn decode_array<T: DeserializeOwned>(value: Value, what: &str) -> AppResult<Vec<T>> {
    if !value.is_array() {
        return Err(AppError::malformed_dataset(format!("{} is not an array", what)));
    }
    serde_json::from_value(value)
        .map_err(|e| AppError::malformed_dataset(format!("{} rows are invalid: {}", what, e)))
}

fn parse_payload(raw: &str, what: &str) -> AppResult<Value> {
    serde_json::from_str(raw).map_err(|e| AppError::malformed_dataset(format!("{} is not valid JSON: {}", what, e)))
}

pub fn decode_timetable(raw: &str) -> AppResult<Vec<WeekSchedule>> {
    decode_array(parse_payload(raw, "timetable")?, "timetable")
}

pub fn decode_exams(raw: &str) -> AppResult<Vec<ExamEntry>> {
    decode_array(parse_payload(raw, "exam list")?, "exam list")
}

/// Resolves every class row of every week.
pub fn class_events(weeks: &[WeekSchedule], tz: Tz) -> AppResult<Vec<ScheduleEvent>> {
    let mut events = Vec::new();
    for week in weeks {
        for (row, entry) in week.data.iter().enumerate() {
            let start = resolver::resolve_class_start(&week.start_date, &entry.thu, &entry.tiet_hoc, tz)?;
            events.push(
                ScheduleEvent::class(entry.lop_hoc_phan.clone(), entry.dia_diem.clone(), start)
                    .with_source(format!("week:{}#{}", week.start_date, row)),
            );
        }
    }
    debug!("Resolved {} class events from {} weeks", events.len(), weeks.len());
    Ok(events)
}

pub fn exam_events(exams: &[ExamEntry], tz: Tz) -> AppResult<Vec<ScheduleEvent>> {
    exams
        .iter()
        .enumerate()
        .map(|(row, exam)| {
            let start = resolver::resolve_exam_start(&exam.ngay_thi, &exam.ca_thi, tz)?;
            Ok(ScheduleEvent::exam(
                exam.ten_hoc_phan.clone(),
                exam.phong_thi.clone(),
                start,
                exam.so_bao_danh.clone(),
            )
            .with_source(format!("exam:{}#{}", exam.ngay_thi, row)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;
    use chrono_tz::Asia::Ho_Chi_Minh;

    const TIMETABLE: &str = r#"[
        {"start_date": "04/03/2024", "data": [
            {"thu": "2", "tiet_hoc": "1 --> 3", "lop_hoc_phan": "CS101", "dia_diem": "A101"},
            {"thu": "8", "tiet_hoc": "6 --> 8", "lop_hoc_phan": "MA201", "dia_diem": "B204"}
        ]},
        {"start_date": "11/03/2024", "data": []}
    ]"#;

    #[test]
    fn test_decode_timetable_and_resolve() {
        let weeks = decode_timetable(TIMETABLE).unwrap();
        assert_eq!(weeks.len(), 2);

        let events = class_events(&weeks, Ho_Chi_Minh).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].name, "CS101");
        assert_eq!(events[0].kind, EventKind::Class);
        assert_eq!(events[0].source_id, "week:04/03/2024#0");
        assert_eq!(events[1].date_key(Ho_Chi_Minh).to_string(), "2024-03-10");
    }

    #[test]
    fn test_non_array_timetable_is_malformed() {
        let err = decode_timetable(r#"{"start_date": "04/03/2024"}"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedDataset(_)));
        assert!(err.to_string().contains("not an array"));
    }

    #[test]
    fn test_exam_events() {
        let exams = decode_exams(
            r#"[{"ngay_thi": "15/03/2024", "ca_thi": "Ca 1 (07:00-09:00)", "ten_hoc_phan": "Math", "phong_thi": "P301", "so_bao_danh": "17"}]"#,
        )
        .unwrap();
        let events = exam_events(&exams, Ho_Chi_Minh).unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_exam());
        assert_eq!(events[0].seat_number.as_deref(), Some("17"));
    }

    #[test]
    fn test_bad_row_fails_whole_dataset() {
        let weeks = decode_timetable(
            r#"[{"start_date": "04/03/2024", "data": [{"thu": "2", "tiet_hoc": "99 --> 100", "lop_hoc_phan": "X"}]}]"#,
        )
        .unwrap();
        assert!(class_events(&weeks, Ho_Chi_Minh).is_err());
    }
}
