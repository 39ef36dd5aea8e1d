// file: src/dataset.rs
//! Raw rows of the timetable and exam payloads, as returned by the school
//! portal and kept verbatim in local storage.
use serde::{Deserialize, Deserializer, Serialize};

/// One teaching week of the timetable payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekSchedule {
    /// Week start date, `dd/mm/yyyy`.
    pub start_date: String,
    #[serde(default)]
    pub data: Vec<ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Weekday code: `2`-`7` for Monday-Saturday, `8` for Sunday.
    #[serde(deserialize_with = "string_or_number")]
    pub thu: String,
    /// Period range, `"start --> end"`.
    pub tiet_hoc: String,
    pub lop_hoc_phan: String,
    #[serde(default)]
    pub dia_diem: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamEntry {
    /// Exam date, `dd/mm/yyyy`.
    pub ngay_thi: String,
    /// Slot description containing `(HH:MM-HH:MM)`.
    pub ca_thi: String,
    pub ten_hoc_phan: String,
    #[serde(default)]
    pub phong_thi: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub so_bao_danh: String,
}

/// A full refresh payload. Fields stay untyped until decoding so a non-array
/// payload is reported as a malformed dataset rather than a parse failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub thoikhoabieu: serde_json::Value,
    #[serde(default)]
    pub lichthi: serde_json::Value,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Null,
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Null => String::new(),
    })
}
