use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Snapshot of the fortune shown on a given day. Later catalog edits never alter it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub message_id: String,
    pub message_text: String,
}

/// Everything persisted per install, stored as one document.
///
/// `history` only ever grows, newest entry first, and every id in it is also in
/// `seen_message_ids`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveData {
    #[serde(rename = "lastCookieDate", with = "optional_date_format")]
    pub last_opened_date: Option<NaiveDate>,
    #[serde(with = "optional_string_format")]
    pub last_message_id: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub seen_message_ids: BTreeSet<String>,
    pub has_seen_tutorial: bool,
    pub sound_enabled: bool,
    pub haptics_enabled: bool,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            last_opened_date: None,
            last_message_id: None,
            history: Vec::new(),
            seen_message_ids: BTreeSet::new(),
            has_seen_tutorial: false,
            sound_enabled: true,
            haptics_enabled: true,
        }
    }
}

impl SaveData {
    pub fn latest_entry(&self) -> Option<&HistoryEntry> {
        self.history.first()
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";

mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(DATE_FORMAT))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let text = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(D::Error::custom)
    }
}

/// Unset dates are written as `""`; both `""` and `null` read back as unset.
mod optional_date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            None => serializer.serialize_str(""),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.is_empty() => NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(Some)
                .map_err(D::Error::custom),
            _ => Ok(None),
        }
    }
}

mod optional_string_format {
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(""))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.filter(|text| !text.is_empty()))
    }
}
