use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use std::collections::BTreeSet;

use crate::*;

/// Daily unlock rule: a new cookie appears at `unlock_hour` local time, once per calendar date.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnlockSchedule {
    unlock_hour: u32,
}

impl UnlockSchedule {
    pub const fn new_unchecked(unlock_hour: u32) -> Self {
        Self { unlock_hour }
    }

    pub fn new(unlock_hour: u32) -> Self {
        Self::new_unchecked(unlock_hour.min(23))
    }

    fn unlock_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(NaiveTime::default()) + TimeDelta::hours(i64::from(self.unlock_hour))
    }

    /// Whether `now` is past today's unlock time on a date other than `last_opened`.
    pub fn is_available(&self, last_opened: Option<NaiveDate>, now: NaiveDateTime) -> bool {
        if last_opened == Some(now.date()) {
            return false;
        }
        now.hour() >= self.unlock_hour
    }

    /// Tomorrow's unlock once today's unlock hour has been reached, today's otherwise.
    pub fn next_unlock(&self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date();
        if now.hour() >= self.unlock_hour {
            match today.succ_opt() {
                Some(tomorrow) => self.unlock_on(tomorrow),
                None => now,
            }
        } else {
            self.unlock_on(today)
        }
    }

    pub fn time_until_next(&self, now: NaiveDateTime) -> TimeDelta {
        (self.next_unlock(now) - now).max(TimeDelta::zero())
    }
}

impl Default for UnlockSchedule {
    fn default() -> Self {
        Rules::default().schedule()
    }
}

/// Owns the persisted record and decides whether a new cookie may be offered.
///
/// The in-memory [`SaveData`] is authoritative: a failed write is logged and the next
/// successful one carries the missed changes.
#[derive(Debug)]
pub struct DailyAvailabilityStore<S> {
    store: S,
    schedule: UnlockSchedule,
    data: SaveData,
}

impl<S: SaveStore> DailyAvailabilityStore<S> {
    /// Loads the saved document, starting fresh when it is absent or unreadable.
    pub fn open(store: S, schedule: UnlockSchedule) -> Self {
        let data = match store.load() {
            Ok(Some(data)) => data,
            Ok(None) => {
                log::info!("No save data found, starting fresh");
                SaveData::default()
            }
            Err(err) => {
                log::error!("Failed to load save data, starting fresh: {}", err);
                SaveData::default()
            }
        };
        Self::with_data(store, schedule, data)
    }

    /// Every fortune in the history counts as seen, even when the document forgot to say so.
    pub fn with_data(store: S, schedule: UnlockSchedule, mut data: SaveData) -> Self {
        let missing: Vec<String> = data
            .history
            .iter()
            .filter(|entry| !data.seen_message_ids.contains(&entry.message_id))
            .map(|entry| entry.message_id.clone())
            .collect();
        if !missing.is_empty() {
            log::warn!("Marking {} history fortunes as seen", missing.len());
            data.seen_message_ids.extend(missing);
        }
        Self {
            store,
            schedule,
            data,
        }
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.data.history
    }

    pub fn seen_message_ids(&self) -> &BTreeSet<String> {
        &self.data.seen_message_ids
    }

    pub fn has_seen_tutorial(&self) -> bool {
        self.data.has_seen_tutorial
    }

    pub fn sound_enabled(&self) -> bool {
        self.data.sound_enabled
    }

    pub fn haptics_enabled(&self) -> bool {
        self.data.haptics_enabled
    }

    pub fn has_opened_today(&self, now: NaiveDateTime) -> bool {
        self.data.last_opened_date == Some(now.date())
    }

    pub fn is_available(&self, now: NaiveDateTime) -> bool {
        self.schedule.is_available(self.data.last_opened_date, now)
    }

    pub fn next_unlock(&self, now: NaiveDateTime) -> NaiveDateTime {
        self.schedule.next_unlock(now)
    }

    pub fn time_until_next(&self, now: NaiveDateTime) -> TimeDelta {
        self.schedule.time_until_next(now)
    }

    /// Commits a reveal. Calling it twice on one day appends two entries, and the last call wins
    /// for `last_opened_date` and `last_message_id`.
    pub fn record_opened(&mut self, now: NaiveDateTime, message: &FortuneMessage) -> bool {
        let today = now.date();
        self.data.last_opened_date = Some(today);
        self.data.last_message_id = Some(message.id.clone());
        self.data.history.insert(
            0,
            HistoryEntry {
                date: today,
                message_id: message.id.clone(),
                message_text: message.text.clone(),
            },
        );
        self.data.seen_message_ids.insert(message.id.clone());
        log::info!("Recorded fortune {} for {}", message.id, today);
        self.save()
    }

    pub fn mark_tutorial_seen(&mut self) -> bool {
        self.data.has_seen_tutorial = true;
        self.save()
    }

    pub fn set_sound_enabled(&mut self, enabled: bool) -> bool {
        self.data.sound_enabled = enabled;
        self.save()
    }

    pub fn set_haptics_enabled(&mut self, enabled: bool) -> bool {
        self.data.haptics_enabled = enabled;
        self.save()
    }

    /// Writes the full document, returning whether it reached the store.
    pub fn save(&mut self) -> bool {
        if let Err(err) = self.store.save(&self.data) {
            log::error!("Failed to save data: {}", err);
            false
        } else {
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn message(id: &str) -> FortuneMessage {
        FortuneMessage::new(id, format!("fortune {id}"))
    }

    fn fresh() -> (MemoryStore, DailyAvailabilityStore<MemoryStore>) {
        let backing = MemoryStore::new();
        let store = DailyAvailabilityStore::open(backing.clone(), UnlockSchedule::default());
        (backing, store)
    }

    #[test]
    fn unset_date_unlocks_exactly_at_ten() {
        let (_, store) = fresh();

        let before = at(2024, 1, 1, 9, 59, 59);
        assert!(!store.is_available(before));
        assert_eq!(store.time_until_next(before), TimeDelta::seconds(1));

        assert!(store.is_available(at(2024, 1, 1, 10, 0, 0)));
    }

    #[test]
    fn same_date_as_last_open_is_never_available() {
        let (_, mut store) = fresh();
        store.record_opened(at(2024, 1, 1, 10, 30, 0), &message("1"));

        for hour in 0..24 {
            assert!(!store.is_available(at(2024, 1, 1, hour, 0, 0)), "hour {hour}");
        }
        assert!(!store.is_available(at(2024, 1, 2, 9, 59, 59)));
        assert!(store.is_available(at(2024, 1, 2, 10, 0, 0)));
        assert!(store.is_available(at(2024, 1, 2, 23, 59, 59)));
    }

    #[test]
    fn next_unlock_lands_on_the_correct_date() {
        let schedule = UnlockSchedule::default();
        let samples = [
            (at(2024, 1, 1, 0, 0, 0), at(2024, 1, 1, 10, 0, 0)),
            (at(2024, 1, 1, 10, 0, 0), at(2024, 1, 2, 10, 0, 0)),
            (at(2024, 2, 29, 23, 59, 59), at(2024, 3, 1, 10, 0, 0)),
            (at(2024, 12, 31, 12, 0, 0), at(2025, 1, 1, 10, 0, 0)),
        ];

        for (now, expected) in samples {
            let wait = schedule.time_until_next(now);
            assert!(wait >= TimeDelta::zero());
            assert_eq!(now + wait, expected);
        }
    }

    #[test]
    fn record_opened_prepends_history_and_marks_seen() {
        let (backing, mut store) = fresh();

        assert!(store.record_opened(at(2024, 1, 1, 11, 0, 0), &message("4")));
        assert!(store.record_opened(at(2024, 1, 2, 11, 0, 0), &message("9")));

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message_id, "9");
        assert_eq!(history[1].message_text, "fortune 4");
        assert!(store.seen_message_ids().contains("4"));
        assert_eq!(backing.snapshot().as_ref(), Some(store.data()));
    }

    #[test]
    fn double_record_on_one_day_appends_twice_and_keeps_last() {
        let (_, mut store) = fresh();
        let now = at(2024, 5, 5, 12, 0, 0);

        store.record_opened(now, &message("1"));
        store.record_opened(now, &message("2"));

        assert_eq!(store.history().len(), 2);
        assert_eq!(store.data().last_message_id.as_deref(), Some("2"));
        assert_eq!(store.data().last_opened_date, Some(now.date()));
        assert_eq!(store.seen_message_ids().len(), 2);
    }

    #[test]
    fn write_failure_keeps_memory_authoritative() {
        let (backing, mut store) = fresh();
        backing.set_fail_writes(true);

        assert!(!store.record_opened(at(2024, 1, 1, 12, 0, 0), &message("1")));
        assert_eq!(store.history().len(), 1);
        assert_eq!(backing.snapshot(), None);

        backing.set_fail_writes(false);
        assert!(store.set_sound_enabled(false));
        let persisted = backing.snapshot().unwrap();
        assert_eq!(persisted.history.len(), 1);
        assert!(!persisted.sound_enabled);
    }

    #[test]
    fn corrupt_document_falls_back_to_fresh_data() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFileStore::in_dir(dir.path());
        std::fs::write(file.path(), "garbage").unwrap();

        let store = DailyAvailabilityStore::open(file, UnlockSchedule::default());

        assert_eq!(store.data(), &SaveData::default());
    }

    #[test]
    fn loaded_history_counts_as_seen() {
        let mut backing = MemoryStore::new();
        let data = SaveData {
            history: vec![HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                message_id: "A".into(),
                message_text: "fortune A".into(),
            }],
            ..SaveData::default()
        };
        backing.save(&data).unwrap();

        let store = DailyAvailabilityStore::open(backing, UnlockSchedule::default());

        assert!(store.seen_message_ids().contains("A"));
    }

    #[test]
    fn preferences_persist_each_change() {
        let (backing, mut store) = fresh();

        store.mark_tutorial_seen();
        store.set_haptics_enabled(false);

        let persisted = backing.snapshot().unwrap();
        assert!(persisted.has_seen_tutorial);
        assert!(!persisted.haptics_enabled);
        assert!(persisted.sound_enabled);
        assert_eq!(backing.write_count(), 2);
    }
}
