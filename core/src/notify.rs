use chrono::{NaiveDateTime, TimeDelta};

use crate::*;

/// A reminder to hand to the platform's notification service.
#[derive(Clone, Debug, PartialEq)]
pub struct Reminder {
    pub fire_at: NaiveDateTime,
    pub delay: TimeDelta,
    pub title: String,
    pub body: String,
}

#[derive(Copy, Clone, Debug)]
pub struct ReminderPlan;

impl ReminderPlan {
    /// Plans the next daily reminder, unless today's cookie was already opened.
    pub fn plan<S: SaveStore>(
        availability: &DailyAvailabilityStore<S>,
        now: NaiveDateTime,
        localizer: &Localizer,
    ) -> Option<Reminder> {
        if availability.has_opened_today(now) {
            log::debug!("Cookie already opened today, no reminder");
            return None;
        }
        let fire_at = availability.next_unlock(now);
        let reminder = Reminder {
            fire_at,
            delay: fire_at - now,
            title: localizer.get(Localizer::MESSAGES, "notification_title"),
            body: localizer.get(Localizer::MESSAGES, "notification_body"),
        };
        log::info!("Reminder planned for {}", reminder.fire_at);
        Some(reminder)
    }
}
