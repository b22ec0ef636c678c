use chrono::NaiveDateTime;

use crate::*;

/// Subject and body passed to a share sheet along with the screenshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareText {
    pub subject: String,
    pub body: String,
}

impl ShareText {
    pub fn compose(localizer: &Localizer, message_text: &str) -> Self {
        Self {
            subject: localizer.get(Localizer::MESSAGES, "share_subject"),
            body: localizer.format(Localizer::MESSAGES, "share_text", &[&message_text]),
        }
    }
}

/// File name for a screenshot taken at `now`.
pub fn screenshot_file_name(now: NaiveDateTime) -> String {
    format!("LuckyCharm_{}.png", now.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn composes_quoted_fortune() {
        let localizer = Localizer::new(Locale::En, StringTables::bundled().unwrap());
        let share = ShareText::compose(&localizer, "Bloom where you are planted.");

        assert_eq!(share.subject, "My Lucky Cookie Fortune");
        assert_eq!(
            share.body,
            "\"Bloom where you are planted.\"\n\nShared from LuckyCharm"
        );
    }

    #[test]
    fn screenshot_names_are_timestamped() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 3)
            .unwrap();
        assert_eq!(screenshot_file_name(now), "LuckyCharm_20240309_070503.png");
    }
}
