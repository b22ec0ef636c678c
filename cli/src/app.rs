use anyhow::{Context, bail};
use chrono::NaiveDateTime;
use lucky_charm_core::*;
use std::fmt::Write;
use std::path::PathBuf;

use crate::config::Settings;

/// Command-line overrides, each taking precedence over the settings file.
#[derive(Debug, Default)]
pub(crate) struct Options {
    pub config: Option<PathBuf>,
    pub save: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub locale: Option<String>,
    pub now: Option<NaiveDateTime>,
}

/// Cells in the countdown fill bar.
const CLOCK_WIDTH: usize = 24;

pub(crate) struct App<S> {
    machine: GameStateMachine<S, Box<dyn Clock>>,
    localizer: Localizer,
}

impl App<JsonFileStore> {
    /// Wires clock, save file, catalog and strings together from settings and overrides.
    pub fn build(options: Options) -> anyhow::Result<Self> {
        let data_dir = Settings::data_dir();
        let settings = match &options.config {
            Some(path) => Settings::load(path, true)?,
            None => Settings::load(&data_dir.join(Settings::FILE_NAME), false)?,
        };

        let save_path = options
            .save
            .or(settings.save_path)
            .unwrap_or_else(|| data_dir.join(JsonFileStore::FILE_NAME));
        log::debug!("Save document at {}", save_path.display());

        let catalog = match options.catalog.or(settings.catalog_path) {
            Some(path) => MessageCatalog::from_path(&path)
                .with_context(|| format!("Could not load catalog {}", path.display()))?,
            None => MessageCatalog::bundled()?,
        };

        let locale = match options.locale.or(settings.locale) {
            Some(code) => Locale::from_code(&code).unwrap_or_else(|| {
                log::warn!("Unknown locale {:?}, using {}", code, Locale::default());
                Locale::default()
            }),
            None => Locale::detect(std::env::var("LANG").ok().as_deref()),
        };
        let localizer = Localizer::new(locale, StringTables::bundled()?);

        let clock: Box<dyn Clock> = match options.now {
            Some(now) => Box::new(ManualClock::new(now)),
            None => Box::new(SystemClock),
        };

        let rules = settings.rules;
        let availability =
            DailyAvailabilityStore::open(JsonFileStore::new(save_path), rules.schedule());
        let machine = GameStateMachine::new(catalog, availability, clock, rules, rand::random());
        Ok(Self::new(machine, localizer))
    }
}

impl<S: SaveStore> App<S> {
    pub fn new(mut machine: GameStateMachine<S, Box<dyn Clock>>, localizer: Localizer) -> Self {
        machine.on_state_changed(|change| log::info!("{:?} -> {:?}", change.from, change.to));
        Self { machine, localizer }
    }

    fn now(&self) -> NaiveDateTime {
        self.machine.clock().now()
    }

    fn countdown(&self, out: &mut String) -> anyhow::Result<()> {
        let countdown = Countdown::new(self.machine.time_until_next());
        writeln!(out, "{}", countdown.overlay_text(&self.localizer))?;
        let filled = (countdown.fill_fraction() * CLOCK_WIDTH as f64).round() as usize;
        writeln!(
            out,
            "[{}{}] {}",
            "#".repeat(filled),
            ".".repeat(CLOCK_WIDTH - filled),
            countdown.clock_text()
        )?;
        Ok(())
    }

    pub fn status(&mut self) -> anyhow::Result<String> {
        let mut out = String::new();
        match self.machine.check_availability()? {
            GameState::Waiting => self.countdown(&mut out)?,
            _ => writeln!(out, "{}", self.localizer.get(Localizer::UI, "tap_cookie"))?,
        }
        Ok(out)
    }

    /// Plays a whole cycle: taps, crack, unroll, reveal.
    pub fn crack(&mut self) -> anyhow::Result<String> {
        let mut out = String::new();
        if self.machine.check_availability()? == GameState::Waiting {
            self.countdown(&mut out)?;
            return Ok(out);
        }

        writeln!(out, "{}", self.localizer.get(Localizer::UI, "tap_cookie"))?;
        loop {
            match self.machine.tap_cookie() {
                TapOutcome::Counted(taps) => {
                    writeln!(out, "  tap {}/{}", taps, self.machine.taps_required())?
                }
                TapOutcome::Cracked => break,
                TapOutcome::Ignored => bail!("Cookie cannot be tapped while {:?}", self.machine.state()),
            }
        }

        let availability = self.machine.availability();
        if availability.sound_enabled() {
            writeln!(out, "  *crack*")?;
        }
        if availability.haptics_enabled() {
            writeln!(out, "  *bzz*")?;
        }

        self.machine.on_crack_animation_complete();
        let first_time = !self.machine.availability().has_seen_tutorial();
        if first_time {
            writeln!(out, "{}", self.localizer.get(Localizer::UI, "swipe_to_unroll"))?;
        }

        if !self.machine.on_message_fully_unrolled().has_update() {
            bail!("Fortune could not be unrolled while {:?}", self.machine.state());
        }
        if let Some(message) = self.machine.current_message() {
            writeln!(out, "\n  \"{}\"\n", self.localizer.fortune_text(message))?;
        }
        if first_time {
            self.machine.availability_mut().mark_tutorial_seen();
        }
        Ok(out)
    }

    pub fn history(&self) -> anyhow::Result<String> {
        let mut out = String::new();
        writeln!(out, "{}", self.localizer.get(Localizer::UI, "history_title"))?;
        for entry in self.machine.availability().history() {
            writeln!(out, "{}  {}", entry.date, entry.message_text)?;
        }
        Ok(out)
    }

    pub fn settings(
        &mut self,
        sound: Option<bool>,
        haptics: Option<bool>,
        tutorial_seen: bool,
    ) -> anyhow::Result<String> {
        let availability = self.machine.availability_mut();
        if let Some(enabled) = sound {
            availability.set_sound_enabled(enabled);
        }
        if let Some(enabled) = haptics {
            availability.set_haptics_enabled(enabled);
        }
        if tutorial_seen {
            availability.mark_tutorial_seen();
        }

        let on_off = |enabled: bool| if enabled { "on" } else { "off" };
        let availability = self.machine.availability();
        let mut out = String::new();
        writeln!(out, "{}", self.localizer.get(Localizer::UI, "settings_title"))?;
        writeln!(
            out,
            "{}: {}",
            self.localizer.get(Localizer::UI, "language_label"),
            self.localizer.locale()
        )?;
        writeln!(out, "sound: {}", on_off(availability.sound_enabled()))?;
        writeln!(out, "haptics: {}", on_off(availability.haptics_enabled()))?;
        writeln!(out, "tutorial seen: {}", availability.has_seen_tutorial())?;
        Ok(out)
    }

    pub fn remind(&self) -> anyhow::Result<String> {
        let mut out = String::new();
        match ReminderPlan::plan(self.machine.availability(), self.now(), &self.localizer) {
            Some(reminder) => {
                writeln!(out, "{}", reminder.title)?;
                writeln!(out, "{}", reminder.body)?;
                writeln!(
                    out,
                    "{} ({})",
                    reminder.fire_at.format("%Y-%m-%d %H:%M"),
                    Countdown::new(reminder.delay).clock_text()
                )?;
            }
            None => writeln!(out, "Today's cookie is already open, no reminder needed.")?,
        }
        Ok(out)
    }

    pub fn share(&self) -> anyhow::Result<String> {
        let Some(entry) = self.machine.availability().data().latest_entry() else {
            bail!("No fortune to share yet");
        };
        let share = ShareText::compose(&self.localizer, &entry.message_text);
        let mut out = String::new();
        writeln!(out, "{}", share.subject)?;
        writeln!(out, "{}", share.body)?;
        writeln!(out, "{}", screenshot_file_name(self.now()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    fn launch(now: NaiveDateTime, backing: &MemoryStore, locale: Locale) -> App<MemoryStore> {
        let catalog = MessageCatalog::new(vec![FortuneMessage::new("18", "Fortune favors the bold.")]);
        let availability = DailyAvailabilityStore::open(backing.clone(), UnlockSchedule::default());
        let clock: Box<dyn Clock> = Box::new(ManualClock::new(now));
        let machine = GameStateMachine::new(catalog, availability, clock, Rules::default(), 5);
        App::new(machine, Localizer::new(locale, StringTables::bundled().unwrap()))
    }

    #[test]
    fn status_shows_countdown_before_unlock() {
        let mut app = launch(at(1, 9, 59), &MemoryStore::new(), Locale::En);
        assert_eq!(app.status().unwrap(), "Next cookie in\n1m 0s\n[########################] 01:00\n");
    }

    #[test]
    fn crack_reveals_localized_fortune_and_saves() {
        let backing = MemoryStore::new();
        let mut app = launch(at(1, 10, 0), &backing, Locale::Es);

        let out = app.crack().unwrap();

        assert!(out.starts_with("¡Toca la galleta!\n  tap 1/5\n"));
        assert!(out.contains("Desliza para desenrollar"));
        assert!(out.contains("\"La fortuna favorece a los audaces.\""));
        let saved = backing.snapshot().unwrap();
        assert_eq!(saved.history.len(), 1);
        assert!(saved.has_seen_tutorial);

        // second run the same day only shows the countdown
        let mut again = launch(at(1, 11, 0), &backing, Locale::En);
        assert_eq!(again.crack().unwrap(), "Next cookie in\n23h 0m\n[#.......................] 23:00:00\n");
    }

    #[test]
    fn crack_omits_muted_cues() {
        let backing = MemoryStore::new();
        let mut app = launch(at(2, 12, 0), &backing, Locale::En);
        app.settings(Some(false), Some(false), true).unwrap();

        let out = app.crack().unwrap();

        assert!(!out.contains("*crack*"));
        assert!(!out.contains("*bzz*"));
        assert!(!out.contains("Swipe to unroll"));
    }

    #[test]
    fn history_remind_and_share_follow_the_record() {
        let backing = MemoryStore::new();
        let mut app = launch(at(3, 10, 30), &backing, Locale::En);

        assert!(app.share().is_err());
        assert!(app.remind().unwrap().starts_with("Your Lucky Cookie is Ready!\n"));

        app.crack().unwrap();

        assert_eq!(
            app.history().unwrap(),
            "History\n2024-01-03  Fortune favors the bold.\n"
        );
        assert!(app.remind().unwrap().contains("no reminder needed"));
        assert_eq!(
            app.share().unwrap(),
            "My Lucky Cookie Fortune\n\"Fortune favors the bold.\"\n\nShared from LuckyCharm\nLuckyCharm_20240103_103000.png\n"
        );
    }
}
