use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    En,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Es];

    pub const fn code(self) -> &'static str {
        use Locale::*;
        match self {
            En => "en",
            Es => "es",
        }
    }

    /// Accepts an exact code or a tag starting with one, like `es-MX` or `es_ES.UTF-8`.
    pub fn from_code(code: &str) -> Option<Self> {
        let language = code
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Self::ALL.into_iter().find(|locale| locale.code() == language)
    }

    /// Picks the locale for a system language tag, English unless it is Spanish.
    pub fn detect(system_language: Option<&str>) -> Self {
        match system_language.and_then(Self::from_code) {
            Some(Self::Es) => Self::Es,
            _ => Self::En,
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::En
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

type Table = BTreeMap<String, String>;

/// Localized strings: locale code, then table name, then entry key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StringTables {
    locales: BTreeMap<String, BTreeMap<String, Table>>,
}

impl StringTables {
    const BUNDLED: &'static str = include_str!("../data/strings.toml");

    pub fn bundled() -> Result<Self> {
        Self::from_toml(Self::BUNDLED)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn entry(&self, locale: Locale, table: &str, key: &str) -> Option<&str> {
        self.locales
            .get(locale.code())?
            .get(table)?
            .get(key)
            .map(String::as_str)
    }
}

/// String lookup for one selected locale.
#[derive(Clone, Debug, PartialEq)]
pub struct Localizer {
    locale: Locale,
    tables: StringTables,
}

impl Localizer {
    pub const UI: &'static str = "UI";
    pub const MESSAGES: &'static str = "Messages";
    pub const FORTUNES: &'static str = "Fortunes";

    pub fn new(locale: Locale, tables: StringTables) -> Self {
        Self { locale, tables }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.locale != locale {
            log::debug!("Locale {} -> {}", self.locale, locale);
            self.locale = locale;
        }
    }

    /// The entry, or the key itself when the table has none.
    pub fn get(&self, table: &str, key: &str) -> String {
        match self.tables.entry(self.locale, table, key) {
            Some(text) => text.to_string(),
            None => {
                log::trace!("Missing {}/{} for {}", table, key, self.locale);
                key.to_string()
            }
        }
    }

    /// Looks up an entry and replaces its `{0}`, `{1}`, ... placeholders with `args`.
    pub fn format(&self, table: &str, key: &str, args: &[&dyn Display]) -> String {
        fill_placeholders(&self.get(table, key), args)
    }

    /// Localized text for a fortune, or its catalog text when no translation exists.
    pub fn fortune_text(&self, message: &FortuneMessage) -> String {
        self.tables
            .entry(self.locale, Self::FORTUNES, &message.localization_key())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| message.text.clone())
    }
}

/// Substituted text is never scanned again, so arguments may contain braces.
fn fill_placeholders(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let arg = tail
            .find('}')
            .and_then(|close| Some((tail[1..close].parse::<usize>().ok()?, close)))
            .and_then(|(index, close)| Some((args.get(index)?, close)));
        match arg {
            Some((arg, close)) => {
                out.push_str(&arg.to_string());
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
