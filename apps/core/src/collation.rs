//! Locale-aware, case-insensitive ordering for file names.
//!
//! Names compare with the collation rules of the process locale
//! (`LC_ALL`, `LC_COLLATE`, then `LANG`) at secondary strength: base letters
//! first, then accents. Case alone never orders two names.

use std::cmp::Ordering;
use std::sync::OnceLock;

use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use icu_locale_core::{locale, Locale};

const LOCALE_ENV_VARS: [&str; 3] = ["LC_ALL", "LC_COLLATE", "LANG"];

pub struct Collation {
    locale: Locale,
    collator: CollatorBorrowed<'static>,
}

impl Collation {
    /// Falls back to the root collation when the locale has no data.
    pub fn for_locale(locale: &Locale) -> Self {
        match build_collator(locale) {
            Some(collator) => Self {
                locale: locale.clone(),
                collator,
            },
            None => {
                tracing::warn!(%locale, "no collation data for locale; using root order");
                let root = locale!("und");
                let collator =
                    build_collator(&root).expect("root collation data is compiled in");
                Self {
                    locale: root,
                    collator,
                }
            }
        }
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.collator.compare(a, b)
    }

    /// Stable sort by collated name; equal names keep their incoming order.
    pub fn sort_by_name<T>(&self, items: &mut [T], name: impl Fn(&T) -> &str) {
        items.sort_by(|a, b| self.collator.compare(name(a), name(b)));
    }
}

fn build_collator(locale: &Locale) -> Option<CollatorBorrowed<'static>> {
    let mut options = CollatorOptions::default();
    options.strength = Some(Strength::Secondary);
    Collator::try_new(locale.clone().into(), options).ok()
}

/// Collation for the process locale, built once.
pub fn process_collation() -> &'static Collation {
    static PROCESS: OnceLock<Collation> = OnceLock::new();
    PROCESS.get_or_init(|| {
        let collation = Collation::for_locale(&process_locale());
        tracing::debug!(locale = %collation.locale(), "collation locale selected");
        collation
    })
}

pub fn process_locale() -> Locale {
    LOCALE_ENV_VARS
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .and_then(|value| parse_posix_locale(&value))
        .unwrap_or(locale!("und"))
}

/// `da_DK.UTF-8@euro` style names to a BCP 47 locale. `C` and `POSIX` mean root.
pub fn parse_posix_locale(value: &str) -> Option<Locale> {
    let tag = value.split(['.', '@']).next()?.trim().replace('_', "-");
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    tag.parse::<Locale>().ok()
}

pub fn compare(a: &str, b: &str) -> Ordering {
    process_collation().compare(a, b)
}

pub fn sort_by_name<T>(items: &mut [T], name: impl Fn(&T) -> &str) {
    process_collation().sort_by_name(items, name);
}
