//! Name-derived default values
//!
//! When a placeholder has no value, a [`DefaultSynthesizer`] produces one from
//! the variable's name alone: `{provider_count}` becomes a plausible integer,
//! `{average_price}` a currency amount, `{city}` a locational phrase. Every
//! name maps to some class, so synthesis never leaves a placeholder behind.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use super::selector::stable_hash;
use crate::template::variables::humanize;

/// Semantic class of a variable, inferred from keywords in its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableClass {
    Price,
    Percent,
    Count,
    Year,
    Rating,
    Duration,
    Location,
    Person,
    Organization,
    Generic,
}

const PRICE_WORDS: &[&str] = &[
    "price", "cost", "fee", "income", "revenue", "salary", "budget", "rent", "spend", "payment",
    "prices", "costs", "fees", "earnings", "earning", "wage", "wages", "premium", "nightly",
];
const PERCENT_WORDS: &[&str] = &[
    "percent", "occupancy", "pct", "roi", "growth", "ratio", "rate", "margin",
];
const COUNT_WORDS: &[&str] = &[
    "count",
    "number",
    "num",
    "total",
    "quantity",
    "qty",
    "population",
    "listings",
    "reviews",
    "units",
    "size",
    "years",
];
const YEAR_WORDS: &[&str] = &["year", "founded", "established"];
const RATING_WORDS: &[&str] = &["rating", "score", "stars"];
const DURATION_WORDS: &[&str] = &[
    "duration", "time", "hour", "hours", "day", "days", "week", "weeks", "minutes", "wait",
];
/// A `rate` qualified by one of these is money per period, not a percentage
const TIME_UNIT_WORDS: &[&str] = &[
    "hourly", "daily", "nightly", "weekly", "monthly", "annual", "yearly",
];
const LOCATION_WORDS: &[&str] = &[
    "city",
    "location",
    "area",
    "region",
    "neighborhood",
    "state",
    "market",
    "town",
    "place",
    "address",
    "zip",
    "county",
];
const PERSON_WORDS: &[&str] = &[
    "host", "owner", "agent", "realtor", "broker", "landlord", "manager", "contact", "author",
    "person",
];
const ORGANIZATION_WORDS: &[&str] = &[
    "company", "brand", "provider", "providers", "business", "vendor", "agency", "contractor",
    "firm",
];

const LOCATION_PHRASES: &[&str] = &[
    "your area",
    "the local area",
    "nearby neighborhoods",
    "the surrounding region",
];
const ORGANIZATION_PHRASES: &[&str] = &[
    "local providers",
    "trusted local professionals",
    "established local companies",
    "well-reviewed specialists",
];

impl VariableClass {
    pub fn classify(name: &str) -> Self {
        let tokens = name_tokens(name);
        let has = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));

        if has(PRICE_WORDS) || (tokens.iter().any(|t| t == "rate") && has(TIME_UNIT_WORDS)) {
            VariableClass::Price
        } else if has(PERCENT_WORDS) {
            VariableClass::Percent
        } else if has(COUNT_WORDS) {
            VariableClass::Count
        } else if has(YEAR_WORDS) {
            VariableClass::Year
        } else if has(RATING_WORDS) {
            VariableClass::Rating
        } else if has(DURATION_WORDS) {
            VariableClass::Duration
        } else if has(PERSON_WORDS) {
            VariableClass::Person
        } else if has(LOCATION_WORDS) {
            VariableClass::Location
        } else if has(ORGANIZATION_WORDS) {
            VariableClass::Organization
        } else {
            VariableClass::Generic
        }
    }

    /// Render a value of this class. `pick(lo, hi)` returns a number in
    /// `lo..=hi`; deterministic and random synthesizers differ only there.
    pub fn render(&self, name: &str, pick: &mut dyn FnMut(u64, u64) -> u64) -> String {
        match self {
            VariableClass::Price => format!("${}", pick(85, 950)),
            VariableClass::Percent => format!("{}%", pick(55, 92)),
            VariableClass::Count => pick(12, 95).to_string(),
            VariableClass::Year => pick(2015, 2024).to_string(),
            VariableClass::Rating => format!("{:.1}", pick(38, 49) as f64 / 10.0),
            VariableClass::Duration => {
                let tokens = name_tokens(name);
                if tokens.iter().any(|t| t == "hour" || t == "hours" || t == "hourly") {
                    format!("{} hours", pick(4, 12))
                } else if tokens.iter().any(|t| t == "minutes") {
                    format!("{} minutes", pick(10, 45))
                } else {
                    format!("{} days", pick(2, 10))
                }
            }
            VariableClass::Location => {
                LOCATION_PHRASES[pick(0, LOCATION_PHRASES.len() as u64 - 1) as usize].to_string()
            }
            VariableClass::Person => {
                let role: Vec<String> = name_tokens(name)
                    .into_iter()
                    .filter(|t| t != "name")
                    .collect();
                format!("a local {}", role.join(" "))
            }
            VariableClass::Organization => ORGANIZATION_PHRASES
                [pick(0, ORGANIZATION_PHRASES.len() as u64 - 1) as usize]
                .to_string(),
            VariableClass::Generic => humanize(name),
        }
    }
}

/// Lowercase words of a variable name, split on separators and camelCase
/// boundaries: `averageNightly_rate` gives `average`, `nightly`, `rate`.
fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut after_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            after_lower = false;
            continue;
        }
        if c.is_uppercase() && after_lower && !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
        after_lower = c.is_lowercase() || c.is_numeric();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Produces a stand-in value for an unresolved variable
pub trait DefaultSynthesizer: Send + Sync {
    fn synthesize(&self, name: &str) -> String;
}

/// Same name, same value: the number is drawn from an MD5 of the name
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedDefaults;

impl DefaultSynthesizer for HashedDefaults {
    fn synthesize(&self, name: &str) -> String {
        let seed = stable_hash(name);
        VariableClass::classify(name).render(name, &mut |lo, hi| lo + seed % (hi - lo + 1))
    }
}

/// Draws numbers from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDefaults;

impl DefaultSynthesizer for RandomDefaults {
    fn synthesize(&self, name: &str) -> String {
        let mut rng = rand::rng();
        VariableClass::classify(name).render(name, &mut |lo, hi| rng.random_range(lo..=hi))
    }
}

/// Reproducible random defaults for tests and replayable runs
#[derive(Debug)]
pub struct SeededDefaults {
    rng: Mutex<StdRng>,
}

impl SeededDefaults {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl DefaultSynthesizer for SeededDefaults {
    fn synthesize(&self, name: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        VariableClass::classify(name).render(name, &mut |lo, hi| rng.random_range(lo..=hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(VariableClass::classify("average_price"), VariableClass::Price);
        assert_eq!(VariableClass::classify("nightly_rate"), VariableClass::Price);
        assert_eq!(VariableClass::classify("occupancy"), VariableClass::Percent);
        assert_eq!(VariableClass::classify("provider_count"), VariableClass::Count);
        assert_eq!(VariableClass::classify("years_in_business"), VariableClass::Count);
        assert_eq!(VariableClass::classify("founded_year"), VariableClass::Year);
        assert_eq!(VariableClass::classify("rating"), VariableClass::Rating);
        assert_eq!(VariableClass::classify("wait_time"), VariableClass::Duration);
        assert_eq!(VariableClass::classify("city"), VariableClass::Location);
        assert_eq!(VariableClass::classify("company"), VariableClass::Organization);
        assert_eq!(VariableClass::classify("favorite_color"), VariableClass::Generic);
    }

    #[test]
    fn test_classification_matches_whole_words() {
        assert_eq!(VariableClass::classify("hourly_rate"), VariableClass::Price);
        assert_eq!(VariableClass::classify("daily_rate"), VariableClass::Price);
        assert_eq!(VariableClass::classify("monthlyRate"), VariableClass::Price);
        assert_eq!(VariableClass::classify("occupancy_rate"), VariableClass::Percent);
        assert_eq!(VariableClass::classify("conversion_rate"), VariableClass::Percent);
        assert_eq!(VariableClass::classify("operating_hours"), VariableClass::Duration);
        assert_eq!(VariableClass::classify("host_name"), VariableClass::Person);
        assert_eq!(VariableClass::classify("real_estate_agent"), VariableClass::Person);
        assert_eq!(VariableClass::classify("estate"), VariableClass::Generic);
        assert_eq!(VariableClass::classify("company_name"), VariableClass::Organization);
    }

    #[test]
    fn test_word_classes_render_sensibly() {
        let synth = HashedDefaults;
        assert!(synth.synthesize("hourly_rate").starts_with('$'));
        assert!(synth.synthesize("operating_hours").ends_with(" hours"));
        assert_eq!(synth.synthesize("host_name"), "a local host");
        assert_eq!(synth.synthesize("real_estate_agent"), "a local real estate agent");
        assert_eq!(
            name_tokens("averageNightly_rate"),
            vec!["average", "nightly", "rate"]
        );
    }

    #[test]
    fn test_hashed_defaults_are_stable() {
        let synth = HashedDefaults;
        assert_eq!(synth.synthesize("provider_count"), synth.synthesize("provider_count"));
        assert_eq!(synth.synthesize("favorite_color"), "favorite color");
        assert!(synth.synthesize("average_price").starts_with('$'));
    }

    #[test]
    fn test_seeded_defaults_replay() {
        let a = SeededDefaults::new(7);
        let b = SeededDefaults::new(7);
        let names = ["price", "count", "rating", "city"];
        let first: Vec<_> = names.iter().map(|n| a.synthesize(n)).collect();
        let second: Vec<_> = names.iter().map(|n| b.synthesize(n)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_defaults_in_range() {
        let synth = RandomDefaults;
        for _ in 0..50 {
            let value: u64 = synth.synthesize("listing_count").parse().unwrap();
            assert!((12..=95).contains(&value));
        }
    }

    #[test]
    fn test_rendered_values_contain_no_placeholders() {
        let synth = HashedDefaults;
        for name in ["a", "city", "price", "x_y_z"] {
            let value = synth.synthesize(name);
            assert!(!value.contains('{') && !value.contains('['));
        }
    }
}
