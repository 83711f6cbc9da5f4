//! Column type mapping from SQLite declarations to MySQL.
//!
//! The mapping is an ordered list of rewrite rules applied one after another
//! to the whole buffer. Several patterns overlap (`TEXT NOT NULL PRIMARY KEY`
//! vs `TEXT NOT NULL` vs `TEXT,`), so the order below is load-bearing.
//!
//! Patterns are case-sensitive and have no word boundaries: they match what
//! `sqlite3 .dump` emits for schemas declared in upper case.

use crate::profile::TargetProfile;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

/// One ordered (pattern, replacement) pair
pub struct RewriteRule {
    pattern: &'static Lazy<Regex>,
    /// `None` keeps matches verbatim
    replacement: Option<String>,
}

impl RewriteRule {
    pub fn replace(pattern: &'static Lazy<Regex>, replacement: impl Into<String>) -> Self {
        Self {
            pattern,
            replacement: Some(replacement.into()),
        }
    }

    /// A rule that claims its matches and leaves them unchanged
    pub fn keep(pattern: &'static Lazy<Regex>) -> Self {
        Self {
            pattern,
            replacement: None,
        }
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    /// Rewrite every match in `input`, returning the new text and the number
    /// of matches rewritten
    pub fn apply(&self, input: &str) -> (String, usize) {
        let Some(replacement) = &self.replacement else {
            return (input.to_string(), 0);
        };

        let count = self.pattern.find_iter(input).count();
        if count == 0 {
            return (input.to_string(), 0);
        }

        let result = self
            .pattern
            .replace_all(input, NoExpand(replacement.as_str()))
            .into_owned();
        (result, count)
    }
}

/// Apply `rules` in order, each over the whole buffer
pub fn apply_rules(input: &str, rules: &[RewriteRule]) -> (String, usize) {
    let mut result = input.to_string();
    let mut total = 0;
    for rule in rules {
        let (next, count) = rule.apply(&result);
        result = next;
        total += count;
    }
    (result, total)
}

/// Builds the SQLite → MySQL type rules for a target profile
pub struct TypeMapper;

impl TypeMapper {
    /// Column-name overrides, run before the general type table
    pub fn column_overrides(profile: &TargetProfile) -> Vec<RewriteRule> {
        vec![
            RewriteRule::replace(
                &RE_PHONE_TEXT,
                format!("`phone` VARCHAR({})", profile.phone_varchar_length),
            ),
            RewriteRule::replace(
                &RE_EMAIL_TEXT,
                format!("`email` VARCHAR({})", profile.email_varchar_length),
            ),
        ]
    }

    /// The general type table, in application order
    pub fn type_rules(profile: &TargetProfile) -> Vec<RewriteRule> {
        let varchar = format!("VARCHAR({})", profile.key_varchar_length);
        let datetime = format!("DATETIME({})", profile.datetime_precision);
        let decimal = format!(
            "DECIMAL({},{})",
            profile.decimal_precision, profile.decimal_scale
        );

        vec![
            // Keyed and required strings need a bounded length to be indexable
            RewriteRule::replace(&RE_TEXT_NOT_NULL_PK, format!("{varchar} NOT NULL PRIMARY KEY")),
            RewriteRule::replace(&RE_TEXT_PK, format!("{varchar} PRIMARY KEY")),
            RewriteRule::replace(&RE_TEXT_NOT_NULL, format!("{varchar} NOT NULL")),
            // Nullable free-text columns stay TEXT
            RewriteRule::keep(&RE_TEXT_COMMA),
            RewriteRule::keep(&RE_TEXT_PAREN),
            RewriteRule::replace(&RE_BOOLEAN_NOT_NULL, "TINYINT(1) NOT NULL"),
            RewriteRule::replace(&RE_BOOLEAN, "TINYINT(1)"),
            RewriteRule::replace(
                &RE_DATETIME_NOT_NULL_DEFAULT_NOW,
                format!(
                    "{datetime} NOT NULL DEFAULT CURRENT_TIMESTAMP({})",
                    profile.datetime_precision
                ),
            ),
            RewriteRule::replace(&RE_DATETIME_NOT_NULL, format!("{datetime} NOT NULL")),
            RewriteRule::replace(&RE_DATETIME_COMMA, format!("{datetime},")),
            RewriteRule::replace(&RE_DATETIME_PAREN, format!("{datetime})")),
            RewriteRule::replace(&RE_DECIMAL_NOT_NULL, format!("{decimal} NOT NULL")),
            RewriteRule::replace(&RE_DECIMAL_COMMA, format!("{decimal},")),
            RewriteRule::replace(&RE_DECIMAL_PAREN, format!("{decimal})")),
            RewriteRule::replace(&RE_INTEGER_PK_AUTOINCREMENT, "INT AUTO_INCREMENT PRIMARY KEY"),
            RewriteRule::replace(&RE_AUTOINCREMENT, "AUTO_INCREMENT"),
        ]
    }

    /// Overrides followed by the type table
    pub fn convert(stmt: &str, profile: &TargetProfile) -> (String, usize) {
        let (result, overridden) = apply_rules(stmt, &Self::column_overrides(profile));
        let (result, mapped) = apply_rules(&result, &Self::type_rules(profile));
        (result, overridden + mapped)
    }
}

// Pre-compiled regexes for type matching
static RE_PHONE_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"`phone` TEXT").unwrap());
static RE_EMAIL_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"`email` TEXT").unwrap());

static RE_TEXT_NOT_NULL_PK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"TEXT NOT NULL PRIMARY KEY").unwrap());
static RE_TEXT_PK: Lazy<Regex> = Lazy::new(|| Regex::new(r"TEXT PRIMARY KEY").unwrap());
static RE_TEXT_NOT_NULL: Lazy<Regex> = Lazy::new(|| Regex::new(r"TEXT NOT NULL").unwrap());
static RE_TEXT_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"TEXT,").unwrap());
static RE_TEXT_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"TEXT\)").unwrap());

static RE_BOOLEAN_NOT_NULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"BOOLEAN NOT NULL").unwrap());
static RE_BOOLEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"BOOLEAN").unwrap());

static RE_DATETIME_NOT_NULL_DEFAULT_NOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP").unwrap());
static RE_DATETIME_NOT_NULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DATETIME NOT NULL").unwrap());
static RE_DATETIME_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"DATETIME,").unwrap());
static RE_DATETIME_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"DATETIME\)").unwrap());

static RE_DECIMAL_NOT_NULL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"DECIMAL NOT NULL").unwrap());
static RE_DECIMAL_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"DECIMAL,").unwrap());
static RE_DECIMAL_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"DECIMAL\)").unwrap());

static RE_INTEGER_PK_AUTOINCREMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"INTEGER PRIMARY KEY AUTOINCREMENT").unwrap());
static RE_AUTOINCREMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"AUTOINCREMENT").unwrap());
