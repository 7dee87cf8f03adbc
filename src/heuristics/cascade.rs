// src/heuristics/cascade.rs

use regex::{Captures, Regex};
use tracing::warn;

/// Compile a built-in pattern. A pattern that fails to compile is logged and
/// dropped so extraction can never fail because of it.
pub(crate) fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "Dropping invalid extraction pattern");
            None
        }
    }
}

/// Turns one regex match into a field value. `None` means "not usable",
/// and the cascade moves on.
pub type Extractor<T> = fn(&Captures<'_>) -> Option<T>;

struct Rule<T> {
    pattern: Regex,
    extract: Extractor<T>,
}

/// Ordered rules for one field: most specific first, first usable match wins.
pub struct Cascade<T> {
    field: &'static str,
    rules: Vec<Rule<T>>,
}

impl<T> Cascade<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            rules: Vec::new(),
        }
    }

    pub fn rule(mut self, pattern: &str, extract: Extractor<T>) -> Self {
        if let Some(pattern) = compile(pattern) {
            self.rules.push(Rule { pattern, extract });
        } else {
            warn!(field = self.field, "Cascade rule skipped");
        }
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Try each rule in order against the whole text. Within a rule, matches
    /// are tried left to right until one yields a value.
    pub fn first_match(&self, text: &str) -> Option<T> {
        self.rules.iter().find_map(|rule| {
            rule.pattern
                .captures_iter(text)
                .find_map(|caps| (rule.extract)(&caps))
        })
    }
}
