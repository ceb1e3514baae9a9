// Template variable substitution for endpoint URLs and request bodies
//
// Supports {{name}} placeholders. The recognized variables are calendar
// dates resolved at substitution time:
//   {{today}}     -> YYYY-MM-DD of the current day
//   {{yesterday}} -> YYYY-MM-DD of the previous day
// Unrecognized placeholders are left untouched.

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::collections::HashMap;

pub struct TemplateSubstitutor {
    placeholder_regex: Regex,
}

impl TemplateSubstitutor {
    pub fn new() -> Self {
        // {{name}} with a lowercase identifier inside
        let placeholder_regex =
            Regex::new(r"\{\{([a-z_][a-z0-9_]*)\}\}").expect("placeholder regex is valid");
        Self { placeholder_regex }
    }

    /// Substitute recognized variables into a template, resolving dates
    /// against `now`.
    pub fn substitute(&self, template: &str, now: DateTime<Utc>) -> String {
        if template.is_empty() {
            return template.to_string();
        }

        let variables = Self::variables_at(now);
        self.placeholder_regex
            .replace_all(template, |caps: &regex::Captures<'_>| {
                let name = &caps[1];
                match variables.get(name) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    /// Extract all placeholder names from a template, in order of first use
    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        let mut variables = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for cap in self.placeholder_regex.captures_iter(template) {
            let name = cap[1].to_string();
            if seen.insert(name.clone()) {
                variables.push(name);
            }
        }

        variables
    }

    fn variables_at(now: DateTime<Utc>) -> HashMap<&'static str, String> {
        let mut variables = HashMap::new();
        variables.insert("today", now.format("%Y-%m-%d").to_string());
        variables.insert(
            "yesterday",
            (now - Duration::days(1)).format("%Y-%m-%d").to_string(),
        );
        variables
    }
}

impl Default for TemplateSubstitutor {
    fn default() -> Self {
        Self::new()
    }
}
