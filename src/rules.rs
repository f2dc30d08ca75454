//! Ordered tables of regular-expression substitutions.
//!
//! Both conversion directions (template markdown to editor HTML, note HTML to
//! exported Markdown) are a fixed list of rules applied one after another.
//! Each rule is a single global, non-recursive pass over the output of the
//! previous one, so a later rule may rewrite what an earlier rule produced.

use log::trace;
use regex::Regex;

/// One substitution step.
#[derive(Debug)]
pub struct Rule {
    /// Short label used in logs and tests
    pub name: &'static str,
    pub pattern: Regex,
    /// Replacement in `regex` syntax (`${1}` for the first group)
    pub replacement: &'static str,
}

impl Rule {
    /// Compiles a rule. Patterns are compile-time constants, so a failure
    /// here is a programming error.
    pub fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        }
    }

    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement)
            .into_owned()
    }
}

/// Runs every rule in order.
pub fn apply_rules(rules: &[Rule], input: &str) -> String {
    rules.iter().fold(input.to_string(), |text, rule| {
        trace!("Applying rule {}", rule.name);
        rule.apply(&text)
    })
}

/// Looks a rule up by name, for rule-by-rule tests.
pub fn find_rule<'a>(rules: &'a [Rule], name: &str) -> Option<&'a Rule> {
    rules.iter().find(|rule| rule.name == name)
}
