use std::fmt;
use tracing::debug;

use crate::{
    error::{CleanupError, Result},
    people::Person,
};

/// Outcome of running a contact through the rule chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Keep(String),
    Delete,
}

impl Classification {
    pub fn is_keep(&self) -> bool {
        matches!(self, Classification::Keep(_))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Keep(reason) => write!(f, "Keep ({})", reason),
            Classification::Delete => write!(f, "Delete"),
        }
    }
}

/// A stateless test that, when it matches, protects a contact from deletion.
pub trait Rule: Send + Sync {
    /// Identifier used in configuration (`rules.order`).
    fn name(&self) -> &'static str;

    /// Reason recorded when this rule keeps a contact.
    fn reason(&self) -> &'static str;

    fn matches(&self, person: &Person) -> bool;
}

/// One of the contact's phone numbers is itself tagged with a group.
pub struct PhoneNumberHasLabel;

impl Rule for PhoneNumberHasLabel {
    fn name(&self) -> &'static str {
        "phone_number_has_label"
    }

    fn reason(&self) -> &'static str {
        "Phone number has a label"
    }

    fn matches(&self, person: &Person) -> bool {
        person
            .phone_numbers
            .iter()
            .any(|phone| phone.contact_group_membership.is_some())
    }
}

pub struct MultiplePhoneNumbers;

impl Rule for MultiplePhoneNumbers {
    fn name(&self) -> &'static str {
        "multiple_phone_numbers"
    }

    fn reason(&self) -> &'static str {
        "More than one phone number"
    }

    fn matches(&self, person: &Person) -> bool {
        person.phone_numbers.len() > 1
    }
}

pub struct MultipleLabels;

impl Rule for MultipleLabels {
    fn name(&self) -> &'static str {
        "multiple_labels"
    }

    fn reason(&self) -> &'static str {
        "More than one label"
    }

    fn matches(&self, person: &Person) -> bool {
        person.memberships.len() > 1
    }
}

/// Look up a built-in rule by its configuration name.
pub fn rule_by_name(name: &str) -> Option<Box<dyn Rule>> {
    match name {
        "phone_number_has_label" => Some(Box::new(PhoneNumberHasLabel)),
        "multiple_phone_numbers" => Some(Box::new(MultiplePhoneNumbers)),
        "multiple_labels" => Some(Box::new(MultipleLabels)),
        _ => None,
    }
}

/// Ordered list of rules. The first rule that matches keeps the contact;
/// a contact no rule matches is deleted.
pub struct RuleChain {
    rules: Vec<Box<dyn Rule>>,
}

impl Default for RuleChain {
    fn default() -> Self {
        Self::new(vec![
            Box::new(PhoneNumberHasLabel),
            Box::new(MultiplePhoneNumbers),
            Box::new(MultipleLabels),
        ])
    }
}

impl RuleChain {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Build a chain from rule names, in the given order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        let rules = names
            .iter()
            .map(|name| {
                rule_by_name(name.as_ref())
                    .ok_or_else(|| CleanupError::Config(format!("unknown rule: {}", name.as_ref())))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// Insert `rule` at `index`, shifting later rules down. `index` past the end appends.
    pub fn insert(&mut self, index: usize, rule: Box<dyn Rule>) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, rule);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    pub fn classify(&self, person: &Person) -> Classification {
        match self.rules.iter().find(|rule| rule.matches(person)) {
            Some(rule) => {
                debug!("{} kept by {}", person.resource_name, rule.name());
                Classification::Keep(rule.reason().to_string())
            }
            None => {
                debug!("{} matched no rule", person.resource_name);
                Classification::Delete
            }
        }
    }
}
