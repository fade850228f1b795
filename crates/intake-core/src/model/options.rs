use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named, ordered, non-empty list of option labels.
///
/// Used for the single-choice, multi-choice and enumerated-choice fields.
/// The first label is the default selection for exclusive choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawChoiceSet")]
pub struct ChoiceSet {
    name: String,
    labels: Vec<String>,
}

#[derive(Deserialize)]
struct RawChoiceSet {
    name: String,
    labels: Vec<String>,
}

impl TryFrom<RawChoiceSet> for ChoiceSet {
    type Error = Error;

    fn try_from(raw: RawChoiceSet) -> Result<Self> {
        Self::new(raw.name, raw.labels)
    }
}

impl ChoiceSet {
    /// Create a choice set.
    ///
    /// # Errors
    /// Returns [`Error::InvalidOptions`] if `labels` is empty or contains a
    /// duplicate label.
    pub fn new<I, S>(name: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();

        if labels.is_empty() {
            return Err(Error::InvalidOptions(format!("{name} has no options")));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(Error::InvalidOptions(format!(
                    "{name} lists {label:?} more than once"
                )));
            }
        }

        Ok(Self { name, labels })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The default selection (first label).
    #[must_use]
    pub fn first(&self) -> &str {
        &self.labels[0]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// The label following `label`, wrapping around. Unknown labels map to
    /// the first option.
    #[must_use]
    pub fn next_after(&self, label: &str) -> &str {
        let next = self.position(label).map_or(0, |i| (i + 1) % self.len());
        &self.labels[next]
    }

    /// The label preceding `label`, wrapping around. Unknown labels map to
    /// the first option.
    #[must_use]
    pub fn prev_before(&self, label: &str) -> &str {
        let prev = self
            .position(label)
            .map_or(0, |i| (i + self.len() - 1) % self.len());
        &self.labels[prev]
    }
}

/// The fixed option lists a form is built over.
///
/// Supplied once at construction and immutable afterwards. Lists missing
/// from a deserialized value fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    /// Single-choice options (`gender`).
    pub gender: ChoiceSet,
    /// Multi-choice options (`checkedMeals`).
    pub meals: ChoiceSet,
    /// Enumerated-choice options (`holidays`).
    pub holidays: ChoiceSet,
}

impl FormOptions {
    #[must_use]
    pub const fn new(gender: ChoiceSet, meals: ChoiceSet, holidays: ChoiceSet) -> Self {
        Self {
            gender,
            meals,
            holidays,
        }
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        let build = |name: &str, labels: &[&str]| ChoiceSet {
            name: name.to_string(),
            labels: labels.iter().map(ToString::to_string).collect(),
        };
        Self {
            gender: build("Gender", &["male", "female"]),
            meals: build("Favorite Meals", &["pizza", "pasta", "borsch"]),
            holidays: build(
                "Your Holiday Choice",
                &["hiking", "sunbathing on the beach", "city tours"],
            ),
        }
    }
}
