use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::Error;
use crate::model::attachment::Attachment;

/// Every field of the form, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    FirstName,
    LastName,
    Tel,
    Gender,
    Photo,
    CheckedMeals,
    Holidays,
}

impl FieldName {
    pub const ALL: [Self; 7] = [
        Self::FirstName,
        Self::LastName,
        Self::Tel,
        Self::Gender,
        Self::Photo,
        Self::CheckedMeals,
        Self::Holidays,
    ];

    /// The field's key in a persisted record.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstName => "firstName",
            Self::LastName => "lastName",
            Self::Tel => "tel",
            Self::Gender => "gender",
            Self::Photo => "photo",
            Self::CheckedMeals => "checkedMeals",
            Self::Holidays => "holidays",
        }
    }

    /// The text selector for this field, if it is a text field.
    #[must_use]
    pub const fn as_text(self) -> Option<TextField> {
        match self {
            Self::FirstName => Some(TextField::FirstName),
            Self::LastName => Some(TextField::LastName),
            Self::Tel => Some(TextField::Tel),
            _ => None,
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::InvalidSelector(s.to_string()))
    }
}

/// Selector for the free-text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    FirstName,
    LastName,
    /// Phone number.
    Tel,
}

impl From<TextField> for FieldName {
    fn from(field: TextField) -> Self {
        match field {
            TextField::FirstName => Self::FirstName,
            TextField::LastName => Self::LastName,
            TextField::Tel => Self::Tel,
        }
    }
}

/// One user edit, tagged by the kind of field it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    /// Replace a text field.
    Text(TextField, String),
    /// Select a single-choice option (`gender`) by label.
    SingleChoice(String),
    /// Flip one multi-choice option (`checkedMeals`) by position.
    ToggleMultiChoice(usize),
    /// Replace or clear the attachment (`photo`).
    Attachment(Option<Arc<Attachment>>),
    /// Select an enumerated-choice option (`holidays`) by label.
    EnumeratedChoice(String),
}

impl FieldEdit {
    /// Build a value edit from a field name, as received from a form input
    /// keyed by name.
    ///
    /// # Errors
    /// Returns [`Error::InvalidSelector`] if `name` is unknown or names a
    /// field that is not set by value (`checkedMeals`, `photo`).
    pub fn set(name: &str, value: impl Into<String>) -> Result<Self, Error> {
        let field: FieldName = name.parse()?;
        let value = value.into();
        match field {
            FieldName::Gender => Ok(Self::SingleChoice(value)),
            FieldName::Holidays => Ok(Self::EnumeratedChoice(value)),
            _ => field
                .as_text()
                .map(|text| Self::Text(text, value))
                .ok_or_else(|| Error::InvalidSelector(name.to_string())),
        }
    }

    /// The field this edit targets.
    #[must_use]
    pub fn field(&self) -> FieldName {
        match self {
            Self::Text(field, _) => (*field).into(),
            Self::SingleChoice(_) => FieldName::Gender,
            Self::ToggleMultiChoice(_) => FieldName::CheckedMeals,
            Self::Attachment(_) => FieldName::Photo,
            Self::EnumeratedChoice(_) => FieldName::Holidays,
        }
    }
}
