//! The live, editable form.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Attachment, FieldEdit, FormOptions, FormState, TextField};

/// Single source of truth for the live form state.
///
/// Each operation changes exactly one field. Option lists are fixed at
/// construction, so the meal flags always have one entry per meal and the
/// exclusive choices always hold a listed label.
#[derive(Debug)]
pub struct FormStateStore {
    options: Arc<FormOptions>,
    state: FormState,
}

impl FormStateStore {
    #[must_use]
    pub fn new(options: FormOptions) -> Self {
        Self::with_shared_options(Arc::new(options))
    }

    #[must_use]
    pub fn with_shared_options(options: Arc<FormOptions>) -> Self {
        let state = FormState::defaults(&options);
        Self { options, state }
    }

    #[must_use]
    pub fn options(&self) -> &FormOptions {
        &self.options
    }

    #[must_use]
    pub fn shared_options(&self) -> Arc<FormOptions> {
        Arc::clone(&self.options)
    }

    /// Dispatch a tagged edit to the matching per-kind operation.
    ///
    /// # Errors
    /// Returns the error of the underlying operation.
    pub fn apply(&mut self, edit: FieldEdit) -> Result<()> {
        log::debug!("Applying edit to {}", edit.field());
        match edit {
            FieldEdit::Text(field, value) => {
                self.set_text(field, value);
                Ok(())
            }
            FieldEdit::SingleChoice(value) => self.select_single(&value),
            FieldEdit::ToggleMultiChoice(index) => self.toggle_option(index),
            FieldEdit::Attachment(attachment) => {
                self.set_attachment(attachment);
                Ok(())
            }
            FieldEdit::EnumeratedChoice(value) => self.select_enumerated(&value),
        }
    }

    /// Replace a text field.
    pub fn set_text(&mut self, field: TextField, value: impl Into<String>) {
        let value = value.into();
        match field {
            TextField::FirstName => self.state.first_name = value,
            TextField::LastName => self.state.last_name = value,
            TextField::Tel => self.state.tel = value,
        }
    }

    /// Select the single-choice (`gender`) option labelled `value`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownOption`] if `value` is not a listed option;
    /// the field is left unchanged.
    pub fn select_single(&mut self, value: &str) -> Result<()> {
        if !self.options.gender.contains(value) {
            return Err(Error::UnknownOption {
                field: "gender",
                value: value.to_string(),
            });
        }
        self.state.set_gender(value.to_string());
        Ok(())
    }

    /// Select the enumerated-choice (`holidays`) option labelled `value`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownOption`] if `value` is not a listed option;
    /// the field is left unchanged.
    pub fn select_enumerated(&mut self, value: &str) -> Result<()> {
        if !self.options.holidays.contains(value) {
            return Err(Error::UnknownOption {
                field: "holidays",
                value: value.to_string(),
            });
        }
        self.state.set_holidays(value.to_string());
        Ok(())
    }

    /// Flip the meal flag at `index`.
    ///
    /// The flags are replaced by a new value; all other positions keep
    /// their values.
    ///
    /// # Errors
    /// Returns [`Error::OptionOutOfRange`] if `index` is not below the
    /// number of meals.
    pub fn toggle_option(&mut self, index: usize) -> Result<()> {
        let flags = self
            .state
            .checked_meals()
            .toggled(index)
            .ok_or(Error::OptionOutOfRange {
                field: "checkedMeals",
                index,
                len: self.options.meals.len(),
            })?;
        self.state.set_checked_meals(flags);
        Ok(())
    }

    /// Replace the attachment; `None` clears it.
    pub fn set_attachment(&mut self, attachment: Option<Arc<Attachment>>) {
        match &attachment {
            Some(photo) => log::debug!("Attachment set to {}", photo.name()),
            None => log::debug!("Attachment cleared"),
        }
        self.state.set_photo(attachment);
    }

    /// A copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FormState {
        self.state.clone()
    }

    /// Borrow the current state without copying it.
    #[must_use]
    pub const fn state(&self) -> &FormState {
        &self.state
    }

    /// Replace the whole state with the defaults in one step.
    pub fn reset(&mut self) {
        self.state = FormState::defaults(&self.options);
    }
}
