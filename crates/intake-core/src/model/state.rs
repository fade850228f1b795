use std::sync::Arc;

use crate::model::attachment::Attachment;
use crate::model::edit::FieldName;
use crate::model::options::FormOptions;

/// Selection flags for a multi-choice field, one per known option.
///
/// The flags are immutable once built: toggling yields a new value with a
/// new identity (see [`MultiChoice::ptr_eq`]) so a renderer can detect the
/// change by identity, while every untouched flag keeps its value.
#[derive(Debug, Clone)]
pub struct MultiChoice(Arc<[bool]>);

impl MultiChoice {
    /// All flags cleared.
    #[must_use]
    pub fn cleared(len: usize) -> Self {
        Self(vec![false; len].into())
    }

    /// A copy with the flag at `index` flipped, or `None` when out of range.
    #[must_use]
    pub fn toggled(&self, index: usize) -> Option<Self> {
        if index >= self.0.len() {
            return None;
        }
        let mut flags = self.0.to_vec();
        flags[index] = !flags[index];
        Some(Self(flags.into()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn is_selected(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn flags(&self) -> &[bool] {
        &self.0
    }

    /// Indices of the selected options, in option order.
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, &checked)| checked.then_some(i))
    }

    /// Whether both values share the same underlying flags.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MultiChoice {
    fn eq(&self, other: &Self) -> bool {
        self.0[..] == other.0[..]
    }
}

impl Eq for MultiChoice {}

/// The live values of every form field.
///
/// Text fields are plain strings. The exclusive choices and the meal flags
/// are only changed through [`crate::FormStateStore`], which keeps them
/// within their option sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub first_name: String,
    pub last_name: String,
    pub tel: String,
    gender: String,
    checked_meals: MultiChoice,
    photo: Option<Arc<Attachment>>,
    holidays: String,
}

impl FormState {
    /// The documented default snapshot for `options`.
    #[must_use]
    pub fn defaults(options: &FormOptions) -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            tel: String::new(),
            gender: options.gender.first().to_string(),
            checked_meals: MultiChoice::cleared(options.meals.len()),
            photo: None,
            holidays: options.holidays.first().to_string(),
        }
    }

    #[must_use]
    pub fn gender(&self) -> &str {
        &self.gender
    }

    #[must_use]
    pub const fn checked_meals(&self) -> &MultiChoice {
        &self.checked_meals
    }

    #[must_use]
    pub const fn photo(&self) -> Option<&Arc<Attachment>> {
        self.photo.as_ref()
    }

    #[must_use]
    pub fn holidays(&self) -> &str {
        &self.holidays
    }

    /// Required text fields that are still blank.
    ///
    /// The UI collaborator checks this before committing.
    #[must_use]
    pub fn missing_required(&self) -> Vec<FieldName> {
        [
            (FieldName::FirstName, &self.first_name),
            (FieldName::LastName, &self.last_name),
            (FieldName::Tel, &self.tel),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub(crate) fn set_gender(&mut self, value: String) {
        self.gender = value;
    }

    pub(crate) fn set_checked_meals(&mut self, flags: MultiChoice) {
        self.checked_meals = flags;
    }

    pub(crate) fn set_photo(&mut self, photo: Option<Arc<Attachment>>) {
        self.photo = photo;
    }

    pub(crate) fn set_holidays(&mut self, value: String) {
        self.holidays = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggled_creates_new_identity() {
        let flags = MultiChoice::cleared(3);
        let toggled = flags.toggled(1).unwrap();

        assert!(!flags.ptr_eq(&toggled));
        assert_eq!(toggled.flags(), [false, true, false]);
        assert_eq!(flags.flags(), [false, false, false]);
    }

    #[test]
    fn test_toggled_out_of_range() {
        let flags = MultiChoice::cleared(3);
        assert!(flags.toggled(3).is_none());
        assert!(!flags.is_selected(7));
    }

    #[test]
    fn test_selected_indices_in_order() {
        let flags = MultiChoice::cleared(4)
            .toggled(3)
            .and_then(|f| f.toggled(0))
            .unwrap();
        assert_eq!(flags.selected_indices().collect::<Vec<_>>(), [0, 3]);
    }

    #[test]
    fn test_defaults() {
        let state = FormState::defaults(&FormOptions::default());

        assert!(state.first_name.is_empty());
        assert!(state.last_name.is_empty());
        assert!(state.tel.is_empty());
        assert_eq!(state.gender(), "male");
        assert_eq!(state.checked_meals().flags(), [false, false, false]);
        assert!(state.photo().is_none());
        assert_eq!(state.holidays(), "hiking");
    }

    #[test]
    fn test_missing_required() {
        let mut state = FormState::defaults(&FormOptions::default());
        assert_eq!(
            state.missing_required(),
            [FieldName::FirstName, FieldName::LastName, FieldName::Tel]
        );

        state.first_name = "Ann".to_string();
        state.tel = "   ".to_string();
        assert_eq!(state.missing_required(), [FieldName::LastName, FieldName::Tel]);
    }
}
