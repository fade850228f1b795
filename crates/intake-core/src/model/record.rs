use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::model::attachment::Attachment;
use crate::model::options::FormOptions;
use crate::model::state::FormState;

/// The canonical result of a commit.
///
/// Built once from a [`FormState`] and never changed afterwards. The
/// multi-choice flags become the labels of the selected options, in
/// declared order; the attachment handle is shared with the state it was
/// built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedRecord {
    first_name: String,
    last_name: String,
    tel: String,
    gender: String,
    checked_meals: Vec<String>,
    holidays: String,
    photo: Option<Arc<Attachment>>,
}

impl SubmittedRecord {
    /// Derive the record for `state` over the option lists it was built
    /// with.
    #[must_use]
    pub fn from_state(state: &FormState, options: &FormOptions) -> Self {
        let checked_meals = options
            .meals
            .labels()
            .iter()
            .zip(state.checked_meals().flags())
            .filter(|(_, &checked)| checked)
            .map(|(label, _)| label.clone())
            .collect();

        Self {
            first_name: state.first_name.clone(),
            last_name: state.last_name.clone(),
            tel: state.tel.clone(),
            gender: state.gender().to_string(),
            checked_meals,
            holidays: state.holidays().to_string(),
            photo: state.photo().cloned(),
        }
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    #[must_use]
    pub fn tel(&self) -> &str {
        &self.tel
    }

    #[must_use]
    pub fn gender(&self) -> &str {
        &self.gender
    }

    #[must_use]
    pub fn checked_meals(&self) -> &[String] {
        &self.checked_meals
    }

    #[must_use]
    pub fn holidays(&self) -> &str {
        &self.holidays
    }

    #[must_use]
    pub const fn photo(&self) -> Option<&Arc<Attachment>> {
        self.photo.as_ref()
    }

    /// The JSON blob written to the key-value store.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChoiceSet;
    use crate::store::FormStateStore;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_multi_choice_conversion_keeps_order() {
        let mut store = FormStateStore::new(FormOptions::default());
        store.toggle_option(2).unwrap();
        store.toggle_option(0).unwrap();

        let record = SubmittedRecord::from_state(&store.snapshot(), store.options());
        assert_eq!(record.checked_meals(), ["pizza", "borsch"]);
    }

    #[test]
    fn test_conversion_over_synthetic_options() {
        let options = FormOptions::new(
            ChoiceSet::new("Side", ["port", "starboard"]).unwrap(),
            ChoiceSet::new("Snacks", ["a", "b", "c", "d"]).unwrap(),
            ChoiceSet::new("Trip", ["north"]).unwrap(),
        );
        let mut store = FormStateStore::new(options);
        store.toggle_option(3).unwrap();
        store.toggle_option(1).unwrap();

        let record = SubmittedRecord::from_state(&store.snapshot(), store.options());
        assert_eq!(record.checked_meals(), ["b", "d"]);
        assert_eq!(record.gender(), "port");
        assert_eq!(record.holidays(), "north");
    }

    #[test]
    fn test_record_json_shape() {
        let mut store = FormStateStore::new(FormOptions::default());
        store.set_text(crate::TextField::FirstName, "Ann");
        store.set_text(crate::TextField::LastName, "Lee");
        store.set_text(crate::TextField::Tel, "5551234");
        store.toggle_option(0).unwrap();
        store.toggle_option(2).unwrap();

        let record = SubmittedRecord::from_state(&store.snapshot(), store.options());
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "firstName": "Ann",
                "lastName": "Lee",
                "tel": "5551234",
                "gender": "male",
                "checkedMeals": ["pizza", "borsch"],
                "holidays": "hiking",
                "photo": null
            })
        );
    }

    #[test]
    fn test_record_shares_attachment_handle() {
        let mut store = FormStateStore::new(FormOptions::default());
        let photo = Arc::new(Attachment::new("me.png", PathBuf::from("/tmp/me.png"), 10));
        store.set_attachment(Some(Arc::clone(&photo)));

        let record = SubmittedRecord::from_state(&store.snapshot(), store.options());
        assert!(Arc::ptr_eq(record.photo().unwrap(), &photo));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["photo"]["name"], "me.png");
    }
}
