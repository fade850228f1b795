use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use intake_core::{Attachment, ChoiceSet, FieldEdit, FormStateStore, TextField};
use intake_pipeline::{
    record_lines, Config, FormEvent, FormSession, LogRenderer, PreviewCache, Published,
    SubmissionPipeline,
};

use super::open_store;

#[derive(Debug, clap::Args)]
pub struct SubmitArgs {
    /// First name (required)
    #[arg(long)]
    first_name: String,

    /// Last name (required)
    #[arg(long)]
    last_name: String,

    /// Phone number (required)
    #[arg(long)]
    tel: String,

    /// Gender (default: first configured option)
    #[arg(long)]
    gender: Option<String>,

    /// A favorite meal; repeat for several
    #[arg(long = "meal")]
    meals: Vec<String>,

    /// Holiday choice (default: first configured option)
    #[arg(long)]
    holiday: Option<String>,

    /// Photo to attach
    #[arg(long)]
    photo: Option<PathBuf>,
}

fn check_option(set: &ChoiceSet, value: &str) -> Result<()> {
    if set.contains(value) {
        Ok(())
    } else {
        anyhow::bail!(
            "Unknown {} option: {value}\n\nValid options: {}",
            set.name(),
            set.labels().join(", ")
        )
    }
}

/// Translate the command-line arguments into form edits, in field order.
fn edits_for(args: SubmitArgs, form: &FormStateStore) -> Result<Vec<FieldEdit>> {
    let options = form.options();
    let mut edits = vec![
        FieldEdit::Text(TextField::FirstName, args.first_name),
        FieldEdit::Text(TextField::LastName, args.last_name),
        FieldEdit::Text(TextField::Tel, args.tel),
    ];

    if let Some(gender) = args.gender {
        check_option(&options.gender, &gender)?;
        edits.push(FieldEdit::SingleChoice(gender));
    }

    if let Some(path) = args.photo {
        let attachment = Attachment::from_path(&path)
            .with_context(|| format!("Cannot attach {}", path.display()))?;
        edits.push(FieldEdit::Attachment(Some(Arc::new(attachment))));
    }

    let mut selected = BTreeSet::new();
    for meal in &args.meals {
        check_option(&options.meals, meal)?;
        if let Some(index) = options.meals.position(meal) {
            selected.insert(index);
        }
    }
    edits.extend(selected.into_iter().map(FieldEdit::ToggleMultiChoice));

    if let Some(holiday) = args.holiday {
        check_option(&options.holidays, &holiday)?;
        edits.push(FieldEdit::EnumeratedChoice(holiday));
    }

    Ok(edits)
}

/// Summary lines for the terminal. Previews are removed when the session
/// drops, so the photo line names the attachment.
fn printed_summary(published: &Published) -> Vec<String> {
    record_lines(published.record(), None)
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Fill the form from arguments, commit it, and print the summary.
pub async fn run_submit(config: &Config, args: SubmitArgs) -> Result<()> {
    let form = FormStateStore::new(config.options.clone());
    let edits = edits_for(args, &form)?;

    let store = open_store(config)?;
    let previews = Arc::new(PreviewCache::new(config.preview_dir.clone()));
    let pipeline = SubmissionPipeline::new(store, previews).with_key(config.storage_key.clone());
    let mut session = FormSession::new(form, pipeline, LogRenderer::default());

    for edit in edits {
        session.handle(FormEvent::Edit(edit))?;
    }

    let missing = session.form().state().missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.as_str()).collect();
        anyhow::bail!("Required fields are blank: {}", names.join(", "));
    }

    session.handle(FormEvent::Commit)?;
    session.settle().await?;

    let view = session.view();
    if let Some(published) = view.submitted {
        println!("Your Submitted Data:");
        for line in printed_summary(published) {
            println!("  {line}");
        }
    }
    if let Some(warning) = view.warning {
        eprintln!("\n⚠ {warning}");
    } else {
        println!("\n✓ Stored under '{}'", config.storage_key);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::FormOptions;

    fn args(meals: &[&str]) -> SubmitArgs {
        SubmitArgs {
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
            tel: "5551234".to_string(),
            gender: None,
            meals: meals.iter().map(ToString::to_string).collect(),
            holiday: None,
            photo: None,
        }
    }

    #[test]
    fn test_repeated_meals_toggle_once_in_order() {
        let form = FormStateStore::new(FormOptions::default());
        let edits = edits_for(args(&["borsch", "pizza", "borsch"]), &form).unwrap();

        let toggles: Vec<&FieldEdit> = edits
            .iter()
            .filter(|e| matches!(e, FieldEdit::ToggleMultiChoice(_)))
            .collect();
        assert_eq!(
            toggles,
            [
                &FieldEdit::ToggleMultiChoice(0),
                &FieldEdit::ToggleMultiChoice(2)
            ]
        );
    }

    #[tokio::test]
    async fn test_printed_summary_names_photo() {
        let dir = tempfile::TempDir::new().unwrap();
        let photo_path = dir.path().join("me.png");
        std::fs::write(&photo_path, b"png bytes").unwrap();

        let previews = Arc::new(PreviewCache::new(dir.path().join("previews")));
        let mut pipeline =
            SubmissionPipeline::new(intake_core::MemoryStore::new(), Arc::clone(&previews));
        let mut form = FormStateStore::new(FormOptions::default());
        form.set_attachment(Some(Arc::new(Attachment::from_path(&photo_path).unwrap())));

        let report = pipeline.commit(form.state(), form.options()).await;
        assert!(report.preview.is_some());

        let lines = printed_summary(pipeline.last_submitted().unwrap());
        assert_eq!(lines.last().unwrap(), "Photo: me.png");
    }

    #[test]
    fn test_unknown_meal_is_rejected() {
        let form = FormStateStore::new(FormOptions::default());
        let err = edits_for(args(&["sushi"]), &form).unwrap_err();
        assert!(err.to_string().contains("Valid options: pizza, pasta, borsch"));
    }
}
