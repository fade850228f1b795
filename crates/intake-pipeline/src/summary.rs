//! Read-only summary of a published submission.

use std::fmt;

use intake_core::SubmittedRecord;

use crate::pipeline::Published;
use crate::preview::PreviewRef;

/// One labelled line of the submitted-data summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub label: &'static str,
    pub value: String,
}

impl fmt::Display for SummaryLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.value)
    }
}

/// Lines describing a published submission, in display order.
#[must_use]
pub fn summary_lines(published: &Published) -> Vec<SummaryLine> {
    record_lines(published.record(), published.preview())
}

/// Lines describing `record`, in display order.
///
/// Names are shown uppercased. The photo line shows the preview URI, or
/// only the attachment's name without a preview, and is empty when
/// nothing was attached.
#[must_use]
pub fn record_lines(record: &SubmittedRecord, preview: Option<&PreviewRef>) -> Vec<SummaryLine> {
    let line = |label, value: String| SummaryLine { label, value };

    let photo = record.photo().map_or_else(String::new, |photo| {
        preview.map_or_else(|| photo.name().to_string(), |p| p.uri().to_string())
    });

    vec![
        line("First Name", record.first_name().to_uppercase()),
        line("Last Name", record.last_name().to_uppercase()),
        line("Phone Number", record.tel().to_string()),
        line("Gender", record.gender().to_string()),
        line("Favorite Meals", record.checked_meals().join(", ")),
        line("Holiday Choice", record.holidays().to_string()),
        line("Photo", photo),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SubmissionPipeline;
    use crate::preview::PreviewCache;
    use intake_core::{Attachment, FormOptions, FormStateStore, MemoryStore, TextField};
    use std::path::PathBuf;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_summary_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = Arc::new(PreviewCache::new(dir.path().to_path_buf()));
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), cache);
        let mut form = FormStateStore::new(FormOptions::default());
        form.set_text(TextField::FirstName, "Ann");
        form.set_text(TextField::LastName, "Lee");
        form.set_text(TextField::Tel, "5551234");
        form.toggle_option(0).unwrap();
        form.toggle_option(2).unwrap();

        pipeline.commit(form.state(), form.options()).await;
        let lines = summary_lines(pipeline.last_submitted().unwrap());
        let rendered: Vec<String> = lines.iter().map(ToString::to_string).collect();

        assert_eq!(
            rendered,
            [
                "First Name: ANN",
                "Last Name: LEE",
                "Phone Number: 5551234",
                "Gender: male",
                "Favorite Meals: pizza, borsch",
                "Holiday Choice: hiking",
                "Photo: ",
            ]
        );
    }

    #[tokio::test]
    async fn test_photo_falls_back_to_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = Arc::new(PreviewCache::new(dir.path().to_path_buf()));
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), cache);
        let mut form = FormStateStore::new(FormOptions::default());
        form.set_attachment(Some(Arc::new(Attachment::new(
            "missing.png",
            PathBuf::from("/no/such/dir/missing.png"),
            12,
        ))));

        let report = pipeline.commit(form.state(), form.options()).await;
        assert!(report.preview_error.is_some());

        let lines = summary_lines(pipeline.last_submitted().unwrap());
        assert_eq!(lines.last().unwrap().to_string(), "Photo: missing.png");
    }

    #[test]
    fn test_record_lines_without_preview_show_name() {
        let mut form = FormStateStore::new(FormOptions::default());
        form.set_attachment(Some(Arc::new(Attachment::new(
            "me.png",
            PathBuf::from("/tmp/me.png"),
            3,
        ))));
        let record = SubmittedRecord::from_state(form.state(), form.options());
        let preview = PreviewRef::new(record.photo().unwrap().id(), "file:///cache/x.png");

        assert_eq!(
            record_lines(&record, Some(&preview)).last().unwrap().value,
            "file:///cache/x.png"
        );
        assert_eq!(
            record_lines(&record, None).last().unwrap().value,
            "me.png"
        );
    }
}
