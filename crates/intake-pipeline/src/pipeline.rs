//! The submission pipeline: commit, persist, publish, clear.
//!
//! Commits are numbered. A preview derivation carries the number of the
//! commit that started it, and its result is only published while that
//! commit is still the latest event; otherwise the preview is released on
//! arrival. Results therefore apply in event order, never completion order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use intake_core::{Attachment, FormOptions, FormState, FormStateStore, KeyValueStore, SubmittedRecord};

use crate::error::{PipelineError, PipelineResult};
use crate::preview::{PreviewFactory, PreviewRef};

/// The key records are written under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "form";

/// The "last submitted" view.
#[derive(Debug, Clone)]
pub struct Published {
    record: Arc<SubmittedRecord>,
    preview: Option<PreviewRef>,
    generation: u64,
    submitted_at: DateTime<Utc>,
}

impl Published {
    #[must_use]
    pub fn record(&self) -> &SubmittedRecord {
        &self.record
    }

    #[must_use]
    pub const fn preview(&self) -> Option<&PreviewRef> {
        self.preview.as_ref()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

/// A preview derivation started by a commit.
#[derive(Debug)]
pub struct PreviewJob {
    generation: u64,
    attachment: Arc<Attachment>,
}

impl PreviewJob {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn attachment(&self) -> &Attachment {
        &self.attachment
    }

    /// Derive the preview. The result must be handed back to
    /// [`SubmissionPipeline::finish_preview`].
    pub async fn run<P: PreviewFactory + ?Sized>(self, factory: &P) -> PreviewDone {
        let result = factory.create_preview(&self.attachment).await;
        PreviewDone {
            generation: self.generation,
            attachment: self.attachment,
            result,
        }
    }
}

/// The result of a [`PreviewJob`].
#[derive(Debug)]
pub struct PreviewDone {
    generation: u64,
    attachment: Arc<Attachment>,
    result: PipelineResult<PreviewRef>,
}

impl PreviewDone {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Release the derived preview, if any, without publishing it. For
    /// results no pipeline will ever receive.
    pub fn discard<P: PreviewFactory + ?Sized>(self, factory: &P) {
        if let Ok(preview) = self.result {
            log::debug!(
                "Releasing orphaned preview {} of commit {}",
                preview.id(),
                self.generation
            );
            factory.release_preview(&preview);
        }
    }
}

/// What happened to a finished preview derivation.
#[derive(Debug)]
pub enum PreviewApplied {
    /// The preview is now part of the published view.
    Published,
    /// Derivation failed; the view shows the attachment name instead.
    Failed(PipelineError),
    /// A later commit or clear superseded the job; any preview it produced
    /// was released.
    Stale,
}

/// Result of starting a commit.
#[derive(Debug)]
pub struct CommitOutcome {
    pub record: Arc<SubmittedRecord>,
    /// Set when the record could not be persisted. The record is published
    /// regardless.
    pub persist_error: Option<PipelineError>,
    /// Present when the record has an attachment to preview.
    pub preview_job: Option<PreviewJob>,
}

/// Result of a commit run to completion.
#[derive(Debug)]
pub struct CommitReport {
    pub record: Arc<SubmittedRecord>,
    pub persist_error: Option<PipelineError>,
    pub preview: Option<PreviewRef>,
    pub preview_error: Option<PipelineError>,
}

/// Turns form snapshots into persisted, published records.
///
/// The pipeline owns the published preview: it releases it before
/// replacing or discarding it, and when the pipeline is dropped.
pub struct SubmissionPipeline<S: KeyValueStore, P: PreviewFactory> {
    store: S,
    previews: Arc<P>,
    key: String,
    generation: u64,
    published: Option<Published>,
}

impl<S: KeyValueStore, P: PreviewFactory> SubmissionPipeline<S, P> {
    #[must_use]
    pub fn new(store: S, previews: Arc<P>) -> Self {
        Self {
            store,
            previews,
            key: DEFAULT_STORAGE_KEY.to_string(),
            generation: 0,
            published: None,
        }
    }

    /// Write records under `key` instead of [`DEFAULT_STORAGE_KEY`].
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn previews(&self) -> &Arc<P> {
        &self.previews
    }

    /// Number of the latest commit or clear.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn last_submitted(&self) -> Option<&Published> {
        self.published.as_ref()
    }

    /// Build, persist and publish the record for `state`.
    ///
    /// The state is read, never consumed. Required text fields are not
    /// checked here; the caller gates the commit. If the record carries an
    /// attachment, the returned job derives its preview.
    pub fn begin_commit(&mut self, state: &FormState, options: &FormOptions) -> CommitOutcome {
        self.generation += 1;
        let record = Arc::new(SubmittedRecord::from_state(state, options));

        let persist_error = self.persist(&record).err();
        if let Some(e) = &persist_error {
            log::warn!("Commit {} not persisted: {e}", self.generation);
        }

        self.replace_published(Some(Published {
            record: Arc::clone(&record),
            preview: None,
            generation: self.generation,
            submitted_at: Utc::now(),
        }));
        log::info!(
            "Commit {} published ({} meals selected)",
            self.generation,
            record.checked_meals().len()
        );

        let preview_job = record.photo().map(|attachment| PreviewJob {
            generation: self.generation,
            attachment: Arc::clone(attachment),
        });

        CommitOutcome {
            record,
            persist_error,
            preview_job,
        }
    }

    /// Apply a finished preview derivation.
    ///
    /// Only the job of the latest commit can publish; results of older jobs
    /// are released and dropped.
    pub fn finish_preview(&mut self, done: PreviewDone) -> PreviewApplied {
        let current = self
            .published
            .as_mut()
            .filter(|p| p.generation == done.generation && p.preview.is_none());

        match (done.result, current) {
            (Ok(preview), Some(published)) => {
                log::debug!(
                    "Preview {} published for commit {}",
                    preview.id(),
                    done.generation
                );
                published.preview = Some(preview);
                PreviewApplied::Published
            }
            (Ok(preview), None) => {
                log::debug!(
                    "Discarding preview {} of superseded commit {}",
                    preview.id(),
                    done.generation
                );
                self.previews.release_preview(&preview);
                PreviewApplied::Stale
            }
            (Err(e), Some(_)) => {
                log::warn!(
                    "No preview for {}; showing name only: {e}",
                    done.attachment.name()
                );
                PreviewApplied::Failed(e)
            }
            (Err(_), None) => PreviewApplied::Stale,
        }
    }

    /// Commit and wait for the preview derivation, if any.
    pub async fn commit(&mut self, state: &FormState, options: &FormOptions) -> CommitReport {
        let CommitOutcome {
            record,
            persist_error,
            preview_job,
        } = self.begin_commit(state, options);

        let mut preview_error = None;
        if let Some(job) = preview_job {
            let done = job.run(self.previews.as_ref()).await;
            if let PreviewApplied::Failed(e) = self.finish_preview(done) {
                preview_error = Some(e);
            }
        }

        CommitReport {
            record,
            persist_error,
            preview: self.published.as_ref().and_then(|p| p.preview.clone()),
            preview_error,
        }
    }

    /// Discard the published view (releasing its preview) and reset the
    /// form to its defaults.
    pub fn clear(&mut self, form: &mut FormStateStore) {
        self.generation += 1;
        self.replace_published(None);
        form.reset();
        log::info!("Form cleared (generation {})", self.generation);
    }

    fn persist(&self, record: &SubmittedRecord) -> PipelineResult<()> {
        record
            .to_json()
            .and_then(|json| self.store.put(&self.key, &json))
            .map_err(|source| PipelineError::PersistenceWriteFailed {
                key: self.key.clone(),
                source,
            })
    }

    fn replace_published(&mut self, next: Option<Published>) {
        let previous = std::mem::replace(&mut self.published, next);
        if let Some(preview) = previous.and_then(|p| p.preview) {
            self.previews.release_preview(&preview);
        }
    }
}

impl<S: KeyValueStore, P: PreviewFactory> Drop for SubmissionPipeline<S, P> {
    fn drop(&mut self) {
        self.replace_published(None);
    }
}

impl<S: KeyValueStore + std::fmt::Debug, P: PreviewFactory> std::fmt::Debug
    for SubmissionPipeline<S, P>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionPipeline")
            .field("store", &self.store)
            .field("key", &self.key)
            .field("generation", &self.generation)
            .field("published", &self.published)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use intake_core::model::PreviewId;
    use intake_core::{MemoryStore, TextField};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts calls and records every release.
    #[derive(Debug, Default)]
    struct CountingPreviews {
        created: AtomicUsize,
        released: Mutex<Vec<PreviewId>>,
        fail: bool,
    }

    impl CountingPreviews {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }

        fn released(&self) -> Vec<PreviewId> {
            self.released.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PreviewFactory for CountingPreviews {
        async fn create_preview(&self, attachment: &Attachment) -> PipelineResult<PreviewRef> {
            self.created.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PipelineError::preview(attachment.name(), "unreadable"));
            }
            Ok(PreviewRef::new(
                attachment.id(),
                format!("preview://{}", attachment.name()),
            ))
        }

        fn release_preview(&self, preview: &PreviewRef) {
            self.released.lock().unwrap().push(preview.id());
        }
    }

    /// A store whose writes always fail.
    #[derive(Debug)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn put(&self, _key: &str, _value: &str) -> intake_core::Result<()> {
            Err(intake_core::Error::Io(std::io::Error::other("disk full")))
        }

        fn get(&self, _key: &str) -> intake_core::Result<Option<String>> {
            Ok(None)
        }
    }

    fn filled_form() -> FormStateStore {
        let mut form = FormStateStore::new(FormOptions::default());
        form.set_text(TextField::FirstName, "Ann");
        form.set_text(TextField::LastName, "Lee");
        form.set_text(TextField::Tel, "5551234");
        form
    }

    fn photo(name: &str) -> Arc<Attachment> {
        Arc::new(Attachment::new(name, PathBuf::from("/tmp").join(name), 42))
    }

    #[tokio::test]
    async fn test_commit_without_attachment_skips_preview() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let form = filled_form();

        let report = pipeline.commit(form.state(), form.options()).await;

        assert_eq!(previews.created(), 0);
        assert!(report.preview.is_none());
        assert!(report.persist_error.is_none());
        assert!(pipeline.last_submitted().unwrap().preview().is_none());
        assert_eq!(pipeline.last_submitted().unwrap().record().first_name(), "Ann");
    }

    #[tokio::test]
    async fn test_commit_persists_under_key() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline =
            SubmissionPipeline::new(MemoryStore::new(), previews).with_key("intake-form");
        let form = filled_form();

        pipeline.commit(form.state(), form.options()).await;

        let stored = pipeline.store().get("intake-form").unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(value["lastName"], "Lee");
        assert!(pipeline.store().get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_with_attachment_publishes_preview() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        let photo = photo("me.png");
        form.set_attachment(Some(Arc::clone(&photo)));

        let report = pipeline.commit(form.state(), form.options()).await;

        assert_eq!(previews.created(), 1);
        let preview = report.preview.unwrap();
        assert_eq!(preview.attachment(), photo.id());
        assert_eq!(
            pipeline.last_submitted().unwrap().preview(),
            Some(&preview)
        );
    }

    #[tokio::test]
    async fn test_failed_preview_keeps_record() {
        let previews = Arc::new(CountingPreviews::failing());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        let photo = photo("broken.png");
        form.set_attachment(Some(Arc::clone(&photo)));
        form.toggle_option(1).unwrap();

        let report = pipeline.commit(form.state(), form.options()).await;

        assert!(report.preview.is_none());
        assert!(report.preview_error.unwrap().is_environmental());
        let published = pipeline.last_submitted().unwrap();
        assert!(published.preview().is_none());
        assert!(Arc::ptr_eq(published.record().photo().unwrap(), &photo));
        assert_eq!(published.record().checked_meals(), ["pasta"]);
        assert_eq!(published.record().tel(), "5551234");
    }

    #[tokio::test]
    async fn test_consecutive_commits_release_first_preview_once() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        let first = pipeline.commit(form.state(), form.options()).await;
        let first_id = first.preview.unwrap().id();
        assert!(previews.released().is_empty());

        let second = pipeline.commit(form.state(), form.options()).await;
        let second_id = second.preview.unwrap().id();

        assert_eq!(previews.released(), [first_id]);
        assert_ne!(first_id, second_id);
        assert_eq!(previews.created(), 2);
    }

    #[tokio::test]
    async fn test_stale_preview_is_discarded_and_released() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("old.png")));

        let first_job = pipeline
            .begin_commit(form.state(), form.options())
            .preview_job
            .unwrap();

        form.set_attachment(Some(photo("new.png")));
        let second_job = pipeline
            .begin_commit(form.state(), form.options())
            .preview_job
            .unwrap();

        // The newer job completes first.
        let second_done = second_job.run(previews.as_ref()).await;
        assert!(matches!(
            pipeline.finish_preview(second_done),
            PreviewApplied::Published
        ));

        let first_done = first_job.run(previews.as_ref()).await;
        assert!(matches!(
            pipeline.finish_preview(first_done),
            PreviewApplied::Stale
        ));

        let published = pipeline.last_submitted().unwrap();
        assert_eq!(published.record().photo().unwrap().name(), "new.png");
        assert!(published.preview().unwrap().uri().ends_with("new.png"));
        assert_eq!(previews.released().len(), 1);
    }

    #[tokio::test]
    async fn test_discard_releases_derived_preview() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        let job = pipeline
            .begin_commit(form.state(), form.options())
            .preview_job
            .unwrap();
        let done = job.run(previews.as_ref()).await;
        done.discard(previews.as_ref());

        assert_eq!(previews.created(), 1);
        assert_eq!(previews.released().len(), 1);
        assert!(pipeline.last_submitted().unwrap().preview().is_none());
    }

    #[tokio::test]
    async fn test_discard_of_failed_derivation_releases_nothing() {
        let previews = Arc::new(CountingPreviews::failing());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        let job = pipeline
            .begin_commit(form.state(), form.options())
            .preview_job
            .unwrap();
        job.run(previews.as_ref()).await.discard(previews.as_ref());

        assert!(previews.released().is_empty());
    }

    #[tokio::test]
    async fn test_preview_after_clear_is_discarded() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        let job = pipeline
            .begin_commit(form.state(), form.options())
            .preview_job
            .unwrap();
        pipeline.clear(&mut form);

        let done = job.run(previews.as_ref()).await;
        assert!(matches!(pipeline.finish_preview(done), PreviewApplied::Stale));
        assert!(pipeline.last_submitted().is_none());
        assert_eq!(previews.released().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_releases_preview_and_resets_form() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        let report = pipeline.commit(form.state(), form.options()).await;
        let preview_id = report.preview.unwrap().id();

        pipeline.clear(&mut form);

        assert!(pipeline.last_submitted().is_none());
        assert_eq!(previews.released(), [preview_id]);
        assert_eq!(form.snapshot(), FormState::defaults(form.options()));
    }

    #[tokio::test]
    async fn test_persistence_failure_still_publishes() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(BrokenStore, previews);
        let form = filled_form();

        let report = pipeline.commit(form.state(), form.options()).await;

        let err = report.persist_error.unwrap();
        assert!(matches!(err, PipelineError::PersistenceWriteFailed { ref key, .. } if key == "form"));
        assert_eq!(pipeline.last_submitted().unwrap().record().last_name(), "Lee");
    }

    #[tokio::test]
    async fn test_commit_reads_state_without_consuming() {
        let previews = Arc::new(CountingPreviews::default());
        let mut pipeline = SubmissionPipeline::new(MemoryStore::new(), previews);
        let mut form = filled_form();
        form.toggle_option(0).unwrap();
        let before = form.snapshot();

        pipeline.commit(form.state(), form.options()).await;
        assert_eq!(form.snapshot(), before);
    }

    #[tokio::test]
    async fn test_drop_releases_published_preview() {
        let previews = Arc::new(CountingPreviews::default());
        let mut form = filled_form();
        form.set_attachment(Some(photo("me.png")));

        {
            let mut pipeline =
                SubmissionPipeline::new(MemoryStore::new(), Arc::clone(&previews));
            pipeline.commit(form.state(), form.options()).await;
            assert!(previews.released().is_empty());
        }

        assert_eq!(previews.released().len(), 1);
    }
}
