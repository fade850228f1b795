//! A form session: one store, one pipeline and one renderer driven by
//! serialized user events.

use std::sync::Arc;

use intake_core::{FieldEdit, FormOptions, FormState, FormStateStore, KeyValueStore};
use tokio::sync::mpsc;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{PreviewApplied, PreviewDone, Published, SubmissionPipeline};
use crate::preview::PreviewFactory;

/// A discrete user event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Edit(FieldEdit),
    Commit,
    Clear,
}

/// Everything a renderer may show, read-only.
#[derive(Debug)]
pub struct FormView<'a> {
    /// Snapshot of the live form.
    pub live: FormState,
    pub options: &'a FormOptions,
    /// The last submitted record and its preview, if any.
    pub submitted: Option<&'a Published>,
    /// The most recent environmental warning (persistence or preview).
    pub warning: Option<&'a str>,
}

/// Turns form views into something visible.
pub trait Renderer {
    /// Show `view`. Called after every state change.
    ///
    /// # Errors
    /// Returns an error if the output surface fails.
    fn render(&mut self, view: &FormView<'_>) -> std::io::Result<()>;
}

/// A renderer for headless runs that only logs each view.
#[derive(Debug, Default)]
pub struct LogRenderer {
    renders: usize,
}

impl LogRenderer {
    #[must_use]
    pub const fn renders(&self) -> usize {
        self.renders
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, view: &FormView<'_>) -> std::io::Result<()> {
        self.renders += 1;
        log::debug!(
            "View #{}: submitted={} preview={}",
            self.renders,
            view.submitted.is_some(),
            view.submitted.and_then(Published::preview).is_some()
        );
        Ok(())
    }
}

/// Drives a [`FormStateStore`] and a [`SubmissionPipeline`] from
/// [`FormEvent`]s and re-renders after each change.
///
/// Events are handled one at a time. Preview derivations run on tokio
/// tasks; their results are applied by [`FormSession::poll_previews`] or
/// [`FormSession::settle`], in commit order. A derivation that finishes
/// after the session is dropped releases its own preview.
pub struct FormSession<S: KeyValueStore, P: PreviewFactory + 'static, R: Renderer> {
    form: FormStateStore,
    pipeline: SubmissionPipeline<S, P>,
    renderer: R,
    warning: Option<String>,
    done_tx: mpsc::UnboundedSender<PreviewDone>,
    done_rx: mpsc::UnboundedReceiver<PreviewDone>,
    in_flight: usize,
}

impl<S: KeyValueStore, P: PreviewFactory + 'static, R: Renderer> FormSession<S, P, R> {
    #[must_use]
    pub fn new(form: FormStateStore, pipeline: SubmissionPipeline<S, P>, renderer: R) -> Self {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            form,
            pipeline,
            renderer,
            warning: None,
            done_tx,
            done_rx,
            in_flight: 0,
        }
    }

    #[must_use]
    pub const fn form(&self) -> &FormStateStore {
        &self.form
    }

    #[must_use]
    pub const fn pipeline(&self) -> &SubmissionPipeline<S, P> {
        &self.pipeline
    }

    #[must_use]
    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer, for presentation-only state such
    /// as focus. Call [`FormSession::refresh`] afterwards.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    #[must_use]
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Record a warning raised by the UI itself and re-render.
    ///
    /// # Errors
    /// Returns [`PipelineError::Render`] if rendering fails.
    pub fn warn(&mut self, message: impl Into<String>) -> PipelineResult<()> {
        self.warning = Some(message.into());
        self.refresh()
    }

    /// Number of preview derivations whose results have not been applied.
    #[must_use]
    pub const fn pending_previews(&self) -> usize {
        self.in_flight
    }

    /// The view the renderer receives.
    #[must_use]
    pub fn view(&self) -> FormView<'_> {
        FormView {
            live: self.form.snapshot(),
            options: self.form.options(),
            submitted: self.pipeline.last_submitted(),
            warning: self.warning.as_deref(),
        }
    }

    /// Render the current view.
    ///
    /// # Errors
    /// Returns [`PipelineError::Render`] if rendering fails.
    pub fn refresh(&mut self) -> PipelineResult<()> {
        let view = FormView {
            live: self.form.snapshot(),
            options: self.form.options(),
            submitted: self.pipeline.last_submitted(),
            warning: self.warning.as_deref(),
        };
        self.renderer.render(&view).map_err(PipelineError::Render)
    }

    /// Handle one event, then render.
    ///
    /// Must be called within a tokio runtime: a commit with an attachment
    /// spawns its preview derivation.
    ///
    /// # Errors
    /// Returns [`PipelineError::Form`] for an invalid edit (unknown option
    /// or index), which leaves the form unchanged, or
    /// [`PipelineError::Render`] if rendering fails.
    pub fn handle(&mut self, event: FormEvent) -> PipelineResult<()> {
        match event {
            FormEvent::Edit(edit) => self.form.apply(edit)?,
            FormEvent::Commit => {
                let outcome = self
                    .pipeline
                    .begin_commit(self.form.state(), self.form.options());
                self.warning = outcome.persist_error.map(|e| e.to_string());
                if let Some(job) = outcome.preview_job {
                    let previews = Arc::clone(self.pipeline.previews());
                    let tx = self.done_tx.clone();
                    self.in_flight += 1;
                    tokio::spawn(async move {
                        let done = job.run(previews.as_ref()).await;
                        if let Err(mpsc::error::SendError(done)) = tx.send(done) {
                            log::debug!("Session closed before preview finished");
                            done.discard(previews.as_ref());
                        }
                    });
                }
            }
            FormEvent::Clear => {
                self.pipeline.clear(&mut self.form);
                self.warning = None;
            }
        }
        self.refresh()
    }

    /// Apply every preview result that has arrived, without waiting.
    /// Returns whether anything was applied.
    ///
    /// # Errors
    /// Returns [`PipelineError::Render`] if rendering fails.
    pub fn poll_previews(&mut self) -> PipelineResult<bool> {
        let mut applied = false;
        while let Ok(done) = self.done_rx.try_recv() {
            self.apply_preview(done);
            applied = true;
        }
        if applied {
            self.refresh()?;
        }
        Ok(applied)
    }

    /// Wait until every spawned preview derivation has been applied.
    ///
    /// # Errors
    /// Returns [`PipelineError::Render`] if rendering fails.
    pub async fn settle(&mut self) -> PipelineResult<()> {
        while self.in_flight > 0 {
            let Some(done) = self.done_rx.recv().await else {
                break;
            };
            self.apply_preview(done);
            self.refresh()?;
        }
        Ok(())
    }

    fn apply_preview(&mut self, done: PreviewDone) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if let PreviewApplied::Failed(e) = self.pipeline.finish_preview(done) {
            self.warning = Some(e.to_string());
        }
    }
}

impl<S: KeyValueStore, P: PreviewFactory + 'static, R: Renderer> Drop for FormSession<S, P, R> {
    fn drop(&mut self) {
        // Results still queued were never published; later sends fail and
        // are released by their task.
        self.done_rx.close();
        while let Ok(done) = self.done_rx.try_recv() {
            done.discard(self.pipeline.previews().as_ref());
        }
    }
}

impl<S: KeyValueStore, P: PreviewFactory + 'static, R: Renderer + std::fmt::Debug> std::fmt::Debug
    for FormSession<S, P, R>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormSession")
            .field("form", &self.form)
            .field("renderer", &self.renderer)
            .field("warning", &self.warning)
            .field("in_flight", &self.in_flight)
            .finish_non_exhaustive()
    }
}
