//! Headless form controller.
//!
//! [`FormController::spawn`] starts an actor task that owns a [`FormMachine`].
//! Events arrive over a channel, effects run as spawned tasks, and every
//! accepted transition is published on a `watch` channel as a
//! [`FormSnapshot`]. Completion of an effect is just another event posted
//! back to the actor, so the machine itself never awaits anything.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::machine::{Effect, FormEvent, FormMachine, FormState, Step, DEFAULT_REDIRECT_DELAY};
use crate::report::{LoadedReport, ReportFormContext, ReportStatus};
use crate::submit::{SubmissionMetadata, SubmitPipeline, UploadReceipt};

/// Shown when the report cannot be loaded.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load report. Please try again.";
/// Shown when a draft save fails.
pub const SAVE_FAILED_MESSAGE: &str = "Could not save draft. Please try again.";
/// Shown when a submission fails.
pub const SUBMIT_FAILED_MESSAGE: &str = "Could not submit report. Please try again.";
/// Shown after a draft save.
pub const DRAFT_SAVED_MESSAGE: &str = "Draft saved successfully.";
/// Shown after a submission.
pub const SUBMITTED_MESSAGE: &str = "Report submitted successfully.";

/// The operations the form invokes.
///
/// Save and submit return the success message to show. Errors are logged by
/// the controller and replaced with a generic message for the user.
#[async_trait]
pub trait ReportService: Send + Sync {
    /// Load the report being edited.
    async fn load_report(&self) -> Result<LoadedReport>;

    /// Save the report as a draft.
    async fn save_draft(&self, context: &ReportFormContext) -> Result<String>;

    /// Submit the report.
    async fn submit_report(&self, context: &ReportFormContext) -> Result<String>;
}

/// Receives notifications from a running form.
///
/// Both methods are called on the controller task and should return quickly.
pub trait FormObserver: Send + Sync {
    /// An event was accepted.
    fn on_transition(&self, _step: &Step, _context: &ReportFormContext) {}

    /// The form navigated away.
    fn on_navigate(&self, _target: &str) {}
}

/// Options for [`FormController::spawn`].
#[derive(Clone)]
pub struct FormOptions {
    /// How long the success state is shown.
    pub redirect_delay: Duration,
    /// Where to navigate after success.
    pub redirect_target: String,
    /// Registered observers.
    pub observers: Vec<Arc<dyn FormObserver>>,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            redirect_target: "/".to_string(),
            observers: Vec::new(),
        }
    }
}

impl std::fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormOptions")
            .field("redirect_delay", &self.redirect_delay)
            .field("redirect_target", &self.redirect_target)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FormOptions {
    /// Options taken from the `[form]` config section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            redirect_delay: config.redirect_delay(),
            redirect_target: config.form.redirect_target.clone(),
            observers: Vec::new(),
        }
    }

    /// Register an observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FormObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

/// What a form looks like after an accepted event.
#[derive(Debug, Clone, PartialEq)]
pub struct FormSnapshot {
    /// Current state.
    pub state: FormState,
    /// Current context.
    pub context: ReportFormContext,
    /// Navigation target once the form has redirected.
    pub navigated_to: Option<String>,
}

struct Command {
    event: FormEvent,
    reply: Option<oneshot::Sender<Step>>,
}

/// Handle to a running form controller.
///
/// Cloning is cheap. The controller stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct FormHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<FormSnapshot>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("event", &self.event.name())
            .finish_non_exhaustive()
    }
}

impl FormHandle {
    /// Send an event and wait for the machine's verdict.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn send(&self, event: FormEvent) -> Result<Step> {
        let (reply, verdict) = oneshot::channel();
        self.commands
            .send(Command {
                event,
                reply: Some(reply),
            })
            .map_err(|_| stopped())?;
        verdict.await.map_err(|_| stopped())
    }

    /// Send an event without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub fn post(&self, event: FormEvent) -> Result<()> {
        self.commands
            .send(Command { event, reply: None })
            .map_err(|_| stopped())
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> FormSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FormSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until a snapshot matches `predicate`.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller stops first.
    pub async fn wait_for<F>(&self, mut predicate: F) -> Result<FormSnapshot>
    where
        F: FnMut(&FormSnapshot) -> bool,
    {
        let mut rx = self.snapshots.clone();
        let snapshot = rx.wait_for(|s| predicate(s)).await.map_err(|_| stopped())?;
        Ok(snapshot.clone())
    }

    /// Wait until the form reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the controller stops first.
    pub async fn wait_for_state(&self, state: FormState) -> Result<FormSnapshot> {
        self.wait_for(|s| s.state == state).await
    }

    /// Load the form if needed, then save or submit it and wait for the outcome.
    ///
    /// Returns the snapshot in `success` or `error`. A load failure is
    /// returned as the `error` snapshot without attempting the upload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormRejected`] if the form is read-only or incomplete,
    /// or an error if the controller stops.
    pub async fn finish(&self, status: ReportStatus) -> Result<FormSnapshot> {
        if self.snapshot().state == FormState::Idle {
            self.send(FormEvent::Initialize).await?;
        }
        let loaded = self
            .wait_for(|s| matches!(s.state, FormState::Editing | FormState::Error))
            .await?;
        if loaded.state == FormState::Error {
            return Ok(loaded);
        }

        let event = match status {
            ReportStatus::Draft => FormEvent::SaveDraft,
            ReportStatus::Submitted => FormEvent::Submit,
        };
        let step = self.send(event).await?;
        if !step.accepted {
            let context = self.snapshot().context;
            let reason = if context.read_only {
                "report is read-only".to_string()
            } else {
                format!("missing {}", context.validate().join(", "))
            };
            return Err(Error::FormRejected { reason });
        }

        self.wait_for(|s| matches!(s.state, FormState::Success | FormState::Error))
            .await
    }
}

fn stopped() -> Error {
    Error::internal("form controller has stopped")
}

/// Spawns form controllers.
#[derive(Debug)]
pub struct FormController;

impl FormController {
    /// Start a controller in `idle`. Send [`FormEvent::Initialize`] to begin.
    #[must_use]
    pub fn spawn(service: Arc<dyn ReportService>, options: FormOptions) -> FormHandle {
        let machine = FormMachine::new(options.redirect_delay, options.redirect_target);
        let (commands, inbox) = mpsc::unbounded_channel();
        let (publish, snapshots) = watch::channel(FormSnapshot {
            state: machine.state(),
            context: machine.context().clone(),
            navigated_to: None,
        });

        let actor = FormActor {
            machine,
            service,
            observers: options.observers,
            loopback: commands.downgrade(),
            inbox,
            publish,
            navigated_to: None,
        };
        tokio::spawn(actor.run());

        FormHandle {
            commands,
            snapshots,
        }
    }
}

struct FormActor {
    machine: FormMachine,
    service: Arc<dyn ReportService>,
    observers: Vec<Arc<dyn FormObserver>>,
    loopback: mpsc::WeakUnboundedSender<Command>,
    inbox: mpsc::UnboundedReceiver<Command>,
    publish: watch::Sender<FormSnapshot>,
    navigated_to: Option<String>,
}

impl FormActor {
    async fn run(mut self) {
        debug!("form controller started");
        while let Some(command) = self.inbox.recv().await {
            let step = self.handle(command.event);
            if let Some(reply) = command.reply {
                let _ = reply.send(step);
            }
        }
        debug!(state = %self.machine.state(), "form controller stopped");
    }

    fn handle(&mut self, event: FormEvent) -> Step {
        let step = self.machine.send(event);
        if !step.accepted {
            return step;
        }

        for observer in &self.observers {
            observer.on_transition(&step, self.machine.context());
        }
        for effect in step.effects.iter().cloned() {
            self.run_effect(effect);
        }

        self.publish.send_replace(FormSnapshot {
            state: self.machine.state(),
            context: self.machine.context().clone(),
            navigated_to: self.navigated_to.clone(),
        });
        step
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::LoadReport => {
                let service = self.service.clone();
                self.spawn_effect(async move {
                    match service.load_report().await {
                        Ok(loaded) => FormEvent::LoadSucceeded(loaded),
                        Err(e) => {
                            warn!("Loading report failed: {e}");
                            FormEvent::LoadFailed(LOAD_FAILED_MESSAGE.to_string())
                        }
                    }
                });
            }
            Effect::SaveDraft(context) => {
                let service = self.service.clone();
                self.spawn_effect(async move {
                    match service.save_draft(&context).await {
                        Ok(message) => FormEvent::SaveSucceeded(message),
                        Err(e) => {
                            warn!("Saving draft failed: {e}");
                            FormEvent::SaveFailed(SAVE_FAILED_MESSAGE.to_string())
                        }
                    }
                });
            }
            Effect::SubmitReport(context) => {
                let service = self.service.clone();
                self.spawn_effect(async move {
                    match service.submit_report(&context).await {
                        Ok(message) => FormEvent::SubmitSucceeded(message),
                        Err(e) => {
                            warn!("Submitting report failed: {e}");
                            FormEvent::SubmitFailed(SUBMIT_FAILED_MESSAGE.to_string())
                        }
                    }
                });
            }
            Effect::ScheduleRedirect(delay) => {
                self.spawn_effect(async move {
                    tokio::time::sleep(delay).await;
                    FormEvent::RedirectDelayElapsed
                });
            }
            Effect::Navigate(target) => {
                info!("Form finished, navigating to {target}");
                for observer in &self.observers {
                    observer.on_navigate(&target);
                }
                self.navigated_to = Some(target);
            }
        }
    }

    /// Run `work` in the background and post its event back when done.
    ///
    /// If every handle is gone by then the event is dropped.
    fn spawn_effect<F>(&self, work: F)
    where
        F: Future<Output = FormEvent> + Send + 'static,
    {
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            let event = work.await;
            if let Some(tx) = loopback.upgrade() {
                let _ = tx.send(Command { event, reply: None });
            }
        });
    }
}

/// A [`ReportService`] backed by the encrypt-and-upload pipeline.
///
/// The report to edit is supplied up front; drafts and submissions go
/// through [`SubmitPipeline::run`] with the matching status tag.
#[derive(Debug)]
pub struct PipelineReportService {
    pipeline: SubmitPipeline,
    metadata: SubmissionMetadata,
    report: LoadedReport,
    last_receipt: Mutex<Option<UploadReceipt>>,
}

impl PipelineReportService {
    /// Create a service for `report`, uploading as `metadata`.
    #[must_use]
    pub fn new(
        pipeline: SubmitPipeline,
        metadata: SubmissionMetadata,
        report: LoadedReport,
    ) -> Self {
        Self {
            pipeline,
            metadata,
            report,
            last_receipt: Mutex::new(None),
        }
    }

    /// Receipt of the most recent successful upload.
    pub async fn last_receipt(&self) -> Option<UploadReceipt> {
        self.last_receipt.lock().await.clone()
    }

    async fn upload(&self, context: &ReportFormContext, status: ReportStatus) -> Result<()> {
        let receipt = self.pipeline.run(context, status, &self.metadata).await?;
        *self.last_receipt.lock().await = Some(receipt);
        Ok(())
    }
}

#[async_trait]
impl ReportService for PipelineReportService {
    async fn load_report(&self) -> Result<LoadedReport> {
        Ok(self.report.clone())
    }

    async fn save_draft(&self, context: &ReportFormContext) -> Result<String> {
        self.upload(context, ReportStatus::Draft).await?;
        Ok(DRAFT_SAVED_MESSAGE.to_string())
    }

    async fn submit_report(&self, context: &ReportFormContext) -> Result<String> {
        self.upload(context, ReportStatus::Submitted).await?;
        Ok(SUBMITTED_MESSAGE.to_string())
    }
}
