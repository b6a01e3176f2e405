//! Report form state machine.
//!
//! A synchronous, explicit transition table over `(FormState, FormEvent)`.
//! The machine never performs I/O: transitions that need work done return
//! [`Effect`]s, and the caller reports the outcome back as another event.
//!
//! ```text
//! idle -> loading -> editing -> savingDraft | submitting -> success -> redirecting
//!            \                        \            /
//!             `-----------------------> error <---'
//!                                         | RETRY
//!                                         v
//!                                      editing
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, trace};

use crate::report::{LoadedReport, ReportFormContext, RowEdit, RowId};

/// Default time the success state is shown before redirecting.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(3000);

/// States of the report form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormState {
    /// Waiting for `Initialize`.
    Idle,
    /// Report data is being loaded.
    Loading,
    /// User is editing.
    Editing,
    /// A draft save is in flight.
    SavingDraft,
    /// A final submission is in flight.
    Submitting,
    /// Save or submit succeeded; waiting for the redirect delay.
    Success,
    /// Terminal: navigating away from the form.
    Redirecting,
    /// An operation failed; only `Retry` is accepted.
    Error,
}

impl FormState {
    /// Whether an async operation is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Loading | Self::SavingDraft | Self::Submitting)
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redirecting)
    }
}

impl fmt::Display for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Editing => "editing",
            Self::SavingDraft => "savingDraft",
            Self::Submitting => "submitting",
            Self::Success => "success",
            Self::Redirecting => "redirecting",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Events accepted by the form machine.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    /// Reset the context and start loading.
    Initialize,
    /// The load operation finished.
    LoadSucceeded(LoadedReport),
    /// The load operation failed.
    LoadFailed(String),
    /// Set the team member.
    UpdateTeamMember(String),
    /// Set the team member's role.
    UpdateTeamRole(String),
    /// Edit one field of a row.
    UpdateRow {
        /// Row to edit.
        id: RowId,
        /// The edit.
        edit: RowEdit,
    },
    /// Change a row's SDLC step (clears its task).
    ChangeSdlcStep {
        /// Row to edit.
        id: RowId,
        /// New step.
        step: String,
    },
    /// Append a blank row.
    AddRow,
    /// Remove a row.
    RemoveRow(RowId),
    /// Flip a row's expanded flag.
    ToggleRow(RowId),
    /// Save the report as a draft.
    SaveDraft,
    /// Submit the report.
    Submit,
    /// The draft save finished.
    SaveSucceeded(String),
    /// The draft save failed.
    SaveFailed(String),
    /// The submission finished.
    SubmitSucceeded(String),
    /// The submission failed.
    SubmitFailed(String),
    /// The success delay has elapsed.
    RedirectDelayElapsed,
    /// Go back to editing after an error.
    Retry,
}

impl FormEvent {
    /// Short name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize => "INITIALIZE",
            Self::LoadSucceeded(_) => "LOAD_SUCCESS",
            Self::LoadFailed(_) => "LOAD_FAILURE",
            Self::UpdateTeamMember(_) => "UPDATE_TEAM_MEMBER",
            Self::UpdateTeamRole(_) => "UPDATE_TEAM_ROLE",
            Self::UpdateRow { .. } => "UPDATE_ROW",
            Self::ChangeSdlcStep { .. } => "CHANGE_SDLC_STEP",
            Self::AddRow => "ADD_ROW",
            Self::RemoveRow(_) => "REMOVE_ROW",
            Self::ToggleRow(_) => "TOGGLE_ROW",
            Self::SaveDraft => "SAVE_DRAFT",
            Self::Submit => "SUBMIT",
            Self::SaveSucceeded(_) => "SAVE_SUCCESS",
            Self::SaveFailed(_) => "SAVE_FAILURE",
            Self::SubmitSucceeded(_) => "SUBMIT_SUCCESS",
            Self::SubmitFailed(_) => "SUBMIT_FAILURE",
            Self::RedirectDelayElapsed => "REDIRECT_DELAY_ELAPSED",
            Self::Retry => "RETRY",
        }
    }

    fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::UpdateTeamMember(_)
                | Self::UpdateTeamRole(_)
                | Self::UpdateRow { .. }
                | Self::ChangeSdlcStep { .. }
                | Self::AddRow
                | Self::RemoveRow(_)
                | Self::ToggleRow(_)
        )
    }
}

/// Work the caller must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the load operation, then send `LoadSucceeded`/`LoadFailed`.
    LoadReport,
    /// Save this snapshot as a draft, then send `SaveSucceeded`/`SaveFailed`.
    SaveDraft(Box<ReportFormContext>),
    /// Submit this snapshot, then send `SubmitSucceeded`/`SubmitFailed`.
    SubmitReport(Box<ReportFormContext>),
    /// Wait, then send `RedirectDelayElapsed`.
    ScheduleRedirect(Duration),
    /// Navigate away from the form.
    Navigate(String),
}

/// Result of feeding one event to the machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// State before the event.
    pub from: FormState,
    /// State after the event.
    pub to: FormState,
    /// Whether the event was handled. Ignored events change nothing.
    pub accepted: bool,
    /// Side effects to run.
    pub effects: Vec<Effect>,
}

impl Step {
    fn ignored(state: FormState) -> Self {
        Self {
            from: state,
            to: state,
            accepted: false,
            effects: Vec::new(),
        }
    }
}

/// The report form state machine.
#[derive(Debug, Clone)]
pub struct FormMachine {
    state: FormState,
    context: ReportFormContext,
    redirect_delay: Duration,
    redirect_target: String,
}

impl Default for FormMachine {
    fn default() -> Self {
        Self::new(DEFAULT_REDIRECT_DELAY, "/")
    }
}

impl FormMachine {
    /// Create a machine in `idle`.
    #[must_use]
    pub fn new(redirect_delay: Duration, redirect_target: impl Into<String>) -> Self {
        Self {
            state: FormState::Idle,
            context: ReportFormContext::default(),
            redirect_delay,
            redirect_target: redirect_target.into(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> FormState {
        self.state
    }

    /// Current context.
    #[must_use]
    pub fn context(&self) -> &ReportFormContext {
        &self.context
    }

    /// Feed one event through the transition table.
    pub fn send(&mut self, event: FormEvent) -> Step {
        let from = self.state;
        let name = event.name();

        let outcome = match (from, event) {
            (FormState::Idle, FormEvent::Initialize) => {
                self.context = ReportFormContext::default();
                Some((FormState::Loading, vec![Effect::LoadReport]))
            }

            (FormState::Loading, FormEvent::LoadSucceeded(loaded)) => {
                self.populate(loaded);
                Some((FormState::Editing, Vec::new()))
            }
            (FormState::Loading, FormEvent::LoadFailed(message)) => {
                self.context.error = Some(message);
                Some((FormState::Error, Vec::new()))
            }

            (FormState::Editing, event) if event.is_mutation() => {
                if self.context.read_only {
                    None
                } else {
                    self.mutate(event).then(|| (FormState::Editing, Vec::new()))
                }
            }
            (FormState::Editing, FormEvent::SaveDraft) => self.guarded().then(|| {
                (
                    FormState::SavingDraft,
                    vec![Effect::SaveDraft(Box::new(self.context.clone()))],
                )
            }),
            (FormState::Editing, FormEvent::Submit) => self.guarded().then(|| {
                (
                    FormState::Submitting,
                    vec![Effect::SubmitReport(Box::new(self.context.clone()))],
                )
            }),

            (FormState::SavingDraft, FormEvent::SaveSucceeded(message))
            | (FormState::Submitting, FormEvent::SubmitSucceeded(message)) => {
                self.context.error = None;
                self.context.success = true;
                self.context.success_message = Some(message);
                Some((
                    FormState::Success,
                    vec![Effect::ScheduleRedirect(self.redirect_delay)],
                ))
            }
            (FormState::SavingDraft, FormEvent::SaveFailed(message))
            | (FormState::Submitting, FormEvent::SubmitFailed(message)) => {
                self.context.success = false;
                self.context.success_message = None;
                self.context.error = Some(message);
                Some((FormState::Error, Vec::new()))
            }

            (FormState::Success, FormEvent::RedirectDelayElapsed) => Some((
                FormState::Redirecting,
                vec![Effect::Navigate(self.redirect_target.clone())],
            )),

            (FormState::Error, FormEvent::Retry) => {
                self.context.error = None;
                Some((FormState::Editing, Vec::new()))
            }

            _ => None,
        };

        match outcome {
            Some((to, effects)) => {
                self.state = to;
                if from == to {
                    trace!(event = name, state = %to, "form context updated");
                } else {
                    debug!(event = name, from = %from, to = %to, "form transition");
                }
                Step {
                    from,
                    to,
                    accepted: true,
                    effects,
                }
            }
            None => {
                trace!(event = name, state = %from, "form event ignored");
                Step::ignored(from)
            }
        }
    }

    /// Guard for save and submit.
    fn guarded(&self) -> bool {
        if self.context.read_only {
            return false;
        }
        let missing = self.context.validate();
        if !missing.is_empty() {
            debug!(missing = ?missing, "form is incomplete");
        }
        missing.is_empty()
    }

    fn populate(&mut self, loaded: LoadedReport) {
        self.context.team = loaded.team;
        self.context.read_only = loaded.read_only;
        if !loaded.rows.is_empty() {
            let mut rows = loaded.rows;
            let mut seen = HashSet::with_capacity(rows.len());
            for i in 0..rows.len() {
                if !seen.insert(rows[i].id) {
                    let fresh = RowId::next(Utc::now().timestamp_millis(), &rows);
                    debug!(duplicate = %rows[i].id, fresh = %fresh, "Reassigned duplicate row id");
                    rows[i].id = fresh;
                    seen.insert(fresh);
                }
            }
            self.context.expanded = rows.iter().map(|r| (r.id, false)).collect();
            self.context.rows = rows;
        }
    }

    /// Apply a mutation event. Returns `false` when it targets nothing.
    fn mutate(&mut self, event: FormEvent) -> bool {
        let ctx = &mut self.context;
        match event {
            FormEvent::UpdateTeamMember(member) => {
                ctx.team.member = member;
                true
            }
            FormEvent::UpdateTeamRole(role) => {
                ctx.team.role = role;
                true
            }
            FormEvent::UpdateRow { id, edit } => {
                ctx.row_mut(id).map(|row| row.apply(edit)).is_some()
            }
            FormEvent::ChangeSdlcStep { id, step } => {
                ctx.row_mut(id).map(|row| row.set_sdlc_step(step)).is_some()
            }
            FormEvent::AddRow => {
                let id = RowId::next(Utc::now().timestamp_millis(), &ctx.rows);
                ctx.rows.push(crate::report::ReportRow::new(id));
                ctx.expanded.insert(id, true);
                true
            }
            FormEvent::RemoveRow(id) => {
                let Some(pos) = ctx.rows.iter().position(|r| r.id == id) else {
                    return false;
                };
                if ctx.rows.len() <= 1 {
                    return false;
                }
                ctx.rows.remove(pos);
                ctx.expanded.remove(&id);
                true
            }
            FormEvent::ToggleRow(id) => {
                if ctx.row(id).is_none() {
                    return false;
                }
                let flag = ctx.expanded.entry(id).or_insert(false);
                *flag = !*flag;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TeamInfo;

    fn team() -> TeamInfo {
        TeamInfo {
            name: "Payments".to_string(),
            member: "Alex".to_string(),
            role: "Developer".to_string(),
        }
    }

    fn editing_machine() -> FormMachine {
        let mut m = FormMachine::default();
        m.send(FormEvent::Initialize);
        m.send(FormEvent::LoadSucceeded(LoadedReport {
            team: team(),
            rows: Vec::new(),
            read_only: false,
        }));
        assert_eq!(m.state(), FormState::Editing);
        m
    }

    fn fill_row(m: &mut FormMachine, id: RowId) {
        let edits = [
            RowEdit::Platform("Web".to_string()),
            RowEdit::Category("Feature".to_string()),
            RowEdit::Complexity("High".to_string()),
            RowEdit::QualityImpact("Better".to_string()),
            RowEdit::EstimatedHours(Some(5.0)),
            RowEdit::ActualHours(Some(2.0)),
        ];
        m.send(FormEvent::ChangeSdlcStep {
            id,
            step: "Development".to_string(),
        });
        m.send(FormEvent::UpdateRow {
            id,
            edit: RowEdit::SdlcTask("Coding".to_string()),
        });
        for edit in edits {
            let step = m.send(FormEvent::UpdateRow { id, edit });
            assert!(step.accepted);
        }
    }

    fn valid_machine() -> FormMachine {
        let mut m = editing_machine();
        let id = m.context().rows[0].id;
        fill_row(&mut m, id);
        assert!(m.context().is_valid());
        m
    }

    #[test]
    fn test_initialize_yields_one_default_row() {
        let mut m = FormMachine::default();
        let step = m.send(FormEvent::Initialize);
        assert_eq!(step.to, FormState::Loading);
        assert_eq!(step.effects, vec![Effect::LoadReport]);
        assert_eq!(m.context().rows.len(), 1);
    }

    #[test]
    fn test_initialize_ignored_outside_idle() {
        let mut m = editing_machine();
        let step = m.send(FormEvent::Initialize);
        assert!(!step.accepted);
        assert_eq!(m.state(), FormState::Editing);
    }

    #[test]
    fn test_load_success_keeps_default_row_when_empty() {
        let m = editing_machine();
        assert_eq!(m.context().rows.len(), 1);
        assert_eq!(m.context().team, team());
    }

    #[test]
    fn test_load_success_with_rows() {
        let mut m = FormMachine::default();
        m.send(FormEvent::Initialize);
        let rows = vec![
            crate::report::ReportRow::new(RowId(10)),
            crate::report::ReportRow::new(RowId(20)),
        ];
        m.send(FormEvent::LoadSucceeded(LoadedReport {
            team: team(),
            rows,
            read_only: false,
        }));
        let ids: Vec<_> = m.context().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![RowId(10), RowId(20)]);
        assert!(!m.context().is_expanded(RowId(10)));
    }

    fn load_rows(ids: &[i64]) -> FormMachine {
        let mut m = FormMachine::default();
        m.send(FormEvent::Initialize);
        m.send(FormEvent::LoadSucceeded(LoadedReport {
            team: team(),
            rows: ids
                .iter()
                .map(|id| crate::report::ReportRow::new(RowId(*id)))
                .collect(),
            read_only: false,
        }));
        assert_eq!(m.state(), FormState::Editing);
        m
    }

    #[test]
    fn test_load_reassigns_duplicate_row_ids() {
        let mut m = load_rows(&[7, 7, 7]);
        let ids: Vec<_> = m.context().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0], RowId(7));
        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 3);

        // Removing the original id takes out exactly one row.
        let step = m.send(FormEvent::RemoveRow(RowId(7)));
        assert!(step.accepted);
        assert_eq!(m.context().rows.len(), 2);

        let remaining: Vec<_> = m.context().rows.iter().map(|r| r.id).collect();
        m.send(FormEvent::RemoveRow(remaining[0]));
        let step = m.send(FormEvent::RemoveRow(remaining[1]));
        assert!(!step.accepted);
        assert_eq!(m.context().rows.len(), 1);
        assert_eq!(m.state(), FormState::Editing);
    }

    #[test]
    fn test_add_row_after_max_row_id() {
        let mut m = load_rows(&[i64::MAX]);
        let step = m.send(FormEvent::AddRow);
        assert!(step.accepted);
        let ids: Vec<_> = m.context().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        let step = m.send(FormEvent::AddRow);
        assert!(step.accepted);
        assert_eq!(m.context().rows.len(), 3);
    }

    #[test]
    fn test_load_failure_goes_to_error() {
        let mut m = FormMachine::default();
        m.send(FormEvent::Initialize);
        let step = m.send(FormEvent::LoadFailed("offline".to_string()));
        assert_eq!(step.to, FormState::Error);
        assert_eq!(m.context().error.as_deref(), Some("offline"));

        let step = m.send(FormEvent::Retry);
        assert_eq!(step.to, FormState::Editing);
        assert_eq!(m.context().rows.len(), 1);
    }

    #[test]
    fn test_team_updates() {
        let mut m = editing_machine();
        m.send(FormEvent::UpdateTeamMember("Jo".to_string()));
        m.send(FormEvent::UpdateTeamRole("Lead".to_string()));
        assert_eq!(m.context().team.member, "Jo");
        assert_eq!(m.context().team.role, "Lead");
        assert_eq!(m.state(), FormState::Editing);
    }

    #[test]
    fn test_change_sdlc_step_clears_task() {
        let mut m = valid_machine();
        let id = m.context().rows[0].id;
        m.send(FormEvent::ChangeSdlcStep {
            id,
            step: "Testing".to_string(),
        });
        let row = m.context().row(id).unwrap();
        assert_eq!(row.sdlc_step, "Testing");
        assert!(row.sdlc_task.is_empty());
        assert!(!m.context().is_valid());
    }

    #[test]
    fn test_add_row_ids_are_unique() {
        let mut m = editing_machine();
        for _ in 0..5 {
            m.send(FormEvent::AddRow);
        }
        let mut ids: Vec<_> = m.context().rows.iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 6);
        ids.dedup();
        assert_eq!(ids.len(), 6);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert!(m.context().is_expanded(ids[5]));
    }

    #[test]
    fn test_remove_row_keeps_rows_non_empty() {
        let mut m = editing_machine();
        let only = m.context().rows[0].id;
        let step = m.send(FormEvent::RemoveRow(only));
        assert!(!step.accepted);
        assert_eq!(m.context().rows.len(), 1);

        m.send(FormEvent::AddRow);
        let second = m.context().rows[1].id;
        let step = m.send(FormEvent::RemoveRow(only));
        assert!(step.accepted);
        assert_eq!(m.context().rows.len(), 1);
        assert_eq!(m.context().rows[0].id, second);
        assert!(!m.context().expanded.contains_key(&only));
    }

    #[test]
    fn test_remove_unknown_row_ignored() {
        let mut m = editing_machine();
        m.send(FormEvent::AddRow);
        let step = m.send(FormEvent::RemoveRow(RowId(-1)));
        assert!(!step.accepted);
        assert_eq!(m.context().rows.len(), 2);
    }

    #[test]
    fn test_toggle_row() {
        let mut m = editing_machine();
        let id = m.context().rows[0].id;
        assert!(m.context().is_expanded(id));
        m.send(FormEvent::ToggleRow(id));
        assert!(!m.context().is_expanded(id));
        m.send(FormEvent::ToggleRow(id));
        assert!(m.context().is_expanded(id));
        assert!(!m.send(FormEvent::ToggleRow(RowId(-5))).accepted);
    }

    #[test]
    fn test_save_and_submit_guarded_when_invalid() {
        let mut m = editing_machine();
        let before = m.context().clone();

        let step = m.send(FormEvent::SaveDraft);
        assert!(!step.accepted);
        assert!(step.effects.is_empty());
        assert_eq!(m.state(), FormState::Editing);

        let step = m.send(FormEvent::Submit);
        assert!(!step.accepted);
        assert_eq!(m.state(), FormState::Editing);
        assert_eq!(m.context(), &before);
    }

    #[test]
    fn test_save_draft_flow() {
        let mut m = valid_machine();
        let step = m.send(FormEvent::SaveDraft);
        assert_eq!(step.to, FormState::SavingDraft);
        assert!(matches!(step.effects[0], Effect::SaveDraft(_)));

        let step = m.send(FormEvent::SaveSucceeded("Draft saved".to_string()));
        assert_eq!(step.to, FormState::Success);
        assert!(m.context().success);
        assert_eq!(m.context().success_message.as_deref(), Some("Draft saved"));
    }

    #[test]
    fn test_submit_success_then_redirect_once() {
        let mut m = valid_machine();
        m.send(FormEvent::Submit);
        let step = m.send(FormEvent::SubmitSucceeded("Submitted".to_string()));
        assert_eq!(m.state(), FormState::Success);
        assert_eq!(
            step.effects,
            vec![Effect::ScheduleRedirect(Duration::from_millis(3000))]
        );

        let step = m.send(FormEvent::RedirectDelayElapsed);
        assert_eq!(step.to, FormState::Redirecting);
        assert_eq!(step.effects, vec![Effect::Navigate("/".to_string())]);

        let again = m.send(FormEvent::RedirectDelayElapsed);
        assert!(!again.accepted);
        assert!(again.effects.is_empty());
        assert!(m.state().is_terminal());
    }

    #[test]
    fn test_busy_states_ignore_user_events() {
        let mut m = valid_machine();
        m.send(FormEvent::Submit);
        assert!(m.state().is_busy());
        for event in [
            FormEvent::AddRow,
            FormEvent::SaveDraft,
            FormEvent::Submit,
            FormEvent::Retry,
            FormEvent::SaveSucceeded("wrong op".to_string()),
        ] {
            assert!(!m.send(event).accepted);
        }
        assert_eq!(m.state(), FormState::Submitting);
        assert_eq!(m.context().rows.len(), 1);
    }

    #[test]
    fn test_submit_failure_and_retry_preserves_context() {
        let mut m = valid_machine();
        let edited = m.context().clone();
        m.send(FormEvent::Submit);
        let step = m.send(FormEvent::SubmitFailed("Could not submit".to_string()));
        assert_eq!(step.to, FormState::Error);
        assert_eq!(m.context().error.as_deref(), Some("Could not submit"));

        assert!(!m.send(FormEvent::AddRow).accepted);

        let step = m.send(FormEvent::Retry);
        assert_eq!(step.to, FormState::Editing);
        assert_eq!(m.context(), &edited);
    }

    #[test]
    fn test_read_only_rejects_mutations() {
        let mut m = FormMachine::default();
        m.send(FormEvent::Initialize);
        m.send(FormEvent::LoadSucceeded(LoadedReport {
            team: team(),
            rows: Vec::new(),
            read_only: true,
        }));
        assert!(!m.send(FormEvent::AddRow).accepted);
        assert!(!m.send(FormEvent::UpdateTeamRole("x".to_string())).accepted);
        assert!(!m.send(FormEvent::Submit).accepted);
        assert_eq!(m.state(), FormState::Editing);
    }

    #[test]
    fn test_custom_redirect() {
        let mut m = FormMachine::new(Duration::from_millis(10), "/thanks");
        m.send(FormEvent::Initialize);
        m.send(FormEvent::LoadSucceeded(LoadedReport {
            team: team(),
            ..LoadedReport::default()
        }));
        let id = m.context().rows[0].id;
        fill_row(&mut m, id);
        m.send(FormEvent::SaveDraft);
        let step = m.send(FormEvent::SaveSucceeded("ok".to_string()));
        assert_eq!(
            step.effects,
            vec![Effect::ScheduleRedirect(Duration::from_millis(10))]
        );
        let step = m.send(FormEvent::RedirectDelayElapsed);
        assert_eq!(step.effects, vec![Effect::Navigate("/thanks".to_string())]);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(FormState::SavingDraft.to_string(), "savingDraft");
        assert_eq!(FormState::Redirecting.to_string(), "redirecting");
    }
}
