//! Core report types for aimpact.
//!
//! A report is a team header plus an ordered list of task rows, each
//! describing how much time an AI tool saved on one piece of work.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a report row.
///
/// Derived from the creation time in milliseconds, bumped forward when
/// needed so that ids within one report are unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub i64);

impl RowId {
    /// Allocate an id for a new row given the rows that already exist.
    #[must_use]
    pub fn next(now_ms: i64, existing: &[ReportRow]) -> Self {
        let Some(max) = existing.iter().map(|r| r.id.0).max() else {
            return Self(now_ms);
        };
        if let Some(floor) = max.checked_add(1) {
            return Self(now_ms.max(floor));
        }
        // The top of the range is taken, so reuse the smallest free value.
        let used: HashSet<i64> = existing.iter().map(|r| r.id.0).collect();
        let free = (i64::MIN..=i64::MAX).find(|candidate| !used.contains(candidate));
        Self(free.unwrap_or(now_ms))
    }

    /// Allocate an id using the current wall clock.
    #[must_use]
    pub fn next_now(existing: &[ReportRow]) -> Self {
        Self::next(Utc::now().timestamp_millis(), existing)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One task entry in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    /// Row identifier.
    pub id: RowId,
    /// Platform the work was done on.
    #[serde(default)]
    pub platform: String,
    /// SDLC phase.
    #[serde(default)]
    pub sdlc_step: String,
    /// SDLC activity within the phase.
    #[serde(default)]
    pub sdlc_task: String,
    /// Work category.
    #[serde(default)]
    pub category: String,
    /// Task complexity.
    #[serde(default)]
    pub complexity: String,
    /// Effect of AI assistance on output quality.
    #[serde(default)]
    pub quality_impact: String,
    /// Hours the task would have taken without AI.
    #[serde(default, rename = "estimatedTimeWithoutAI")]
    pub estimated_hours_without_ai: Option<f64>,
    /// Hours the task actually took with AI.
    #[serde(default, rename = "actualTimeWithAI")]
    pub actual_hours_with_ai: Option<f64>,
    /// AI tools used.
    #[serde(default)]
    pub tools_used: Vec<String>,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

impl ReportRow {
    /// Create a row with empty defaults.
    #[must_use]
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            platform: String::new(),
            sdlc_step: String::new(),
            sdlc_task: String::new(),
            category: String::new(),
            complexity: String::new(),
            quality_impact: String::new(),
            estimated_hours_without_ai: None,
            actual_hours_with_ai: None,
            tools_used: Vec::new(),
            notes: String::new(),
        }
    }

    /// Hours saved, rounded to the nearest quarter hour and never negative.
    ///
    /// Missing hour values count as zero.
    #[must_use]
    pub fn time_saved(&self) -> f64 {
        let estimated = self.estimated_hours_without_ai.unwrap_or(0.0);
        let actual = self.actual_hours_with_ai.unwrap_or(0.0);
        let rounded = ((estimated - actual) * 4.0).round() / 4.0;
        // Also maps NaN and -0.0 to 0.0.
        if rounded > 0.0 {
            rounded
        } else {
            0.0
        }
    }

    /// Time saved formatted with two decimals, e.g. `"3.00"`.
    #[must_use]
    pub fn time_saved_display(&self) -> String {
        format!("{:.2}", self.time_saved())
    }

    /// Apply a single field edit.
    pub fn apply(&mut self, edit: RowEdit) {
        match edit {
            RowEdit::Platform(v) => self.platform = v,
            RowEdit::SdlcTask(v) => self.sdlc_task = v,
            RowEdit::Category(v) => self.category = v,
            RowEdit::Complexity(v) => self.complexity = v,
            RowEdit::QualityImpact(v) => self.quality_impact = v,
            RowEdit::EstimatedHours(v) => self.estimated_hours_without_ai = v,
            RowEdit::ActualHours(v) => self.actual_hours_with_ai = v,
            RowEdit::ToolsUsed(v) => self.tools_used = v,
            RowEdit::Notes(v) => self.notes = v,
        }
    }

    /// Change the SDLC step, clearing the dependent task.
    pub fn set_sdlc_step(&mut self, step: String) {
        self.sdlc_step = step;
        self.sdlc_task.clear();
    }

    fn missing_fields(&self, index: usize, out: &mut Vec<String>) {
        let text = [
            ("platform", &self.platform),
            ("sdlcStep", &self.sdlc_step),
            ("sdlcTask", &self.sdlc_task),
            ("category", &self.category),
            ("complexity", &self.complexity),
            ("qualityImpact", &self.quality_impact),
        ];
        for (name, value) in text {
            if value.trim().is_empty() {
                out.push(format!("rows[{index}].{name}"));
            }
        }
        let hours = [
            ("estimatedTimeWithoutAI", self.estimated_hours_without_ai),
            ("actualTimeWithAI", self.actual_hours_with_ai),
        ];
        for (name, value) in hours {
            if !value.is_some_and(|h| h.is_finite() && h >= 0.0) {
                out.push(format!("rows[{index}].{name}"));
            }
        }
    }
}

/// A single-field edit of a report row.
///
/// The SDLC step is not here: changing it also clears the task and goes
/// through its own event.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEdit {
    /// Set the platform.
    Platform(String),
    /// Set the SDLC task.
    SdlcTask(String),
    /// Set the category.
    Category(String),
    /// Set the complexity.
    Complexity(String),
    /// Set the quality impact.
    QualityImpact(String),
    /// Set the estimated hours without AI.
    EstimatedHours(Option<f64>),
    /// Set the actual hours with AI.
    ActualHours(Option<f64>),
    /// Replace the list of tools used.
    ToolsUsed(Vec<String>),
    /// Set the notes.
    Notes(String),
}

/// Team metadata attached to a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TeamInfo {
    /// Team name.
    pub name: String,
    /// Reporting team member.
    pub member: String,
    /// Member's role.
    pub role: String,
}

/// Report data produced by the "load report" operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadedReport {
    /// Team metadata.
    pub team: TeamInfo,
    /// Existing rows; empty means "start with one blank row".
    pub rows: Vec<ReportRow>,
    /// Whether the report can no longer be edited.
    pub read_only: bool,
}

/// Everything the form state machine tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFormContext {
    /// Team metadata.
    pub team: TeamInfo,
    /// Ordered rows, never empty while editing.
    pub rows: Vec<ReportRow>,
    /// Expanded flag per row.
    pub expanded: BTreeMap<RowId, bool>,
    /// Whether edits are rejected.
    pub read_only: bool,
    /// Last error message shown to the user.
    pub error: Option<String>,
    /// Whether the last save or submit succeeded.
    pub success: bool,
    /// Message describing the last success.
    pub success_message: Option<String>,
}

impl Default for ReportFormContext {
    fn default() -> Self {
        Self::with_first_row(RowId::next_now(&[]))
    }
}

impl ReportFormContext {
    /// Create a default context whose single row has the given id.
    #[must_use]
    pub fn with_first_row(id: RowId) -> Self {
        let mut expanded = BTreeMap::new();
        expanded.insert(id, true);
        Self {
            team: TeamInfo::default(),
            rows: vec![ReportRow::new(id)],
            expanded,
            read_only: false,
            error: None,
            success: false,
            success_message: None,
        }
    }

    /// Find a row by id.
    #[must_use]
    pub fn row(&self, id: RowId) -> Option<&ReportRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Find a row by id, mutably.
    pub fn row_mut(&mut self, id: RowId) -> Option<&mut ReportRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }

    /// Whether the given row is expanded.
    #[must_use]
    pub fn is_expanded(&self, id: RowId) -> bool {
        self.expanded.get(&id).copied().unwrap_or(false)
    }

    /// List required fields that are still empty.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let team = [
            ("teamName", &self.team.name),
            ("teamMember", &self.team.member),
            ("teamRole", &self.team.role),
        ];
        for (name, value) in team {
            if value.trim().is_empty() {
                missing.push(name.to_string());
            }
        }
        if self.rows.is_empty() {
            missing.push("rows".to_string());
        }
        for (index, row) in self.rows.iter().enumerate() {
            row.missing_fields(index, &mut missing);
        }
        missing
    }

    /// Whether all required fields are filled in.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Sum of time saved over all rows.
    #[must_use]
    pub fn total_time_saved(&self) -> f64 {
        self.rows.iter().map(ReportRow::time_saved).sum()
    }
}

/// Persistence state of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Saved for later editing.
    Draft,
    /// Final submission.
    Submitted,
}

impl ReportStatus {
    /// Wire tag of this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            other => Err(format!("unknown report status: {other}")),
        }
    }
}

/// Row in the canonical submitted form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRow {
    /// Row identifier.
    pub id: RowId,
    /// Platform.
    pub platform: String,
    /// SDLC phase.
    pub sdlc_step: String,
    /// SDLC activity.
    pub sdlc_task: String,
    /// Category.
    pub category: String,
    /// Complexity.
    pub complexity: String,
    /// Quality impact.
    pub quality_impact: String,
    /// Hours without AI.
    #[serde(rename = "estimatedTimeWithoutAI")]
    pub estimated_time_without_ai: f64,
    /// Hours with AI.
    #[serde(rename = "actualTimeWithAI")]
    pub actual_time_with_ai: f64,
    /// Time saved, two decimals.
    pub time_saved: String,
    /// Tools, comma separated.
    pub tools_used: String,
    /// Notes.
    pub notes: String,
}

impl From<&ReportRow> for NormalizedRow {
    fn from(row: &ReportRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform.trim().to_string(),
            sdlc_step: row.sdlc_step.trim().to_string(),
            sdlc_task: row.sdlc_task.trim().to_string(),
            category: row.category.trim().to_string(),
            complexity: row.complexity.trim().to_string(),
            quality_impact: row.quality_impact.trim().to_string(),
            estimated_time_without_ai: row.estimated_hours_without_ai.unwrap_or(0.0),
            actual_time_with_ai: row.actual_hours_with_ai.unwrap_or(0.0),
            time_saved: row.time_saved_display(),
            tools_used: row
                .tools_used
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            notes: row.notes.clone(),
        }
    }
}

/// The plaintext document that gets encrypted and uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPayload {
    /// Team name.
    pub team_name: String,
    /// Team member.
    pub team_member: String,
    /// Member role.
    pub team_role: String,
    /// Normalized rows.
    pub rows: Vec<NormalizedRow>,
    /// When the payload was produced.
    pub timestamp: DateTime<Utc>,
    /// Draft or submitted.
    pub status: ReportStatus,
}

impl ReportPayload {
    /// Build the payload for a form context.
    #[must_use]
    pub fn new(
        context: &ReportFormContext,
        status: ReportStatus,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            team_name: context.team.name.trim().to_string(),
            team_member: context.team.member.trim().to_string(),
            team_role: context.team.role.trim().to_string(),
            rows: context.rows.iter().map(NormalizedRow::from).collect(),
            timestamp,
            status,
        }
    }

    /// Canonical JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
