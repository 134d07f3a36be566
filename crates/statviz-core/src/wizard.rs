//! The four-step analysis session: upload, map variables, choose an
//! analysis, view results.
//!
//! All state lives in the [`Wizard`]; nothing is persisted. Loading a new
//! upload resets everything downstream of it, and [`Wizard::reset`] starts
//! over and invalidates any analysis still in flight.

use std::fmt;
use std::time::Instant;

use statviz_analysis::{AnalysisBackend, AnalysisRequest, RequestTicket, RequestTracker, dispatch};
use statviz_ingest::{Upload, UploadPolicy, infer_column_kinds, parse_upload};
use statviz_map::{Assignment, RoleAssignment};
use statviz_model::{AnalysisResult, AnalysisType, Dataset, VariableMapping, VariableRole};

use crate::error::{CoreError, Result};

pub const TOTAL_STEPS: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WizardStep {
    Upload = 1,
    MapVariables = 2,
    ChooseAnalysis = 3,
    Results = 4,
}

impl WizardStep {
    pub const fn number(self) -> u8 {
        self as u8
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::Upload => "Upload & Prepare Data",
            Self::MapVariables => "Define Variables",
            Self::ChooseAnalysis => "Select Statistical Analysis",
            Self::Results => "View Results & Interpretation",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Upload => "Upload your .csv or .xlsx file and preview your data.",
            Self::MapVariables => {
                "Assign columns from your data to their roles in the analysis (e.g., dependent, independent)."
            }
            Self::ChooseAnalysis => "Choose the statistical test you want to perform on your data.",
            Self::Results => {
                "Review the statistical output, get AI explanations, and download your findings."
            }
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Upload => Some(Self::MapVariables),
            Self::MapVariables => Some(Self::ChooseAnalysis),
            Self::ChooseAnalysis => Some(Self::Results),
            Self::Results => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Upload => None,
            Self::MapVariables => Some(Self::Upload),
            Self::ChooseAnalysis => Some(Self::MapVariables),
            Self::Results => Some(Self::ChooseAnalysis),
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// An analysis that has been started but whose result has not landed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnalysis {
    pub ticket: RequestTicket,
    pub request: AnalysisRequest,
}

#[derive(Debug, Default)]
pub struct Wizard {
    policy: UploadPolicy,
    step: Option<WizardStep>,
    dataset: Option<Dataset>,
    assignment: Option<RoleAssignment>,
    analysis_type: Option<AnalysisType>,
    result: Option<AnalysisResult>,
    tracker: RequestTracker,
}

impl Wizard {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step.unwrap_or(WizardStep::Upload)
    }

    /// Completion in percent of the current step.
    pub fn progress(&self) -> f64 {
        f64::from(self.step().number()) / f64::from(TOTAL_STEPS) * 100.0
    }

    pub fn policy(&self) -> UploadPolicy {
        self.policy
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn mapping(&self) -> VariableMapping {
        self.assignment
            .as_ref()
            .map(|assignment| assignment.mapping().clone())
            .unwrap_or_default()
    }

    pub fn assignment(&self) -> Option<&RoleAssignment> {
        self.assignment.as_ref()
    }

    pub fn analysis_type(&self) -> Option<AnalysisType> {
        self.analysis_type
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Parse `upload` under the wizard's policy and make it the session's
    /// data. The upload is cleared when it is rejected.
    pub fn load_upload(&mut self, upload: &mut Upload, sheet: Option<&str>) -> Result<&Dataset> {
        let dataset = parse_upload(upload, &self.policy, sheet)?;
        Ok(self.load_dataset(dataset))
    }

    /// Replace the session's data, resetting mapping, analysis and result.
    pub fn load_dataset(&mut self, mut dataset: Dataset) -> &Dataset {
        infer_column_kinds(&mut dataset);
        self.tracker.cancel_all();
        self.assignment = Some(RoleAssignment::new(dataset.column_names()));
        self.analysis_type = None;
        self.result = None;
        tracing::info!(
            source = %dataset.source_name,
            rows = dataset.rows.len(),
            columns = dataset.columns.len(),
            "data ready"
        );
        self.dataset.insert(dataset)
    }

    fn assignment_mut(&mut self) -> Result<&mut RoleAssignment> {
        self.assignment.as_mut().ok_or_else(|| CoreError::StepBlocked {
            step: WizardStep::Upload,
            reason: "Please upload and process a data file first.".to_string(),
        })
    }

    pub fn assign(&mut self, column: &str, role: VariableRole) -> Result<Assignment> {
        Ok(self.assignment_mut()?.assign(column, role)?)
    }

    pub fn unassign(&mut self, column: &str) -> Result<VariableMapping> {
        Ok(self.assignment_mut()?.unassign(column)?)
    }

    /// Replace the whole mapping; unknown columns are dropped.
    pub fn set_mapping(&mut self, mapping: &VariableMapping) -> Result<VariableMapping> {
        let columns = self.assignment_mut()?.columns().to_vec();
        let assignment = RoleAssignment::from_mapping(columns, mapping);
        let snapshot = assignment.mapping().clone();
        self.assignment = Some(assignment);
        Ok(snapshot)
    }

    pub fn select_analysis(&mut self, analysis_type: AnalysisType) {
        self.analysis_type = Some(analysis_type);
    }

    fn check_leave(&self, step: WizardStep) -> Result<()> {
        let blocked = |reason: &str| {
            Err(CoreError::StepBlocked {
                step,
                reason: reason.to_string(),
            })
        };
        match step {
            WizardStep::Upload if self.dataset.as_ref().is_none_or(|d| d.rows.is_empty()) => {
                blocked("Please upload and process a data file first.")
            }
            WizardStep::MapVariables if !self.mapping().is_ready() => blocked(
                "Please define at least one dependent and one independent variable.",
            ),
            WizardStep::ChooseAnalysis if self.analysis_type.is_none() => {
                blocked("Please select a statistical analysis type.")
            }
            _ => Ok(()),
        }
    }

    /// Advance one step. Leaving step 3 runs the analysis on `backend`.
    pub fn next(&mut self, backend: &dyn AnalysisBackend) -> Result<WizardStep> {
        let current = self.step();
        self.check_leave(current)?;
        if current == WizardStep::ChooseAnalysis {
            self.run_analysis(backend)?;
        } else if let Some(next) = current.next() {
            self.step = Some(next);
        }
        Ok(self.step())
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step().previous() {
            self.step = Some(previous);
        }
        self.step()
    }

    /// Validate the session and start an analysis request.
    pub fn begin_analysis(&self) -> Result<PendingAnalysis> {
        self.check_leave(WizardStep::Upload)?;
        self.check_leave(WizardStep::MapVariables)?;
        self.check_leave(WizardStep::ChooseAnalysis)?;
        let (Some(dataset), Some(analysis_type)) = (&self.dataset, self.analysis_type) else {
            return Err(CoreError::StepBlocked {
                step: WizardStep::ChooseAnalysis,
                reason: "Please select a statistical analysis type.".to_string(),
            });
        };
        Ok(PendingAnalysis {
            ticket: self.tracker.begin(),
            request: AnalysisRequest::new(dataset.rows.clone(), self.mapping(), analysis_type),
        })
    }

    /// Store the result of `ticket` and move to the results step.
    ///
    /// Returns `false` and drops the result when a newer analysis began or
    /// the session was reset in between.
    pub fn complete_analysis(&mut self, ticket: RequestTicket, result: AnalysisResult) -> bool {
        match self.tracker.accept(ticket, result) {
            Some(result) => {
                self.result = Some(result);
                self.step = Some(WizardStep::Results);
                true
            }
            None => false,
        }
    }

    /// Run the selected analysis synchronously.
    pub fn run_analysis(&mut self, backend: &dyn AnalysisBackend) -> Result<&AnalysisResult> {
        let start = Instant::now();
        let pending = self.begin_analysis()?;
        let result = dispatch(backend, &pending.request);
        self.complete_analysis(pending.ticket, result);
        tracing::debug!(duration_ms = start.elapsed().as_millis(), "wizard analysis finished");
        self.result.as_ref().ok_or_else(|| CoreError::StepBlocked {
            step: WizardStep::ChooseAnalysis,
            reason: "The analysis was superseded.".to_string(),
        })
    }

    /// Start over. Any analysis still in flight will be discarded.
    pub fn reset(&mut self) {
        self.tracker.cancel_all();
        self.step = None;
        self.dataset = None;
        self.assignment = None;
        self.analysis_type = None;
        self.result = None;
        tracing::info!("workflow reset");
    }
}
