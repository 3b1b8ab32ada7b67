// src/session.rs
//! Per-student grading session: `Idle → Graded → Idle`.

use crate::error::GradeError;
use crate::grade::{grade, FinalReport, GradeOptions};
use crate::table::Table;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("submission already graded; resubmit to grade again")]
    AlreadyGraded,
    #[error(transparent)]
    Grade(#[from] GradeError),
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Graded(Arc<FinalReport>),
}

#[derive(Debug, Clone)]
struct Attempt {
    report: Arc<FinalReport>,
    submission: Table,
}

#[derive(Debug, Default)]
pub struct GradingSession {
    state: SessionState,
    current: Option<Table>,
    previous: Option<Attempt>,
}

impl GradingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_graded(&self) -> bool {
        matches!(self.state, SessionState::Graded(_))
    }

    /// The current report, while in `Graded`.
    pub fn report(&self) -> Option<&Arc<FinalReport>> {
        match &self.state {
            SessionState::Graded(report) => Some(report),
            SessionState::Idle => None,
        }
    }

    pub fn previous_report(&self) -> Option<&Arc<FinalReport>> {
        self.previous.as_ref().map(|a| &a.report)
    }

    pub fn previous_submission(&self) -> Option<&Table> {
        self.previous.as_ref().map(|a| &a.submission)
    }

    /// Grade a submission. Only allowed from `Idle`. A failed attempt leaves
    /// the session in `Idle` with nothing stored.
    pub fn submit(
        &mut self,
        truth: &Table,
        submitted: Table,
        opts: &GradeOptions,
    ) -> Result<Arc<FinalReport>, SessionError> {
        if self.is_graded() {
            return Err(SessionError::AlreadyGraded);
        }
        let report = Arc::new(grade(truth, &submitted, opts)?);
        self.current = Some(submitted);
        self.state = SessionState::Graded(Arc::clone(&report));
        info!("session graded");
        Ok(report)
    }

    /// Go back to `Idle` so a corrected file can be submitted. The attempt
    /// just left becomes the previous one. No-op when already `Idle`.
    pub fn resubmit(&mut self) {
        match std::mem::take(&mut self.state) {
            SessionState::Graded(report) => {
                if let Some(submission) = self.current.take() {
                    self.previous = Some(Attempt { report, submission });
                }
                debug!("session reset for resubmission");
            }
            SessionState::Idle => {}
        }
    }
}
