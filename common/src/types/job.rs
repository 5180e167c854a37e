use state_machines::state_machine;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Idle,
    Submitting,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Submitting => "submitting",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy)]
enum JobTransition {
    Submit,
    Accept,
    Succeed,
    Fail,
    Reset,
}

impl JobTransition {
    fn as_str(&self) -> &'static str {
        match self {
            JobTransition::Submit => "submit",
            JobTransition::Accept => "accept",
            JobTransition::Succeed => "succeed",
            JobTransition::Fail => "fail",
            JobTransition::Reset => "reset",
        }
    }
}

mod lifecycle {
    use super::state_machine;

    state_machine! {
        name: JobLifecycleMachine,
        initial: Idle,
        states: [Idle, Submitting, Processing, Succeeded, Failed],
        events {
            submit {
                transition: { from: Idle, to: Submitting }
                transition: { from: Failed, to: Submitting }
            }
            accept {
                transition: { from: Submitting, to: Processing }
            }
            succeed {
                transition: { from: Processing, to: Succeeded }
            }
            fail {
                transition: { from: Submitting, to: Failed }
                transition: { from: Processing, to: Failed }
            }
            reset {
                transition: { from: Submitting, to: Idle }
                transition: { from: Processing, to: Idle }
                transition: { from: Succeeded, to: Idle }
                transition: { from: Failed, to: Idle }
            }
        }
    }

    pub(super) fn idle() -> JobLifecycleMachine<(), Idle> {
        JobLifecycleMachine::new(())
    }

    pub(super) fn submitting() -> JobLifecycleMachine<(), Submitting> {
        idle()
            .submit()
            .expect("submit transition from Idle should exist")
    }

    pub(super) fn processing() -> JobLifecycleMachine<(), Processing> {
        submitting()
            .accept()
            .expect("accept transition from Submitting should exist")
    }

    pub(super) fn succeeded() -> JobLifecycleMachine<(), Succeeded> {
        processing()
            .succeed()
            .expect("succeed transition from Processing should exist")
    }

    pub(super) fn failed() -> JobLifecycleMachine<(), Failed> {
        processing()
            .fail()
            .expect("fail transition from Processing should exist")
    }
}

fn invalid_transition(status: &JobStatus, event: JobTransition) -> AppError {
    AppError::Validation(format!(
        "Invalid job transition: {} -> {}",
        status.as_str(),
        event.as_str()
    ))
}

fn compute_next_state(status: &JobStatus, event: JobTransition) -> Result<JobStatus, AppError> {
    use lifecycle::*;
    match (status, event) {
        (JobStatus::Idle, JobTransition::Submit) => idle()
            .submit()
            .map(|_| JobStatus::Submitting)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Failed, JobTransition::Submit) => failed()
            .submit()
            .map(|_| JobStatus::Submitting)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Submitting, JobTransition::Accept) => submitting()
            .accept()
            .map(|_| JobStatus::Processing)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Processing, JobTransition::Succeed) => processing()
            .succeed()
            .map(|_| JobStatus::Succeeded)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Submitting, JobTransition::Fail) => submitting()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Processing, JobTransition::Fail) => processing()
            .fail()
            .map(|_| JobStatus::Failed)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Submitting, JobTransition::Reset) => submitting()
            .reset()
            .map(|_| JobStatus::Idle)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Processing, JobTransition::Reset) => processing()
            .reset()
            .map(|_| JobStatus::Idle)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Succeeded, JobTransition::Reset) => succeeded()
            .reset()
            .map(|_| JobStatus::Idle)
            .map_err(|_| invalid_transition(status, event)),
        (JobStatus::Failed, JobTransition::Reset) => failed()
            .reset()
            .map(|_| JobStatus::Idle)
            .map_err(|_| invalid_transition(status, event)),
        _ => Err(invalid_transition(status, event)),
    }
}

/// One attempt to produce a composite image via the external generation API.
///
/// Lives in memory for the duration of a booth session; durability of the
/// output artifact is delegated to object storage, not this record. Mutated
/// exclusively through the transition methods below, which enforce the
/// lifecycle and the field invariants (`job_id` only after a successful
/// submission, both result URLs together, `error_message` exactly while
/// failed).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct GenerationJob {
    pub id: String,
    pub status: JobStatus,
    pub job_id: Option<String>,
    pub result_url: Option<String>,
    pub download_url: Option<String>,
    pub error_message: Option<String>,
    pub attempt: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Default for GenerationJob {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationJob {
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            status: JobStatus::Idle,
            job_id: None,
            result_url: None,
            download_url: None,
            error_message: None,
            attempt: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }

    /// Enter `submitting` from `idle` (automatic start) or `failed` (retry).
    /// Clears the previous attempt's identifier and diagnostic.
    pub fn begin_attempt(&mut self) -> Result<(), AppError> {
        self.status = compute_next_state(&self.status, JobTransition::Submit)?;
        self.job_id = None;
        self.error_message = None;
        self.result_url = None;
        self.download_url = None;
        self.attempt = self.attempt.saturating_add(1);
        self.touch();
        Ok(())
    }

    /// The external API accepted the submission; record its identifier.
    pub fn record_accepted(&mut self, job_id: String) -> Result<(), AppError> {
        if job_id.trim().is_empty() {
            return Err(AppError::Validation(
                "job identifier must be non-empty".to_string(),
            ));
        }
        self.status = compute_next_state(&self.status, JobTransition::Accept)?;
        self.job_id = Some(job_id);
        self.touch();
        Ok(())
    }

    /// Generation and persistence both completed; both URLs are set together
    /// and only here.
    pub fn record_succeeded(
        &mut self,
        result_url: String,
        download_url: String,
    ) -> Result<(), AppError> {
        self.status = compute_next_state(&self.status, JobTransition::Succeed)?;
        self.result_url = Some(result_url);
        self.download_url = Some(download_url);
        self.error_message = None;
        self.touch();
        Ok(())
    }

    /// Any stage failed; entering `failed` always carries a diagnostic.
    pub fn record_failed(&mut self, message: impl Into<String>) -> Result<(), AppError> {
        self.status = compute_next_state(&self.status, JobTransition::Fail)?;
        let message = message.into();
        self.error_message = Some(if message.trim().is_empty() {
            "generation failed".to_string()
        } else {
            message
        });
        self.touch();
        Ok(())
    }

    /// Hard reset back to a cleared `idle` record. A no-op when already idle.
    pub fn record_reset(&mut self) {
        if let Ok(next) = compute_next_state(&self.status, JobTransition::Reset) {
            self.status = next;
        }
        self.job_id = None;
        self.result_url = None;
        self.download_url = None;
        self.error_message = None;
        self.attempt = 0;
        self.touch();
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, serde::Serialize, PartialEq, Eq)]
pub struct JobSnapshot {
    pub status: JobStatus,
    pub job_id: Option<String>,
    pub error: Option<String>,
    pub result_url: Option<String>,
    pub download_url: Option<String>,
    pub attempt: u32,
}

impl From<&GenerationJob> for JobSnapshot {
    fn from(job: &GenerationJob) -> Self {
        Self {
            status: job.status.clone(),
            job_id: job.job_id.clone(),
            error: job.error_message.clone(),
            result_url: job.result_url.clone(),
            download_url: job.download_url.clone(),
            attempt: job.attempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processing_job() -> GenerationJob {
        let mut job = GenerationJob::new();
        job.begin_attempt().expect("idle -> submitting");
        job.record_accepted("pred-1".to_string())
            .expect("submitting -> processing");
        job
    }

    #[test]
    fn new_job_defaults() {
        let job = GenerationJob::new();
        assert_eq!(job.status, JobStatus::Idle);
        assert!(job.job_id.is_none());
        assert!(job.result_url.is_none());
        assert!(job.download_url.is_none());
        assert!(job.error_message.is_none());
        assert_eq!(job.attempt, 0);
    }

    #[test]
    fn full_success_path() {
        let mut job = processing_job();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.job_id.as_deref(), Some("pred-1"));

        job.record_succeeded(
            "https://storage/x/composite.png".to_string(),
            "/download/x?path=x%2Fcomposite.png".to_string(),
        )
        .expect("processing -> succeeded");
        assert_eq!(job.status, JobStatus::Succeeded);
        assert!(job.result_url.is_some() && job.download_url.is_some());
        assert!(job.error_message.is_none());
    }

    #[test]
    fn submission_failure_leaves_job_id_unset() {
        let mut job = GenerationJob::new();
        job.begin_attempt().expect("idle -> submitting");
        job.record_failed("generation API returned 500")
            .expect("submitting -> failed");

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.job_id.is_none());
        assert_eq!(
            job.error_message.as_deref(),
            Some("generation API returned 500")
        );
    }

    #[test]
    fn failed_always_carries_a_message() {
        let mut job = processing_job();
        job.record_failed("").expect("processing -> failed");
        assert_eq!(job.error_message.as_deref(), Some("generation failed"));
    }

    #[test]
    fn retry_clears_error_and_job_id() {
        let mut job = processing_job();
        job.record_failed("upstream failure")
            .expect("processing -> failed");

        job.begin_attempt().expect("failed -> submitting");
        assert_eq!(job.status, JobStatus::Submitting);
        assert!(job.error_message.is_none());
        assert!(job.job_id.is_none());
        assert_eq!(job.attempt, 2);
    }

    #[test]
    fn reset_clears_everything_from_any_state() {
        let mut job = processing_job();
        job.record_succeeded("url".to_string(), "dl".to_string())
            .expect("processing -> succeeded");

        job.record_reset();
        assert_eq!(job.status, JobStatus::Idle);
        assert!(job.job_id.is_none());
        assert!(job.result_url.is_none());
        assert!(job.download_url.is_none());
        assert!(job.error_message.is_none());
        assert_eq!(job.attempt, 0);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let mut job = GenerationJob::new();
        assert!(job.record_accepted("pred".to_string()).is_err());
        assert!(job.record_succeeded("a".to_string(), "b".to_string()).is_err());
        assert!(job.record_failed("boom").is_err());

        let mut succeeded = processing_job();
        succeeded
            .record_succeeded("a".to_string(), "b".to_string())
            .expect("succeed");
        // A finished job cannot be re-submitted without a reset.
        assert!(succeeded.begin_attempt().is_err());
        assert!(succeeded.record_failed("late").is_err());
    }

    #[test]
    fn empty_job_identifier_is_rejected() {
        let mut job = GenerationJob::new();
        job.begin_attempt().expect("idle -> submitting");
        assert!(job.record_accepted("  ".to_string()).is_err());
        assert_eq!(job.status, JobStatus::Submitting);
    }

    #[test]
    fn status_terminality() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Idle.is_terminal());
        assert!(!JobStatus::Submitting.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }
}
