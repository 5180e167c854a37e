mod config;

pub use config::OrchestratorTuning;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use common::{
    error::AppError,
    types::{
        generation::{GenerationRequest, GenerationStatus, PredictionOutput},
        job::{GenerationJob, JobSnapshot, JobStatus},
    },
};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::services::GenerationServices;

/// Sequences one generation job per booth session: submission, status
/// polling, result persistence, and the terminal transition, exposing a
/// single status plus error message to the presentation layer.
///
/// The orchestrator is the only writer of the job record; the submission
/// client, poller and persister return results which are applied here. Every
/// application is guarded by the attempt epoch, so a response belonging to a
/// superseded attempt (after `retry` or `reset`) is discarded silently.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    services: Arc<dyn GenerationServices>,
    tuning: OrchestratorTuning,
    request: GenerationRequest,
    job: Mutex<GenerationJob>,
    epoch: AtomicU64,
    started: AtomicBool,
}

impl GenerationOrchestrator {
    pub fn new(services: Arc<dyn GenerationServices>, request: GenerationRequest) -> Self {
        Self::with_tuning(services, request, OrchestratorTuning::default())
    }

    pub fn with_tuning(
        services: Arc<dyn GenerationServices>,
        request: GenerationRequest,
        tuning: OrchestratorTuning,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                services,
                tuning,
                request,
                job: Mutex::new(GenerationJob::new()),
                epoch: AtomicU64::new(0),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// Current job state for display.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot::from(&*self.inner.lock_job())
    }

    /// Automatic start trigger. Idempotent: re-evaluating the trigger any
    /// number of times launches at most one attempt; the latch re-arms only
    /// on an explicit `retry` or `reset`. Returns whether an attempt was
    /// launched.
    pub fn start(&self) -> bool {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return false;
        }

        let epoch = {
            let mut job = self.inner.lock_job();
            if job.begin_attempt().is_err() {
                // Not in a startable state; leave the latch set so the
                // trigger cannot fire again without retry/reset.
                return false;
            }
            self.inner.epoch.load(Ordering::SeqCst)
        };

        info!(attempt = self.snapshot().attempt, "starting generation attempt");
        tokio::spawn(run_attempt(Arc::clone(&self.inner), epoch));
        true
    }

    /// User-initiated retry from `failed`: clears the diagnostic and the
    /// stale job identifier, supersedes any in-flight work, and re-enters
    /// the full sequence from submission.
    pub fn retry(&self) -> Result<(), AppError> {
        let epoch = {
            let mut job = self.inner.lock_job();
            if job.status != JobStatus::Failed {
                return Err(AppError::Validation(format!(
                    "retry is only valid from failed, not {}",
                    job.status.as_str()
                )));
            }
            let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            job.begin_attempt()?;
            self.inner.started.store(true, Ordering::SeqCst);
            epoch
        };

        info!(attempt = self.snapshot().attempt, "retrying generation");
        tokio::spawn(run_attempt(Arc::clone(&self.inner), epoch));
        Ok(())
    }

    /// Hard reset back to a cleared `idle` record from any state. Stops the
    /// poll loop (its next liveness check fails) and re-arms the start
    /// latch for the fresh job.
    pub fn reset(&self) {
        let mut job = self.inner.lock_job();
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        job.record_reset();
        self.inner.started.store(false, Ordering::SeqCst);
        debug!("generation job reset");
    }
}

impl Inner {
    fn lock_job(&self) -> std::sync::MutexGuard<'_, GenerationJob> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a transition on behalf of the given attempt. Returns false,
    /// without mutating anything, when the attempt has been superseded or
    /// the transition is no longer legal.
    fn apply(
        &self,
        epoch: u64,
        transition: impl FnOnce(&mut GenerationJob) -> Result<(), AppError>,
    ) -> bool {
        let mut job = self.lock_job();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!("discarding state transition from a superseded attempt");
            return false;
        }
        match transition(&mut job) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "ignoring transition no longer legal for the current state");
                false
            }
        }
    }

    /// Liveness check for the poll loop: the attempt is current and the job
    /// is still processing.
    fn is_live(&self, epoch: u64) -> bool {
        if self.epoch.load(Ordering::SeqCst) != epoch {
            return false;
        }
        self.lock_job().status == JobStatus::Processing
    }
}

/// One full attempt: submit, poll at fixed cadence until terminal, persist,
/// finish. Strictly sequential; the only suspension points are the three
/// boundary calls and the interval timer.
async fn run_attempt(inner: Arc<Inner>, epoch: u64) {
    let receipt = match inner.services.submit(&inner.request).await {
        Ok(receipt) => receipt,
        Err(err) => {
            warn!(error = %err, "generation submission failed");
            inner.apply(epoch, |job| job.record_failed(err.to_string()));
            return;
        }
    };

    if !inner.apply(epoch, |job| job.record_accepted(receipt.id.clone())) {
        return;
    }

    let started_at = Instant::now();
    let mut interval = tokio::time::interval(inner.tuning.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval completes immediately; consume it
    // so the first poll happens one full period after acceptance.
    interval.tick().await;

    let mut consecutive_failures: u32 = 0;

    loop {
        interval.tick().await;

        // Check liveness immediately before dispatching the network call: a
        // superseded or finished job must not be polled.
        if !inner.is_live(epoch) {
            return;
        }

        if started_at.elapsed() >= inner.tuning.max_wait {
            inner.apply(epoch, |job| {
                job.record_failed(format!(
                    "generation timed out after {}s",
                    inner.tuning.max_wait.as_secs()
                ))
            });
            return;
        }

        let response = match inner.services.poll(&receipt.id).await {
            Ok(response) => {
                consecutive_failures = 0;
                response
            }
            Err(err) => {
                consecutive_failures = consecutive_failures.saturating_add(1);
                if consecutive_failures > inner.tuning.max_transient_poll_failures {
                    inner.apply(epoch, |job| job.record_failed(err.to_string()));
                    return;
                }
                warn!(
                    prediction_id = %receipt.id,
                    consecutive_failures,
                    error = %err,
                    "status poll failed; keeping cadence"
                );
                continue;
            }
        };

        match response.status {
            GenerationStatus::Starting
            | GenerationStatus::Processing
            | GenerationStatus::Other(_) => {}
            GenerationStatus::Succeeded => {
                let output_url = response
                    .output
                    .as_ref()
                    .and_then(PredictionOutput::first_url)
                    .map(ToString::to_string);
                let Some(output_url) = output_url else {
                    // A malformed terminal response must not leave the job
                    // stuck in processing.
                    inner.apply(epoch, |job| {
                        job.record_failed(
                            "generation reported success but returned no usable output",
                        )
                    });
                    return;
                };

                // The poll was in flight while retry/reset may have fired;
                // re-check before the persist side effect.
                if !inner.is_live(epoch) {
                    return;
                }

                match inner.services.persist(&output_url).await {
                    Ok(artifact) => {
                        inner.apply(epoch, |job| {
                            job.record_succeeded(
                                artifact.public_url.clone(),
                                artifact.download_url.clone(),
                            )
                        });
                        info!(
                            prediction_id = %receipt.id,
                            image_id = %artifact.image_id,
                            "generation attempt succeeded"
                        );
                    }
                    Err(err) => {
                        // Generation itself succeeded; the artifact may be
                        // unrecoverable without re-running it.
                        error!(
                            prediction_id = %receipt.id,
                            output_url = %output_url,
                            error = %err,
                            "persisting the generated artifact failed"
                        );
                        inner.apply(epoch, |job| job.record_failed(err.to_string()));
                    }
                }
                return;
            }
            GenerationStatus::Failed => {
                let message = response
                    .error
                    .unwrap_or_else(|| "Generation failed".to_string());
                inner.apply(epoch, |job| job.record_failed(message));
                return;
            }
            GenerationStatus::Canceled => {
                inner.apply(epoch, |job| {
                    job.record_failed("generation was canceled upstream")
                });
                return;
            }
        }
    }
}
