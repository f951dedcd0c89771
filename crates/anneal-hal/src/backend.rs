//! The annealer backend trait.
//!
//! ```text
//!   submit() ──→ status() ... status() ──→ result()
//!                 └── wait() polls at poll_interval() ──┘
//! ```
//!
//! | Method | Kind | Required | Returns |
//! |--------|------|----------|---------|
//! | `name()` | sync | yes | `&str` |
//! | `solver()` | sync | yes | `&SolverDescriptor` |
//! | `submit()` | async | yes | `HalResult<JobId>` |
//! | `status()` | async | yes | `HalResult<JobStatus>` |
//! | `result()` | async | yes | `HalResult<AnnealBuffer>` |
//! | `poll_interval()` | sync | provided | `Duration` |
//! | `poll_timeout()` | sync | provided | `Option<Duration>` |
//! | `wait()` | async | provided | `HalResult<AnnealBuffer>` |
//! | `execute()` | async | provided | `HalResult<AnnealBuffer>` |

use std::time::Duration;

use anneal_ir::Kernel;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::AnnealBuffer;
use crate::solver::SolverDescriptor;

/// Default delay between two status requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Trait for annealing backends.
///
/// `wait()` only sleeps between two status requests: a job reported as
/// `PENDING`, `PENDING`, `COMPLETED` costs exactly three `status()` calls.
/// Dropping the future returned by `wait()` stops polling.
#[async_trait]
pub trait Annealer: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// The solver jobs are sent to.
    fn solver(&self) -> &SolverDescriptor;

    /// Submit one kernel for annealing.
    ///
    /// `bindings` supplies values for the kernel's symbolic parameters.
    async fn submit(
        &self,
        kernels: &[Kernel],
        bindings: Option<&FxHashMap<String, f64>>,
    ) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the decoded result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<AnnealBuffer>;

    /// Delay between two status requests.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Upper bound on the total wait; `None` polls until a terminal status.
    fn poll_timeout(&self) -> Option<Duration> {
        None
    }

    /// Poll until the job is terminal and return its result.
    async fn wait(&self, job_id: &JobId) -> HalResult<AnnealBuffer> {
        use tokio::time::{Instant, sleep};

        let started = Instant::now();
        let interval = self.poll_interval();
        let timeout = self.poll_timeout();
        let mut polls: u64 = 0;

        loop {
            let status = self.status(job_id).await?;
            polls += 1;

            match status {
                JobStatus::Completed => {
                    debug!(job = %job_id, polls, "job completed");
                    return self.result(job_id).await;
                }
                JobStatus::Failed(_) | JobStatus::Cancelled => {
                    return Err(HalError::RemoteExecution {
                        status: status.as_remote(),
                    });
                }
                JobStatus::Pending | JobStatus::InProgress | JobStatus::Unknown(_) => {
                    if let Some(limit) = timeout {
                        if started.elapsed() + interval > limit {
                            return Err(HalError::Timeout(job_id.0.clone()));
                        }
                    }
                    sleep(interval).await;
                }
            }
        }
    }

    /// Submit a kernel and wait for its result.
    async fn execute(
        &self,
        kernels: &[Kernel],
        bindings: Option<&FxHashMap<String, f64>>,
    ) -> HalResult<AnnealBuffer> {
        let job_id = self.submit(kernels, bindings).await?;
        self.wait(&job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::HardwareTopology;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replays a fixed status sequence.
    struct Scripted {
        solver: SolverDescriptor,
        statuses: Mutex<Vec<JobStatus>>,
        status_calls: AtomicUsize,
        timeout: Option<Duration>,
    }

    impl Scripted {
        fn new(mut statuses: Vec<JobStatus>) -> Self {
            statuses.reverse();
            Self {
                solver: SolverDescriptor::new("scripted", HardwareTopology::full(2)),
                statuses: Mutex::new(statuses),
                status_calls: AtomicUsize::new(0),
                timeout: None,
            }
        }
    }

    #[async_trait]
    impl Annealer for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn solver(&self) -> &SolverDescriptor {
            &self.solver
        }

        async fn submit(
            &self,
            _kernels: &[Kernel],
            _bindings: Option<&FxHashMap<String, f64>>,
        ) -> HalResult<JobId> {
            Ok(JobId::new("job"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            let mut statuses = self.statuses.lock().unwrap();
            Ok(statuses.pop().unwrap_or(JobStatus::Pending))
        }

        async fn result(&self, _job_id: &JobId) -> HalResult<AnnealBuffer> {
            Ok(AnnealBuffer::new("scripted", vec![0, 1]))
        }

        fn poll_timeout(&self) -> Option<Duration> {
            self.timeout
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_completed() {
        let backend = Scripted::new(vec![
            JobStatus::Pending,
            JobStatus::Pending,
            JobStatus::Completed,
        ]);
        let buffer = backend.wait(&JobId::new("job")).await.unwrap();
        assert_eq!(buffer.solver, "scripted");
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_failed_status() {
        let backend = Scripted::new(vec![
            JobStatus::InProgress,
            JobStatus::Failed("h out of range".into()),
        ]);
        let err = backend.wait(&JobId::new("job")).await.unwrap_err();
        assert!(matches!(
            err,
            HalError::RemoteExecution { ref status } if status == "FAILED: h out of range"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_unknown_status_keeps_polling() {
        let backend = Scripted::new(vec![
            JobStatus::Unknown("WEIRD".into()),
            JobStatus::Completed,
        ]);
        backend.wait(&JobId::new("job")).await.unwrap();
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout() {
        let mut backend = Scripted::new(vec![]);
        backend.timeout = Some(Duration::from_millis(350));
        let err = backend.wait(&JobId::new("job")).await.unwrap_err();
        assert!(matches!(err, HalError::Timeout(_)));
        assert_eq!(backend.status_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_submits_then_waits() {
        let backend = Scripted::new(vec![JobStatus::Completed]);
        let buffer = backend.execute(&[], None).await.unwrap();
        assert_eq!(buffer.active_variables, vec![0, 1]);
    }
}
