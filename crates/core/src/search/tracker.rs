//! Search job tracking
//!
//! `JobTracker` reads job snapshots and turns repeated reads into a
//! [`PollSequence`]: a lazy, cancellable stream that ends at the first
//! terminal snapshot or when its timeout elapses.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use risma_domain::{
    ClientError, JobId, JobStatus, PollingConfig, RequestStep, Result, SearchJob,
};
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::ports::SearchBackend;

// Stand-in deadline for durations too large to add to `Instant::now()`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Reads, classifies and polls search jobs
pub struct JobTracker {
    backend: Arc<dyn SearchBackend>,
    polling: PollingConfig,
}

impl JobTracker {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend, polling: PollingConfig::default() }
    }

    /// Use `polling` as the defaults for [`wait_for_completion`](Self::wait_for_completion)
    #[must_use]
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Fetch and classify the current snapshot of `job_id`.
    ///
    /// # Errors
    /// `UnknownStatus` for a status outside the known set; remote and
    /// network failures tagged `job-fetch`.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn fetch(&self, job_id: JobId) -> Result<SearchJob> {
        fetch_snapshot(self.backend.as_ref(), job_id).await
    }

    /// Map a wire status onto the known set.
    ///
    /// # Errors
    /// `ClientError::UnknownStatus` for anything else.
    pub fn classify(status: &str) -> Result<JobStatus> {
        JobStatus::classify(status)
    }

    /// Check that `next` may follow `prev`.
    ///
    /// # Errors
    /// `ClientError::ProtocolViolation` for a regression or any change
    /// after a terminal status.
    pub fn validate_transition(prev: JobStatus, next: JobStatus) -> Result<()> {
        if prev.can_transition_to(next) {
            Ok(())
        } else {
            Err(ClientError::ProtocolViolation(format!(
                "job status went from '{prev}' to '{next}'"
            )))
        }
    }

    /// Ask the service to stop `job_id`.
    ///
    /// # Errors
    /// Remote and network failures tagged `job-cancel`.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn cancel(&self, job_id: JobId) -> Result<()> {
        self.backend
            .cancel_search_job(job_id)
            .await
            .map_err(|err| err.at_step(RequestStep::JobCancel))?;
        info!("Search job cancelled");
        Ok(())
    }

    /// Lazily poll `job_id` every `interval` for at most `timeout`.
    ///
    /// The first fetch happens on the first `next()`. Nothing runs until the
    /// stream is polled, and every call starts an independent sequence.
    pub fn poll(&self, job_id: JobId, interval: Duration, timeout: Duration) -> PollSequence {
        let token = CancellationToken::new();
        let state = PollState {
            backend: Arc::clone(&self.backend),
            job_id,
            interval,
            timeout,
            deadline: None,
            token: token.clone(),
            last: None,
            done: false,
        };

        PollSequence { inner: stream::unfold(state, next_snapshot).boxed(), token }
    }

    /// Poll with the configured defaults until a terminal snapshot.
    ///
    /// Returns the last snapshot seen, which is non-terminal if the timeout
    /// elapsed first.
    ///
    /// # Errors
    /// The first error the sequence yields, or `Network` (step `job-fetch`)
    /// if the timeout elapsed before any snapshot arrived.
    #[instrument(skip(self), fields(job_id = %job_id))]
    pub async fn wait_for_completion(&self, job_id: JobId) -> Result<SearchJob> {
        let mut sequence = self.poll(job_id, self.polling.interval(), self.polling.timeout());
        let mut last = None;

        while let Some(snapshot) = sequence.next().await {
            last = Some(snapshot?);
        }

        match last {
            Some(job) => {
                if !job.is_terminal() {
                    warn!(status = %job.status, "Gave up waiting for search job");
                }
                Ok(job)
            }
            None => Err(ClientError::network(format!("timed out waiting for job {job_id}"))
                .at_step(RequestStep::JobFetch)),
        }
    }
}

async fn fetch_snapshot(backend: &dyn SearchBackend, job_id: JobId) -> Result<SearchJob> {
    let record = backend
        .fetch_search_job(job_id)
        .await
        .map_err(|err| err.at_step(RequestStep::JobFetch))?;
    SearchJob::try_from(record)
}

/// Cancellable stream of job snapshots returned by [`JobTracker::poll`].
///
/// Yields `Ok` snapshots until one is terminal, then ends. An error (fetch
/// failure, unknown status, state regression) is yielded once and ends the
/// sequence. Reaching the timeout ends it without an item. After
/// [`cancel`](Self::cancel), or once the stream is dropped, no further fetch
/// is started and an in-flight one is abandoned.
pub struct PollSequence {
    inner: BoxStream<'static, Result<SearchJob>>,
    token: CancellationToken,
}

impl PollSequence {
    /// Stop the sequence. Subsequent `next()` calls return `None`.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that cancels this sequence, for handing to another task
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Stream for PollSequence {
    type Item = Result<SearchJob>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.token.is_cancelled() {
            return Poll::Ready(None);
        }
        this.inner.poll_next_unpin(cx)
    }
}

impl std::fmt::Debug for PollSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollSequence").field("cancelled", &self.is_cancelled()).finish()
    }
}

struct PollState {
    backend: Arc<dyn SearchBackend>,
    job_id: JobId,
    interval: Duration,
    timeout: Duration,
    // Set on the first poll so an unpolled sequence does not age.
    deadline: Option<Instant>,
    token: CancellationToken,
    last: Option<JobStatus>,
    done: bool,
}

fn instant_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or_else(|| now + FAR_FUTURE)
}

async fn next_snapshot(mut state: PollState) -> Option<(Result<SearchJob>, PollState)> {
    if state.done || state.token.is_cancelled() {
        return None;
    }

    let deadline = match state.deadline {
        Some(deadline) => {
            let wake = instant_after(state.interval).min(deadline);
            tokio::select! {
                biased;
                () = state.token.cancelled() => return None,
                () = sleep_until(wake) => {}
            }
            deadline
        }
        None => {
            let deadline = instant_after(state.timeout);
            state.deadline = Some(deadline);
            deadline
        }
    };

    if Instant::now() >= deadline {
        debug!(job_id = %state.job_id, "Polling timed out");
        return None;
    }

    let fetched = tokio::select! {
        biased;
        () = state.token.cancelled() => return None,
        fetched = timeout_at(deadline, fetch_snapshot(state.backend.as_ref(), state.job_id)) => fetched,
    };

    let Ok(result) = fetched else {
        debug!(job_id = %state.job_id, "Polling timed out during fetch");
        return None;
    };

    let item = result.and_then(|job| {
        if let Some(prev) = state.last {
            JobTracker::validate_transition(prev, job.status)?;
        }
        Ok(job)
    });

    match &item {
        Ok(job) => {
            debug!(job_id = %job.id, status = %job.status, "Polled search job");
            state.last = Some(job.status);
            state.done = job.is_terminal();
        }
        Err(err) => {
            warn!(job_id = %state.job_id, error = %err, "Polling stopped");
            state.done = true;
        }
    }

    Some((item, state))
}
