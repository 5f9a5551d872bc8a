use std::{future::Future, time::Duration};

use backon::{BackoffBuilder, ConstantBuilder, Sleeper, TokioSleeper};
use tokio_util::sync::CancellationToken;

use super::errors::{ApiClientError, JobError};
use super::models::Project;
use super::types::ProjectStatus;

/// Callback receiving the status string observed on every fetch.
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Anything that can report the current state of a project.
pub trait ProjectSource {
    fn fetch_project(
        &self,
        project_id: &str,
    ) -> impl Future<Output = Result<Project, ApiClientError>> + Send;
}

/// Bounds for a single poll invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl PollPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

    /// # Errors
    ///
    /// Will return `Err` if `interval` is zero or `max_attempts` is
    /// zero.
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self, ApiClientError> {
        if interval.is_zero() {
            return Err(ApiClientError::InvalidPollPolicy(
                "interval must be positive",
            ));
        }
        if max_attempts == 0 {
            return Err(ApiClientError::InvalidPollPolicy(
                "max attempts must be at least 1",
            ));
        }
        Ok(Self {
            interval,
            max_attempts,
        })
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    // One wait between each pair of fetches, none after the last one.
    fn schedule(&self) -> impl Iterator<Item = Duration> {
        ConstantBuilder::default()
            .with_delay(self.interval)
            .with_max_times(usize::try_from(self.max_attempts - 1).unwrap_or(usize::MAX))
            .build()
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PollState {
    Polling { attempt: u32 },
    Completed(Project),
    Failed(String),
    TimedOut { attempts: u32 },
}

pub struct JobPoller<'a, S, T = TokioSleeper> {
    source: &'a S,
    sleeper: T,
    policy: PollPolicy,
    cancel: Option<CancellationToken>,
}

impl<'a, S: ProjectSource> JobPoller<'a, S> {
    pub const fn new(source: &'a S, policy: PollPolicy) -> Self {
        Self {
            source,
            sleeper: TokioSleeper,
            policy,
            cancel: None,
        }
    }
}

impl<'a, S: ProjectSource, T: Sleeper> JobPoller<'a, S, T> {
    pub fn with_sleeper<U: Sleeper>(self, sleeper: U) -> JobPoller<'a, S, U> {
        JobPoller {
            source: self.source,
            sleeper,
            policy: self.policy,
            cancel: self.cancel,
        }
    }

    /// Stop between attempts once `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// # Errors
    ///
    /// Returns [`JobError::Failed`] when the project reports `Failed`,
    /// [`JobError::TimedOut`] once every attempt observed a non-terminal
    /// status, [`ApiClientError::Cancelled`] when cancelled, and any
    /// transport error of a fetch unchanged.
    pub async fn poll_until_complete(
        &self,
        project_id: &str,
        mut on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<Project, ApiClientError> {
        let mut schedule = self.policy.schedule();
        let mut state = PollState::Polling { attempt: 1 };

        loop {
            state = match state {
                PollState::Polling { attempt } => {
                    if self.is_cancelled() {
                        return Err(ApiClientError::Cancelled);
                    }

                    let project = self.source.fetch_project(project_id).await?;
                    log::debug!(
                        "Project {project_id} attempt {attempt}/{}: status={:?} progress={:?}",
                        self.policy.max_attempts,
                        project.status,
                        project.progress
                    );

                    if let Some(callback) = on_progress.as_deref_mut() {
                        callback(project.status_label());
                    }

                    match project.status() {
                        ProjectStatus::Completed => PollState::Completed(project),
                        ProjectStatus::Failed => PollState::Failed(
                            project
                                .error_message()
                                .unwrap_or("unknown failure")
                                .to_owned(),
                        ),
                        ProjectStatus::Pending(_) => match schedule.next() {
                            Some(delay) => {
                                self.wait(delay).await?;
                                PollState::Polling {
                                    attempt: attempt + 1,
                                }
                            }
                            None => PollState::TimedOut { attempts: attempt },
                        },
                    }
                }
                PollState::Completed(project) => return Ok(project),
                PollState::Failed(message) => return Err(JobError::Failed(message).into()),
                PollState::TimedOut { attempts } => {
                    return Err(JobError::TimedOut { attempts }.into())
                }
            };
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    async fn wait(&self, delay: Duration) -> Result<(), ApiClientError> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(ApiClientError::Cancelled),
                _ = self.sleeper.sleep(delay) => Ok(()),
            },
            None => {
                self.sleeper.sleep(delay).await;
                Ok(())
            }
        }
    }
}
