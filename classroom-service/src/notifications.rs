//! New-assignment notices
//!
//! When a student submits work, every teacher is told about it through a
//! publish/subscribe channel. A mail relay subscribed to that channel does the
//! actual emailing. Without a Redis section in the configuration the notice is
//! only logged.

use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config as DeadpoolConfig, Pool, Runtime};
use serde::Serialize;

use crate::config::RedisConfig;
use crate::error::{Error, Result};
use crate::models::{Assignment, User};

/// Mailbox domain substituted for real recipients outside production
pub const TEST_MAILBOX_DOMAIN: &str = "yopmail.com";

/// Payload published when an assignment is submitted
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAssignmentNotice {
    pub emails: Vec<String>,
    pub assignment: Assignment,
    pub student: User,
}

impl NewAssignmentNotice {
    /// Build a notice addressed to `teachers`
    ///
    /// With `production == false` each address keeps its local part and is
    /// moved to the test mailbox domain.
    pub fn new(teachers: &[User], assignment: Assignment, production: bool) -> Self {
        let emails = teachers
            .iter()
            .map(|teacher| {
                if production {
                    teacher.email.clone()
                } else {
                    to_test_mailbox(&teacher.email)
                }
            })
            .collect();
        let student = assignment.student.clone();

        Self {
            emails,
            assignment,
            student,
        }
    }
}

fn to_test_mailbox(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    format!("{local}@{TEST_MAILBOX_DOMAIN}")
}

/// Sink for new-assignment notices
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, notice: &NewAssignmentNotice) -> Result<()>;
}

/// Publishes notices as JSON on a Redis channel
#[derive(Clone)]
pub struct RedisPublisher {
    pool: Pool,
    channel: String,
}

impl RedisPublisher {
    /// Build the connection pool and check that Redis answers
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let pool = DeadpoolConfig::from_url(&config.url)
            .builder()
            .map_err(|e| Error::Internal(format!("Failed to build Redis pool: {}", e)))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create Redis pool: {}", e)))?;

        let conn = pool
            .get()
            .await
            .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {}", e)))?;
        drop(conn);

        tracing::info!(
            channel = %config.channel,
            max_connections = config.max_connections,
            "Redis publisher ready"
        );

        Ok(Self {
            pool,
            channel: config.channel.clone(),
        })
    }
}

#[async_trait]
impl NotificationPublisher for RedisPublisher {
    async fn publish(&self, notice: &NewAssignmentNotice) -> Result<()> {
        let payload = serde_json::to_string(notice)
            .map_err(|e| Error::Internal(format!("Failed to encode notice: {}", e)))?;

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| Error::Internal(format!("Failed to get Redis connection: {}", e)))?;

        let receivers: i64 = conn.publish(&self.channel, payload).await?;
        tracing::debug!(
            channel = %self.channel,
            receivers,
            assignment_id = notice.assignment.id,
            "Published new assignment notice"
        );
        Ok(())
    }
}

/// Logs notices instead of publishing them
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl NotificationPublisher for LogPublisher {
    async fn publish(&self, notice: &NewAssignmentNotice) -> Result<()> {
        tracing::info!(
            assignment_id = notice.assignment.id,
            student_id = notice.student.id,
            recipients = notice.emails.len(),
            "New assignment notice (no Redis configured)"
        );
        Ok(())
    }
}

/// Publish and swallow failures
///
/// Submission has already succeeded when this runs.
pub async fn notify(publisher: &dyn NotificationPublisher, notice: &NewAssignmentNotice) {
    if let Err(e) = publisher.publish(notice).await {
        tracing::warn!(
            assignment_id = notice.assignment.id,
            error = %e,
            "Failed to publish new assignment notice"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every published notice in memory
    #[derive(Default)]
    pub(crate) struct RecordingPublisher {
        pub(crate) notices: Mutex<Vec<NewAssignmentNotice>>,
    }

    #[async_trait]
    impl NotificationPublisher for RecordingPublisher {
        async fn publish(&self, notice: &NewAssignmentNotice) -> Result<()> {
            self.notices.lock().unwrap().push(notice.clone());
            Ok(())
        }
    }

    /// Always fails
    pub(crate) struct BrokenPublisher;

    #[async_trait]
    impl NotificationPublisher for BrokenPublisher {
        async fn publish(&self, _notice: &NewAssignmentNotice) -> Result<()> {
            Err(Error::Internal("channel closed".to_string()))
        }
    }
}
