//! Application state shared across handlers

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::{
    auth::{JwtGenerator, PasswordHasher},
    config::Config,
    error::Result,
    grading::{ChatCompletionAdvisor, GradeAdvisor},
    middleware::JwtAuth,
    notifications::{LogPublisher, NotificationPublisher, RedisPublisher},
    repository::{AssignmentRepository, GradeRepository, UserRepository},
};

/// Everything a request handler needs
///
/// Cloning is cheap: pools and collaborators are reference counted.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    pool: SqlitePool,
    pub users: UserRepository,
    pub assignments: AssignmentRepository,
    pub grades: GradeRepository,
    pub hasher: PasswordHasher,
    pub tokens: JwtGenerator,
    pub jwt: JwtAuth,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub advisor: Arc<dyn GradeAdvisor>,
}

impl AppState {
    /// Create a builder for the application state
    pub fn builder(config: Config, pool: SqlitePool) -> AppStateBuilder {
        AppStateBuilder::new(config, pool)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Builder for [`AppState`]
///
/// Collaborators not set explicitly are derived from the configuration:
/// a Redis publisher when `redis` is configured (log-only otherwise) and a
/// chat-completions grade advisor.
pub struct AppStateBuilder {
    config: Config,
    pool: SqlitePool,
    hasher: Option<PasswordHasher>,
    publisher: Option<Arc<dyn NotificationPublisher>>,
    advisor: Option<Arc<dyn GradeAdvisor>>,
}

impl AppStateBuilder {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        Self {
            config,
            pool,
            hasher: None,
            publisher: None,
            advisor: None,
        }
    }

    /// Set the password hasher
    pub fn hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the new-assignment notice publisher
    pub fn publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set the grade advisor
    pub fn advisor(mut self, advisor: Arc<dyn GradeAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Build the state, connecting to Redis if needed
    pub async fn build(self) -> Result<AppState> {
        let config = self.config;
        let total_pages = config.pagination.total_pages;

        let publisher: Arc<dyn NotificationPublisher> = match (self.publisher, &config.redis) {
            (Some(publisher), _) => publisher,
            (None, Some(redis)) => Arc::new(RedisPublisher::connect(redis).await?),
            (None, None) => {
                tracing::warn!("No Redis configured, new assignment notices will only be logged");
                Arc::new(LogPublisher)
            }
        };

        let advisor = self
            .advisor
            .unwrap_or_else(|| Arc::new(ChatCompletionAdvisor::new(&config.grading)));

        Ok(AppState {
            users: UserRepository::new(self.pool.clone()),
            assignments: AssignmentRepository::new(self.pool.clone(), total_pages),
            grades: GradeRepository::new(self.pool.clone(), total_pages),
            hasher: self.hasher.unwrap_or_default(),
            tokens: JwtGenerator::new(&config.jwt)?,
            jwt: JwtAuth::new(&config.jwt)?,
            publisher,
            advisor,
            pool: self.pool,
            config: Arc::new(config),
        })
    }
}
