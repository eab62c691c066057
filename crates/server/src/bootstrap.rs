use std::sync::Arc;

use demogenie_agent::{GenerationSettings, LlmClient, LlmError, OpenAiChatClient, PrepBriefGenerator};
use demogenie_core::config::{AppConfig, ConfigError, LlmConfig, LoadOptions};
use demogenie_db::{connect_with_config, migrations, DbPool, DemoSeedDataset, RepositoryError};
use thiserror::Error;
use tracing::info;

use crate::booking::BookingService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<BookingService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("demo seed failed: {0}")]
    Seed(#[source] RepositoryError),
    #[error("completion client setup failed: {0}")]
    LlmClient(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    if config.database.seed_demo_data {
        let seeded = DemoSeedDataset::load(&db_pool).await.map_err(BootstrapError::Seed)?;
        info!(
            event_name = "system.bootstrap.demo_seed",
            correlation_id = "bootstrap",
            skipped = seeded.skipped,
            aes_seeded = seeded.aes_seeded,
            bookings_seeded = seeded.bookings_seeded.len(),
            "demo data seed evaluated"
        );
    }

    let generator = Arc::new(brief_generator(&config.llm)?);
    let service = Arc::new(BookingService::with_pool(db_pool.clone(), generator));

    Ok(Application { config, db_pool, service })
}

/// Without a credential the generator stays on the template path.
fn brief_generator(llm: &LlmConfig) -> Result<PrepBriefGenerator, BootstrapError> {
    let settings = GenerationSettings::from(llm);
    let client = OpenAiChatClient::from_config(llm).map_err(BootstrapError::LlmClient)?;

    info!(
        event_name = "system.bootstrap.brief_generator",
        correlation_id = "bootstrap",
        ai_enabled = client.is_some(),
        model = %settings.model,
        "prep brief generator configured"
    );

    Ok(PrepBriefGenerator::new(client.map(|client| Arc::new(client) as Arc<dyn LlmClient>), settings))
}
