use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, RepositoryKind},
    db::{PgRepository, Repository},
    memory::MemoryRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn Repository> = match config.repository {
            RepositoryKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is required for the postgres repository")?;
                let pg = PgRepository::connect(url).await?;
                pg.migrate().await?;
                info!("connected to postgres, migrations applied");
                Arc::new(pg)
            }
            RepositoryKind::Memory => {
                warn!("using in-memory repository; data is lost on shutdown");
                Arc::new(MemoryRepository::new())
            }
        };
        Ok(Self::from_parts(repo, Arc::new(config)))
    }

    pub fn from_parts(repo: Arc<dyn Repository>, config: Arc<AppConfig>) -> Self {
        Self { repo, config }
    }

    /// Memory-backed state with test JWT settings.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(MemoryRepository::new()),
            Arc::new(AppConfig::for_tests()),
        )
    }
}
