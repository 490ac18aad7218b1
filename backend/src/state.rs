use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::content::{ContentProvider, StaticCatalog};
use crate::services::judge::{LocalJudge, TestJudge};
use crate::services::progress::ProgressEngine;
use crate::services::streak::StreakService;
use crate::store::{AccountStore, MemoryStore, PgStore, ProgressStore, StreakStore};

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    engine: Arc<ProgressEngine>,
    database_connected: bool,
}

impl AppState {
    pub fn new(engine: Arc<ProgressEngine>, database_connected: bool) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            engine,
            database_connected,
        }
    }

    /// Fully in-memory stack: seeded catalog, memory store, local judge.
    /// Used by tests and database-less deployments.
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::new(
            Arc::new(Self::build_engine(
                store.clone(),
                store.clone(),
                store,
                Arc::new(StaticCatalog::solana_curriculum()),
                Arc::new(LocalJudge),
            )),
            false,
        )
    }

    pub fn with_postgres(store: Arc<PgStore>) -> Self {
        Self::new(
            Arc::new(Self::build_engine(
                store.clone(),
                store.clone(),
                store,
                Arc::new(StaticCatalog::solana_curriculum()),
                Arc::new(LocalJudge),
            )),
            true,
        )
    }

    fn build_engine(
        progress: Arc<dyn ProgressStore>,
        streaks: Arc<dyn StreakStore>,
        accounts: Arc<dyn AccountStore>,
        content: Arc<dyn ContentProvider>,
        judge: Arc<dyn TestJudge>,
    ) -> ProgressEngine {
        ProgressEngine::new(
            progress,
            content,
            judge,
            Arc::new(StreakService::new(streaks)),
            accounts,
        )
    }

    pub fn engine(&self) -> Arc<ProgressEngine> {
        Arc::clone(&self.engine)
    }

    pub fn streaks(&self) -> Arc<StreakService> {
        self.engine.streaks()
    }

    pub fn database_connected(&self) -> bool {
        self.database_connected
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }
}
