use std::sync::Arc;

use tracing::info;

use shared_config::{AppConfig, StoreBackend};

use crate::memory::InMemoryStore;
use crate::store::{AppointmentStore, DirectoryStore};
use crate::supabase::SupabaseStore;

/// Router state shared by every cell: configuration plus the two stores.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<dyn DirectoryStore>,
    pub appointments: Arc<dyn AppointmentStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        directory: Arc<dyn DirectoryStore>,
        appointments: Arc<dyn AppointmentStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            directory,
            appointments,
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(config, store.clone(), store)
    }

    pub fn supabase(config: AppConfig) -> Self {
        let store = Arc::new(SupabaseStore::new(&config));
        Self::new(config, store.clone(), store)
    }

    pub fn from_config(config: AppConfig) -> Self {
        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory store");
                Self::in_memory(config)
            }
            StoreBackend::Supabase => {
                info!("Using Supabase store at {}", config.supabase_url);
                Self::supabase(config)
            }
        }
    }
}
