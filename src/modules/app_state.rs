use crate::modules::config::AppConfig;
use crate::modules::favorites::FavoritesStore;
use crate::modules::progress::ProgressTracker;
use crate::modules::registry::ProductRegistry;
use crate::modules::remote_store::BinStoreClient;
use crate::modules::report::ReportDesk;
use crate::modules::shopping_list::ListStore;
use anyhow::Context;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Owns every store for one app session. Constructed once at startup; the
/// UI layer holds it and hands `Arc` clones of the stores to its screens.
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<ProductRegistry>,
    pub progress: Arc<ProgressTracker>,
    pub favorites: Arc<FavoritesStore>,
    pub lists: Arc<ListStore>,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(crate::modules::config::load_config()).await
    }

    pub async fn with_config(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = config.data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Could not create data directory {}", data_dir.display()))?;

        let remote = BinStoreClient::new(&config.api_url(), &config.master_key)
            .map_err(anyhow::Error::msg)?;

        let registry = Arc::new(ProductRegistry::new(Some(remote.clone())));
        let progress = Arc::new(ProgressTracker::new());
        let favorites = Arc::new(FavoritesStore::new(
            data_dir.join("liked_products.json"),
            Some(remote),
        ));
        let lists = Arc::new(ListStore::new(data_dir.join("lists.json")));

        favorites.load().await;
        lists.load().await;
        registry.initialize().await;

        let state = Self {
            config,
            registry,
            progress,
            favorites,
            lists,
        };

        // Start background reconciliation task
        let registry_clone = Arc::clone(&state.registry);
        let favorites_clone = Arc::clone(&state.favorites);
        let period = state.config.refresh_interval_secs.max(1);
        tokio::spawn(async move {
            Self::background_refresh(registry_clone, favorites_clone, period).await;
        });

        log::info!("Shelfmate core initialized");
        Ok(state)
    }

    pub fn report_desk(&self) -> ReportDesk {
        ReportDesk::new(Arc::clone(&self.registry), Arc::clone(&self.progress))
    }

    /// Periodically re-fetches the registry and reconciles the cached
    /// favorite statuses against it. Staleness between ticks is tolerated.
    async fn background_refresh(
        registry: Arc<ProductRegistry>,
        favorites: Arc<FavoritesStore>,
        period_secs: u64,
    ) {
        let mut timer = interval(Duration::from_secs(period_secs));
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick fires immediately and initialize() already ran
        timer.tick().await;

        loop {
            timer.tick().await;
            futures::join!(registry.initialize(), favorites.refresh_statuses());
        }
    }
}
