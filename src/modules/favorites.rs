use crate::modules::listeners::{ListenerId, ListenerSet};
use crate::modules::registry::Product;
use crate::modules::remote_store::BinStoreClient;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

/// User-curated subset of products, persisted as a JSON array in the app
/// data directory. Entries are denormalized copies: the cached `status`
/// field goes stale between refreshes by design, and the registry remains
/// the only authoritative source.
///
/// Mutations are optimistic: the in-memory list changes first, then the
/// file write happens; a write failure is logged and leaves the in-memory
/// change in place with `pending_sync()` raised.
pub struct FavoritesStore {
    liked: Mutex<Vec<Product>>,
    listeners: ListenerSet<()>,
    path: PathBuf,
    remote: Option<BinStoreClient>,
    last_refreshed: StdMutex<Option<DateTime<Utc>>>,
    sync_pending: AtomicBool,
}

impl FavoritesStore {
    pub fn new(path: PathBuf, remote: Option<BinStoreClient>) -> Self {
        Self {
            liked: Mutex::new(Vec::new()),
            listeners: ListenerSet::new(),
            path,
            remote,
            last_refreshed: StdMutex::new(None),
            sync_pending: AtomicBool::new(false),
        }
    }

    /// Loads the persisted favorites. A missing file means an empty set;
    /// malformed contents fail closed to an empty set instead of crashing.
    /// When a remote source is configured the cached statuses are refreshed
    /// right after loading.
    pub async fn load(&self) {
        let loaded: Vec<Product> = match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(liked) => liked,
                Err(e) => {
                    log::error!("Malformed favorites file, starting empty: {}", e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                log::error!("Error loading favorites: {}", e);
                Vec::new()
            }
        };

        let was_empty = loaded.is_empty();
        *self.liked.lock().await = loaded;
        if !was_empty {
            self.refresh_statuses().await;
        }
    }

    /// Snapshot of the stored favorites.
    pub async fn get_all(&self) -> Vec<Product> {
        self.liked.lock().await.clone()
    }

    /// Returns `false` without touching anything when the product is
    /// already a favorite.
    pub async fn add(&self, product: &Product) -> bool {
        {
            let mut liked = self.liked.lock().await;
            if liked.iter().any(|p| p.id == product.id) {
                return false;
            }
            liked.push(product.clone());
            self.persist(&liked);
        }
        self.listeners.emit(&());
        true
    }

    /// Returns `false` without touching anything when the product is not a
    /// favorite.
    pub async fn remove(&self, product: &Product) -> bool {
        {
            let mut liked = self.liked.lock().await;
            let before = liked.len();
            liked.retain(|p| p.id != product.id);
            if liked.len() == before {
                return false;
            }
            self.persist(&liked);
        }
        self.listeners.emit(&());
        true
    }

    /// Re-fetches the authoritative product set and replaces each cached
    /// `status`. A fetch failure is logged and changes nothing; favorites
    /// whose product vanished upstream keep their last known status.
    pub async fn refresh_statuses(&self) {
        let Some(remote) = &self.remote else {
            log::debug!("No remote source configured, skipping favorites refresh");
            return;
        };

        match remote.fetch_products().await {
            Ok(latest) => {
                self.refresh_from(&latest).await;
            }
            Err(e) => {
                log::error!("Error fetching latest product data: {}", e);
            }
        }
    }

    /// Merge step of the refresh: replaces each favorite's cached status
    /// with the one from `latest`, matched by id.
    pub async fn refresh_from(&self, latest: &[Product]) {
        {
            let mut liked = self.liked.lock().await;
            for favorite in liked.iter_mut() {
                if let Some(current) = latest.iter().find(|p| p.id == favorite.id) {
                    favorite.status = current.status;
                }
            }
            self.persist(&liked);
        }
        *self.last_refreshed.lock().unwrap_or_else(|p| p.into_inner()) = Some(Utc::now());
        self.listeners.emit(&());
    }

    /// True when the last file write failed and the on-disk copy lags the
    /// in-memory list.
    pub fn pending_sync(&self) -> bool {
        self.sync_pending.load(Ordering::Relaxed)
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Listeners carry no payload; subscribers re-query `get_all()`.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(move |_: &()| listener())
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }

    fn persist(&self, liked: &[Product]) {
        let result = serde_json::to_string(liked)
            .map_err(|e| format!("Failed to serialize favorites: {}", e))
            .and_then(|json| {
                std::fs::write(&self.path, json)
                    .map_err(|e| format!("Failed to write favorites: {}", e))
            });

        match result {
            Ok(()) => self.sync_pending.store(false, Ordering::Relaxed),
            Err(e) => {
                log::error!("Error saving liked products: {}", e);
                self.sync_pending.store(true, Ordering::Relaxed);
            }
        }
    }
}
