use crate::modules::listeners::{ListenerId, ListenerSet};
use crate::modules::remote_store::BinStoreClient;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Available,
    #[serde(rename = "Not available")]
    NotAvailable,
    Expired,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::NotAvailable => write!(f, "Not available"),
            Self::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub title: String,
    pub price: f64,
    pub image: String,
    pub description: String,
    pub category: String,
    pub status: ProductStatus,
}

/// Authoritative in-memory product collection. Constructed once and shared
/// behind an `Arc`; every screen-facing consumer queries it and subscribes
/// to `products_updated` notifications instead of keeping its own copy.
///
/// With `remote: Some(..)` the registry mirrors a remote bin (fetch on
/// initialize, PUT on every mutation); with `remote: None` it runs
/// local-only from the built-in seed catalogue.
pub struct ProductRegistry {
    products: Mutex<IndexMap<u32, Product>>,
    listeners: ListenerSet<Vec<Product>>,
    remote: Option<BinStoreClient>,
}

impl ProductRegistry {
    pub fn new(remote: Option<BinStoreClient>) -> Self {
        Self {
            products: Mutex::new(IndexMap::new()),
            listeners: ListenerSet::new(),
            remote,
        }
    }

    /// Populates the collection. Remote-backed: fetches the bin and fully
    /// replaces local contents on success (safe to call repeatedly, each
    /// call re-fetches). On fetch failure the error is logged; an empty
    /// registry falls back to the seed catalogue, a populated one keeps its
    /// prior state untouched.
    pub async fn initialize(&self) {
        match &self.remote {
            Some(remote) => match remote.fetch_products().await {
                Ok(fetched) => {
                    let snapshot = {
                        let mut guard = self.products.lock().await;
                        guard.clear();
                        for product in fetched {
                            guard.insert(product.id, product);
                        }
                        guard.values().cloned().collect::<Vec<_>>()
                    };
                    self.listeners.emit(&snapshot);
                }
                Err(e) => {
                    log::error!("Error initializing product registry: {}", e);
                    self.seed_if_empty().await;
                }
            },
            None => self.seed_if_empty().await,
        }
    }

    async fn seed_if_empty(&self) {
        let snapshot = {
            let mut guard = self.products.lock().await;
            if !guard.is_empty() {
                return;
            }
            for product in seed_products() {
                guard.insert(product.id, product);
            }
            guard.values().cloned().collect::<Vec<_>>()
        };
        log::info!("Product registry seeded with {} products", snapshot.len());
        self.listeners.emit(&snapshot);
    }

    /// Snapshot of the whole collection, in insertion order.
    pub async fn products(&self) -> Vec<Product> {
        self.products.lock().await.values().cloned().collect()
    }

    /// Case-insensitive substring match against product titles. An empty
    /// query matches nothing rather than everything.
    pub async fn find_by_query(&self, query: &str) -> Vec<Product> {
        if query.is_empty() {
            return Vec::new();
        }
        let query = query.to_lowercase();
        self.products
            .lock()
            .await
            .values()
            .filter(|product| product.title.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub async fn find_by_status(&self, status: ProductStatus) -> Vec<Product> {
        self.products
            .lock()
            .await
            .values()
            .filter(|product| product.status == status)
            .cloned()
            .collect()
    }

    pub async fn status_of(&self, id: u32) -> Option<ProductStatus> {
        self.products.lock().await.get(&id).map(|product| product.status)
    }

    /// Sets the status of one product. Unknown ids are a silent no-op with
    /// no notification. The remote write is attempted before the
    /// notification fires; a failed write is logged and the local mutation
    /// stands (local state runs optimistically ahead of the remote).
    pub async fn update_status(&self, id: u32, new_status: ProductStatus) {
        let mut guard = self.products.lock().await;
        let Some(product) = guard.get_mut(&id) else {
            return;
        };
        product.status = new_status;
        let snapshot: Vec<Product> = guard.values().cloned().collect();

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.put_products(&snapshot).await {
                log::error!("Error updating product status remotely: {}", e);
            }
        }
        drop(guard);

        self.listeners.emit(&snapshot);
    }

    pub async fn clear_report(&self, id: u32) {
        self.update_status(id, ProductStatus::Available).await;
    }

    /// Resets every product currently at `status` back to `Available` in a
    /// single pass, with one remote write and one notification for the
    /// whole batch. When nothing matches, nothing is written or emitted.
    pub async fn clear_all_by_status(&self, status: ProductStatus) {
        let mut guard = self.products.lock().await;
        let mut changed = 0usize;
        for product in guard.values_mut() {
            if product.status == status {
                product.status = ProductStatus::Available;
                changed += 1;
            }
        }
        if changed == 0 {
            return;
        }
        let snapshot: Vec<Product> = guard.values().cloned().collect();

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.put_products(&snapshot).await {
                log::error!("Error clearing {} reports remotely: {}", status, e);
            }
        }
        drop(guard);

        log::info!("Cleared {} products reported as {}", changed, status);
        self.listeners.emit(&snapshot);
    }

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Vec<Product>) + Send + Sync + 'static,
    {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) {
        self.listeners.unsubscribe(id);
    }
}

/// Built-in grocery catalogue used when no remote copy can be reached.
pub fn seed_products() -> Vec<Product> {
    fn product(
        id: u32,
        title: &str,
        price: f64,
        image: &str,
        description: &str,
        category: &str,
    ) -> Product {
        Product {
            id,
            title: title.to_string(),
            price,
            image: format!("https://images.shelfmate.dev/{}", image),
            description: description.to_string(),
            category: category.to_string(),
            status: ProductStatus::Available,
        }
    }

    vec![
        product(1, "Banana", 6.49, "banana-turkish.png", "Turkish bananas, sold per kg", "Fruit"),
        product(2, "Banana", 5.99, "banana-romanian.png", "Romanian bananas, sold per kg", "Fruit"),
        product(3, "Apple", 4.29, "apple-green.png", "Green apples, crisp and tart", "Fruit"),
        product(4, "Grapes", 9.99, "grapes-red.png", "Seedless red grapes", "Fruit"),
        product(5, "Mango", 12.50, "mango-indian.png", "Indian mango, ripe", "Fruit"),
        product(6, "Carrot", 3.49, "carrot-organic.png", "Organic carrots, bunch", "Vegetable"),
        product(7, "Broccoli", 7.25, "broccoli-fresh.png", "Fresh broccoli head", "Vegetable"),
        product(8, "Chicken Breast", 24.90, "chicken-breast.png", "Boneless chicken breast, per kg", "Meat"),
        product(9, "Salmon", 54.00, "salmon-wild.png", "Wild salmon fillet, per kg", "Fish"),
        product(10, "Milk", 7.50, "milk-whole.png", "Whole milk, 1L", "Dairy"),
        product(11, "Cheddar Cheese", 18.75, "cheddar-aged.png", "Aged cheddar, 300g", "Dairy"),
        product(12, "Bread", 5.50, "bread-whole-wheat.png", "Whole wheat loaf", "Bakery"),
        product(13, "Croissant", 4.80, "croissant-butter.png", "Butter croissant", "Bakery"),
        product(14, "Orange Juice", 11.20, "orange-juice.png", "Freshly squeezed, 1L", "Beverage"),
        product(15, "Coffee", 22.40, "coffee-ground.png", "Ground coffee, 500g", "Beverage"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    async fn seeded_registry() -> ProductRegistry {
        let registry = ProductRegistry::new(None);
        registry.initialize().await;
        registry
    }

    fn count_emissions(registry: &ProductRegistry) -> Arc<StdMutex<Vec<Vec<Product>>>> {
        let emissions = Arc::new(StdMutex::new(Vec::new()));
        let emissions_clone = Arc::clone(&emissions);
        registry.subscribe(move |products: &Vec<Product>| {
            emissions_clone.lock().unwrap().push(products.clone());
        });
        emissions
    }

    #[tokio::test]
    async fn initialize_seeds_when_local_only() {
        let registry = seeded_registry().await;
        let products = registry.products().await;
        assert_eq!(products.len(), 15);
        assert!(products.iter().all(|p| p.status == ProductStatus::Available));
    }

    #[tokio::test]
    async fn initialize_is_idempotent_locally() {
        let registry = seeded_registry().await;
        registry.update_status(10, ProductStatus::Expired).await;
        registry.initialize().await; // populated, must not reseed
        assert_eq!(registry.status_of(10).await, Some(ProductStatus::Expired));
    }

    #[tokio::test]
    async fn update_status_is_visible_through_queries() {
        let registry = seeded_registry().await;
        registry.update_status(10, ProductStatus::Expired).await;

        let results = registry.find_by_query("milk").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ProductStatus::Expired);
        assert_eq!(registry.status_of(10).await, Some(ProductStatus::Expired));
    }

    #[tokio::test]
    async fn update_status_unknown_id_is_silent() {
        let registry = seeded_registry().await;
        let before = registry.products().await;
        let emissions = count_emissions(&registry);

        registry.update_status(9999, ProductStatus::Expired).await;

        assert_eq!(registry.products().await, before);
        assert!(emissions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_status_emits_full_collection_once() {
        let registry = seeded_registry().await;
        let emissions = count_emissions(&registry);

        registry.update_status(10, ProductStatus::Expired).await;

        let emissions = emissions.lock().unwrap();
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].len(), 15);
        let milk = emissions[0].iter().find(|p| p.id == 10).unwrap();
        assert_eq!(milk.status, ProductStatus::Expired);
    }

    #[tokio::test]
    async fn find_by_query_empty_matches_nothing() {
        let registry = seeded_registry().await;
        assert!(registry.find_by_query("").await.is_empty());
        // Substring and case-insensitive matching
        assert_eq!(registry.find_by_query("BANA").await.len(), 2);
    }

    #[tokio::test]
    async fn find_by_status_groups_reports() {
        let registry = seeded_registry().await;
        registry.update_status(3, ProductStatus::NotAvailable).await;
        registry.update_status(4, ProductStatus::Expired).await;

        assert_eq!(registry.find_by_status(ProductStatus::NotAvailable).await.len(), 1);
        assert_eq!(registry.find_by_status(ProductStatus::Expired).await.len(), 1);
        assert_eq!(registry.find_by_status(ProductStatus::Available).await.len(), 13);
    }

    #[tokio::test]
    async fn clear_report_restores_available() {
        let registry = seeded_registry().await;
        let before = registry.find_by_query("Milk").await;

        registry.update_status(10, ProductStatus::Expired).await;
        registry.clear_report(10).await;

        let after = registry.find_by_query("Milk").await;
        assert_eq!(before, after); // every other field untouched
    }

    #[tokio::test]
    async fn clear_all_by_status_batches_into_one_emission() {
        let registry = seeded_registry().await;
        registry.update_status(1, ProductStatus::Expired).await;
        registry.update_status(2, ProductStatus::Expired).await;
        registry.update_status(3, ProductStatus::NotAvailable).await;

        let emissions = count_emissions(&registry);
        registry.clear_all_by_status(ProductStatus::Expired).await;

        assert_eq!(emissions.lock().unwrap().len(), 1);
        assert!(registry.find_by_status(ProductStatus::Expired).await.is_empty());
        // Other report kinds untouched
        assert_eq!(registry.status_of(3).await, Some(ProductStatus::NotAvailable));

        // Second call finds nothing at Expired and stays silent
        registry.clear_all_by_status(ProductStatus::Expired).await;
        assert_eq!(emissions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unsubscribed_listener_stops_receiving() {
        let registry = seeded_registry().await;
        let count = Arc::new(StdMutex::new(0));

        let count_clone = Arc::clone(&count);
        let id = registry.subscribe(move |_: &Vec<Product>| {
            *count_clone.lock().unwrap() += 1;
        });

        registry.update_status(10, ProductStatus::Expired).await;
        registry.unsubscribe(id);
        registry.update_status(10, ProductStatus::Available).await;

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn status_round_trips_wire_strings() {
        assert_eq!(
            serde_json::to_string(&ProductStatus::NotAvailable).unwrap(),
            "\"Not available\""
        );
        let status: ProductStatus = serde_json::from_str("\"Expired\"").unwrap();
        assert_eq!(status, ProductStatus::Expired);
    }
}
