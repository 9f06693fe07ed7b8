use crate::modules::registry::Product;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use url::Url;

// Global HTTP client for the remote bin store
static BIN_CLIENT: OnceLock<Client> = OnceLock::new();

pub fn get_bin_client() -> &'static Client {
    BIN_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .pool_max_idle_per_host(2)
            .build()
            .expect("Failed to create bin store HTTP client")
    })
}

/// Client for the versioned bin holding the whole product array. The bin
/// wraps the payload in a `{ "record": [...] }` envelope on reads and takes
/// the bare array on writes.
#[derive(Debug, Clone)]
pub struct BinStoreClient {
    api_url: String,
    master_key: String,
}

#[derive(Deserialize)]
struct BinEnvelope {
    record: Vec<Product>,
}

impl BinStoreClient {
    pub fn new(api_url: &str, master_key: &str) -> Result<Self, String> {
        Url::parse(api_url).map_err(|e| format!("Invalid bin store URL {}: {}", api_url, e))?;
        Ok(Self {
            api_url: api_url.to_string(),
            master_key: master_key.to_string(),
        })
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, String> {
        let response = get_bin_client()
            .get(&self.api_url)
            .header("X-Master-Key", &self.master_key)
            .send()
            .await
            .map_err(|e| format!("Failed to fetch products: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "No error details".to_string());
            log::error!("Bin store API error {}: {}", status, error_text);
            return Err(format!("Bin store API error: {}", status));
        }

        let envelope: BinEnvelope = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse products: {}", e))?;

        Ok(envelope.record)
    }

    pub async fn put_products(&self, products: &[Product]) -> Result<(), String> {
        let response = get_bin_client()
            .put(&self.api_url)
            .header("Content-Type", "application/json")
            .header("X-Master-Key", &self.master_key)
            .json(products)
            .send()
            .await
            .map_err(|e| format!("Failed to update products: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Bin store API error: {}", response.status()));
        }

        Ok(())
    }
}
