use crate::modules::registry::ProductRegistry;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub id: u32,
    pub label: String,
    pub checked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: u32,
    pub title: String,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ListDocument {
    lists: Vec<ShoppingList>,
}

/// File-persisted shopping lists, stored as `{ "lists": [...] }` at a fixed
/// path. Peripheral to the registry: its only coupling is the price lookup
/// by product title when an item is created.
pub struct ListStore {
    lists: Mutex<Vec<ShoppingList>>,
    path: PathBuf,
}

impl ListStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            lists: Mutex::new(Vec::new()),
            path,
        }
    }

    /// Missing or malformed document loads as no lists.
    pub async fn load(&self) {
        let document: ListDocument = match std::fs::read_to_string(&self.path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(document) => document,
                Err(e) => {
                    log::error!("Malformed lists file, starting empty: {}", e);
                    ListDocument::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ListDocument::default(),
            Err(e) => {
                log::error!("Error loading lists: {}", e);
                ListDocument::default()
            }
        };
        *self.lists.lock().await = document.lists;
    }

    pub async fn get_lists(&self) -> Vec<ShoppingList> {
        self.lists.lock().await.clone()
    }

    pub async fn create_list(&self, title: &str) -> u32 {
        let mut lists = self.lists.lock().await;
        let id = lists.len() as u32 + 1;
        lists.push(ShoppingList {
            id,
            title: title.to_string(),
            items: Vec::new(),
        });
        self.persist(&lists);
        id
    }

    /// Appends an item to a list, filling `price` from the registry when a
    /// product with that exact title exists. Unknown list id is a no-op.
    pub async fn add_item(&self, list_id: u32, label: &str, registry: &ProductRegistry) -> bool {
        let price = lookup_price(registry, label).await;

        let mut lists = self.lists.lock().await;
        let Some(list) = lists.iter_mut().find(|list| list.id == list_id) else {
            return false;
        };
        let item_id = list.items.len() as u32 + 1 + list_id * 100;
        list.items.push(ListItem {
            id: item_id,
            label: label.to_string(),
            checked: false,
            price,
        });
        self.persist(&lists);
        true
    }

    pub async fn toggle_item(&self, list_id: u32, item_id: u32, checked: bool) -> bool {
        let mut lists = self.lists.lock().await;
        let Some(item) = lists
            .iter_mut()
            .find(|list| list.id == list_id)
            .and_then(|list| list.items.iter_mut().find(|item| item.id == item_id))
        else {
            return false;
        };
        item.checked = checked;
        self.persist(&lists);
        true
    }

    fn persist(&self, lists: &[ShoppingList]) {
        let document = ListDocument {
            lists: lists.to_vec(),
        };
        let result = serde_json::to_string(&document)
            .map_err(|e| format!("Failed to serialize lists: {}", e))
            .and_then(|json| {
                std::fs::write(&self.path, json).map_err(|e| format!("Failed to write lists: {}", e))
            });
        if let Err(e) = result {
            log::error!("Error saving lists: {}", e);
        }
    }
}

/// Exact (case-insensitive) title match against the registry.
async fn lookup_price(registry: &ProductRegistry, label: &str) -> Option<f64> {
    registry
        .find_by_query(label)
        .await
        .into_iter()
        .find(|product| product.title.eq_ignore_ascii_case(label))
        .map(|product| product.price)
}
