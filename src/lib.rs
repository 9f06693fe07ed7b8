// Module declarations
mod modules;

pub use modules::{
    app_state::AppState,
    config::{load_config, AppConfig},
    favorites::FavoritesStore,
    listeners::{ListenerId, ListenerSet},
    progress::{ProgressTracker, UserProgress, XP_MAX, XP_PER_REPORT},
    registry::{seed_products, Product, ProductRegistry, ProductStatus},
    remote_store::BinStoreClient,
    report::{ReportDesk, ReportIssue},
    shopping_list::{ListItem, ListStore, ShoppingList},
};
