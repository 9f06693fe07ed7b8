// Module declarations
pub mod app_state;
pub mod config;
pub mod favorites;
pub mod listeners;
pub mod progress;
pub mod registry;
pub mod remote_store;
pub mod report;
pub mod shopping_list;
