use crate::modules::progress::{ProgressTracker, XP_PER_REPORT};
use crate::modules::registry::{ProductRegistry, ProductStatus};
use std::sync::Arc;

/// What the user says is wrong with a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportIssue {
    NotAvailable,
    Expired,
}

impl ReportIssue {
    pub fn status(self) -> ProductStatus {
        match self {
            Self::NotAvailable => ProductStatus::NotAvailable,
            Self::Expired => ProductStatus::Expired,
        }
    }
}

/// Translates report/resolve actions into registry status transitions.
///
/// Per product the only legal transitions are
/// `Available -> {Not available | Expired}` (report) and back to
/// `Available` (resolve); switching between the two report kinds requires
/// resolving first. An accepted report awards XP once; a rejected one
/// changes nothing and awards nothing.
pub struct ReportDesk {
    registry: Arc<ProductRegistry>,
    progress: Arc<ProgressTracker>,
}

impl ReportDesk {
    pub fn new(registry: Arc<ProductRegistry>, progress: Arc<ProgressTracker>) -> Self {
        Self { registry, progress }
    }

    /// Returns `false` when the product is unknown or already reported.
    pub async fn report(&self, id: u32, issue: ReportIssue) -> bool {
        match self.registry.status_of(id).await {
            Some(ProductStatus::Available) => {}
            Some(current) => {
                log::debug!("Report rejected for product {}: already {}", id, current);
                return false;
            }
            None => return false,
        }

        self.registry.update_status(id, issue.status()).await;
        self.progress.award_xp(XP_PER_REPORT).await;
        true
    }

    /// Employee action clearing a report. Returns `false` when the product
    /// is unknown or not currently reported.
    pub async fn resolve(&self, id: u32) -> bool {
        match self.registry.status_of(id).await {
            Some(status) if status != ProductStatus::Available => {}
            _ => return false,
        }

        self.registry.clear_report(id).await;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::progress::UserProgress;
    use crate::modules::registry::Product;
    use std::sync::Mutex as StdMutex;

    async fn desk() -> (ReportDesk, Arc<ProductRegistry>, Arc<ProgressTracker>) {
        let registry = Arc::new(ProductRegistry::new(None));
        registry.initialize().await;
        let progress = Arc::new(ProgressTracker::new());
        (
            ReportDesk::new(Arc::clone(&registry), Arc::clone(&progress)),
            registry,
            progress,
        )
    }

    #[tokio::test]
    async fn report_transitions_and_awards_xp() {
        let (desk, registry, progress) = desk().await;

        assert!(desk.report(10, ReportIssue::Expired).await);
        assert_eq!(registry.status_of(10).await, Some(ProductStatus::Expired));
        assert_eq!(progress.get_progress().await, UserProgress { xp: 10, level: 1 });
    }

    #[tokio::test]
    async fn double_report_is_rejected_without_xp() {
        let (desk, registry, progress) = desk().await;

        assert!(desk.report(10, ReportIssue::Expired).await);
        // Already reported: no transition to the other report kind either
        assert!(!desk.report(10, ReportIssue::NotAvailable).await);

        assert_eq!(registry.status_of(10).await, Some(ProductStatus::Expired));
        assert_eq!(progress.get_progress().await.xp, 10);
    }

    #[tokio::test]
    async fn resolve_requires_an_open_report() {
        let (desk, registry, _progress) = desk().await;

        assert!(!desk.resolve(10).await); // nothing reported yet

        desk.report(10, ReportIssue::NotAvailable).await;
        assert!(desk.resolve(10).await);
        assert_eq!(registry.status_of(10).await, Some(ProductStatus::Available));
    }

    #[tokio::test]
    async fn resolve_gives_no_xp() {
        let (desk, _registry, progress) = desk().await;

        desk.report(10, ReportIssue::Expired).await;
        desk.resolve(10).await;
        assert_eq!(progress.get_progress().await.xp, XP_PER_REPORT);
    }

    #[tokio::test]
    async fn unknown_product_is_rejected() {
        let (desk, _registry, progress) = desk().await;

        assert!(!desk.report(9999, ReportIssue::Expired).await);
        assert!(!desk.resolve(9999).await);
        assert_eq!(progress.get_progress().await.xp, 0);
    }

    #[tokio::test]
    async fn report_resolve_round_trip_preserves_other_fields() {
        let (desk, registry, _progress) = desk().await;
        let before: Vec<Product> = registry.find_by_query("Milk").await;

        desk.report(10, ReportIssue::Expired).await;
        desk.resolve(10).await;

        assert_eq!(registry.find_by_query("Milk").await, before);
    }

    #[tokio::test]
    async fn seeded_milk_scenario() {
        // Report Milk, expect one products_updated emission carrying the
        // new status and exactly one XP award of 10.
        let (desk, registry, progress) = desk().await;
        let emissions = Arc::new(StdMutex::new(Vec::new()));

        let emissions_clone = Arc::clone(&emissions);
        registry.subscribe(move |products: &Vec<Product>| {
            emissions_clone.lock().unwrap().push(products.clone());
        });

        assert!(desk.report(10, ReportIssue::Expired).await);

        let emissions = emissions.lock().unwrap();
        assert_eq!(emissions.len(), 1);
        let milk = emissions[0].iter().find(|p| p.id == 10).unwrap();
        assert_eq!(milk.status, ProductStatus::Expired);
        assert_eq!(progress.get_progress().await, UserProgress { xp: 10, level: 1 });
    }
}
