use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::app::ports::ChildStorePort;
use crate::app::timeout::with_timeout;
use crate::domain::{Child, Parent, Program};
use crate::error::{PortalError, Result};
use crate::observability::metrics;
use crate::processing::export::export;
use crate::processing::import::ImportFormat;
use crate::processing::parents::aggregate_parents;

/// Read-side roster operations over both child collections
pub struct RosterUseCase {
    store: Arc<dyn ChildStorePort>,
    store_timeout: Duration,
}

impl RosterUseCase {
    pub fn new(store: Arc<dyn ChildStorePort>, store_timeout: Duration) -> Self {
        Self { store, store_timeout }
    }

    async fn both_programs(&self, operation: &str) -> Result<(Vec<Child>, Vec<Child>)> {
        with_timeout(self.store_timeout, operation, async {
            let preschool = self.store.list(Program::Preschool).await?;
            let afterschool = self.store.list(Program::Afterschool).await?;
            Ok::<_, PortalError>((preschool, afterschool))
        })
        .await
    }

    /// Parents derived from every child that names one
    pub async fn parents(&self) -> Result<Vec<Parent>> {
        let (preschool, afterschool) = self.both_programs("Fetching parents").await?;
        let parents = aggregate_parents(&preschool, &afterschool);
        info!("Aggregated {} parent(s) from {} child record(s)", parents.len(), preschool.len() + afterschool.len());
        Ok(parents)
    }

    /// Children of one parent across both programs, preschool first
    pub async fn children_for_parent(&self, email: &str) -> Result<Vec<Child>> {
        let (preschool, afterschool) = self
            .both_programs("Fetching children by parent email")
            .await?;
        Ok(preschool
            .into_iter()
            .chain(afterschool)
            .filter(|c| c.profile.parent_email == email)
            .collect())
    }

    pub async fn update_parent_details(&self, email: &str, name: &str, phone: &str) -> Result<usize> {
        let updated = with_timeout(
            self.store_timeout,
            "Updating parent details",
            self.store.update_parent_details(email, name, phone),
        )
        .await?;
        info!("Updated parent details on {} child record(s)", updated);
        Ok(updated)
    }

    /// All children, preschool then afterschool, as a CSV or TSV document
    pub async fn export(&self, format: ImportFormat) -> Result<String> {
        let (preschool, afterschool) = self.both_programs("Fetching children for export").await?;
        let children: Vec<Child> = preschool.into_iter().chain(afterschool).collect();
        let document = export(&children, format)?;
        metrics::export::completed(&format.to_string(), children.len());
        Ok(document)
    }
}
