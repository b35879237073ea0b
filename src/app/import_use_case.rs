use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn, Instrument};

use crate::app::ports::ChildStorePort;
use crate::app::timeout::with_timeout;
use crate::constants::BULK_TIMEOUT_MULTIPLIER;
use crate::domain::Program;
use crate::error::{PortalError, Result};
use crate::fingerprint::compute_import_key;
use crate::observability::metrics;
use crate::processing::import::{parse_rows, DelimitedRecordImporter, ImportFormat};
use crate::processing::quality_gate::{
    assess, ImportDecision, ImportPolicy, IssueSeverity, QualityReport,
};

/// Outcome of one roster import
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub import_key: String,
    pub file_name: String,
    pub format: ImportFormat,
    /// Profiles parsed from the file (and persisted, unless this was a dry run)
    pub imported: usize,
    /// Ids assigned by the store; empty on a dry run
    pub ids: Vec<String>,
    pub report: QualityReport,
    pub decision: ImportDecision,
    pub dry_run: bool,
}

/// Use case for bulk-loading children from an uploaded CSV/TSV file
pub struct ImportUseCase {
    store: Arc<dyn ChildStorePort>,
    importer: DelimitedRecordImporter,
    policy: ImportPolicy,
    store_timeout: Duration,
}

impl ImportUseCase {
    pub fn new(
        store: Arc<dyn ChildStorePort>,
        importer: DelimitedRecordImporter,
        policy: ImportPolicy,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            importer,
            policy,
            store_timeout,
        }
    }

    /// Import with the default importer, lenient policy and store timeout
    pub fn with_defaults(store: Arc<dyn ChildStorePort>) -> Self {
        Self::new(
            store,
            DelimitedRecordImporter::default(),
            ImportPolicy::default(),
            Duration::from_secs(crate::constants::DEFAULT_STORE_TIMEOUT_SECS),
        )
    }

    /// Parse, assess and persist a file into the preschool collection.
    pub async fn run(&self, file_name: &str, mime_type: Option<&str>, source: &str) -> Result<ImportSummary> {
        let format = ImportFormat::from_file(file_name, mime_type);
        self.execute(file_name, format, source, false).await
    }

    /// Everything `run` does except writing to the store.
    pub async fn dry_run(&self, file_name: &str, format: ImportFormat, source: &str) -> Result<ImportSummary> {
        self.execute(file_name, format, source, true).await
    }

    pub async fn run_with_format(&self, file_name: &str, format: ImportFormat, source: &str) -> Result<ImportSummary> {
        self.execute(file_name, format, source, false).await
    }

    async fn execute(
        &self,
        file_name: &str,
        format: ImportFormat,
        source: &str,
        dry_run: bool,
    ) -> Result<ImportSummary> {
        let import_key = compute_import_key(file_name, format, source);
        let span = tracing::info_span!("import", file = %file_name, %format, key = %&import_key[..12]);

        self.import(import_key, file_name, format, source, dry_run)
            .instrument(span)
            .await
    }

    async fn import(
        &self,
        import_key: String,
        file_name: &str,
        format: ImportFormat,
        source: &str,
        dry_run: bool,
    ) -> Result<ImportSummary> {
        let parsed = match parse_rows(source, format) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Import failed: {}", e);
                metrics::import::failed("malformed_input");
                return Err(e);
            }
        };

        let report = assess(&parsed);
        let decision = report.decision(self.policy);
        metrics::import::issues_found("warning", report.count(IssueSeverity::Warning));
        metrics::import::issues_found("error", report.errors());

        for issue in &report.issues {
            info!(line = issue.line, severity = ?issue.severity, "{}", issue.description);
        }

        if decision == ImportDecision::Reject {
            warn!("Import rejected with {} row error(s)", report.errors());
            metrics::import::failed("rejected");
            return Err(PortalError::Rejected {
                errors: report.errors(),
            });
        }

        let profiles = self.importer.profiles(&parsed);
        let ids = if dry_run {
            info!("Dry run: {} profile(s) parsed, nothing written", profiles.len());
            Vec::new()
        } else {
            let timeout = self.store_timeout * BULK_TIMEOUT_MULTIPLIER;
            let ids = with_timeout(
                timeout,
                "Batch adding children",
                self.store.bulk_insert(Program::Preschool, &profiles),
            )
            .await
            .map_err(|e| {
                metrics::import::failed("store");
                e
            })?;
            info!("Imported {} child profile(s)", ids.len());
            metrics::import::completed(&format.to_string(), ids.len());
            ids
        };

        Ok(ImportSummary {
            import_key,
            file_name: file_name.to_string(),
            format,
            imported: profiles.len(),
            ids,
            report,
            decision,
            dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Child, ImportedProfile};
    use crate::infra::in_memory_store::InMemoryChildStore;
    use async_trait::async_trait;

    const ROSTER: &str = "name,dateOfBirth,gender,parentEmail,previousPreschool\n\
        Jane Doe,2020-01-01,female,jane@example.com,yes\n\
        \"Smith, Bob\",2019-06-15,robot,bob@example.com,maybe\n";

    struct FailingStore;

    #[async_trait]
    impl ChildStorePort for FailingStore {
        async fn bulk_insert(&self, _program: Program, _profiles: &[ImportedProfile]) -> Result<Vec<String>> {
            Err(PortalError::Store {
                message: "write batch failed".to_string(),
            })
        }

        async fn list(&self, _program: Program) -> Result<Vec<Child>> {
            Ok(Vec::new())
        }

        async fn update_parent_details(&self, _email: &str, _name: &str, _phone: &str) -> Result<usize> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_import_persists_into_preschool() {
        let store = Arc::new(InMemoryChildStore::new());
        let use_case = ImportUseCase::with_defaults(store.clone());

        let summary = use_case.run("roster.csv", Some("text/csv"), ROSTER).await.unwrap();
        assert_eq!(summary.format, ImportFormat::Csv);
        assert_eq!(summary.imported, 2);
        assert_eq!(summary.ids.len(), 2);
        assert_eq!(summary.decision, ImportDecision::AcceptWithWarnings);
        assert!(!summary.dry_run);

        let stored = store.list(Program::Preschool).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(store.list(Program::Afterschool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let store = Arc::new(InMemoryChildStore::new());
        let use_case = ImportUseCase::with_defaults(store.clone());

        let summary = use_case.dry_run("roster.csv", ImportFormat::Csv, ROSTER).await.unwrap();
        assert_eq!(summary.imported, 2);
        assert!(summary.ids.is_empty());
        assert!(store.list(Program::Preschool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_input_persists_nothing() {
        let store = Arc::new(InMemoryChildStore::new());
        let use_case = ImportUseCase::with_defaults(store.clone());

        let err = use_case.run("roster.csv", None, "name,gender\n").await.unwrap_err();
        assert!(matches!(err, PortalError::MalformedInput(_)));
        assert!(store.list(Program::Preschool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_strict_policy_rejects_rows_with_errors() {
        let store = Arc::new(InMemoryChildStore::new());
        let use_case = ImportUseCase::new(
            store.clone(),
            DelimitedRecordImporter::default(),
            ImportPolicy::Strict,
            Duration::from_secs(1),
        );

        let source = "name,parentEmail\nJane,jane@example.com\n,nobody@example.com\n";
        let err = use_case.run("roster.csv", None, source).await.unwrap_err();
        assert!(matches!(err, PortalError::Rejected { errors: 1 }));
        assert!(store.list(Program::Preschool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let use_case = ImportUseCase::with_defaults(Arc::new(FailingStore));
        let err = use_case.run("roster.tsv", None, "name\tparentEmail\nJane\tjane@example.com").await.unwrap_err();
        assert!(matches!(err, PortalError::Store { .. }));
    }
}
