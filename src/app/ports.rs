use async_trait::async_trait;

use crate::domain::{Child, ImportedProfile, Program};
use crate::error::Result;

/// Persistence for child records, one collection per program
#[async_trait]
pub trait ChildStorePort: Send + Sync {
    /// Insert all profiles or none; returns the new ids in input order.
    async fn bulk_insert(&self, program: Program, profiles: &[ImportedProfile]) -> Result<Vec<String>>;

    /// All children of a program, sorted by name.
    async fn list(&self, program: Program) -> Result<Vec<Child>>;

    /// Rewrite parent name and phone on every child, in every program, whose
    /// parent email matches. Returns how many children changed.
    async fn update_parent_details(&self, email: &str, name: &str, phone: &str) -> Result<usize>;

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
