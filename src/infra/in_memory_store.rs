use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::app::ports::ChildStorePort;
use crate::domain::{Child, ImportedProfile, Program};
use crate::error::{PortalError, Result};

/// In-memory store for development/testing
#[derive(Default)]
pub struct InMemoryChildStore {
    children: Mutex<HashMap<Program, Vec<Child>>>,
}

impl InMemoryChildStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Program, Vec<Child>>>> {
        self.children.lock().map_err(|_| PortalError::Store {
            message: "child store lock poisoned".to_string(),
        })
    }
}

pub(crate) fn new_children(program: Program, profiles: &[ImportedProfile]) -> Vec<Child> {
    profiles
        .iter()
        .map(|profile| Child {
            id: Uuid::new_v4().to_string(),
            program,
            profile: profile.clone(),
        })
        .collect()
}

pub(crate) fn sorted_by_name(mut children: Vec<Child>) -> Vec<Child> {
    children.sort_by(|a, b| a.profile.name.cmp(&b.profile.name));
    children
}

#[async_trait]
impl ChildStorePort for InMemoryChildStore {
    async fn bulk_insert(&self, program: Program, profiles: &[ImportedProfile]) -> Result<Vec<String>> {
        let created = new_children(program, profiles);
        let ids = created.iter().map(|c| c.id.clone()).collect();

        self.lock()?.entry(program).or_default().extend(created);
        debug!("Inserted {} child(ren) into {}", profiles.len(), program.collection());
        Ok(ids)
    }

    async fn list(&self, program: Program) -> Result<Vec<Child>> {
        let children = self.lock()?.get(&program).cloned().unwrap_or_default();
        Ok(sorted_by_name(children))
    }

    async fn update_parent_details(&self, email: &str, name: &str, phone: &str) -> Result<usize> {
        let mut guard = self.lock()?;
        let mut updated = 0;
        for child in guard.values_mut().flatten() {
            if child.profile.parent_email == email {
                child.profile.parent = name.to_string();
                child.profile.parent_phone = phone.to_string();
                updated += 1;
            }
        }
        debug!("Updated parent {} on {} child(ren)", email, updated);
        Ok(updated)
    }
}
