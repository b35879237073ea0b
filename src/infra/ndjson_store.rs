use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::app::ports::ChildStorePort;
use crate::domain::{Child, ImportedProfile, Program};
use crate::error::{PortalError, Result};
use crate::infra::in_memory_store::{new_children, sorted_by_name};

type Collections = HashMap<Program, Vec<Child>>;

/// File-backed child store: one NDJSON file per program inside a data
/// directory. Opened explicitly and closed explicitly; every mutation
/// rewrites the affected files through temp files and renames.
pub struct NdjsonChildStore {
    dir: PathBuf,
    children: Arc<Mutex<Collections>>,
}

fn file_name(program: Program) -> &'static str {
    match program {
        Program::Preschool => "children.ndjson",
        Program::Afterschool => "afterschool_children.ndjson",
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("ndjson.tmp")
}

fn render(children: &[Child]) -> Result<String> {
    let mut body = String::new();
    for child in children {
        body.push_str(&serde_json::to_string(child)?);
        body.push('\n');
    }
    Ok(body)
}

async fn load(path: &Path) -> Result<Vec<Child>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Child>(line).map_err(|e| PortalError::Store {
                message: format!("{}:{}: {}", path.display(), index + 1, e),
            })
        })
        .collect()
}

async fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        if let Err(e) = tokio::fs::remove_file(tmp).await {
            warn!("Could not remove {}: {}", tmp.display(), e);
        }
    }
}

/// Stage every file first, then rename them all. Nothing is renamed if a
/// temp file cannot be written or the caller has already stopped waiting.
async fn write_files(
    dir: &Path,
    changes: &[(Program, Vec<Child>)],
    caller: &oneshot::Sender<Result<()>>,
) -> Result<()> {
    let mut bodies = Vec::with_capacity(changes.len());
    for (program, children) in changes {
        bodies.push((*program, render(children)?));
    }

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(bodies.len());
    for (program, body) in bodies {
        let path = dir.join(file_name(program));
        let tmp = tmp_path(&path);
        if let Err(e) = tokio::fs::write(&tmp, body).await {
            discard(&staged).await;
            return Err(e.into());
        }
        staged.push((tmp, path));
    }

    if caller.is_closed() {
        discard(&staged).await;
        return Err(PortalError::Store {
            message: "write abandoned before commit".to_string(),
        });
    }

    for (tmp, path) in &staged {
        tokio::fs::rename(tmp, path).await?;
        debug!("Replaced {}", path.display());
    }
    Ok(())
}

impl NdjsonChildStore {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let mut children = HashMap::new();
        for program in Program::all() {
            let loaded = load(&dir.join(file_name(program))).await?;
            debug!("Loaded {} {} record(s)", loaded.len(), program);
            children.insert(program, loaded);
        }

        info!("Opened child store at {}", dir.display());
        Ok(Self {
            dir,
            children: Arc::new(Mutex::new(children)),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the changed programs to disk and then swap them into memory.
    ///
    /// The work runs on its own task holding the store lock, so dropping the
    /// calling future (a timeout, say) never leaves disk and memory apart.
    async fn commit(&self, mut guard: OwnedMutexGuard<Collections>, changes: Vec<(Program, Vec<Child>)>) -> Result<()> {
        let dir = self.dir.clone();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = write_files(&dir, &changes, &tx).await;
            if result.is_ok() {
                for (program, children) in changes {
                    guard.insert(program, children);
                }
            }
            let _ = tx.send(result);
        });

        rx.await.map_err(|_| PortalError::Store {
            message: "store write task ended without a result".to_string(),
        })?
    }
}

#[async_trait]
impl ChildStorePort for NdjsonChildStore {
    async fn bulk_insert(&self, program: Program, profiles: &[ImportedProfile]) -> Result<Vec<String>> {
        let guard = self.children.clone().lock_owned().await;
        let created = new_children(program, profiles);
        let ids = created.iter().map(|c| c.id.clone()).collect();

        let mut next = guard.get(&program).cloned().unwrap_or_default();
        next.extend(created);
        self.commit(guard, vec![(program, next)]).await?;
        Ok(ids)
    }

    async fn list(&self, program: Program) -> Result<Vec<Child>> {
        let children = self.children.lock().await.get(&program).cloned().unwrap_or_default();
        Ok(sorted_by_name(children))
    }

    async fn update_parent_details(&self, email: &str, name: &str, phone: &str) -> Result<usize> {
        let guard = self.children.clone().lock_owned().await;
        let mut changes = Vec::new();
        let mut updated = 0;

        for program in Program::all() {
            let mut next = guard.get(&program).cloned().unwrap_or_default();
            let mut changed = 0;
            for child in next.iter_mut().filter(|c| c.profile.parent_email == email) {
                child.profile.parent = name.to_string();
                child.profile.parent_phone = phone.to_string();
                changed += 1;
            }
            if changed > 0 {
                changes.push((program, next));
                updated += changed;
            }
        }

        if !changes.is_empty() {
            self.commit(guard, changes).await?;
        }
        Ok(updated)
    }

    async fn close(&self) -> Result<()> {
        let guard = self.children.lock().await;
        for program in Program::all() {
            if let Some(children) = guard.get(&program) {
                let path = self.dir.join(file_name(program));
                let tmp = tmp_path(&path);
                tokio::fs::write(&tmp, render(children)?).await?;
                tokio::fs::rename(&tmp, &path).await?;
            }
        }
        info!("Closed child store at {}", self.dir.display());
        Ok(())
    }
}
