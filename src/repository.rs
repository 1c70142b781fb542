//! # Project Repository
//!
//! Owner-scoped CRUD over project records. Every mutation is applied to a
//! draft of the document, persisted as a whole snapshot, and only then made
//! visible; a failed write leaves the in-memory state exactly as on disk.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::{Rng, RngCore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DeployPolicy;
use crate::errors::RepositoryError;
use crate::project::{
    self, OwnerId, Project, ProjectField, ProjectId, Wallet, WalletRole,
};
use crate::storage::{ProjectStore, RepositoryDocument};

/// Length of generated project ids
pub const PROJECT_ID_LEN: usize = 8;

/// Repository handle shared between update handlers
pub type SharedRepository = Arc<Mutex<ProjectRepository>>;

pub struct ProjectRepository {
    document: RepositoryDocument,
    store: Box<dyn ProjectStore>,
    deploy_policy: DeployPolicy,
}

impl ProjectRepository {
    /// Load the repository from `store`
    pub fn open(
        store: impl ProjectStore + 'static,
        deploy_policy: DeployPolicy,
    ) -> Result<Self, RepositoryError> {
        let document = store.load()?;
        info!(
            projects = document.project_count(),
            require_wallet = deploy_policy.require_wallet,
            "Project repository opened"
        );
        Ok(Self {
            document,
            store: Box::new(store),
            deploy_policy,
        })
    }

    pub fn into_shared(self) -> SharedRepository {
        Arc::new(Mutex::new(self))
    }

    pub fn deploy_policy(&self) -> &DeployPolicy {
        &self.deploy_policy
    }

    /// Create a project with empty metadata and no wallets
    pub fn create_project(
        &mut self,
        owner_id: &OwnerId,
        name: &str,
    ) -> Result<Project, RepositoryError> {
        let project = self.mutate(|document| {
            let id = generate_unique_id(document);
            let project = Project::new(id, owner_id.clone(), name);
            document
                .owners
                .entry(owner_id.clone())
                .or_default()
                .push(project.clone());
            Ok(project)
        })?;

        info!(owner_id = %owner_id, project_id = %project.id, "Project created");
        Ok(project)
    }

    /// All projects of an owner in insertion order
    pub fn list_projects(&self, owner_id: &OwnerId) -> Vec<Project> {
        self.document
            .owners
            .get(owner_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_project(
        &self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
    ) -> Result<Project, RepositoryError> {
        find_project(&self.document, owner_id, project_id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(project_id.clone()))
    }

    /// Overwrite exactly one field of a project
    pub fn update_field(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
        field: ProjectField,
        value: &str,
    ) -> Result<Project, RepositoryError> {
        let project = self.mutate(|document| {
            let project = find_project_mut(document, owner_id, project_id)?;
            project.set_field(field, value.to_string());
            project.updated_at = Utc::now();
            Ok(project.clone())
        })?;

        debug!(owner_id = %owner_id, project_id = %project_id, field = %field, "Project field updated");
        Ok(project)
    }

    /// Same as [`update_field`](Self::update_field) with a field given by name
    pub fn update_field_by_name(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
        field: &str,
        value: &str,
    ) -> Result<Project, RepositoryError> {
        let field: ProjectField = field.parse()?;
        self.update_field(owner_id, project_id, field, value)
    }

    /// Remove a project; returns whether a record was removed
    pub fn delete_project(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
    ) -> Result<bool, RepositoryError> {
        if find_project(&self.document, owner_id, project_id).is_none() {
            debug!(owner_id = %owner_id, project_id = %project_id, "Delete of absent project ignored");
            return Ok(false);
        }

        self.mutate(|document| {
            if let Some(projects) = document.owners.get_mut(owner_id) {
                projects.retain(|project| &project.id != project_id);
                if projects.is_empty() {
                    document.owners.remove(owner_id);
                }
            }
            Ok(())
        })?;

        info!(owner_id = %owner_id, project_id = %project_id, "Project deleted");
        Ok(true)
    }

    /// Append a wallet to the project's wallet list
    pub fn add_wallet(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
        wallet: Wallet,
    ) -> Result<Project, RepositoryError> {
        let role = wallet.role;
        let project = self.mutate(|document| {
            let project = find_project_mut(document, owner_id, project_id)?;
            project.wallets.push(wallet);
            project.updated_at = Utc::now();
            Ok(project.clone())
        })?;

        info!(
            owner_id = %owner_id,
            project_id = %project_id,
            role = role.as_str(),
            wallets = project.wallets.len(),
            "Wallet attached"
        );
        Ok(project)
    }

    /// Generate a fresh owner wallet and attach it
    pub fn generate_wallet(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
    ) -> Result<Project, RepositoryError> {
        // Fail before generating anything for an unknown project
        self.get_project(owner_id, project_id)?;
        self.add_wallet(owner_id, project_id, Wallet::new(WalletRole::Owner, generate_secret()))
    }

    pub fn is_deployable(&self, project: &Project) -> bool {
        project::is_deployable(project, &self.deploy_policy)
    }

    /// Set `deployed` once every required field is populated
    pub fn mark_deployed(
        &mut self,
        owner_id: &OwnerId,
        project_id: &ProjectId,
    ) -> Result<Project, RepositoryError> {
        let current = self.get_project(owner_id, project_id)?;
        let missing = project::missing_required_fields(&current, &self.deploy_policy);
        if !missing.is_empty() {
            warn!(
                owner_id = %owner_id,
                project_id = %project_id,
                missing = ?missing,
                "Deploy rejected"
            );
            return Err(RepositoryError::ValidationFailed { missing });
        }

        if current.deployed {
            return Ok(current);
        }

        let project = self.mutate(|document| {
            let project = find_project_mut(document, owner_id, project_id)?;
            project.deployed = true;
            project.updated_at = Utc::now();
            Ok(project.clone())
        })?;

        info!(owner_id = %owner_id, project_id = %project_id, "Project marked as deployed");
        Ok(project)
    }

    fn mutate<T, F>(&mut self, operation: F) -> Result<T, RepositoryError>
    where
        F: FnOnce(&mut RepositoryDocument) -> Result<T, RepositoryError>,
    {
        let mut draft = self.document.clone();
        let result = operation(&mut draft)?;

        if let Err(e) = self.store.save(&draft) {
            warn!(error = %e, "Snapshot write failed, mutation rolled back");
            return Err(e.into());
        }

        self.document = draft;
        Ok(result)
    }
}

fn find_project<'a>(
    document: &'a RepositoryDocument,
    owner_id: &OwnerId,
    project_id: &ProjectId,
) -> Option<&'a Project> {
    document
        .owners
        .get(owner_id)?
        .iter()
        .find(|project| &project.id == project_id)
}

fn find_project_mut<'a>(
    document: &'a mut RepositoryDocument,
    owner_id: &OwnerId,
    project_id: &ProjectId,
) -> Result<&'a mut Project, RepositoryError> {
    document
        .owners
        .get_mut(owner_id)
        .and_then(|projects| projects.iter_mut().find(|project| &project.id == project_id))
        .ok_or_else(|| RepositoryError::NotFound(project_id.clone()))
}

fn id_in_use(document: &RepositoryDocument, id: &str) -> bool {
    document
        .owners
        .values()
        .flatten()
        .any(|project| project.id.as_str() == id)
}

fn generate_unique_id(document: &RepositoryDocument) -> ProjectId {
    let mut rng = rand::thread_rng();
    loop {
        let candidate: String = (&mut rng)
            .sample_iter(&Alphanumeric)
            .take(PROJECT_ID_LEN)
            .map(char::from)
            .collect();
        if !id_in_use(document, &candidate) {
            return ProjectId(candidate);
        }
    }
}

/// 32 random bytes, hex-encoded
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}
