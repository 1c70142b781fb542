//! # Conversation Edit Controller
//!
//! Captures the next free-text message of a conversation as the value of a
//! previously selected project field (or wallet secret, or new project name).
//! The pending target lives in the conversation's [`EditDialogue`]; there is
//! no queue and no expiry.

use tracing::{debug, info, warn};

use crate::config::EditPolicy;
use crate::dialogue::{
    validate_field_value, validate_required_value, EditDialogue, EditState, ValueRejection,
};
use crate::errors::{EditError, RepositoryError};
use crate::project::{OwnerId, Project, ProjectField, ProjectId, Wallet, WalletRole};
use crate::repository::SharedRepository;

/// Result of feeding a free-text message to the controller
#[derive(Clone, Debug, PartialEq)]
pub enum EditOutcome {
    /// Nothing was pending; the message belongs to command dispatch
    PassThrough,
    /// A field was overwritten
    Updated { project: Project, field: ProjectField },
    /// A new project was created from the captured name
    Created(Project),
    /// A wallet was imported from the captured secret
    WalletAdded(Project),
    /// The value was refused; the edit stays pending
    Rejected(ValueRejection),
}

#[derive(Clone)]
pub struct EditController {
    repository: SharedRepository,
    policy: EditPolicy,
}

impl EditController {
    pub fn new(repository: SharedRepository, policy: EditPolicy) -> Self {
        Self { repository, policy }
    }

    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }

    /// Current pending state of a conversation
    pub async fn pending(&self, dialogue: &EditDialogue) -> Result<EditState, EditError> {
        Ok(dialogue.get().await?.unwrap_or_default())
    }

    /// Wait for a new value of `field`, replacing any pending edit
    ///
    /// The project must exist under `owner_id`; otherwise the conversation
    /// state is left untouched and `NotFound` is returned.
    pub async fn start_edit(
        &self,
        dialogue: &EditDialogue,
        owner_id: &OwnerId,
        project_id: &ProjectId,
        field: ProjectField,
    ) -> Result<Project, EditError> {
        let project = self.repository.lock().await.get_project(owner_id, project_id)?;

        dialogue
            .update(EditState::AwaitingValue {
                project_id: project_id.clone(),
                field,
            })
            .await?;

        debug!(owner_id = %owner_id, project_id = %project_id, field = %field, "Edit started");
        Ok(project)
    }

    /// Wait for a wallet secret to import with `role`
    pub async fn start_wallet_import(
        &self,
        dialogue: &EditDialogue,
        owner_id: &OwnerId,
        project_id: &ProjectId,
        role: WalletRole,
    ) -> Result<Project, EditError> {
        let project = self.repository.lock().await.get_project(owner_id, project_id)?;

        dialogue
            .update(EditState::AwaitingWalletSecret {
                project_id: project_id.clone(),
                role,
            })
            .await?;

        debug!(owner_id = %owner_id, project_id = %project_id, role = role.as_str(), "Wallet import started");
        Ok(project)
    }

    /// Create a project from a name given up front, validated like a
    /// prompted name
    pub async fn create_named_project(
        &self,
        owner_id: &OwnerId,
        name: &str,
    ) -> Result<EditOutcome, EditError> {
        let name = match validate_required_value(name, &self.policy) {
            Ok(name) => name,
            Err(rejection) => return Ok(self.rejected(owner_id, rejection)),
        };

        let project = self.repository.lock().await.create_project(owner_id, &name)?;
        Ok(EditOutcome::Created(project))
    }

    /// Wait for the name of a project to create
    pub async fn start_project_creation(&self, dialogue: &EditDialogue) -> Result<(), EditError> {
        dialogue.update(EditState::AwaitingProjectName).await?;
        Ok(())
    }

    /// Drop the pending edit; returns whether one was pending
    pub async fn cancel(&self, dialogue: &EditDialogue) -> Result<bool, EditError> {
        let pending = !self.pending(dialogue).await?.is_idle();
        if pending {
            dialogue.exit().await?;
        }
        Ok(pending)
    }

    /// Consume a free-text message
    ///
    /// With nothing pending the message passes through untouched. Otherwise
    /// the value is applied and the conversation returns to idle, except when
    /// the value is rejected or the write fails, in which case the edit stays
    /// pending so the user can send it again.
    pub async fn handle_text(
        &self,
        dialogue: &EditDialogue,
        owner_id: &OwnerId,
        text: &str,
    ) -> Result<EditOutcome, EditError> {
        match self.pending(dialogue).await? {
            EditState::Idle => Ok(EditOutcome::PassThrough),
            EditState::AwaitingValue { project_id, field } => {
                let value = match validate_field_value(text, &self.policy) {
                    Ok(value) => value,
                    Err(rejection) => return Ok(self.rejected(owner_id, rejection)),
                };

                let result = self
                    .repository
                    .lock()
                    .await
                    .update_field(owner_id, &project_id, field, &value);
                let project = complete(dialogue, result).await?;

                info!(owner_id = %owner_id, project_id = %project_id, field = %field, "Pending edit applied");
                Ok(EditOutcome::Updated { project, field })
            }
            EditState::AwaitingWalletSecret { project_id, role } => {
                let secret = match validate_required_value(text, &self.policy) {
                    Ok(secret) => secret,
                    Err(rejection) => return Ok(self.rejected(owner_id, rejection)),
                };

                let result = self.repository.lock().await.add_wallet(
                    owner_id,
                    &project_id,
                    Wallet::new(role, secret),
                );
                let project = complete(dialogue, result).await?;
                Ok(EditOutcome::WalletAdded(project))
            }
            EditState::AwaitingProjectName => {
                let name = match validate_required_value(text, &self.policy) {
                    Ok(name) => name,
                    Err(rejection) => return Ok(self.rejected(owner_id, rejection)),
                };

                let result = self.repository.lock().await.create_project(owner_id, &name);
                let project = complete(dialogue, result).await?;
                Ok(EditOutcome::Created(project))
            }
        }
    }

    fn rejected(&self, owner_id: &OwnerId, rejection: ValueRejection) -> EditOutcome {
        debug!(owner_id = %owner_id, rejection = ?rejection, "Pending edit value rejected");
        EditOutcome::Rejected(rejection)
    }
}

/// Leave the pending state unless the failure was a write error
async fn complete<T>(
    dialogue: &EditDialogue,
    result: Result<T, RepositoryError>,
) -> Result<T, EditError> {
    match result {
        Ok(value) => {
            dialogue.exit().await?;
            Ok(value)
        }
        Err(RepositoryError::Persistence(e)) => {
            warn!(error = %e, "Pending edit kept after failed write");
            Err(RepositoryError::Persistence(e).into())
        }
        Err(e) => {
            dialogue.exit().await?;
            Err(e.into())
        }
    }
}
