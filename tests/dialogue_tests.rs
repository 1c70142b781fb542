//! # Edit Dialogue Tests
//!
//! Drives the edit controller through a real in-memory dialogue storage,
//! the same way the dispatcher does for each chat.

use anyhow::Result;
use std::sync::Arc;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;

use vortex::config::{DeployPolicy, EditPolicy};
use vortex::dialogue::{EditDialogue, EditState, ValueRejection};
use vortex::edit_controller::{EditController, EditOutcome};
use vortex::errors::{EditError, RepositoryError};
use vortex::project::{OwnerId, Project, ProjectField, ProjectId, RequiredField, WalletRole};
use vortex::repository::ProjectRepository;
use vortex::storage::InMemoryStore;

struct Harness {
    controller: EditController,
    store: InMemoryStore,
    storage: Arc<InMemStorage<EditState>>,
}

impl Harness {
    fn new(deploy_policy: DeployPolicy, edit_policy: EditPolicy) -> Result<Self> {
        let store = InMemoryStore::new();
        let repository = ProjectRepository::open(store.clone(), deploy_policy)?.into_shared();
        Ok(Self {
            controller: EditController::new(repository, edit_policy),
            store,
            storage: InMemStorage::new(),
        })
    }

    fn dialogue(&self, chat: i64) -> EditDialogue {
        Dialogue::new(self.storage.clone(), ChatId(chat))
    }

    async fn create(&self, owner: &OwnerId, name: &str) -> Result<Project> {
        Ok(self.controller.repository().lock().await.create_project(owner, name)?)
    }

    async fn get(&self, owner: &OwnerId, id: &ProjectId) -> Result<Project> {
        Ok(self.controller.repository().lock().await.get_project(owner, id)?)
    }
}

fn default_harness() -> Result<Harness> {
    Harness::new(DeployPolicy::default(), EditPolicy::default())
}

#[tokio::test]
async fn test_symbol_edit_then_deploy_gate() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    let outcome = harness.controller.handle_text(&dialogue, &owner, "BTC").await?;

    match outcome {
        EditOutcome::Updated { project, field } => {
            assert_eq!(field, ProjectField::Symbol);
            assert_eq!(project.metadata.symbol.as_deref(), Some("BTC"));
        }
        other => panic!("Expected an update, got {other:?}"),
    }
    assert!(harness.controller.pending(&dialogue).await?.is_idle());

    let result = harness
        .controller
        .repository()
        .lock()
        .await
        .mark_deployed(&owner, &project.id);
    match result {
        Err(RepositoryError::ValidationFailed { missing }) => {
            assert_eq!(missing, vec![RequiredField::Description])
        }
        other => panic!("Expected validation failure, got {other:?}"),
    }

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Description)
        .await?;
    harness.controller.handle_text(&dialogue, &owner, "A coin").await?;

    let deployed = harness
        .controller
        .repository()
        .lock()
        .await
        .mark_deployed(&owner, &project.id)?;
    assert!(deployed.deployed);
    Ok(())
}

#[tokio::test]
async fn test_last_start_wins() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Twitter)
        .await?;

    harness.controller.handle_text(&dialogue, &owner, "@foo").await?;

    let project = harness.get(&owner, &project.id).await?;
    assert_eq!(project.metadata.twitter.as_deref(), Some("@foo"));
    assert_eq!(project.metadata.symbol, None);
    Ok(())
}

#[tokio::test]
async fn test_idle_message_passes_through() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    harness.create(&owner, "Foo").await?;
    let writes = harness.store.write_count();

    let outcome = harness.controller.handle_text(&dialogue, &owner, "hello").await?;

    assert_eq!(outcome, EditOutcome::PassThrough);
    assert_eq!(harness.store.write_count(), writes);
    assert_eq!(harness.controller.pending(&dialogue).await?, EditState::Idle);
    Ok(())
}

#[tokio::test]
async fn test_single_use_edit() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Website)
        .await?;
    harness
        .controller
        .handle_text(&dialogue, &owner, "https://foo.io")
        .await?;

    // The follow-up message is a normal message again
    let outcome = harness
        .controller
        .handle_text(&dialogue, &owner, "https://bar.io")
        .await?;
    assert_eq!(outcome, EditOutcome::PassThrough);

    let project = harness.get(&owner, &project.id).await?;
    assert_eq!(project.metadata.website.as_deref(), Some("https://foo.io"));
    Ok(())
}

#[tokio::test]
async fn test_empty_value_rejected_by_default() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;
    let writes = harness.store.write_count();

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    let outcome = harness.controller.handle_text(&dialogue, &owner, "   ").await?;

    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::Empty));
    assert_eq!(harness.store.write_count(), writes);
    // Still waiting for a usable value
    assert!(matches!(
        harness.controller.pending(&dialogue).await?,
        EditState::AwaitingValue { field: ProjectField::Symbol, .. }
    ));

    harness.controller.handle_text(&dialogue, &owner, "FOO").await?;
    let project = harness.get(&owner, &project.id).await?;
    assert_eq!(project.metadata.symbol.as_deref(), Some("FOO"));
    Ok(())
}

#[tokio::test]
async fn test_empty_value_allowed_when_policy_permits() -> Result<()> {
    let harness = Harness::new(
        DeployPolicy::default(),
        EditPolicy {
            reject_empty: false,
            ..EditPolicy::default()
        },
    )?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    harness.controller.handle_text(&dialogue, &owner, "FOO").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    let outcome = harness.controller.handle_text(&dialogue, &owner, "").await?;
    assert!(matches!(outcome, EditOutcome::Updated { .. }));

    let project = harness.get(&owner, &project.id).await?;
    assert_eq!(project.metadata.symbol.as_deref(), Some(""));
    assert!(!project.is_field_set(ProjectField::Symbol));
    Ok(())
}

#[tokio::test]
async fn test_too_long_value_rejected() -> Result<()> {
    let harness = Harness::new(
        DeployPolicy::default(),
        EditPolicy {
            max_value_len: 8,
            ..EditPolicy::default()
        },
    )?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Description)
        .await?;
    let outcome = harness
        .controller
        .handle_text(&dialogue, &owner, "far too long for this")
        .await?;

    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::TooLong { max: 8 }));
    assert_eq!(harness.get(&owner, &project.id).await?.metadata.description, None);
    Ok(())
}

#[tokio::test]
async fn test_start_edit_on_missing_project() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");

    let result = harness
        .controller
        .start_edit(&dialogue, &owner, &ProjectId::from("nope"), ProjectField::Symbol)
        .await;

    assert!(matches!(result, Err(ref e) if e.is_not_found()));
    assert!(harness.controller.pending(&dialogue).await?.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_start_edit_on_other_owners_project() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(2);
    let project = harness.create(&OwnerId::from("u1"), "Foo").await?;

    let result = harness
        .controller
        .start_edit(&dialogue, &OwnerId::from("u2"), &project.id, ProjectField::Symbol)
        .await;

    assert!(matches!(
        result,
        Err(EditError::Repository(RepositoryError::NotFound(_)))
    ));
    Ok(())
}

#[tokio::test]
async fn test_project_deleted_while_edit_pending() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    harness
        .controller
        .repository()
        .lock()
        .await
        .delete_project(&owner, &project.id)?;

    let result = harness.controller.handle_text(&dialogue, &owner, "FOO").await;
    assert!(matches!(result, Err(ref e) if e.is_not_found()));
    assert!(harness.controller.pending(&dialogue).await?.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_failed_write_keeps_edit_pending() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Symbol)
        .await?;
    harness.store.set_fail_writes(true);

    let result = harness.controller.handle_text(&dialogue, &owner, "FOO").await;
    assert!(matches!(
        result,
        Err(EditError::Repository(RepositoryError::Persistence(_)))
    ));
    assert_eq!(harness.get(&owner, &project.id).await?.metadata.symbol, None);
    assert!(!harness.controller.pending(&dialogue).await?.is_idle());

    // Retrying once storage recovers applies the value
    harness.store.set_fail_writes(false);
    harness.controller.handle_text(&dialogue, &owner, "FOO").await?;
    assert_eq!(
        harness.get(&owner, &project.id).await?.metadata.symbol.as_deref(),
        Some("FOO")
    );
    Ok(())
}

#[tokio::test]
async fn test_cancel() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    assert!(!harness.controller.cancel(&dialogue).await?);

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Image)
        .await?;
    assert!(harness.controller.cancel(&dialogue).await?);

    let outcome = harness
        .controller
        .handle_text(&dialogue, &owner, "https://img")
        .await?;
    assert_eq!(outcome, EditOutcome::PassThrough);
    assert_eq!(harness.get(&owner, &project.id).await?.metadata.image, None);
    Ok(())
}

#[tokio::test]
async fn test_conversations_are_independent() -> Result<()> {
    let harness = default_harness()?;
    let first = harness.dialogue(1);
    let second = harness.dialogue(2);
    let owner_one = OwnerId::from("1");
    let owner_two = OwnerId::from("2");
    let project = harness.create(&owner_one, "Foo").await?;

    harness
        .controller
        .start_edit(&first, &owner_one, &project.id, ProjectField::Symbol)
        .await?;

    let outcome = harness.controller.handle_text(&second, &owner_two, "FOO").await?;
    assert_eq!(outcome, EditOutcome::PassThrough);
    assert!(!harness.controller.pending(&first).await?.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_wallet_import() -> Result<()> {
    let harness = Harness::new(DeployPolicy { require_wallet: true }, EditPolicy::default())?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_wallet_import(&dialogue, &owner, &project.id, WalletRole::Creator)
        .await?;
    assert_eq!(
        harness.controller.handle_text(&dialogue, &owner, " ").await?,
        EditOutcome::Rejected(ValueRejection::Empty)
    );

    let outcome = harness
        .controller
        .handle_text(&dialogue, &owner, " 5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3 ")
        .await?;

    match outcome {
        EditOutcome::WalletAdded(project) => {
            assert_eq!(project.wallets.len(), 1);
            assert_eq!(project.wallets[0].role, WalletRole::Creator);
            assert_eq!(
                project.wallets[0].secret,
                "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3"
            );
        }
        other => panic!("Expected a wallet, got {other:?}"),
    }
    assert!(harness.controller.pending(&dialogue).await?.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_project_creation_from_name() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");

    harness.controller.start_project_creation(&dialogue).await?;
    assert_eq!(
        harness.controller.pending(&dialogue).await?,
        EditState::AwaitingProjectName
    );

    let outcome = harness.controller.handle_text(&dialogue, &owner, "  Moon  ").await?;
    let created = match outcome {
        EditOutcome::Created(project) => project,
        other => panic!("Expected a project, got {other:?}"),
    };
    assert_eq!(created.name, "Moon");

    let projects = harness.controller.repository().lock().await.list_projects(&owner);
    assert_eq!(projects, vec![created]);
    Ok(())
}

#[tokio::test]
async fn test_project_name_never_empty() -> Result<()> {
    let harness = Harness::new(
        DeployPolicy::default(),
        EditPolicy {
            reject_empty: false,
            ..EditPolicy::default()
        },
    )?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");

    harness.controller.start_project_creation(&dialogue).await?;
    let outcome = harness.controller.handle_text(&dialogue, &owner, "").await?;

    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::Empty));
    assert!(harness.controller.repository().lock().await.list_projects(&owner).is_empty());
    Ok(())
}

#[tokio::test]
async fn test_command_text_fills_pending_edit() -> Result<()> {
    let harness = default_harness()?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;

    harness
        .controller
        .start_edit(&dialogue, &owner, &project.id, ProjectField::Telegram)
        .await?;

    // A pending edit takes the message before any command dispatch
    let outcome = harness.controller.handle_text(&dialogue, &owner, "/home").await?;
    assert!(matches!(
        outcome,
        EditOutcome::Updated { field: ProjectField::Telegram, .. }
    ));
    assert_eq!(
        harness.get(&owner, &project.id).await?.metadata.telegram.as_deref(),
        Some("/home")
    );

    // Once consumed, the same text is left to command dispatch
    let outcome = harness.controller.handle_text(&dialogue, &owner, "/home").await?;
    assert_eq!(outcome, EditOutcome::PassThrough);
    Ok(())
}

#[tokio::test]
async fn test_wallet_secret_length_limited() -> Result<()> {
    let harness = Harness::new(
        DeployPolicy::default(),
        EditPolicy {
            max_value_len: 10,
            ..EditPolicy::default()
        },
    )?;
    let dialogue = harness.dialogue(1);
    let owner = OwnerId::from("u1");
    let project = harness.create(&owner, "Foo").await?;
    let writes = harness.store.write_count();

    harness
        .controller
        .start_wallet_import(&dialogue, &owner, &project.id, WalletRole::Imported)
        .await?;
    let outcome = harness
        .controller
        .handle_text(&dialogue, &owner, &"x".repeat(10_000))
        .await?;

    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::TooLong { max: 10 }));
    assert_eq!(harness.store.write_count(), writes);
    assert!(harness.get(&owner, &project.id).await?.wallets.is_empty());
    assert!(matches!(
        harness.controller.pending(&dialogue).await?,
        EditState::AwaitingWalletSecret { .. }
    ));
    Ok(())
}

#[tokio::test]
async fn test_inline_project_name_validated() -> Result<()> {
    let harness = Harness::new(
        DeployPolicy::default(),
        EditPolicy {
            max_value_len: 10,
            ..EditPolicy::default()
        },
    )?;
    let owner = OwnerId::from("u1");

    let outcome = harness
        .controller
        .create_named_project(&owner, &"M".repeat(300))
        .await?;
    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::TooLong { max: 10 }));

    let outcome = harness.controller.create_named_project(&owner, "   ").await?;
    assert_eq!(outcome, EditOutcome::Rejected(ValueRejection::Empty));
    assert!(harness.controller.repository().lock().await.list_projects(&owner).is_empty());

    let outcome = harness.controller.create_named_project(&owner, " Moon ").await?;
    match outcome {
        EditOutcome::Created(project) => assert_eq!(project.name, "Moon"),
        other => panic!("Expected a project, got {other:?}"),
    }
    Ok(())
}
