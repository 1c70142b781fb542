//! Dialogue Manager module turning edit outcomes and core errors into replies

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{error, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import core types
use crate::config::DeployPolicy;
use crate::dialogue::ValueRejection;
use crate::edit_controller::{EditController, EditOutcome};
use crate::errors::{EditError, RepositoryError};
use crate::project::{OwnerId, Project, ProjectField, ProjectId};

// Import UI builder functions
use super::ui_builder::{
    field_label, format_missing_fields, metadata_screen, project_screen, wallets_screen, Screen,
};

/// Send a screen as a new message
pub async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> Result<()> {
    bot.send_message(chat_id, screen.text)
        .reply_markup(screen.keyboard)
        .await?;
    Ok(())
}

/// Fetch a project together with the deploy policy used to render it
pub async fn load_project(
    controller: &EditController,
    owner_id: &OwnerId,
    project_id: &ProjectId,
) -> Result<(Project, DeployPolicy), RepositoryError> {
    let repository = controller.repository().lock().await;
    let project = repository.get_project(owner_id, project_id)?;
    Ok((project, repository.deploy_policy().clone()))
}

/// User-facing text for a repository failure
pub fn repository_error_text(err: &RepositoryError, language_code: Option<&str>) -> String {
    match err {
        RepositoryError::NotFound(_) => t_lang("error-not-found", language_code),
        RepositoryError::ValidationFailed { missing } => t_args_lang(
            "deploy-missing",
            &[("fields", &format_missing_fields(missing, language_code))],
            language_code,
        ),
        RepositoryError::UnknownField(_) | RepositoryError::Persistence(_) => {
            t_lang("error-generic", language_code)
        }
    }
}

/// User-facing text for an edit controller failure
pub fn edit_error_text(err: &EditError, language_code: Option<&str>) -> String {
    match err {
        EditError::Repository(e) => repository_error_text(e, language_code),
        EditError::Dialogue(_) => t_lang("error-generic", language_code),
    }
}

/// User-facing text for a refused value
pub fn rejection_text(rejection: ValueRejection, language_code: Option<&str>) -> String {
    match rejection {
        ValueRejection::Empty => t_lang("edit-rejected-empty", language_code),
        ValueRejection::TooLong { max } => {
            t_args_lang("edit-rejected-too-long", &[("max", &max.to_string())], language_code)
        }
    }
}

pub async fn report_repository_error(
    bot: &Bot,
    chat_id: ChatId,
    err: &RepositoryError,
    language_code: Option<&str>,
) -> Result<()> {
    match err {
        RepositoryError::NotFound(_) | RepositoryError::ValidationFailed { .. } => {
            warn!(user_id = %chat_id, error = %err, "Project operation refused");
        }
        _ => error!(user_id = %chat_id, error = %err, "Project operation failed"),
    }
    bot.send_message(chat_id, repository_error_text(err, language_code))
        .await?;
    Ok(())
}

pub async fn report_edit_error(
    bot: &Bot,
    chat_id: ChatId,
    err: &EditError,
    language_code: Option<&str>,
) -> Result<()> {
    match err {
        EditError::Repository(e) => report_repository_error(bot, chat_id, e, language_code).await,
        EditError::Dialogue(e) => {
            error!(user_id = %chat_id, error = %e, "Dialogue storage failed");
            bot.send_message(chat_id, edit_error_text(err, language_code))
                .await?;
            Ok(())
        }
    }
}

fn with_notice(notice: String, mut screen: Screen) -> Screen {
    screen.text = format!("{notice}\n\n{}", screen.text);
    screen
}

/// Reply to a consumed pending edit
pub async fn handle_edit_outcome(
    bot: &Bot,
    chat_id: ChatId,
    controller: &EditController,
    outcome: EditOutcome,
    language_code: Option<&str>,
) -> Result<()> {
    match outcome {
        EditOutcome::PassThrough => Ok(()),
        EditOutcome::Updated { project, field } => {
            let notice = t_args_lang(
                "edit-saved",
                &[("field", &field_label(field, language_code))],
                language_code,
            );
            let screen = if field == ProjectField::Name {
                let policy = controller.repository().lock().await.deploy_policy().clone();
                project_screen(&project, &policy, language_code)
            } else {
                metadata_screen(&project, language_code)
            };
            send_screen(bot, chat_id, with_notice(notice, screen)).await
        }
        EditOutcome::Created(project) => {
            let notice = t_args_lang("project-created", &[("name", &project.name)], language_code);
            let policy = controller.repository().lock().await.deploy_policy().clone();
            let screen = project_screen(&project, &policy, language_code);
            send_screen(bot, chat_id, with_notice(notice, screen)).await
        }
        EditOutcome::WalletAdded(project) => {
            let notice = t_args_lang("wallet-added", &[("name", &project.name)], language_code);
            send_screen(bot, chat_id, with_notice(notice, wallets_screen(&project, language_code)))
                .await
        }
        EditOutcome::Rejected(rejection) => {
            bot.send_message(chat_id, rejection_text(rejection, language_code))
                .await?;
            Ok(())
        }
    }
}
