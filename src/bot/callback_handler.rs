//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::future::Future;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use teloxide::{ApiError, RequestError};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import core types
use crate::callback::Action;
use crate::dialogue::EditDialogue;
use crate::edit_controller::EditController;
use crate::errors::RepositoryError;
use crate::project::OwnerId;

// Import dialogue manager functions
use super::dialogue_manager::{
    load_project, report_edit_error, report_repository_error, send_screen,
};

// Import UI builder functions
use super::ui_builder::{
    edit_prompt, home_screen, metadata_screen, project_name_prompt, project_screen,
    projects_screen, settings_screen, unavailable_screen, wallet_import_prompt, wallets_screen,
    Screen,
};

/// How a failed in-place edit should be handled
#[derive(Debug, PartialEq, Eq)]
enum EditFailure {
    /// The message already shows this screen
    Unchanged,
    /// The message is gone or too old to edit; send the screen instead
    NotEditable,
    Other,
}

fn classify_edit_error(err: &RequestError) -> EditFailure {
    match err {
        RequestError::Api(ApiError::MessageNotModified) => EditFailure::Unchanged,
        RequestError::Api(ApiError::MessageCantBeEdited | ApiError::MessageToEditNotFound) => {
            EditFailure::NotEditable
        }
        _ => EditFailure::Other,
    }
}

/// Replace the pressed message with `screen`, sending a new one if it cannot be edited
async fn show(bot: &Bot, msg: &MaybeInaccessibleMessage, screen: Screen) -> Result<()> {
    let chat_id = msg.chat().id;
    let err = match bot
        .edit_message_text(chat_id, msg.id(), screen.text.clone())
        .reply_markup(screen.keyboard.clone())
        .await
    {
        Ok(_) => return Ok(()),
        Err(e) => e,
    };

    match classify_edit_error(&err) {
        EditFailure::Unchanged => {
            debug!(user_id = %chat_id, "Screen already up to date");
            Ok(())
        }
        EditFailure::NotEditable => {
            debug!(user_id = %chat_id, error = %err, "Message not editable, sending a new one");
            send_screen(bot, chat_id, screen).await
        }
        EditFailure::Other => Err(err.into()),
    }
}

/// Run `action`, then `answer` whatever the action returned
///
/// A failed action is logged; only a failed answer is reported to the caller.
async fn run_then_answer<A, B>(action: A, answer: B) -> Result<()>
where
    A: Future<Output = Result<()>>,
    B: Future<Output = Result<()>>,
{
    if let Err(e) = action.await {
        error!(error = %e, "Callback action failed");
    }
    answer.await
}

async fn handle_action(
    bot: &Bot,
    q: &CallbackQuery,
    msg: &MaybeInaccessibleMessage,
    controller: &EditController,
    dialogue: &EditDialogue,
    action: Action,
) -> Result<()> {
    let chat_id = msg.chat().id;
    let owner_id = OwnerId::from(chat_id);
    let language_code = q.from.language_code.as_deref();

    match action {
        Action::Home => show(bot, msg, home_screen(&q.from.first_name, language_code)).await,
        Action::Settings => show(bot, msg, settings_screen(language_code)).await,
        Action::Unavailable => show(bot, msg, unavailable_screen(language_code)).await,
        Action::ListProjects => {
            let projects = controller.repository().lock().await.list_projects(&owner_id);
            show(bot, msg, projects_screen(&projects, language_code)).await
        }
        Action::CreateProject => match controller.start_project_creation(dialogue).await {
            Ok(()) => send_screen(bot, chat_id, project_name_prompt(language_code)).await,
            Err(e) => report_edit_error(bot, chat_id, &e, language_code).await,
        },
        Action::CancelEdit => {
            let key = match controller.cancel(dialogue).await {
                Ok(true) => "edit-cancelled",
                Ok(false) => "edit-nothing-pending",
                Err(e) => return report_edit_error(bot, chat_id, &e, language_code).await,
            };
            show(
                bot,
                msg,
                Screen {
                    text: t_lang(key, language_code),
                    keyboard: home_screen(&q.from.first_name, language_code).keyboard,
                },
            )
            .await
        }
        Action::Open(project_id) => match load_project(controller, &owner_id, &project_id).await {
            Ok((project, policy)) => {
                show(bot, msg, project_screen(&project, &policy, language_code)).await
            }
            Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
        },
        Action::Metadata(project_id) => {
            match load_project(controller, &owner_id, &project_id).await {
                Ok((project, _)) => show(bot, msg, metadata_screen(&project, language_code)).await,
                Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
            }
        }
        Action::StartEdit(project_id, field) => {
            match controller
                .start_edit(dialogue, &owner_id, &project_id, field)
                .await
            {
                Ok(project) => {
                    send_screen(bot, chat_id, edit_prompt(&project, field, language_code)).await
                }
                Err(e) => report_edit_error(bot, chat_id, &e, language_code).await,
            }
        }
        Action::Deploy(project_id) => {
            let result = {
                let mut repository = controller.repository().lock().await;
                repository
                    .mark_deployed(&owner_id, &project_id)
                    .map(|project| (project, repository.deploy_policy().clone()))
            };
            match result {
                Ok((project, policy)) => {
                    info!(user_id = %chat_id, project_id = %project_id, "Deploy accepted");
                    bot.send_message(
                        chat_id,
                        t_args_lang("deploy-success", &[("name", &project.name)], language_code),
                    )
                    .await?;
                    show(bot, msg, project_screen(&project, &policy, language_code)).await
                }
                Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
            }
        }
        Action::Delete(project_id) => {
            let result = {
                let mut repository = controller.repository().lock().await;
                repository
                    .delete_project(&owner_id, &project_id)
                    .map(|deleted| (deleted, repository.list_projects(&owner_id)))
            };
            match result {
                Ok((true, projects)) => {
                    let mut screen = projects_screen(&projects, language_code);
                    screen.text = format!("{}\n\n{}", t_lang("project-deleted", language_code), screen.text);
                    show(bot, msg, screen).await
                }
                Ok((false, _)) => {
                    let err = RepositoryError::NotFound(project_id);
                    report_repository_error(bot, chat_id, &err, language_code).await
                }
                Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
            }
        }
        Action::Wallets(project_id) => match load_project(controller, &owner_id, &project_id).await {
            Ok((project, _)) => show(bot, msg, wallets_screen(&project, language_code)).await,
            Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
        },
        Action::WalletCreate(project_id) => {
            let result = controller
                .repository()
                .lock()
                .await
                .generate_wallet(&owner_id, &project_id);
            match result {
                Ok(project) => {
                    let mut screen = wallets_screen(&project, language_code);
                    screen.text = format!(
                        "{}\n\n{}",
                        t_args_lang("wallet-created", &[("name", &project.name)], language_code),
                        screen.text
                    );
                    show(bot, msg, screen).await
                }
                Err(e) => report_repository_error(bot, chat_id, &e, language_code).await,
            }
        }
        Action::WalletImport(project_id, role) => {
            match controller
                .start_wallet_import(dialogue, &owner_id, &project_id, role)
                .await
            {
                Ok(project) => {
                    send_screen(bot, chat_id, wallet_import_prompt(&project, role, language_code))
                        .await
                }
                Err(e) => report_edit_error(bot, chat_id, &e, language_code).await,
            }
        }
    }
}

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    controller: EditController,
    dialogue: EditDialogue,
) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    let action = q.data.as_deref().and_then(Action::decode);
    let dispatch = async {
        match (action, &q.message) {
            (Some(action), Some(msg)) => {
                debug!(user_id = %q.from.id, action = ?action, "Dispatching callback action");
                handle_action(&bot, &q, msg, &controller, &dialogue, action).await
            }
            (None, _) => {
                warn!(user_id = %q.from.id, data = ?q.data, "Ignoring malformed callback data");
                Ok(())
            }
            (Some(_), None) => {
                warn!(user_id = %q.from.id, "Callback query without message");
                Ok(())
            }
        }
    };

    // Answer the callback query to remove the loading state
    let answer = async {
        bot.answer_callback_query(q.id.clone()).await?;
        Ok::<(), anyhow::Error>(())
    };

    run_then_answer(dispatch, answer).await
}
