//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, info};

// Import localization
use crate::localization::t_lang;

// Import core types
use crate::dialogue::EditDialogue;
use crate::edit_controller::{EditController, EditOutcome};
use crate::project::OwnerId;

// Import dialogue manager functions
use super::dialogue_manager::{handle_edit_outcome, report_edit_error, send_screen};

// Import UI builder functions
use super::ui_builder::{home_screen, project_name_prompt, projects_screen, start_screen};

/// Bot commands understood while no edit is pending
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Home,
    Projects,
    /// `/new` with an optional inline project name
    New(Option<String>),
    Help,
}

impl Command {
    /// Parse `/command[@bot] [args]`
    pub fn parse(text: &str) -> Option<Command> {
        let text = text.trim();
        let (head, rest) = match text.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (text, ""),
        };
        let name = head.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);

        match name {
            "start" => Some(Command::Start),
            "home" => Some(Command::Home),
            "projects" => Some(Command::Projects),
            "new" => Some(Command::New((!rest.is_empty()).then(|| rest.to_string()))),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}

fn first_name(msg: &Message) -> &str {
    msg.from
        .as_ref()
        .map(|user| user.first_name.as_str())
        .unwrap_or("boss")
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    controller: &EditController,
    dialogue: &EditDialogue,
    command: Command,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let owner_id = OwnerId::from(chat_id);

    match command {
        Command::Start => send_screen(bot, chat_id, start_screen(language_code)).await,
        Command::Home => {
            send_screen(bot, chat_id, home_screen(first_name(msg), language_code)).await
        }
        Command::Projects => {
            let projects = controller.repository().lock().await.list_projects(&owner_id);
            send_screen(bot, chat_id, projects_screen(&projects, language_code)).await
        }
        Command::New(Some(name)) => match controller.create_named_project(&owner_id, &name).await {
            Ok(outcome) => {
                if let EditOutcome::Created(project) = &outcome {
                    info!(user_id = %chat_id, project_id = %project.id, "Project created from command");
                }
                handle_edit_outcome(bot, chat_id, controller, outcome, language_code).await
            }
            Err(e) => report_edit_error(bot, chat_id, &e, language_code).await,
        },
        Command::New(None) => match controller.start_project_creation(dialogue).await {
            Ok(()) => send_screen(bot, chat_id, project_name_prompt(language_code)).await,
            Err(e) => report_edit_error(bot, chat_id, &e, language_code).await,
        },
        Command::Help => {
            bot.send_message(chat_id, t_lang("help-text", language_code))
                .await?;
            Ok(())
        }
    }
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    controller: &EditController,
    dialogue: &EditDialogue,
    text: &str,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");

    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    let owner_id = OwnerId::from(msg.chat.id);

    // A pending edit takes the message before command dispatch
    match controller.handle_text(dialogue, &owner_id, text).await {
        Ok(EditOutcome::PassThrough) => {}
        Ok(outcome) => {
            return handle_edit_outcome(bot, msg.chat.id, controller, outcome, language_code).await;
        }
        Err(e) => return report_edit_error(bot, msg.chat.id, &e, language_code).await,
    }

    match Command::parse(text) {
        Some(command) => {
            handle_command(bot, msg, controller, dialogue, command, language_code).await
        }
        None => {
            bot.send_message(msg.chat.id, t_lang("text-response", language_code))
                .await?;
            Ok(())
        }
    }
}

async fn handle_unsupported_message(bot: &Bot, msg: &Message) -> Result<()> {
    // Extract user's language code from Telegram
    let language_code = msg
        .from
        .as_ref()
        .and_then(|user| user.language_code.as_ref())
        .map(|s| s.as_str());

    debug!(user_id = %msg.chat.id, "Received unsupported message type from user");

    bot.send_message(msg.chat.id, t_lang("text-response", language_code))
        .await?;
    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    controller: EditController,
    dialogue: EditDialogue,
) -> Result<()> {
    if let Some(text) = msg.text() {
        handle_text_message(&bot, &msg, &controller, &dialogue, text).await?;
    } else {
        handle_unsupported_message(&bot, &msg).await?;
    }

    Ok(())
}
