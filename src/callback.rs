//! Inline button action tokens.
//!
//! Tokens are `tag[:arg]*`. Project ids are alphanumeric, so `:` can never
//! appear inside an argument and splitting is unambiguous.

use regex::Regex;
use std::sync::LazyLock;

use crate::project::{ProjectField, ProjectId, WalletRole};

pub const SEPARATOR: char = ':';

/// Telegram rejects callback data longer than this
pub const MAX_CALLBACK_DATA_LEN: usize = 64;

static PROJECT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]{1,32}$").expect("Project id pattern should be valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Home,
    Settings,
    Unavailable,
    ListProjects,
    CreateProject,
    CancelEdit,
    Open(ProjectId),
    Metadata(ProjectId),
    StartEdit(ProjectId, ProjectField),
    Deploy(ProjectId),
    Delete(ProjectId),
    Wallets(ProjectId),
    WalletCreate(ProjectId),
    WalletImport(ProjectId, WalletRole),
}

impl Action {
    pub fn encode(&self) -> String {
        let parts: Vec<&str> = match self {
            Action::Home => vec!["home"],
            Action::Settings => vec!["settings"],
            Action::Unavailable => vec!["unavailable"],
            Action::ListProjects => vec!["projects"],
            Action::CreateProject => vec!["create"],
            Action::CancelEdit => vec!["cancel"],
            Action::Open(id) => vec!["open", id.as_str()],
            Action::Metadata(id) => vec!["meta", id.as_str()],
            Action::StartEdit(id, field) => vec!["edit", id.as_str(), field.as_str()],
            Action::Deploy(id) => vec!["deploy", id.as_str()],
            Action::Delete(id) => vec!["delete", id.as_str()],
            Action::Wallets(id) => vec!["wallets", id.as_str()],
            Action::WalletCreate(id) => vec!["wcreate", id.as_str()],
            Action::WalletImport(id, role) => vec!["wimport", id.as_str(), role.as_str()],
        };
        let token = parts.join(&SEPARATOR.to_string());
        debug_assert!(token.len() <= MAX_CALLBACK_DATA_LEN);
        token
    }

    /// Parse a token; anything malformed yields `None`
    pub fn decode(token: &str) -> Option<Action> {
        let parts: Vec<&str> = token.split(SEPARATOR).collect();
        let action = match parts.as_slice() {
            ["home"] => Action::Home,
            ["settings"] => Action::Settings,
            ["unavailable"] => Action::Unavailable,
            ["projects"] => Action::ListProjects,
            ["create"] => Action::CreateProject,
            ["cancel"] => Action::CancelEdit,
            ["open", id] => Action::Open(project_id(id)?),
            ["meta", id] => Action::Metadata(project_id(id)?),
            ["edit", id, field] => Action::StartEdit(project_id(id)?, field.parse().ok()?),
            ["deploy", id] => Action::Deploy(project_id(id)?),
            ["delete", id] => Action::Delete(project_id(id)?),
            ["wallets", id] => Action::Wallets(project_id(id)?),
            ["wcreate", id] => Action::WalletCreate(project_id(id)?),
            ["wimport", id, role] => Action::WalletImport(project_id(id)?, role.parse().ok()?),
            _ => return None,
        };
        Some(action)
    }
}

fn project_id(raw: &str) -> Option<ProjectId> {
    PROJECT_ID_PATTERN
        .is_match(raw)
        .then(|| ProjectId(raw.to_string()))
}
