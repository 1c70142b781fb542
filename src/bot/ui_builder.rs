//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import project types
use crate::callback::Action;
use crate::config::DeployPolicy;
use crate::project::{
    missing_required_fields, render_status, Project, ProjectField, RequiredField, WalletRole,
};

/// A message body together with its inline keyboard
#[derive(Clone, Debug)]
pub struct Screen {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

impl Screen {
    fn new(text: String, rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self {
            text,
            keyboard: InlineKeyboardMarkup::new(rows),
        }
    }
}

fn button(label: impl Into<String>, action: Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.into(), action.encode())
}

fn back_button(action: Action, language_code: Option<&str>) -> InlineKeyboardButton {
    button(format!("⬅️ {}", t_lang("btn-back", language_code)), action)
}

/// Localized label of a project field
pub fn field_label(field: ProjectField, language_code: Option<&str>) -> String {
    t_lang(&format!("field-{}", field.as_str()), language_code)
}

/// Localized label of a required field
pub fn required_field_label(field: RequiredField, language_code: Option<&str>) -> String {
    t_lang(&format!("field-{}", field.as_str()), language_code)
}

pub fn wallet_role_label(role: WalletRole, language_code: Option<&str>) -> String {
    t_lang(&format!("wallet-role-{}", role.as_str()), language_code)
}

/// Comma separated list of missing fields
pub fn format_missing_fields(missing: &[RequiredField], language_code: Option<&str>) -> String {
    missing
        .iter()
        .map(|field| required_field_label(*field, language_code))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn start_screen(language_code: Option<&str>) -> Screen {
    let text = format!(
        "🌟 {}\n\n{}\n\n{}",
        t_lang("welcome-title", language_code),
        t_lang("welcome-description", language_code),
        t_lang("welcome-commands", language_code)
    );
    Screen::new(
        text,
        vec![
            vec![button(format!("🏠 {}", t_lang("btn-home", language_code)), Action::Home)],
            vec![button(
                format!("⚙️ {}", t_lang("btn-settings", language_code)),
                Action::Settings,
            )],
        ],
    )
}

pub fn home_screen(first_name: &str, language_code: Option<&str>) -> Screen {
    let text = t_args_lang("home-greeting", &[("name", first_name)], language_code);
    Screen::new(
        text,
        vec![
            vec![
                button(
                    format!("📂 {}", t_lang("btn-projects", language_code)),
                    Action::ListProjects,
                ),
                button(
                    format!("🚀 {}", t_lang("btn-create-project", language_code)),
                    Action::CreateProject,
                ),
            ],
            vec![
                button(
                    format!("🤑 {}", t_lang("btn-bump-bot", language_code)),
                    Action::Unavailable,
                ),
                button(
                    format!("🎁 {}", t_lang("btn-dev-rewards", language_code)),
                    Action::Unavailable,
                ),
            ],
            vec![button(
                format!("⚙️ {}", t_lang("btn-settings", language_code)),
                Action::Settings,
            )],
        ],
    )
}

pub fn settings_screen(language_code: Option<&str>) -> Screen {
    let text = format!(
        "⚙️ {}\n\n{}",
        t_lang("settings-title", language_code),
        t_lang("settings-description", language_code)
    );
    Screen::new(
        text,
        vec![
            vec![button(
                format!("🎯 {}", t_lang("btn-lsnipe-settings", language_code)),
                Action::Unavailable,
            )],
            vec![back_button(Action::Home, language_code)],
        ],
    )
}

pub fn unavailable_screen(language_code: Option<&str>) -> Screen {
    Screen::new(
        format!("🚧 {}", t_lang("unavailable-text", language_code)),
        vec![vec![back_button(Action::Home, language_code)]],
    )
}

/// Project list with one open button per project
pub fn projects_screen(projects: &[Project], language_code: Option<&str>) -> Screen {
    let mut rows = Vec::new();

    let text = if projects.is_empty() {
        format!("📂 {}", t_lang("projects-empty", language_code))
    } else {
        format!("📂 {}", t_lang("projects-title", language_code))
    };

    for project in projects {
        let marker = if project.deployed { "🚀" } else { "📄" };
        rows.push(vec![button(
            format!("{marker} {}", project.name),
            Action::Open(project.id.clone()),
        )]);
    }

    rows.push(vec![button(
        format!("➕ {}", t_lang("btn-create-project", language_code)),
        Action::CreateProject,
    )]);
    rows.push(vec![back_button(Action::Home, language_code)]);

    Screen::new(text, rows)
}

/// Project overview with deploy readiness
pub fn project_screen(
    project: &Project,
    policy: &DeployPolicy,
    language_code: Option<&str>,
) -> Screen {
    let missing_value = t_lang("value-missing", language_code);
    let mut text = t_args_lang("project-title", &[("name", &project.name)], language_code);
    text.push('\n');
    text.push_str(&t_args_lang("project-id-line", &[("id", project.id.as_str())], language_code));
    text.push_str("\n\n");

    for field in [ProjectField::Symbol, ProjectField::Description] {
        text.push_str(&format!(
            "{}: {}\n",
            field_label(field, language_code),
            project.field(field).unwrap_or(missing_value.as_str())
        ));
    }
    text.push_str(&t_args_lang(
        "project-wallets-count",
        &[("count", &project.wallets.len().to_string())],
        language_code,
    ));
    text.push_str("\n\n");

    let missing = missing_required_fields(project, policy);
    if project.deployed {
        text.push_str(&t_lang("project-deployed", language_code));
    } else if missing.is_empty() {
        text.push_str(&t_lang("project-ready", language_code));
    } else {
        text.push_str(&t_args_lang(
            "project-missing",
            &[("fields", &format_missing_fields(&missing, language_code))],
            language_code,
        ));
    }

    let id = &project.id;
    Screen::new(
        text,
        vec![
            vec![
                button(
                    format!("🎯 {}", t_lang("btn-metadata", language_code)),
                    Action::Metadata(id.clone()),
                ),
                button(
                    format!("🏦 {}", t_lang("btn-wallets", language_code)),
                    Action::Wallets(id.clone()),
                ),
            ],
            vec![button(
                format!("🚀 {}", t_lang("btn-deploy", language_code)),
                Action::Deploy(id.clone()),
            )],
            vec![button(
                format!("🗑️ {}", t_lang("btn-delete", language_code)),
                Action::Delete(id.clone()),
            )],
            vec![back_button(Action::ListProjects, language_code)],
        ],
    )
}

/// Field picker, two fields per row, each decorated with its set/unset status
pub fn metadata_screen(project: &Project, language_code: Option<&str>) -> Screen {
    let deployed_line = if project.deployed {
        format!("✅ {}", t_lang("metadata-deployed", language_code))
    } else {
        format!("❌ {}", t_lang("metadata-not-deployed", language_code))
    };
    let text = format!(
        "🎯 {}\n{}",
        t_args_lang("metadata-title", &[("name", &project.name)], language_code),
        deployed_line
    );

    let field_buttons: Vec<InlineKeyboardButton> = render_status(project)
        .into_iter()
        .map(|status| {
            let marker = if status.is_set { "✅" } else { "❌" };
            button(
                format!("{marker} {}", field_label(status.field, language_code)),
                Action::StartEdit(project.id.clone(), status.field),
            )
        })
        .collect();

    let mut rows: Vec<Vec<InlineKeyboardButton>> =
        field_buttons.chunks(2).map(|chunk| chunk.to_vec()).collect();
    rows.push(vec![button(
        format!("🚀 {}", t_lang("btn-deploy", language_code)),
        Action::Deploy(project.id.clone()),
    )]);
    rows.push(vec![back_button(Action::Open(project.id.clone()), language_code)]);

    Screen::new(text, rows)
}

/// Wallet list with masked secrets
pub fn wallets_screen(project: &Project, language_code: Option<&str>) -> Screen {
    let mut text = format!(
        "🏦 {}\n\n",
        t_args_lang("wallets-title", &[("name", &project.name)], language_code)
    );

    if project.wallets.is_empty() {
        text.push_str(&t_lang("wallets-empty", language_code));
    } else {
        for (i, wallet) in project.wallets.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} {}\n",
                i + 1,
                wallet_role_label(wallet.role, language_code),
                wallet.masked_secret()
            ));
        }
    }

    let id = &project.id;
    Screen::new(
        text,
        vec![
            vec![button(
                format!("➕ {}", t_lang("btn-wallet-create", language_code)),
                Action::WalletCreate(id.clone()),
            )],
            vec![button(
                format!("📥 {}", t_lang("btn-wallet-import", language_code)),
                Action::WalletImport(id.clone(), WalletRole::Imported),
            )],
            vec![button(
                format!("👑 {}", t_lang("btn-wallet-creator", language_code)),
                Action::WalletImport(id.clone(), WalletRole::Creator),
            )],
            vec![back_button(Action::Open(id.clone()), language_code)],
        ],
    )
}

fn cancel_keyboard(language_code: Option<&str>) -> Vec<Vec<InlineKeyboardButton>> {
    vec![vec![button(
        format!("❌ {}", t_lang("btn-cancel", language_code)),
        Action::CancelEdit,
    )]]
}

/// Prompt asking for the next value of a field
pub fn edit_prompt(project: &Project, field: ProjectField, language_code: Option<&str>) -> Screen {
    let label = field_label(field, language_code);
    let mut text = format!(
        "✏️ {}",
        t_args_lang(
            "edit-prompt",
            &[("field", &label), ("name", &project.name)],
            language_code
        )
    );
    if let Some(current) = project.field(field).filter(|value| !value.is_empty()) {
        text.push_str("\n\n");
        text.push_str(&t_args_lang("edit-current", &[("value", current)], language_code));
    }
    Screen::new(text, cancel_keyboard(language_code))
}

pub fn wallet_import_prompt(
    project: &Project,
    role: WalletRole,
    language_code: Option<&str>,
) -> Screen {
    let text = format!(
        "📥 {}",
        t_args_lang(
            "wallet-import-prompt",
            &[
                ("role", &wallet_role_label(role, language_code)),
                ("name", &project.name)
            ],
            language_code
        )
    );
    Screen::new(text, cancel_keyboard(language_code))
}

pub fn project_name_prompt(language_code: Option<&str>) -> Screen {
    Screen::new(
        format!("📝 {}", t_lang("project-name-prompt", language_code)),
        cancel_keyboard(language_code),
    )
}
