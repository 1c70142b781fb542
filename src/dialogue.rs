//! Edit dialogue module holding the per-conversation pending edit slot.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::config::EditPolicy;
use crate::project::{ProjectField, ProjectId, WalletRole};

/// What the next free-text message from a conversation means
///
/// Every variant other than `Idle` occupies the same single slot, so at most
/// one edit is pending per conversation and starting another replaces it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    #[default]
    Idle,
    AwaitingValue {
        project_id: ProjectId,
        field: ProjectField,
    },
    AwaitingWalletSecret {
        project_id: ProjectId,
        role: WalletRole,
    },
    AwaitingProjectName,
}

impl EditState {
    pub fn is_idle(&self) -> bool {
        matches!(self, EditState::Idle)
    }
}

/// Type alias for our edit dialogue
pub type EditDialogue = Dialogue<EditState, InMemStorage<EditState>>;

/// Why a captured value was refused
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueRejection {
    Empty,
    TooLong { max: usize },
}

/// Validates a free-text value against the edit policy
pub fn validate_field_value(value: &str, policy: &EditPolicy) -> Result<String, ValueRejection> {
    let trimmed = value.trim();

    if trimmed.is_empty() && policy.reject_empty {
        return Err(ValueRejection::Empty);
    }

    if trimmed.chars().count() > policy.max_value_len {
        return Err(ValueRejection::TooLong {
            max: policy.max_value_len,
        });
    }

    Ok(trimmed.to_string())
}

/// Validates a value that can never be blank, such as a project name or a
/// wallet secret, whatever `reject_empty` says
pub fn validate_required_value(value: &str, policy: &EditPolicy) -> Result<String, ValueRejection> {
    let value = validate_field_value(value, policy)?;
    if value.is_empty() {
        return Err(ValueRejection::Empty);
    }
    Ok(value)
}
