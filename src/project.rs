//! # Project Model
//!
//! Records owned by a conversation: a prospective token launch with its
//! metadata fields, attached wallets and deploy status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::DeployPolicy;
use crate::errors::RepositoryError;

/// Opaque project identifier, unique across the whole repository
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        ProjectId(value.to_string())
    }
}

/// Identifier of the conversation that owns a set of projects
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        OwnerId(value.to_string())
    }
}

impl From<teloxide::types::ChatId> for OwnerId {
    fn from(chat_id: teloxide::types::ChatId) -> Self {
        OwnerId(chat_id.0.to_string())
    }
}

/// Editable project fields: the top-level name plus every metadata entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectField {
    Name,
    Symbol,
    Description,
    Twitter,
    Telegram,
    Website,
    Image,
}

impl ProjectField {
    pub const ALL: [ProjectField; 7] = [
        ProjectField::Name,
        ProjectField::Symbol,
        ProjectField::Description,
        ProjectField::Twitter,
        ProjectField::Telegram,
        ProjectField::Website,
        ProjectField::Image,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectField::Name => "name",
            ProjectField::Symbol => "symbol",
            ProjectField::Description => "description",
            ProjectField::Twitter => "twitter",
            ProjectField::Telegram => "telegram",
            ProjectField::Website => "website",
            ProjectField::Image => "image",
        }
    }
}

impl fmt::Display for ProjectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectField {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| RepositoryError::UnknownField(s.to_string()))
    }
}

/// Metadata fields; `None` means the field was never set
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
}

/// How a wallet came to be attached to a project
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// Generated by the bot for the owner
    Owner,
    /// Imported from an existing secret
    Imported,
    /// Imported creator wallet
    Creator,
}

impl WalletRole {
    pub fn as_str(self) -> &'static str {
        match self {
            WalletRole::Owner => "owner",
            WalletRole::Imported => "imported",
            WalletRole::Creator => "creator",
        }
    }
}

impl FromStr for WalletRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(WalletRole::Owner),
            "imported" => Ok(WalletRole::Imported),
            "creator" => Ok(WalletRole::Creator),
            other => Err(format!("unknown wallet role: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub role: WalletRole,
    pub secret: String,
    pub added_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(role: WalletRole, secret: impl Into<String>) -> Self {
        Self {
            role,
            secret: secret.into(),
            added_at: Utc::now(),
        }
    }

    /// Secret with everything but the first and last four characters hidden
    pub fn masked_secret(&self) -> String {
        let chars: Vec<char> = self.secret.chars().collect();
        if chars.len() <= 8 {
            return "•".repeat(chars.len().max(4));
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}…{tail}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: OwnerId,
    pub name: String,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub deployed: bool,
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(id: ProjectId, owner_id: OwnerId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner_id,
            name: name.into(),
            metadata: ProjectMetadata::default(),
            deployed: false,
            wallets: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Current value of a field, `None` when absent
    pub fn field(&self, field: ProjectField) -> Option<&str> {
        let value = match field {
            ProjectField::Name => return Some(self.name.as_str()),
            ProjectField::Symbol => &self.metadata.symbol,
            ProjectField::Description => &self.metadata.description,
            ProjectField::Twitter => &self.metadata.twitter,
            ProjectField::Telegram => &self.metadata.telegram,
            ProjectField::Website => &self.metadata.website,
            ProjectField::Image => &self.metadata.image,
        };
        value.as_deref()
    }

    /// Overwrite exactly one field
    pub fn set_field(&mut self, field: ProjectField, value: String) {
        let slot = match field {
            ProjectField::Name => {
                self.name = value;
                return;
            }
            ProjectField::Symbol => &mut self.metadata.symbol,
            ProjectField::Description => &mut self.metadata.description,
            ProjectField::Twitter => &mut self.metadata.twitter,
            ProjectField::Telegram => &mut self.metadata.telegram,
            ProjectField::Website => &mut self.metadata.website,
            ProjectField::Image => &mut self.metadata.image,
        };
        *slot = Some(value);
    }

    pub fn is_field_set(&self, field: ProjectField) -> bool {
        self.field(field).is_some_and(|value| !value.trim().is_empty())
    }
}

/// Fields gating the deploy transition
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Symbol,
    Description,
    Wallet,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            RequiredField::Name => "name",
            RequiredField::Symbol => "symbol",
            RequiredField::Description => "description",
            RequiredField::Wallet => "wallet",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Required fields that are still empty, in a fixed order
pub fn missing_required_fields(project: &Project, policy: &DeployPolicy) -> Vec<RequiredField> {
    let mut missing = Vec::new();
    if !project.is_field_set(ProjectField::Name) {
        missing.push(RequiredField::Name);
    }
    if !project.is_field_set(ProjectField::Symbol) {
        missing.push(RequiredField::Symbol);
    }
    if !project.is_field_set(ProjectField::Description) {
        missing.push(RequiredField::Description);
    }
    if policy.require_wallet && project.wallets.is_empty() {
        missing.push(RequiredField::Wallet);
    }
    missing
}

pub fn is_deployable(project: &Project, policy: &DeployPolicy) -> bool {
    missing_required_fields(project, policy).is_empty()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldStatus {
    pub field: ProjectField,
    pub is_set: bool,
}

/// Which fields are populated, used to decorate menu buttons
pub fn render_status(project: &Project) -> Vec<FieldStatus> {
    ProjectField::ALL
        .into_iter()
        .map(|field| FieldStatus {
            field,
            is_set: project.is_field_set(field),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Project {
        Project::new(ProjectId::from("p1"), OwnerId::from("u1"), "Foo")
    }

    #[test]
    fn test_field_parsing() {
        assert_eq!("symbol".parse::<ProjectField>().unwrap(), ProjectField::Symbol);
        assert!(matches!(
            "deployed".parse::<ProjectField>(),
            Err(RepositoryError::UnknownField(name)) if name == "deployed"
        ));
    }

    #[test]
    fn test_set_field_touches_one_slot() {
        let mut project = sample();
        project.set_field(ProjectField::Website, "https://example.org".to_string());

        assert_eq!(project.field(ProjectField::Website), Some("https://example.org"));
        assert_eq!(project.field(ProjectField::Twitter), None);
        assert_eq!(project.name, "Foo");
    }

    #[test]
    fn test_missing_fields_order() {
        let project = Project::new(ProjectId::from("p1"), OwnerId::from("u1"), "");
        let policy = DeployPolicy { require_wallet: true };

        assert_eq!(
            missing_required_fields(&project, &policy),
            vec![
                RequiredField::Name,
                RequiredField::Symbol,
                RequiredField::Description,
                RequiredField::Wallet
            ]
        );
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut project = sample();
        project.set_field(ProjectField::Symbol, "   ".to_string());
        project.set_field(ProjectField::Description, "A token".to_string());

        let missing = missing_required_fields(&project, &DeployPolicy::default());
        assert_eq!(missing, vec![RequiredField::Symbol]);
    }

    #[test]
    fn test_render_status() {
        let mut project = sample();
        project.set_field(ProjectField::Image, "https://example.org/logo.png".to_string());

        let status = render_status(&project);
        assert_eq!(status.len(), ProjectField::ALL.len());
        assert!(status.iter().any(|s| s.field == ProjectField::Name && s.is_set));
        assert!(status.iter().any(|s| s.field == ProjectField::Image && s.is_set));
        assert!(status.iter().any(|s| s.field == ProjectField::Symbol && !s.is_set));
    }

    #[test]
    fn test_masked_secret() {
        let wallet = Wallet::new(WalletRole::Imported, "abcdef0123456789");
        assert_eq!(wallet.masked_secret(), "abcd…6789");

        let short = Wallet::new(WalletRole::Imported, "abc");
        assert_eq!(short.masked_secret(), "••••");
    }
}
