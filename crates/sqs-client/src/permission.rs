//! Cross-account queue permissions.

use crate::error::ValidationError;
use crate::validation::check_account_id;
use std::fmt;
use std::str::FromStr;

/// Queue actions that can be granted to another account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionAction {
    /// Every action (`*`)
    All,
    SendMessage,
    ReceiveMessage,
    DeleteMessage,
    ChangeMessageVisibility,
    GetQueueAttributes,
    GetQueueUrl,
}

impl PermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "*",
            Self::SendMessage => "SendMessage",
            Self::ReceiveMessage => "ReceiveMessage",
            Self::DeleteMessage => "DeleteMessage",
            Self::ChangeMessageVisibility => "ChangeMessageVisibility",
            Self::GetQueueAttributes => "GetQueueAttributes",
            Self::GetQueueUrl => "GetQueueUrl",
        }
    }
}

impl fmt::Display for PermissionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "*" => Ok(Self::All),
            "SendMessage" => Ok(Self::SendMessage),
            "ReceiveMessage" => Ok(Self::ReceiveMessage),
            "DeleteMessage" => Ok(Self::DeleteMessage),
            "ChangeMessageVisibility" => Ok(Self::ChangeMessageVisibility),
            "GetQueueAttributes" => Ok(Self::GetQueueAttributes),
            "GetQueueUrl" => Ok(Self::GetQueueUrl),
            other => Err(ValidationError::InvalidFormat {
                field: "action_name".to_string(),
                message: format!("'{}' is not a grantable queue action", other),
            }),
        }
    }
}

/// Grant of one action to one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountPermission {
    pub account_id: String,
    pub action: PermissionAction,
}

impl AccountPermission {
    pub fn new(account_id: impl Into<String>, action: PermissionAction) -> Self {
        Self {
            account_id: account_id.into(),
            action,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        check_account_id(&self.account_id)
    }
}

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
