//! Capability policy and partial updates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File store access level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsAccess {
    /// No file store access at all.
    None,
    /// Reads only.
    Read,
    /// Reads and writes.
    #[default]
    ReadWrite,
}

impl FsAccess {
    /// Whether reads are allowed.
    #[must_use]
    pub fn can_read(self) -> bool {
        self != Self::None
    }

    /// Whether writes are allowed.
    #[must_use]
    pub fn can_write(self) -> bool {
        self == Self::ReadWrite
    }
}

impl fmt::Display for FsAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Read => write!(f, "read"),
            Self::ReadWrite => write!(f, "readwrite"),
        }
    }
}

impl FromStr for FsAccess {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "none" => Ok(Self::None),
            "read" => Ok(Self::Read),
            "readwrite" | "read_write" | "rw" => Ok(Self::ReadWrite),
            _ => Err(PolicyParseError {
                field: "fs",
                value: s.to_string(),
            }),
        }
    }
}

/// Allow/deny switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    /// Permitted.
    #[default]
    Allow,
    /// Refused.
    Deny,
}

impl Access {
    /// Whether this is [`Access::Allow`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Self::Allow
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "allow"),
            Self::Deny => write!(f, "deny"),
        }
    }
}

impl FromStr for Access {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(PolicyParseError {
                field: "access",
                value: s.to_string(),
            }),
        }
    }
}

/// A policy value string that names no known setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} setting: {value:?}")]
pub struct PolicyParseError {
    /// Which setting was being parsed.
    pub field: &'static str,
    /// The rejected input.
    pub value: String,
}

/// The permission set a kernel enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityPolicy {
    /// File store access. Also gates scheduler mutation.
    pub fs: FsAccess,
    /// Shell execution.
    pub shell: Access,
    /// Outbound network for collaborators that ask.
    pub network: Access,
    /// Whether notifications are delivered.
    pub notifications: bool,
    /// Whether bridge callers are barred from changing the policy.
    pub sandboxed: bool,
}

impl Default for CapabilityPolicy {
    fn default() -> Self {
        Self {
            fs: FsAccess::ReadWrite,
            shell: Access::Allow,
            network: Access::Allow,
            notifications: true,
            sandboxed: false,
        }
    }
}

impl CapabilityPolicy {
    /// The most restrictive policy.
    #[must_use]
    pub fn locked_down() -> Self {
        Self {
            fs: FsAccess::None,
            shell: Access::Deny,
            network: Access::Deny,
            notifications: false,
            sandboxed: true,
        }
    }

    /// This policy with every field set in `patch` replaced.
    #[must_use]
    pub fn merged(self, patch: &PolicyPatch) -> Self {
        Self {
            fs: patch.fs.unwrap_or(self.fs),
            shell: patch.shell.unwrap_or(self.shell),
            network: patch.network.unwrap_or(self.network),
            notifications: patch.notifications.unwrap_or(self.notifications),
            sandboxed: patch.sandboxed.unwrap_or(self.sandboxed),
        }
    }
}

/// A partial policy update. Absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyPatch {
    /// New file store access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsAccess>,
    /// New shell setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<Access>,
    /// New network setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Access>,
    /// New notification setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
    /// New sandbox setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandboxed: Option<bool>,
}
