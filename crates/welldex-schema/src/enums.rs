//! Small closed-world enums shared across the canonical entities. Stored in
//! Postgres as plain `TEXT` columns (see `migrations/0001_init.sql`) — these
//! types own the `Display`/`FromStr` pair that converts between the Rust
//! representation and that column's string value.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    Oil,
    Gas,
    Mining,
    Energy,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetType::Oil => "oil",
            AssetType::Gas => "gas",
            AssetType::Mining => "mining",
            AssetType::Energy => "energy",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AssetType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oil" => Ok(Self::Oil),
            "gas" => Ok(Self::Gas),
            "mining" => Ok(Self::Mining),
            "energy" => Ok(Self::Energy),
            other => Err(UnknownVariant { kind: "AssetType", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetStatus {
    Active,
    Inactive,
    ShutIn,
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetStatus::Active => "active",
            AssetStatus::Inactive => "inactive",
            AssetStatus::ShutIn => "shut_in",
        };
        write!(f, "{s}")
    }
}

impl FromStr for AssetStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "shut_in" => Ok(Self::ShutIn),
            other => Err(UnknownVariant { kind: "AssetStatus", value: other.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceStatus {
    Success,
    Partial,
    Failed,
}

impl fmt::Display for ProvenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProvenanceStatus::Success => "success",
            ProvenanceStatus::Partial => "partial",
            ProvenanceStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ProvenanceStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "partial" => Ok(Self::Partial),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant { kind: "ProvenanceStatus", value: other.to_string() }),
        }
    }
}
