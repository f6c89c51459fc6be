use std::{fmt::Display, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::error::Error;

pub mod cache;

pub type Extras = serde_json::value::Map<String, serde_json::Value>;

/// Snapshot of a host resource in dictionary form, as the archive worker
/// expects to receive it. Extras are flattened into the top-level object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub package_id: String,
    pub url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub mimetype_inner: Option<String>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub created: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_modified: Option<NaiveDateTime>,
    #[serde(default)]
    pub cache_url: Option<String>,
    #[serde(default)]
    pub cache_last_updated: Option<NaiveDateTime>,
    #[serde(default)]
    pub url_type: Option<String>,
    #[serde(default = "default_state")]
    pub state: ResourceState,
    #[serde(flatten)]
    pub extras: Extras,
}

fn default_state() -> ResourceState {
    ResourceState::Active
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Active,
    Deleted,
}
impl FromStr for ResourceState {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            _ => Err(Error::Unexpected("resource state not supported".into())),
        }
    }
}
impl Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}
