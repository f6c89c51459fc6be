use std::{fmt::Display, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::domain::Result;

use super::{error::Error, resource::Resource};

macro_rules! into_event {
    ($name:ident) => {
        impl From<$name> for Event {
            fn from(value: $name) -> Self {
                Self::$name(value)
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainObjectRef {
    pub id: String,
}

/// Entity carried by a host modification notification. Only resources are
/// sent with a full snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainObject {
    Resource(Resource),
    Package(DomainObjectRef),
    Group(DomainObjectRef),
    User(DomainObjectRef),
    #[serde(other)]
    Unknown,
}
impl DomainObject {
    pub fn kind(&self) -> &'static str {
        match self {
            DomainObject::Resource(_) => "resource",
            DomainObject::Package(_) => "package",
            DomainObject::Group(_) => "group",
            DomainObject::User(_) => "user",
            DomainObject::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DomainObjectOperation {
    New,
    Changed,
    Deleted,
    Other(String),
}
impl From<String> for DomainObjectOperation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "new" => Self::New,
            "changed" => Self::Changed,
            "deleted" => Self::Deleted,
            _ => Self::Other(value),
        }
    }
}
impl From<DomainObjectOperation> for String {
    fn from(value: DomainObjectOperation) -> Self {
        value.to_string()
    }
}
impl Display for DomainObjectOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Changed => write!(f, "changed"),
            Self::Deleted => write!(f, "deleted"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// Generic notification. `operation` is absent when the host does not say
/// what happened to the entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainObjectModified {
    pub entity: DomainObject,
    #[serde(default)]
    pub operation: Option<DomainObjectOperation>,
    #[serde(default)]
    pub actor: Option<String>,
}
into_event!(DomainObjectModified);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceUrlChanged {
    pub resource: Resource,
    #[serde(default)]
    pub actor: Option<String>,
}
into_event!(ResourceUrlChanged);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    DomainObjectModified(DomainObjectModified),
    ResourceUrlChanged(ResourceUrlChanged),
}
impl Event {
    pub fn key(&self) -> String {
        match self {
            Event::DomainObjectModified(_) => "DomainObjectModified".into(),
            Event::ResourceUrlChanged(_) => "ResourceUrlChanged".into(),
        }
    }
    pub fn from_key(key: &str, payload: &[u8]) -> Result<Self> {
        match key {
            "DomainObjectModified" => Ok(Self::DomainObjectModified(serde_json::from_slice(
                payload,
            )?)),
            "ResourceUrlChanged" => Ok(Self::ResourceUrlChanged(serde_json::from_slice(payload)?)),
            _ => Err(Error::Unexpected(format!(
                "Event key '{}' not implemented",
                key
            ))),
        }
    }
}

/// Capability set a host notification source drives.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DomainEventHandler: Send + Sync {
    async fn on_domain_object_modification(&self, evt: DomainObjectModified) -> Result<()>;
    async fn on_resource_url_change(&self, evt: ResourceUrlChanged) -> Result<()>;
}

pub async fn handle(handler: Arc<dyn DomainEventHandler>, event: Event) -> Result<()> {
    match event {
        Event::DomainObjectModified(evt) => handler.on_domain_object_modification(evt).await,
        Event::ResourceUrlChanged(evt) => handler.on_resource_url_change(evt).await,
    }
}
