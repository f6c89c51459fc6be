use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod cache;
pub mod command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub apikey: String,
    pub sysadmin: bool,
    pub state: String,
}
impl User {
    /// Privileged, non-human account used when no request user is known.
    pub fn new_site_user(name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            apikey: Uuid::new_v4().to_string(),
            sysadmin: true,
            state: "active".into(),
        }
    }
}
