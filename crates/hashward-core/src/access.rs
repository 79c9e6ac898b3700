//! Access-control collaborator
//!
//! Role tables and ownership transfer live outside this crate. The engine
//! only needs to ask who owns a data item and what role a caller holds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Role of a user on a dataset, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    None,
    Viewer,
    Editor,
    Owner,
}

pub trait AccessControl {
    /// Role `user` holds on the data item `(owner, data_id)`.
    fn role(&self, user: &str, owner: &str, data_id: &str) -> Role;

    fn is_dataset_owner(&self, user: &str, owner: &str, data_id: &str) -> bool {
        self.role(user, owner, data_id) == Role::Owner
    }
}

/// Owners hold every right on their own data; nobody else holds any.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOnly;

impl AccessControl for OwnerOnly {
    fn role(&self, user: &str, owner: &str, _data_id: &str) -> Role {
        if user == owner {
            Role::Owner
        } else {
            Role::None
        }
    }
}

/// Explicit per-item grants on top of ownership.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    grants: HashMap<(String, String, String), Role>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `user` a role on `(owner, data_id)`, replacing any earlier grant.
    pub fn grant(
        mut self,
        owner: impl Into<String>,
        data_id: impl Into<String>,
        user: impl Into<String>,
        role: Role,
    ) -> Self {
        self.grants
            .insert((owner.into(), data_id.into(), user.into()), role);
        self
    }
}

impl AccessControl for RoleTable {
    fn role(&self, user: &str, owner: &str, data_id: &str) -> Role {
        if user == owner {
            return Role::Owner;
        }
        self.grants
            .get(&(owner.to_string(), data_id.to_string(), user.to_string()))
            .copied()
            .unwrap_or(Role::None)
    }
}
