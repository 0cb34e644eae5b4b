//! Entra ID directory adapter.

use std::sync::Arc;

use crate::client::{GraphApi, Query};
use crate::error::{Result, optional};
use crate::model::{Group, RoleAssignment, User};
use crate::odata;
use crate::raw::{RawDirectoryObject, RawGroup, RawUser, normalize_all};

const USERS: &str = "/users";
const GROUPS: &str = "/groups";

const USER_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "userPrincipalName",
    "mail",
    "jobTitle",
    "department",
    "accountEnabled",
];
const GROUP_FIELDS: &[&str] = &["id", "displayName", "description", "groupTypes", "membershipRule"];
const MEMBER_OF_FIELDS: &[&str] = &["id", "displayName", "description"];
const SEARCH_FIELDS: &[&str] = &["displayName", "userPrincipalName"];

/// Users, groups and memberships.
pub struct DirectoryService<C> {
    client: Arc<C>,
}

impl<C: GraphApi> DirectoryService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let mut fields = USER_FIELDS.to_vec();
        fields.push("signInActivity");
        let query = Query::new().select(&fields);
        let values = self.client.list(USERS, &query).await?;
        normalize_all::<RawUser, _>(values)
    }

    pub async fn search_users(&self, text: &str) -> Result<Vec<User>> {
        let query = Query::new()
            .filter(odata::startswith_any(SEARCH_FIELDS, text))
            .select(USER_FIELDS);
        let values = self.client.list(USERS, &query).await?;
        normalize_all::<RawUser, _>(values)
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>> {
        let query = Query::new().select(GROUP_FIELDS);
        let values = self.client.list(GROUPS, &query).await?;
        normalize_all::<RawGroup, _>(values)
    }

    /// Roles and groups the user belongs to; `None` if the user does not exist.
    pub async fn user_roles(&self, user_id: &str) -> Result<Option<Vec<RoleAssignment>>> {
        let path = format!("{USERS}/{}/memberOf", odata::segment(user_id));
        let query = Query::new().select(MEMBER_OF_FIELDS);
        match optional(self.client.list(&path, &query).await)? {
            Some(values) => Ok(Some(normalize_all::<RawDirectoryObject, _>(values)?)),
            None => Ok(None),
        }
    }
}
