//! Group membership and resource moderation.

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::Resource;
use crate::snapshot::GroupSnapshot;

const INVITE_CODE_BYTES: usize = 4;
const RESOURCE_ID_BYTES: usize = 12;

/// Lowercase hex of `n` random bytes.
pub fn random_hex<R: Rng + ?Sized>(rng: &mut R, n: usize) -> String {
    (0..n).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
}

/// A resource as submitted, before it has an id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub kind: Option<String>,
    pub link: Option<String>,
}

impl GroupSnapshot {
    /// A new group with a fresh invite code. The owner is its first member.
    pub fn create(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::create_with_rng(name, owner, &mut rand::thread_rng())
    }

    pub fn create_with_rng<R: Rng + ?Sized>(
        name: impl Into<String>,
        owner: impl Into<String>,
        rng: &mut R,
    ) -> Self {
        let owner = owner.into();
        let snapshot = Self {
            name: name.into(),
            owner: Some(owner.clone()),
            members: vec![owner],
            invite_code: random_hex(rng, INVITE_CODE_BYTES),
            ..Self::default()
        };
        info!(group = %snapshot.name, "created group");
        snapshot
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }

    /// Adds `username` when `code` is this group's invite code.
    ///
    /// Returns `false` if they were already a member; joining twice changes nothing.
    pub fn join(&mut self, username: &str, code: &str) -> Result<bool> {
        if self.invite_code.is_empty() || code != self.invite_code {
            return Err(Error::InvalidInviteCode(code.to_string()));
        }
        if self.is_member(username) {
            debug!(group = %self.name, username, "already a member");
            return Ok(false);
        }
        self.members.push(username.to_string());
        info!(group = %self.name, username, "member joined");
        Ok(true)
    }

    /// Queues a resource for approval and returns its id.
    pub fn add_resource(&mut self, new: NewResource, added_by: &str, at: DateTime<Utc>) -> String {
        self.add_resource_with_rng(new, added_by, at, &mut rand::thread_rng())
    }

    pub fn add_resource_with_rng<R: Rng + ?Sized>(
        &mut self,
        new: NewResource,
        added_by: &str,
        at: DateTime<Utc>,
        rng: &mut R,
    ) -> String {
        let mut id = random_hex(rng, RESOURCE_ID_BYTES);
        while self.resource(&id).is_some() {
            id = random_hex(rng, RESOURCE_ID_BYTES);
        }

        self.pending_resources.push(Resource {
            id: id.clone(),
            title: new.title,
            description: new.description,
            kind: new.kind,
            link: new.link,
            added_by: added_by.to_string(),
            added_at: at,
        });
        info!(group = %self.name, id = %id, added_by, "resource awaiting approval");
        id
    }

    /// Looks up a resource by id in both the approved list and the pending queue.
    pub fn resource(&self, id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .chain(&self.pending_resources)
            .find(|r| r.id == id)
    }

    /// Moves a pending resource to the approved list. Unknown ids leave the group untouched.
    pub fn approve_resource(&mut self, id: &str) -> Option<Resource> {
        let pos = self.pending_resources.iter().position(|r| r.id == id)?;
        let resource = self.pending_resources.remove(pos);
        self.resources.push(resource.clone());
        info!(group = %self.name, id, "resource approved");
        Some(resource)
    }

    /// Drops a pending resource. Unknown ids leave the group untouched.
    pub fn reject_resource(&mut self, id: &str) -> Option<Resource> {
        let pos = self.pending_resources.iter().position(|r| r.id == id)?;
        let resource = self.pending_resources.remove(pos);
        info!(group = %self.name, id, "resource rejected");
        Some(resource)
    }
}
