//! Membership rules of a group. Persisting the result is the caller's job.

use chrono::{DateTime, Utc};

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::schemas::{Group, Member, NewGroup};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

impl Group {
    pub fn new(
        id: String,
        input: NewGroup,
        creator: Member,
        now: DateTime<Utc>,
    ) -> LedgerResult<Group> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ValidationError::MissingGroupName.into());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::GroupNameTooLong(MAX_NAME_LEN).into());
        }
        let description = trimmed(input.description);
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(ValidationError::DescriptionTooLong(MAX_DESCRIPTION_LEN).into());
        }

        Ok(Group {
            id,
            name,
            description,
            creator_id: creator.member_id.clone(),
            members: vec![creator],
            active: true,
            share: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m.member_id == member_id)
    }

    /// Groups are only visible to their members while they are active.
    pub fn require_member(&self, member_id: &str) -> LedgerResult<()> {
        if !self.active {
            return Err(LedgerError::NotFound("Group".into()));
        }
        if !self.is_member(member_id) {
            return Err(LedgerError::Forbidden("not a member of this group".into()));
        }
        Ok(())
    }

    pub fn require_creator(&self, member_id: &str) -> LedgerResult<()> {
        self.require_member(member_id)?;
        if self.creator_id != member_id {
            return Err(LedgerError::Forbidden(
                "only the group creator can do this".into(),
            ));
        }
        Ok(())
    }

    pub fn add_member(&mut self, member: Member, now: DateTime<Utc>) -> LedgerResult<()> {
        let member_id = member.member_id.trim().to_string();
        if member_id.is_empty() {
            return Err(ValidationError::MissingMemberId.into());
        }
        let display_name = member.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(ValidationError::MissingDisplayName.into());
        }
        if self.is_member(&member_id) {
            return Err(ValidationError::AlreadyMember(member_id).into());
        }
        self.members.push(Member {
            member_id,
            display_name,
        });
        self.updated_at = now;
        Ok(())
    }

    /// Removing someone who isn't a member is a no-op.
    pub fn remove_member(&mut self, member_id: &str, now: DateTime<Utc>) -> LedgerResult<()> {
        if self.creator_id == member_id {
            return Err(ValidationError::CreatorRemoval.into());
        }
        self.members.retain(|m| m.member_id != member_id);
        self.updated_at = now;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.share = None;
        self.updated_at = now;
    }
}

pub(crate) fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
