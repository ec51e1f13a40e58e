//! Invitation links that let someone join a group without being added by
//! hand.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{LedgerResult, ValidationError};
use crate::schemas::{Group, Member, ShareLink};

type HmacSha256 = Hmac<Sha256>;

/// Derives an unguessable token for `group_id` from the server secret and
/// the issue time.
pub fn generate_token(group_id: &str, secret: &str, now: DateTime<Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_else(|| now.timestamp());
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(format!("{group_id}:{nanos}").as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Replaces any previous link of `group`.
pub fn issue(group: &mut Group, secret: &str, ttl: Duration, now: DateTime<Utc>) -> ShareLink {
    let link = ShareLink {
        token: generate_token(&group.id, secret, now),
        expires_at: now + ttl,
    };
    group.share = Some(link.clone());
    group.updated_at = now;
    link
}

pub fn is_valid(group: &Group, token: &str, now: DateTime<Utc>) -> bool {
    group.active
        && group
            .share
            .as_ref()
            .is_some_and(|link| link.token == token && link.expires_at > now)
}

/// Adds `member` to the group and consumes the link.
pub fn join(
    group: &mut Group,
    token: &str,
    member: Member,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    if !is_valid(group, token, now) {
        return Err(ValidationError::InvalidShareLink.into());
    }
    group.add_member(member, now)?;
    group.share = None;
    Ok(())
}

pub fn link_url(client_url: &str, group_id: &str, token: &str) -> String {
    format!(
        "{}/group/{}?token={}",
        client_url.trim_end_matches('/'),
        group_id,
        token
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::tests::{group_of, member};

    #[test]
    fn tokens_depend_on_group_secret_and_time() {
        let now = Utc::now();
        let token = generate_token("g1", "secret", now);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token, generate_token("g1", "secret", now));
        assert_ne!(token, generate_token("g2", "secret", now));
        assert_ne!(token, generate_token("g1", "other", now));
        assert_ne!(
            token,
            generate_token("g1", "secret", now + Duration::nanoseconds(1))
        );
    }

    #[test]
    fn links_expire() {
        let now = Utc::now();
        let mut group = group_of(&["alice"]);
        let link = issue(&mut group, "secret", Duration::days(7), now);

        assert!(is_valid(&group, &link.token, now + Duration::days(6)));
        assert!(!is_valid(&group, &link.token, now + Duration::days(7)));
        assert!(!is_valid(&group, "forged", now));
    }

    #[test]
    fn joining_consumes_the_link() {
        let now = Utc::now();
        let mut group = group_of(&["alice"]);
        let link = issue(&mut group, "secret", Duration::days(7), now);

        join(&mut group, &link.token, member("bob"), now).unwrap();
        assert!(group.is_member("bob"));
        assert_eq!(group.share, None);
        assert_eq!(
            join(&mut group, &link.token, member("carol"), now),
            Err(ValidationError::InvalidShareLink.into())
        );
    }

    #[test]
    fn members_cannot_join_twice() {
        let now = Utc::now();
        let mut group = group_of(&["alice"]);
        let link = issue(&mut group, "secret", Duration::days(7), now);

        assert_eq!(
            join(&mut group, &link.token, member("alice"), now),
            Err(ValidationError::AlreadyMember("alice".into()).into())
        );
        // The link survives a failed join
        assert!(is_valid(&group, &link.token, now));
    }

    #[test]
    fn urls_point_at_the_client() {
        assert_eq!(
            link_url("http://localhost:3000/", "g1", "abc"),
            "http://localhost:3000/group/g1?token=abc"
        );
    }
}
