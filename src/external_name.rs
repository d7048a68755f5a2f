// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Codecs for the `crossplane.io/external-name` annotation.
//!
//! Every kind knows the shape of its own names, so decoding is kind-scoped.
//! Decoders return `None` for anything they cannot parse; callers treat that as
//! "not created yet" so Create runs again cleanly.

/// Bare names: Repository, Organization, User, AdminUser, OrganizationSettings.
pub fn decode_name(external_name: &str) -> Option<&str> {
    let name = external_name.trim();
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

/// Numeric IDs: Team, RepositoryKey, Issue, PullRequest, Release.
pub fn encode_id(id: i64) -> String {
    id.to_string()
}

pub fn decode_id(external_name: &str) -> Option<i64> {
    external_name.trim().parse().ok().filter(|id| *id > 0)
}

/// `{a}/{b}` names: OrganizationMember, RepositorySecret, OrganizationSecret.
pub fn encode_pair(first: &str, second: &str) -> String {
    format!("{}/{}", first, second)
}

pub fn decode_pair(external_name: &str) -> Option<(String, String)> {
    match split(external_name).as_slice() {
        [a, b] => Some((a.to_string(), b.to_string())),
        _ => None,
    }
}

/// `{scope}/{id}` names: UserKey and AccessToken (scoped by username).
pub fn encode_scoped_id(scope: &str, id: i64) -> String {
    format!("{}/{}", scope, id)
}

pub fn decode_scoped_id(external_name: &str) -> Option<(String, i64)> {
    let (scope, id) = decode_pair(external_name)?;
    Some((scope, decode_id(&id)?))
}

/// `{owner}/{repo}/{name}` names: RepositoryCollaborator, GitHook, Action.
pub fn encode_repo_name(owner: &str, repo: &str, name: &str) -> String {
    format!("{}/{}/{}", owner, repo, name)
}

pub fn decode_repo_name(external_name: &str) -> Option<(String, String, String)> {
    match split(external_name).as_slice() {
        [owner, repo, name] => Some((owner.to_string(), repo.to_string(), name.to_string())),
        _ => None,
    }
}

/// `{owner}/{repo}/{id}` names: Label, DeployKey, repository webhooks.
pub fn encode_repo_id(owner: &str, repo: &str, id: i64) -> String {
    format!("{}/{}/{}", owner, repo, id)
}

pub fn decode_repo_id(external_name: &str) -> Option<(String, String, i64)> {
    let (owner, repo, id) = decode_repo_name(external_name)?;
    Some((owner, repo, decode_id(&id)?))
}

/// Where a webhook lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookLocation {
    Repository { owner: String, repo: String, id: i64 },
    Organization { org: String, id: i64 },
}

impl HookLocation {
    pub fn encode(&self) -> String {
        match self {
            HookLocation::Repository { owner, repo, id } => encode_repo_id(owner, repo, *id),
            HookLocation::Organization { org, id } => encode_scoped_id(org, *id),
        }
    }

    /// Three segments address a repository hook, two an organization hook.
    pub fn decode(external_name: &str) -> Option<Self> {
        match split(external_name).as_slice() {
            [owner, repo, id] => Some(HookLocation::Repository {
                owner: owner.to_string(),
                repo: repo.to_string(),
                id: decode_id(id)?,
            }),
            [org, id] => Some(HookLocation::Organization {
                org: org.to_string(),
                id: decode_id(id)?,
            }),
            _ => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            HookLocation::Repository { id, .. } | HookLocation::Organization { id, .. } => *id,
        }
    }
}

/// `{owner}/{repo}/{branch}/{ruleName}` for BranchProtection.
///
/// Branch and rule names may contain slashes, which are written as `%2F`.
pub fn encode_branch_protection(owner: &str, repo: &str, branch: &str, rule_name: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        owner,
        repo,
        escape_slashes(branch),
        escape_slashes(rule_name)
    )
}

pub fn decode_branch_protection(external_name: &str) -> Option<(String, String, String, String)> {
    match split(external_name).as_slice() {
        [owner, repo, branch, rule] => Some((
            owner.to_string(),
            repo.to_string(),
            unescape_slashes(branch),
            unescape_slashes(rule),
        )),
        _ => None,
    }
}

fn escape_slashes(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

fn unescape_slashes(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}

/// `{scope}:{scopeValue}:{runnerID}` for Runner; system runners have an empty value.
pub fn encode_runner(scope: &str, scope_value: &str, id: i64) -> String {
    format!("{}:{}:{}", scope, scope_value, id)
}

pub fn decode_runner(external_name: &str) -> Option<(String, String, i64)> {
    let (rest, id) = external_name.trim().rsplit_once(':')?;
    let (scope, value) = rest.split_once(':')?;
    if scope.is_empty() {
        return None;
    }
    Some((scope.to_string(), value.to_string(), decode_id(id)?))
}

/// Splits on `/`, rejecting empty segments.
fn split(external_name: &str) -> Vec<&str> {
    let parts: Vec<&str> = external_name.trim().split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Vec::new();
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_name() {
        assert_eq!(decode_name("acme-lib"), Some("acme-lib"));
        assert_eq!(decode_name(""), None);
        assert_eq!(decode_name("a/b"), None);
    }

    #[test]
    fn test_decode_id_rejects_garbage() {
        assert_eq!(decode_id("42"), Some(42));
        assert_eq!(decode_id("0"), None);
        assert_eq!(decode_id("-3"), None);
        assert_eq!(decode_id("forty-two"), None);
        assert_eq!(decode_id(""), None);
    }

    #[test]
    fn test_repo_id() {
        assert_eq!(encode_repo_id("acme", "lib", 5), "acme/lib/5");
        assert_eq!(
            decode_repo_id("acme/lib/5"),
            Some(("acme".to_string(), "lib".to_string(), 5))
        );
        assert_eq!(decode_repo_id("acme/lib"), None);
        assert_eq!(decode_repo_id("acme//5"), None);
        assert_eq!(decode_repo_id("acme/lib/x"), None);
    }

    #[test]
    fn test_scoped_id() {
        assert_eq!(encode_scoped_id("alice", 9), "alice/9");
        assert_eq!(decode_scoped_id("alice/9"), Some(("alice".to_string(), 9)));
        assert_eq!(decode_scoped_id("alice"), None);
    }

    #[test]
    fn test_pair() {
        assert_eq!(encode_pair("acme", "CI_TOKEN"), "acme/CI_TOKEN");
        assert_eq!(
            decode_pair("acme/CI_TOKEN"),
            Some(("acme".to_string(), "CI_TOKEN".to_string()))
        );
        assert_eq!(decode_pair("acme/CI_TOKEN/x"), None);
    }

    #[test]
    fn test_hook_location_by_segment_count() {
        let repo = HookLocation::decode("acme/lib/3").unwrap();
        assert_eq!(
            repo,
            HookLocation::Repository {
                owner: "acme".to_string(),
                repo: "lib".to_string(),
                id: 3
            }
        );
        assert_eq!(repo.encode(), "acme/lib/3");

        let org = HookLocation::decode("acme/4").unwrap();
        assert_eq!(org.id(), 4);
        assert_eq!(org.encode(), "acme/4");

        assert_eq!(HookLocation::decode("4"), None);
    }

    #[test]
    fn test_branch_protection_with_slashed_branch() {
        let name = encode_branch_protection("acme", "lib", "release/1.x", "release/1.x");
        assert_eq!(name, "acme/lib/release%2F1.x/release%2F1.x");
        let (owner, repo, branch, rule) = decode_branch_protection(&name).unwrap();
        assert_eq!((owner.as_str(), repo.as_str()), ("acme", "lib"));
        assert_eq!((branch.as_str(), rule.as_str()), ("release/1.x", "release/1.x"));

        let (_, _, branch, rule) = decode_branch_protection("acme/lib/main/main").unwrap();
        assert_eq!((branch.as_str(), rule.as_str()), ("main", "main"));

        assert_eq!(decode_branch_protection("acme/lib/main"), None);
        assert_eq!(decode_branch_protection("acme/lib/release/1.x/protect"), None);
    }

    #[test]
    fn test_runner() {
        assert_eq!(encode_runner("organization", "acme", 7), "organization:acme:7");
        assert_eq!(
            decode_runner("organization:acme:7"),
            Some(("organization".to_string(), "acme".to_string(), 7))
        );
        assert_eq!(
            decode_runner("repository:acme/lib:2"),
            Some(("repository".to_string(), "acme/lib".to_string(), 2))
        );
        assert_eq!(
            decode_runner("system::1"),
            Some(("system".to_string(), String::new(), 1))
        );
        assert_eq!(decode_runner("7"), None);
        assert_eq!(decode_runner("organization:acme:x"), None);
    }
}
