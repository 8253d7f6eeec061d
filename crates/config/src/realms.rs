use serde::Deserialize;

/// One set of access rules. A realm accepts an identity when any of its rule sets accepts it,
/// and a rule set accepts an identity when every configured rule does.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealmAccessRules {
    /// Require second factor authentication.
    pub require_2fa: bool,
    /// Reject robot accounts.
    pub reject_bots: bool,
    /// Reject locked accounts.
    pub reject_locked: bool,
    /// Reject accounts which never confirmed their registration.
    pub reject_pristine: bool,
    /// Only accept these usernames.
    pub require_users: Vec<String>,
    /// Reject these usernames.
    pub reject_users: Vec<String>,
    /// Require membership in all of these groups.
    pub require_groups: Vec<String>,
    /// Require membership in at least one of these groups.
    pub require_any_groups: Vec<String>,
    /// Reject members of any of these groups.
    pub reject_groups: Vec<String>,
    /// Require all of these account attributes.
    pub require_attributes: Vec<String>,
    /// Reject accounts with any of these attributes.
    pub reject_attributes: Vec<String>,
}
