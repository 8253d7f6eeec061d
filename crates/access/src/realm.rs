use std::collections::{BTreeMap, HashMap};

use config::RealmAccessRules;
use thiserror::Error;

use crate::{Decision, Identity, Rule};

/// Name of the realm used by `<path>/authenticate`. When configured, its rule applies to every realm.
pub const DEFAULT_REALM: &str = "";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealmError {
    #[error("No such authentication realm {0:?}")]
    NoSuchRealm(String),

    #[error("user {username:?} is not authorized to access realm {realm:?}: {reason}")]
    Denied {
        realm: String,
        username: String,
        reason: String,
    },
}

impl RealmError {
    /// Explanation suitable for the review response.
    pub fn reason(&self) -> String {
        match self {
            RealmError::NoSuchRealm(_) => self.to_string(),
            RealmError::Denied { reason, .. } => reason.clone(),
        }
    }
}

/// Authorization rules per realm.
#[derive(Debug, Clone)]
pub struct RealmPolicy {
    realms: HashMap<String, Rule>,
}

impl Default for RealmPolicy {
    fn default() -> Self {
        Self::from_rules([(DEFAULT_REALM.to_string(), Rule::AlwaysAllow)])
    }
}

impl RealmPolicy {
    pub fn from_rules(realms: impl IntoIterator<Item = (String, Rule)>) -> Self {
        Self {
            realms: realms.into_iter().collect(),
        }
    }

    /// Builds the policy from the `[realms]` configuration. A realm admits an identity
    /// if any of its rule sets does. Without any realm, the default realm admits everyone.
    pub fn from_config(config: &BTreeMap<String, Vec<RealmAccessRules>>) -> Self {
        if config.is_empty() {
            return Self::default();
        }

        let realms = config.iter().map(|(name, sets)| {
            let rule = Rule::AnyOf(sets.iter().map(Rule::from).collect());
            log::debug!("Realm {name:?} configured with {} rule set(s)", sets.len());

            (name.clone(), rule)
        });

        Self::from_rules(realms)
    }

    pub fn contains(&self, realm: &str) -> bool {
        self.realms.contains_key(realm)
    }

    /// Applies the realm rule, then the default realm rule if one is configured.
    pub fn authorize(&self, realm: &str, identity: &Identity) -> Result<(), RealmError> {
        self.authorize_realm(realm, identity)?;

        if realm != DEFAULT_REALM && self.contains(DEFAULT_REALM) {
            self.authorize_realm(DEFAULT_REALM, identity)?;
        }

        Ok(())
    }

    fn authorize_realm(&self, realm: &str, identity: &Identity) -> Result<(), RealmError> {
        let Some(rule) = self.realms.get(realm) else {
            return Err(RealmError::NoSuchRealm(realm.to_string()));
        };

        match rule.evaluate(identity) {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(RealmError::Denied {
                realm: realm.to_string(),
                username: identity.username.clone(),
                reason,
            }),
        }
    }
}
