use std::{collections::BTreeMap, time::Duration};

use config::GitlabConfig;
use gitlab::{Account, Group};
use jiff::{SignedDuration, Timestamp};

use crate::{ATTRIBUTES_KEY, Attribute, EXTRA_NAMESPACE, GROUP_PREFIX, Identity};

/// Settings of the account to identity mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserInfoOptions {
    /// Append `gitlab:<attribute>` groups for every derived attribute.
    pub attributes_as_groups: bool,
    /// Inactivity after which an account is dormant. Zero disables the attribute.
    pub dormant_timeout: Duration,
}

impl From<&GitlabConfig> for UserInfoOptions {
    fn from(config: &GitlabConfig) -> Self {
        Self {
            attributes_as_groups: config.attributes_as_groups,
            dormant_timeout: config.inactivity_timeout,
        }
    }
}

/// Maps an account and its groups into the identity reported to Kubernetes.
pub fn user_info(account: &Account, groups: &[Group], options: &UserInfoOptions, now: Timestamp) -> Identity {
    let attributes = attributes(account, options.dormant_timeout, now);

    let mut identity_groups: Vec<String> = groups.iter().map(|g| g.full_path.replace('/', ":")).collect();

    if options.attributes_as_groups {
        identity_groups.extend(attributes.iter().map(|a| format!("{GROUP_PREFIX}{a}")));
    }

    let mut extra = BTreeMap::new();

    extra.insert(
        ATTRIBUTES_KEY.to_string(),
        attributes.iter().map(|a| a.as_str().to_string()).collect(),
    );

    for attribute in &account.custom_attributes {
        extra.insert(format!("{EXTRA_NAMESPACE}{}", attribute.key), vec![attribute.value.clone()]);
    }

    Identity {
        username: account.username.clone(),
        uid: account.id.to_string(),
        groups: identity_groups,
        extra,
    }
}

fn attributes(account: &Account, dormant_timeout: Duration, now: Timestamp) -> Vec<Attribute> {
    let flags = [
        (account.two_factor_enabled, Attribute::TwoFactor),
        (account.bot, Attribute::Bot),
        (account.is_admin, Attribute::Admin),
        (account.is_auditor, Attribute::Auditor),
        (account.external, Attribute::External),
        (account.private_profile, Attribute::Private),
        (account.locked, Attribute::Locked),
        (account.confirmed_at.is_none(), Attribute::Pristine),
        (is_dormant(account.last_activity_on, dormant_timeout, now), Attribute::Dormant),
    ];

    flags.into_iter().filter(|(set, _)| *set).map(|(_, a)| a).collect()
}

fn is_dormant(last_activity: Option<Timestamp>, timeout: Duration, now: Timestamp) -> bool {
    let Some(last_activity) = last_activity else {
        return false;
    };

    if timeout.is_zero() {
        return false;
    }

    let Ok(timeout) = SignedDuration::try_from(timeout) else {
        return false;
    };

    now.duration_since(last_activity) > timeout
}
