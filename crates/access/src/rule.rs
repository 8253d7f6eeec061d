use config::RealmAccessRules;

use crate::{Attribute, Identity};

/// Outcome of a rule evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Human readable explanation of the denial.
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Composable authorization predicate over an [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    AlwaysAllow,
    AlwaysDeny,
    /// The attribute must be listed in the identity attributes.
    RequireAttribute(String),
    /// The attribute must not be listed in the identity attributes.
    RejectAttribute(String),
    /// The username must be one of the names.
    RequireAnyName(Vec<String>),
    /// The username must not be one of the names.
    RejectAnyName(Vec<String>),
    /// The identity must be a member of every group.
    RequireAllGroups(Vec<String>),
    /// The identity must be a member of at least one group.
    RequireAnyGroups(Vec<String>),
    /// The identity must not be a member of any group.
    RejectAnyGroups(Vec<String>),
    /// Every rule must allow. Stops at the first denial.
    AllOf(Vec<Rule>),
    /// One rule must allow. Stops at the first approval and otherwise reports the last denial.
    AnyOf(Vec<Rule>),
}

impl Rule {
    pub fn evaluate(&self, identity: &Identity) -> Decision {
        match self {
            Rule::AlwaysAllow => Decision::Allow,
            Rule::AlwaysDeny => Decision::Deny("Access is denied".to_string()),
            Rule::RequireAttribute(attribute) => {
                if identity.has_attribute(attribute) {
                    Decision::Allow
                } else {
                    Decision::Deny(require_attribute_reason(attribute))
                }
            }
            Rule::RejectAttribute(attribute) => {
                if identity.has_attribute(attribute) {
                    Decision::Deny(reject_attribute_reason(attribute))
                } else {
                    Decision::Allow
                }
            }
            Rule::RequireAnyName(names) => {
                if names.contains(&identity.username) {
                    Decision::Allow
                } else {
                    Decision::Deny("Username is not explicitly allowed".to_string())
                }
            }
            Rule::RejectAnyName(names) => {
                if names.contains(&identity.username) {
                    Decision::Deny(format!("User {} is explicitly prohibited", identity.username))
                } else {
                    Decision::Allow
                }
            }
            Rule::RequireAllGroups(groups) => match groups.iter().find(|g| !identity.in_group(g)) {
                Some(missing) => Decision::Deny(format!("Membership in {missing} is required")),
                None => Decision::Allow,
            },
            Rule::RequireAnyGroups(groups) => {
                if groups.iter().any(|g| identity.in_group(g)) {
                    Decision::Allow
                } else {
                    Decision::Deny(format!("Membership in one of {} is required", groups.join(", ")))
                }
            }
            Rule::RejectAnyGroups(groups) => match groups.iter().find(|g| identity.in_group(g)) {
                Some(group) => Decision::Deny(format!("Members of {group} are not allowed")),
                None => Decision::Allow,
            },
            Rule::AllOf(rules) => rules
                .iter()
                .map(|rule| rule.evaluate(identity))
                .find(|decision| !decision.is_allowed())
                .unwrap_or(Decision::Allow),
            Rule::AnyOf(rules) => {
                let mut last = Decision::Deny("No explicit permission".to_string());

                for rule in rules {
                    match rule.evaluate(identity) {
                        Decision::Allow => return Decision::Allow,
                        deny => last = deny,
                    }
                }

                last
            }
        }
    }
}

impl From<&RealmAccessRules> for Rule {
    fn from(config: &RealmAccessRules) -> Self {
        let mut rules = Vec::new();

        if config.require_2fa {
            rules.push(Rule::RequireAttribute(Attribute::TwoFactor.to_string()));
        }

        if config.reject_bots {
            rules.push(Rule::RejectAttribute(Attribute::Bot.to_string()));
        }

        if config.reject_locked {
            rules.push(Rule::RejectAttribute(Attribute::Locked.to_string()));
        }

        if config.reject_pristine {
            rules.push(Rule::RejectAttribute(Attribute::Pristine.to_string()));
        }

        if !config.require_users.is_empty() {
            rules.push(Rule::RequireAnyName(config.require_users.clone()));
        }

        if !config.reject_users.is_empty() {
            rules.push(Rule::RejectAnyName(config.reject_users.clone()));
        }

        if !config.require_groups.is_empty() {
            rules.push(Rule::RequireAllGroups(config.require_groups.clone()));
        }

        if !config.require_any_groups.is_empty() {
            rules.push(Rule::RequireAnyGroups(config.require_any_groups.clone()));
        }

        if !config.reject_groups.is_empty() {
            rules.push(Rule::RejectAnyGroups(config.reject_groups.clone()));
        }

        rules.extend(config.require_attributes.iter().cloned().map(Rule::RequireAttribute));
        rules.extend(config.reject_attributes.iter().cloned().map(Rule::RejectAttribute));

        Rule::AllOf(rules)
    }
}

fn require_attribute_reason(attribute: &str) -> String {
    match attribute {
        "2fa" => "Second factor authentication must be enabled".to_string(),
        other => format!("User attribute {other} is required"),
    }
}

fn reject_attribute_reason(attribute: &str) -> String {
    match attribute {
        "bot" => "Robot users are not allowed".to_string(),
        "locked" => "User is locked".to_string(),
        "pristine" => "User has never logged in before".to_string(),
        other => format!("Users with attribute {other} are not allowed"),
    }
}
