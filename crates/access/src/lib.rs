//! Mapping of GitLab accounts into Kubernetes identities, and the realm scoped
//! authorization policy applied to them.

mod attribute;
mod identity;
mod realm;
mod rule;
mod user_info;

pub use attribute::Attribute;
pub use identity::{ATTRIBUTES_KEY, EXTRA_NAMESPACE, GROUP_PREFIX, Identity, UNAUTHENTICATED_UID};
pub use realm::{DEFAULT_REALM, RealmError, RealmPolicy};
pub use rule::{Decision, Rule};
pub use user_info::{UserInfoOptions, user_info};
