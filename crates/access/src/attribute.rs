use std::fmt;

/// Boolean account properties exposed as identity attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    TwoFactor,
    Bot,
    Admin,
    Auditor,
    External,
    Private,
    Locked,
    /// The account never confirmed its registration.
    Pristine,
    /// The last activity predates the inactivity timeout.
    Dormant,
}

impl Attribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::TwoFactor => "2fa",
            Attribute::Bot => "bot",
            Attribute::Admin => "admin",
            Attribute::Auditor => "auditor",
            Attribute::External => "external",
            Attribute::Private => "private",
            Attribute::Locked => "locked",
            Attribute::Pristine => "pristine",
            Attribute::Dormant => "dormant",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
