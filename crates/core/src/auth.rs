use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AppError;

/// Portal-level role resolved at login.
///
/// Chain-stage authority for faculty is not carried here; it derives from the
/// faculty directory entry resolved by email (roles, owned subjects, mentees).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalRole {
    /// A student reading their own clearance state and slip.
    Student,
    /// A faculty member acting on approval stages.
    Faculty,
    /// Office staff issuing hall tickets.
    Office,
    /// Administrator managing the directory.
    Admin,
}

impl PortalRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Office => "office",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for PortalRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "office" => Ok(Self::Office),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown portal role '{value}'"
            ))),
        }
    }
}

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    subject: String,
    display_name: String,
    email: String,
    role: PortalRole,
}

impl UserIdentity {
    /// Creates a user identity from a resolved portal account.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: PortalRole,
    ) -> Self {
        Self {
            subject: subject.into(),
            display_name: display_name.into(),
            email: email.into(),
            role,
        }
    }

    /// Returns the stable account identifier.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the portal role resolved at login.
    #[must_use]
    pub fn role(&self) -> PortalRole {
        self.role
    }

    /// Returns whether the identity carries the given portal role.
    #[must_use]
    pub fn has_role(&self, role: PortalRole) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::PortalRole;

    #[test]
    fn portal_role_roundtrip_storage_value() {
        let role = PortalRole::Office;
        let restored = PortalRole::from_str(role.as_str());
        assert!(restored.is_ok());
        assert_eq!(restored.unwrap_or(PortalRole::Student), role);
    }

    #[test]
    fn unknown_portal_role_is_rejected() {
        let parsed = PortalRole::from_str("registrar");
        assert!(parsed.is_err());
    }
}
