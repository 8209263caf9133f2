//! Faculty directory entries and their chain-stage roles.

use std::collections::BTreeSet;
use std::str::FromStr;

use clearslip_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::EmailAddress;
use crate::capability::StageCapability;
use crate::catalog::SubjectId;
use crate::student::StudentId;

/// Unique identifier for a faculty directory entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FacultyId(Uuid);

impl FacultyId {
    /// Creates a new random faculty identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a faculty identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FacultyId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FacultyId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Chain-stage roles a faculty member may hold.
///
/// Roles are not mutually exclusive; a member holding several roles acts at
/// several stages of the same record, each role evaluated independently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FacultyRole {
    /// Signs off individual enrolled subjects.
    SubjectTeacher,
    /// Signs off the mentor stage for assigned mentees.
    Mentor,
    /// Signs off the counsellor stage.
    ClassCounsellor,
    /// Signs off the final HOD stage.
    Hod,
}

impl FacultyRole {
    /// Returns all known roles.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FacultyRole] = &[
            FacultyRole::SubjectTeacher,
            FacultyRole::Mentor,
            FacultyRole::ClassCounsellor,
            FacultyRole::Hod,
        ];

        ALL
    }

    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubjectTeacher => "subject_teacher",
            Self::Mentor => "mentor",
            Self::ClassCounsellor => "class_counsellor",
            Self::Hod => "hod",
        }
    }
}

impl FromStr for FacultyRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "subject_teacher" => Ok(Self::SubjectTeacher),
            "mentor" => Ok(Self::Mentor),
            "class_counsellor" => Ok(Self::ClassCounsellor),
            "hod" => Ok(Self::Hod),
            _ => Err(AppError::Validation(format!(
                "unknown faculty role '{value}'"
            ))),
        }
    }
}

/// One subject taught by a faculty member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaughtSubject {
    /// Subject code.
    pub subject_id: SubjectId,
    /// Subject display name, denormalized for listings.
    pub subject_name: String,
}

/// Input payload used to construct a validated faculty entry.
#[derive(Debug, Clone)]
pub struct FacultyMemberInput {
    /// Stable identifier; generated when registering a new member.
    pub id: FacultyId,
    /// Full display name.
    pub name: String,
    /// Login and directory email.
    pub email: EmailAddress,
    /// Chain-stage roles held.
    pub roles: BTreeSet<FacultyRole>,
    /// Subjects taught, used by the SubjectTeacher role.
    pub taught_subjects: Vec<TaughtSubject>,
    /// Mentee students, used by the Mentor role.
    pub mentee_ids: BTreeSet<StudentId>,
}

/// Faculty directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyMember {
    id: FacultyId,
    name: NonEmptyString,
    email: EmailAddress,
    roles: BTreeSet<FacultyRole>,
    taught_subjects: Vec<TaughtSubject>,
    mentee_ids: BTreeSet<StudentId>,
}

impl FacultyMember {
    /// Creates a validated faculty entry.
    pub fn new(input: FacultyMemberInput) -> AppResult<Self> {
        let FacultyMemberInput {
            id,
            name,
            email,
            roles,
            taught_subjects,
            mentee_ids,
        } = input;

        let mut seen = BTreeSet::new();
        for taught in &taught_subjects {
            if !seen.insert(taught.subject_id.clone()) {
                return Err(AppError::Validation(format!(
                    "duplicate taught subject '{}'",
                    taught.subject_id
                )));
            }
        }

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            email,
            roles,
            taught_subjects,
            mentee_ids,
        })
    }

    /// Returns the faculty identifier.
    #[must_use]
    pub fn id(&self) -> FacultyId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the directory email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the held chain-stage roles.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<FacultyRole> {
        &self.roles
    }

    /// Returns whether the member holds the given role.
    #[must_use]
    pub fn has_role(&self, role: FacultyRole) -> bool {
        self.roles.contains(&role)
    }

    /// Returns the taught subjects.
    #[must_use]
    pub fn taught_subjects(&self) -> &[TaughtSubject] {
        &self.taught_subjects
    }

    /// Returns the mentee student ids.
    #[must_use]
    pub fn mentee_ids(&self) -> &BTreeSet<StudentId> {
        &self.mentee_ids
    }

    /// Adds a role, returning whether the set changed.
    pub fn grant_role(&mut self, role: FacultyRole) -> bool {
        self.roles.insert(role)
    }

    /// Removes a role, returning whether the set changed.
    pub fn revoke_role(&mut self, role: FacultyRole) -> bool {
        self.roles.remove(&role)
    }

    /// Replaces the taught subject list.
    pub fn set_taught_subjects(&mut self, taught_subjects: Vec<TaughtSubject>) -> AppResult<()> {
        let mut seen = BTreeSet::new();
        for taught in &taught_subjects {
            if !seen.insert(taught.subject_id.clone()) {
                return Err(AppError::Validation(format!(
                    "duplicate taught subject '{}'",
                    taught.subject_id
                )));
            }
        }

        self.taught_subjects = taught_subjects;
        Ok(())
    }

    /// Replaces the mentee list.
    pub fn set_mentees(&mut self, mentee_ids: BTreeSet<StudentId>) {
        self.mentee_ids = mentee_ids;
    }

    /// Derives the stage capabilities granted by the held roles.
    ///
    /// One capability per role, each carrying the data that scopes it; a
    /// member with an empty subject list still yields a SubjectTeacher
    /// capability that authorizes nothing.
    #[must_use]
    pub fn capabilities(&self) -> Vec<StageCapability> {
        self.roles
            .iter()
            .map(|role| match role {
                FacultyRole::SubjectTeacher => StageCapability::SubjectTeacher {
                    subject_ids: self
                        .taught_subjects
                        .iter()
                        .map(|taught| taught.subject_id.clone())
                        .collect(),
                },
                FacultyRole::Mentor => StageCapability::Mentor {
                    mentee_ids: self.mentee_ids.clone(),
                },
                FacultyRole::ClassCounsellor => StageCapability::ClassCounsellor,
                FacultyRole::Hod => StageCapability::Hod,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{FacultyId, FacultyMember, FacultyMemberInput, FacultyRole, TaughtSubject};
    use crate::account::EmailAddress;
    use crate::capability::StageCapability;
    use crate::catalog::SubjectId;

    fn email() -> EmailAddress {
        EmailAddress::new("teacher@college.ac.in").unwrap_or_else(|_| unreachable!())
    }

    fn subject_id(code: &str) -> SubjectId {
        SubjectId::new(code).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn duplicate_taught_subjects_are_rejected() {
        let member = FacultyMember::new(FacultyMemberInput {
            id: FacultyId::new(),
            name: "Prof. Rao".to_owned(),
            email: email(),
            roles: BTreeSet::from([FacultyRole::SubjectTeacher]),
            taught_subjects: vec![
                TaughtSubject {
                    subject_id: subject_id("CS301"),
                    subject_name: "Operating Systems".to_owned(),
                },
                TaughtSubject {
                    subject_id: subject_id("CS301"),
                    subject_name: "Operating Systems".to_owned(),
                },
            ],
            mentee_ids: BTreeSet::new(),
        });

        assert!(member.is_err());
    }

    #[test]
    fn capabilities_follow_held_roles() {
        let member = FacultyMember::new(FacultyMemberInput {
            id: FacultyId::new(),
            name: "Prof. Rao".to_owned(),
            email: email(),
            roles: BTreeSet::from([FacultyRole::SubjectTeacher, FacultyRole::Mentor]),
            taught_subjects: vec![TaughtSubject {
                subject_id: subject_id("CS301"),
                subject_name: "Operating Systems".to_owned(),
            }],
            mentee_ids: BTreeSet::new(),
        });

        let capabilities = member.map(|m| m.capabilities()).unwrap_or_default();
        assert_eq!(capabilities.len(), 2);
        assert!(
            capabilities
                .iter()
                .any(|capability| matches!(capability, StageCapability::SubjectTeacher { .. }))
        );
        assert!(
            capabilities
                .iter()
                .any(|capability| matches!(capability, StageCapability::Mentor { .. }))
        );
    }
}
