//! Reference data: subjects and departments.

use clearslip_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::faculty::FacultyId;

/// Stable subject code, e.g. `CS301`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a validated subject code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_owned();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "subject id must not be empty".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the underlying subject code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Catalog entry for one teachable subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    subject_id: SubjectId,
    subject_name: NonEmptyString,
    credits: u8,
}

impl Subject {
    /// Creates a validated subject catalog entry.
    pub fn new(
        subject_id: SubjectId,
        subject_name: impl Into<String>,
        credits: u8,
    ) -> AppResult<Self> {
        if credits == 0 || credits > 10 {
            return Err(AppError::Validation(
                "subject credits must be between 1 and 10".to_owned(),
            ));
        }

        Ok(Self {
            subject_id,
            subject_name: NonEmptyString::new(subject_name)?,
            credits,
        })
    }

    /// Returns the subject code.
    #[must_use]
    pub fn subject_id(&self) -> &SubjectId {
        &self.subject_id
    }

    /// Returns the subject display name.
    #[must_use]
    pub fn subject_name(&self) -> &NonEmptyString {
        &self.subject_name
    }

    /// Returns the credit weight.
    #[must_use]
    pub fn credits(&self) -> u8 {
        self.credits
    }
}

/// Stable department code, e.g. `CSE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepartmentId(String);

impl DepartmentId {
    /// Creates a validated department code.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_owned();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "department id must not be empty".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the underlying department code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for DepartmentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// An academic department.
///
/// At most one faculty member holds the HOD post at any time; the replace
/// operation in the directory service moves the post atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    dept_id: DepartmentId,
    dept_name: NonEmptyString,
    hod_id: Option<FacultyId>,
}

impl Department {
    /// Creates a department, initially without an HOD.
    pub fn new(dept_id: DepartmentId, dept_name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            dept_id,
            dept_name: NonEmptyString::new(dept_name)?,
            hod_id: None,
        })
    }

    /// Returns the department code.
    #[must_use]
    pub fn dept_id(&self) -> &DepartmentId {
        &self.dept_id
    }

    /// Returns the department display name.
    #[must_use]
    pub fn dept_name(&self) -> &NonEmptyString {
        &self.dept_name
    }

    /// Returns the current HOD, if one is appointed.
    #[must_use]
    pub fn hod_id(&self) -> Option<FacultyId> {
        self.hod_id
    }

    /// Points the department at a new HOD, returning the prior holder.
    pub fn appoint_hod(&mut self, faculty_id: FacultyId) -> Option<FacultyId> {
        self.hod_id.replace(faculty_id)
    }
}

#[cfg(test)]
mod tests {
    use super::{Subject, SubjectId};

    #[test]
    fn subject_rejects_zero_credits() {
        let subject_id = SubjectId::new("CS301");
        assert!(subject_id.is_ok());
        let Ok(subject_id) = subject_id else {
            return;
        };
        assert!(Subject::new(subject_id, "Operating Systems", 0).is_err());
    }

    #[test]
    fn subject_id_is_trimmed() {
        let subject_id = SubjectId::new("  CS301 ").map(|id| id.as_str().to_owned());
        assert_eq!(subject_id.unwrap_or_default(), "CS301");
    }
}
