//! Student directory entries.

use std::collections::BTreeSet;

use clearslip_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::EmailAddress;
use crate::catalog::{DepartmentId, SubjectId};
use crate::faculty::FacultyId;

/// Unique identifier for a student directory entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StudentId(Uuid);

impl StudentId {
    /// Creates a new random student identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a student identifier from an existing UUID value.
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

impl Default for StudentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// One subject a student is enrolled in for the current semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledSubject {
    /// Subject code.
    pub subject_id: SubjectId,
    /// Subject display name, denormalized for slips and listings.
    pub subject_name: String,
    /// Credit weight of the enrollment.
    pub credits: u8,
}

/// The student's assigned mini-project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniProjectAssignment {
    /// Project title.
    pub title: String,
    /// Supervising faculty display name.
    pub supervisor_name: String,
}

/// Input payload used to construct a validated student entry.
#[derive(Debug, Clone)]
pub struct StudentInput {
    /// Stable identifier; generated when registering a new student.
    pub id: StudentId,
    /// College roll number.
    pub roll_no: String,
    /// University seat number.
    pub usn: String,
    /// Full display name.
    pub name: String,
    /// Login and directory email.
    pub email: EmailAddress,
    /// Contact number, if known.
    pub contact: Option<String>,
    /// Owning department.
    pub dept_id: DepartmentId,
    /// Division code within the department.
    pub division: String,
    /// Lab/tutorial batch code.
    pub batch: String,
    /// Year of study, 1 through 4.
    pub year: u8,
    /// Current semester, 1 through 8.
    pub semester: u8,
    /// Enrolled subjects; must be non-empty with unique subject ids.
    pub enrolled_subjects: Vec<EnrolledSubject>,
    /// Assigned mini-project.
    pub mini_project: MiniProjectAssignment,
    /// Assigned mentor.
    pub mentor_id: FacultyId,
    /// Assigned class counsellor.
    pub counsellor_id: FacultyId,
}

/// Student directory entry.
///
/// Identity fields are immutable after registration; roster fields (enrolled
/// subjects, batch, assigned faculty) are mutable through admin operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    id: StudentId,
    roll_no: NonEmptyString,
    usn: NonEmptyString,
    name: NonEmptyString,
    email: EmailAddress,
    contact: Option<String>,
    dept_id: DepartmentId,
    division: NonEmptyString,
    batch: NonEmptyString,
    year: u8,
    semester: u8,
    enrolled_subjects: Vec<EnrolledSubject>,
    mini_project: MiniProjectAssignment,
    mentor_id: FacultyId,
    counsellor_id: FacultyId,
}

impl Student {
    /// Creates a validated student entry.
    pub fn new(input: StudentInput) -> AppResult<Self> {
        let StudentInput {
            id,
            roll_no,
            usn,
            name,
            email,
            contact,
            dept_id,
            division,
            batch,
            year,
            semester,
            enrolled_subjects,
            mini_project,
            mentor_id,
            counsellor_id,
        } = input;

        if !(1..=4).contains(&year) {
            return Err(AppError::Validation(
                "year of study must be between 1 and 4".to_owned(),
            ));
        }

        if !(1..=8).contains(&semester) {
            return Err(AppError::Validation(
                "semester must be between 1 and 8".to_owned(),
            ));
        }

        validate_enrollment(&enrolled_subjects)?;

        let contact = contact.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            id,
            roll_no: NonEmptyString::new(roll_no)?,
            usn: NonEmptyString::new(usn)?,
            name: NonEmptyString::new(name)?,
            email,
            contact,
            dept_id,
            division: NonEmptyString::new(division)?,
            batch: NonEmptyString::new(batch)?,
            year,
            semester,
            enrolled_subjects,
            mini_project,
            mentor_id,
            counsellor_id,
        })
    }

    /// Returns the student identifier.
    #[must_use]
    pub fn id(&self) -> StudentId {
        self.id
    }

    /// Returns the college roll number.
    #[must_use]
    pub fn roll_no(&self) -> &NonEmptyString {
        &self.roll_no
    }

    /// Returns the university seat number.
    #[must_use]
    pub fn usn(&self) -> &NonEmptyString {
        &self.usn
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

    /// Returns the contact number, if known.
    #[must_use]
    pub fn contact(&self) -> Option<&str> {
        self.contact.as_deref()
    }

    /// Returns the owning department.
    #[must_use]
    pub fn dept_id(&self) -> &DepartmentId {
        &self.dept_id
    }

    /// Returns the division code.
    #[must_use]
    pub fn division(&self) -> &NonEmptyString {
        &self.division
    }

    /// Returns the batch code.
    #[must_use]
    pub fn batch(&self) -> &NonEmptyString {
        &self.batch
    }

    /// Returns the year of study.
    #[must_use]
    pub fn year(&self) -> u8 {
        self.year
    }

    /// Returns the current semester.
    #[must_use]
    pub fn semester(&self) -> u8 {
        self.semester
    }

    /// Returns the enrolled subjects.
    #[must_use]
    pub fn enrolled_subjects(&self) -> &[EnrolledSubject] {
        &self.enrolled_subjects
    }

    /// Returns the mini-project assignment.
    #[must_use]
    pub fn mini_project(&self) -> &MiniProjectAssignment {
        &self.mini_project
    }

    /// Returns the assigned mentor.
    #[must_use]
    pub fn mentor_id(&self) -> FacultyId {
        self.mentor_id
    }

    /// Returns the assigned class counsellor.
    #[must_use]
    pub fn counsellor_id(&self) -> FacultyId {
        self.counsellor_id
    }

    /// Replaces the enrolled subject list.
    pub fn set_enrolled_subjects(&mut self, enrolled_subjects: Vec<EnrolledSubject>) -> AppResult<()> {
        validate_enrollment(&enrolled_subjects)?;
        self.enrolled_subjects = enrolled_subjects;
        Ok(())
    }

    /// Moves the student to another batch.
    pub fn set_batch(&mut self, batch: impl Into<String>) -> AppResult<()> {
        self.batch = NonEmptyString::new(batch)?;
        Ok(())
    }

    /// Reassigns the mentor.
    pub fn assign_mentor(&mut self, mentor_id: FacultyId) {
        self.mentor_id = mentor_id;
    }

    /// Reassigns the class counsellor.
    pub fn assign_counsellor(&mut self, counsellor_id: FacultyId) {
        self.counsellor_id = counsellor_id;
    }
}

fn validate_enrollment(enrolled_subjects: &[EnrolledSubject]) -> AppResult<()> {
    if enrolled_subjects.is_empty() {
        return Err(AppError::Validation(
            "student must be enrolled in at least one subject".to_owned(),
        ));
    }

    let mut seen = BTreeSet::new();
    for enrolled in enrolled_subjects {
        if !seen.insert(enrolled.subject_id.clone()) {
            return Err(AppError::Validation(format!(
                "duplicate enrolled subject '{}'",
                enrolled.subject_id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{EnrolledSubject, MiniProjectAssignment, Student, StudentId, StudentInput};
    use crate::account::EmailAddress;
    use crate::catalog::{DepartmentId, SubjectId};
    use crate::faculty::FacultyId;

    fn base_input() -> Option<StudentInput> {
        Some(StudentInput {
            id: StudentId::new(),
            roll_no: "42".to_owned(),
            usn: "1DY21CS042".to_owned(),
            name: "Asha Kulkarni".to_owned(),
            email: EmailAddress::new("asha@students.college.ac.in").ok()?,
            contact: Some("  ".to_owned()),
            dept_id: DepartmentId::new("CSE").ok()?,
            division: "B".to_owned(),
            batch: "B2".to_owned(),
            year: 3,
            semester: 5,
            enrolled_subjects: vec![EnrolledSubject {
                subject_id: SubjectId::new("CS301").ok()?,
                subject_name: "Operating Systems".to_owned(),
                credits: 4,
            }],
            mini_project: MiniProjectAssignment {
                title: "Campus Navigator".to_owned(),
                supervisor_name: "Prof. Iyer".to_owned(),
            },
            mentor_id: FacultyId::new(),
            counsellor_id: FacultyId::new(),
        })
    }

    #[test]
    fn blank_contact_is_normalized_to_none() {
        let Some(input) = base_input() else {
            panic!("failed to build student input");
        };
        let student = Student::new(input);
        assert_eq!(student.ok().and_then(|s| s.contact().map(String::from)), None);
    }

    #[test]
    fn out_of_range_semester_is_rejected() {
        let Some(mut input) = base_input() else {
            panic!("failed to build student input");
        };
        input.semester = 9;
        assert!(Student::new(input).is_err());
    }

    #[test]
    fn empty_enrollment_is_rejected() {
        let Some(mut input) = base_input() else {
            panic!("failed to build student input");
        };
        input.enrolled_subjects.clear();
        assert!(Student::new(input).is_err());
    }
}
