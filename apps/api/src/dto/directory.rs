use std::collections::BTreeSet;
use std::str::FromStr;

use clearslip_application::{UpdateFacultyAssignmentsInput, UpdateRosterInput};
use clearslip_core::{AppError, AppResult};
use clearslip_domain::{
    Department, DepartmentId, EmailAddress, EnrolledSubject, FacultyId, FacultyMember,
    FacultyMemberInput, FacultyRole, MiniProjectAssignment, Student, StudentId, StudentInput,
    SubjectId, TaughtSubject,
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One enrolled subject in transport form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/enrolled-subject.ts"
)]
pub struct EnrolledSubjectDto {
    pub subject_id: String,
    pub subject_name: String,
    pub credits: u8,
}

impl EnrolledSubjectDto {
    fn into_domain(self) -> AppResult<EnrolledSubject> {
        Ok(EnrolledSubject {
            subject_id: SubjectId::new(self.subject_id)?,
            subject_name: self.subject_name,
            credits: self.credits,
        })
    }

    fn from_domain(enrolled: &EnrolledSubject) -> Self {
        Self {
            subject_id: enrolled.subject_id.as_str().to_owned(),
            subject_name: enrolled.subject_name.clone(),
            credits: enrolled.credits,
        }
    }
}

/// The assigned mini-project in transport form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/mini-project.ts"
)]
pub struct MiniProjectDto {
    pub title: String,
    pub supervisor_name: String,
}

/// Incoming payload for student registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-student-request.ts"
)]
pub struct RegisterStudentRequest {
    pub roll_no: String,
    pub usn: String,
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
    pub dept_id: String,
    pub division: String,
    pub batch: String,
    pub year: u8,
    pub semester: u8,
    pub enrolled_subjects: Vec<EnrolledSubjectDto>,
    pub mini_project: MiniProjectDto,
    pub mentor_id: String,
    pub counsellor_id: String,
}

impl RegisterStudentRequest {
    pub fn into_input(self) -> AppResult<StudentInput> {
        Ok(StudentInput {
            id: StudentId::new(),
            roll_no: self.roll_no,
            usn: self.usn,
            name: self.name,
            email: EmailAddress::new(self.email)?,
            contact: self.contact,
            dept_id: DepartmentId::new(self.dept_id)?,
            division: self.division,
            batch: self.batch,
            year: self.year,
            semester: self.semester,
            enrolled_subjects: self
                .enrolled_subjects
                .into_iter()
                .map(EnrolledSubjectDto::into_domain)
                .collect::<AppResult<Vec<_>>>()?,
            mini_project: MiniProjectAssignment {
                title: self.mini_project.title,
                supervisor_name: self.mini_project.supervisor_name,
            },
            mentor_id: parse_faculty_id(&self.mentor_id)?,
            counsellor_id: parse_faculty_id(&self.counsellor_id)?,
        })
    }
}

/// API representation of a student directory entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/student-response.ts"
)]
pub struct StudentResponse {
    pub id: String,
    pub roll_no: String,
    pub usn: String,
    pub name: String,
    pub email: String,
    pub contact: Option<String>,
    pub dept_id: String,
    pub division: String,
    pub batch: String,
    pub year: u8,
    pub semester: u8,
    pub enrolled_subjects: Vec<EnrolledSubjectDto>,
    pub mini_project: MiniProjectDto,
    pub mentor_id: String,
    pub counsellor_id: String,
}

impl From<&Student> for StudentResponse {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id().to_string(),
            roll_no: student.roll_no().as_str().to_owned(),
            usn: student.usn().as_str().to_owned(),
            name: student.name().as_str().to_owned(),
            email: student.email().as_str().to_owned(),
            contact: student.contact().map(ToOwned::to_owned),
            dept_id: student.dept_id().as_str().to_owned(),
            division: student.division().as_str().to_owned(),
            batch: student.batch().as_str().to_owned(),
            year: student.year(),
            semester: student.semester(),
            enrolled_subjects: student
                .enrolled_subjects()
                .iter()
                .map(EnrolledSubjectDto::from_domain)
                .collect(),
            mini_project: MiniProjectDto {
                title: student.mini_project().title.clone(),
                supervisor_name: student.mini_project().supervisor_name.clone(),
            },
            mentor_id: student.mentor_id().to_string(),
            counsellor_id: student.counsellor_id().to_string(),
        }
    }
}

/// Incoming payload for student roster mutations; omitted fields are left
/// untouched.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-roster-request.ts"
)]
pub struct UpdateRosterRequest {
    pub enrolled_subjects: Option<Vec<EnrolledSubjectDto>>,
    pub batch: Option<String>,
    pub mentor_id: Option<String>,
    pub counsellor_id: Option<String>,
}

impl UpdateRosterRequest {
    pub fn into_input(self) -> AppResult<UpdateRosterInput> {
        Ok(UpdateRosterInput {
            enrolled_subjects: self
                .enrolled_subjects
                .map(|subjects| {
                    subjects
                        .into_iter()
                        .map(EnrolledSubjectDto::into_domain)
                        .collect::<AppResult<Vec<_>>>()
                })
                .transpose()?,
            batch: self.batch,
            mentor_id: self
                .mentor_id
                .as_deref()
                .map(parse_faculty_id)
                .transpose()?,
            counsellor_id: self
                .counsellor_id
                .as_deref()
                .map(parse_faculty_id)
                .transpose()?,
        })
    }
}

/// One taught subject in transport form.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/taught-subject.ts"
)]
pub struct TaughtSubjectDto {
    pub subject_id: String,
    pub subject_name: String,
}

impl TaughtSubjectDto {
    fn into_domain(self) -> AppResult<TaughtSubject> {
        Ok(TaughtSubject {
            subject_id: SubjectId::new(self.subject_id)?,
            subject_name: self.subject_name,
        })
    }
}

/// Incoming payload for faculty registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/register-faculty-request.ts"
)]
pub struct RegisterFacultyRequest {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub taught_subjects: Vec<TaughtSubjectDto>,
    pub mentee_ids: Vec<String>,
}

impl RegisterFacultyRequest {
    pub fn into_input(self) -> AppResult<FacultyMemberInput> {
        Ok(FacultyMemberInput {
            id: FacultyId::new(),
            name: self.name,
            email: EmailAddress::new(self.email)?,
            roles: parse_roles(self.roles)?,
            taught_subjects: self
                .taught_subjects
                .into_iter()
                .map(TaughtSubjectDto::into_domain)
                .collect::<AppResult<Vec<_>>>()?,
            mentee_ids: parse_student_ids(self.mentee_ids)?,
        })
    }
}

/// API representation of a faculty directory entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/faculty-response.ts"
)]
pub struct FacultyResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub taught_subjects: Vec<TaughtSubjectDto>,
    pub mentee_ids: Vec<String>,
}

impl From<&FacultyMember> for FacultyResponse {
    fn from(member: &FacultyMember) -> Self {
        Self {
            id: member.id().to_string(),
            name: member.name().as_str().to_owned(),
            email: member.email().as_str().to_owned(),
            roles: member
                .roles()
                .iter()
                .map(|role| role.as_str().to_owned())
                .collect(),
            taught_subjects: member
                .taught_subjects()
                .iter()
                .map(|taught| TaughtSubjectDto {
                    subject_id: taught.subject_id.as_str().to_owned(),
                    subject_name: taught.subject_name.clone(),
                })
                .collect(),
            mentee_ids: member
                .mentee_ids()
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// Incoming payload for faculty role and assignment mutations; omitted
/// fields are left untouched.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-faculty-assignments-request.ts"
)]
pub struct UpdateFacultyAssignmentsRequest {
    pub roles: Option<Vec<String>>,
    pub taught_subjects: Option<Vec<TaughtSubjectDto>>,
    pub mentee_ids: Option<Vec<String>>,
}

impl UpdateFacultyAssignmentsRequest {
    pub fn into_input(self) -> AppResult<UpdateFacultyAssignmentsInput> {
        Ok(UpdateFacultyAssignmentsInput {
            roles: self.roles.map(parse_roles).transpose()?,
            taught_subjects: self
                .taught_subjects
                .map(|subjects| {
                    subjects
                        .into_iter()
                        .map(TaughtSubjectDto::into_domain)
                        .collect::<AppResult<Vec<_>>>()
                })
                .transpose()?,
            mentee_ids: self.mentee_ids.map(parse_student_ids).transpose()?,
        })
    }
}

/// Incoming payload for department registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-department-request.ts"
)]
pub struct CreateDepartmentRequest {
    pub dept_id: String,
    pub dept_name: String,
}

/// API representation of a department.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/department-response.ts"
)]
pub struct DepartmentResponse {
    pub dept_id: String,
    pub dept_name: String,
    pub hod_id: Option<String>,
}

impl From<&Department> for DepartmentResponse {
    fn from(department: &Department) -> Self {
        Self {
            dept_id: department.dept_id().as_str().to_owned(),
            dept_name: department.dept_name().as_str().to_owned(),
            hod_id: department.hod_id().map(|id| id.to_string()),
        }
    }
}

/// Incoming payload for the atomic department HOD replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/replace-hod-request.ts"
)]
pub struct ReplaceHodRequest {
    pub faculty_id: String,
}

pub fn parse_faculty_id(value: &str) -> AppResult<FacultyId> {
    uuid::Uuid::parse_str(value)
        .map(FacultyId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid faculty id '{value}': {error}")))
}

pub fn parse_student_id(value: &str) -> AppResult<StudentId> {
    uuid::Uuid::parse_str(value)
        .map(StudentId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid student id '{value}': {error}")))
}

fn parse_roles(values: Vec<String>) -> AppResult<BTreeSet<FacultyRole>> {
    values
        .iter()
        .map(|value| FacultyRole::from_str(value))
        .collect()
}

fn parse_student_ids(values: Vec<String>) -> AppResult<BTreeSet<StudentId>> {
    values.iter().map(|value| parse_student_id(value)).collect()
}
