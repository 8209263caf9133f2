use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    Department, DepartmentId, EmailAddress, EnrolledSubject, FacultyId, FacultyMember,
    FacultyMemberInput, FacultyRole, MiniProjectAssignment, Student, StudentId, StudentInput,
    SubjectId,
};

use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::directory_ports::{DepartmentRepository, FacultyRepository, StudentRepository};

use super::{DirectoryService, UpdateRosterInput};

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn list_recent(&self, limit: i64) -> AppResult<Vec<AuditEvent>> {
        let events = self.events.lock().await;
        Ok(events.iter().rev().take(limit as usize).cloned().collect())
    }
}

/// Single-lock directory fake so the HOD replacement can be atomic, the way
/// the real adapters implement it.
#[derive(Default)]
struct FakeDirectory {
    inner: Mutex<DirectoryState>,
}

#[derive(Default)]
struct DirectoryState {
    students: HashMap<StudentId, Student>,
    faculty: HashMap<FacultyId, FacultyMember>,
    departments: HashMap<DepartmentId, Department>,
}

#[async_trait]
impl StudentRepository for FakeDirectory {
    async fn create(&self, student: Student) -> AppResult<()> {
        let mut state = self.inner.lock().await;
        if state.students.contains_key(&student.id()) {
            return Err(AppError::Conflict("duplicate student".to_owned()));
        }
        state.students.insert(student.id(), student);
        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<Student>> {
        Ok(self.inner.lock().await.students.get(&student_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        Ok(self
            .inner
            .lock()
            .await
            .students
            .values()
            .find(|student| student.email().as_str() == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Student>> {
        Ok(self.inner.lock().await.students.values().cloned().collect())
    }

    async fn save(&self, student: Student) -> AppResult<()> {
        self.inner.lock().await.students.insert(student.id(), student);
        Ok(())
    }
}

#[async_trait]
impl FacultyRepository for FakeDirectory {
    async fn create(&self, member: FacultyMember) -> AppResult<()> {
        self.inner.lock().await.faculty.insert(member.id(), member);
        Ok(())
    }

    async fn find(&self, faculty_id: FacultyId) -> AppResult<Option<FacultyMember>> {
        Ok(self.inner.lock().await.faculty.get(&faculty_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<FacultyMember>> {
        Ok(self
            .inner
            .lock()
            .await
            .faculty
            .values()
            .find(|member| member.email().as_str() == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<FacultyMember>> {
        Ok(self.inner.lock().await.faculty.values().cloned().collect())
    }

    async fn save(&self, member: FacultyMember) -> AppResult<()> {
        self.inner.lock().await.faculty.insert(member.id(), member);
        Ok(())
    }
}

#[async_trait]
impl DepartmentRepository for FakeDirectory {
    async fn create(&self, department: Department) -> AppResult<()> {
        let mut state = self.inner.lock().await;
        if state.departments.contains_key(department.dept_id()) {
            return Err(AppError::Conflict("duplicate department".to_owned()));
        }
        state
            .departments
            .insert(department.dept_id().clone(), department);
        Ok(())
    }

    async fn find(&self, dept_id: &DepartmentId) -> AppResult<Option<Department>> {
        Ok(self.inner.lock().await.departments.get(dept_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<Department>> {
        Ok(self
            .inner
            .lock()
            .await
            .departments
            .values()
            .cloned()
            .collect())
    }

    async fn replace_hod(
        &self,
        dept_id: &DepartmentId,
        new_hod: FacultyId,
    ) -> AppResult<Option<FacultyId>> {
        let mut state = self.inner.lock().await;

        let prior = state
            .departments
            .get(dept_id)
            .and_then(|department| department.hod_id());

        if let Some(prior) = prior
            && let Some(member) = state.faculty.get_mut(&prior)
        {
            member.revoke_role(FacultyRole::Hod);
        }

        if let Some(member) = state.faculty.get_mut(&new_hod) {
            member.grant_role(FacultyRole::Hod);
        }

        if let Some(department) = state.departments.get_mut(dept_id) {
            department.appoint_hod(new_hod);
        }

        Ok(prior)
    }
}

fn member(name: &str, login: &str) -> FacultyMember {
    FacultyMember::new(FacultyMemberInput {
        id: FacultyId::new(),
        name: name.to_owned(),
        email: EmailAddress::new(login).unwrap_or_else(|_| unreachable!()),
        roles: BTreeSet::new(),
        taught_subjects: Vec::new(),
        mentee_ids: BTreeSet::new(),
    })
    .unwrap_or_else(|_| unreachable!())
}

fn student_input(mentor_id: FacultyId, counsellor_id: FacultyId) -> StudentInput {
    StudentInput {
        id: StudentId::new(),
        roll_no: "42".to_owned(),
        usn: "1DY21CS042".to_owned(),
        name: "Asha Kulkarni".to_owned(),
        email: EmailAddress::new("asha@students.college.ac.in").unwrap_or_else(|_| unreachable!()),
        contact: None,
        dept_id: DepartmentId::new("CSE").unwrap_or_else(|_| unreachable!()),
        division: "B".to_owned(),
        batch: "B2".to_owned(),
        year: 3,
        semester: 5,
        enrolled_subjects: vec![EnrolledSubject {
            subject_id: SubjectId::new("CS301").unwrap_or_else(|_| unreachable!()),
            subject_name: "Operating Systems".to_owned(),
            credits: 4,
        }],
        mini_project: MiniProjectAssignment {
            title: "Campus Navigator".to_owned(),
            supervisor_name: "Prof. Iyer".to_owned(),
        },
        mentor_id,
        counsellor_id,
    }
}

struct Fixture {
    service: DirectoryService,
    directory: Arc<FakeDirectory>,
    admin: UserIdentity,
    office: UserIdentity,
    dept_id: DepartmentId,
    first_hod: FacultyId,
    second_hod: FacultyId,
    mentor: FacultyId,
}

async fn fixture() -> Fixture {
    let directory = Arc::new(FakeDirectory::default());
    let audit = Arc::new(FakeAuditRepository::default());

    let dept_id = DepartmentId::new("CSE").unwrap_or_else(|_| unreachable!());
    let department = Department::new(dept_id.clone(), "Computer Science")
        .unwrap_or_else(|_| unreachable!());
    let _ = DepartmentRepository::create(directory.as_ref(), department).await;

    let first = member("Prof. Bhat", "bhat@college.ac.in");
    let second = member("Prof. Kulkarni", "kulkarni@college.ac.in");
    let mentor = member("Prof. Rao", "rao@college.ac.in");
    let first_hod = first.id();
    let second_hod = second.id();
    let mentor_id = mentor.id();
    for entry in [first, second, mentor] {
        let _ = FacultyRepository::create(directory.as_ref(), entry).await;
    }

    let service = DirectoryService::new(
        directory.clone(),
        directory.clone(),
        directory.clone(),
        audit,
    );

    Fixture {
        service,
        directory,
        admin: UserIdentity::new("acct-admin", "Admin", "admin@college.ac.in", PortalRole::Admin),
        office: UserIdentity::new(
            "acct-office",
            "Office",
            "office@college.ac.in",
            PortalRole::Office,
        ),
        dept_id,
        first_hod,
        second_hod,
        mentor: mentor_id,
    }
}

#[tokio::test]
async fn directory_administration_is_admin_gated() {
    let fixture = fixture().await;

    let result = fixture.service.list_students(&fixture.office).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn registering_a_student_checks_referenced_entries() {
    let fixture = fixture().await;

    let mut input = student_input(fixture.mentor, fixture.first_hod);
    input.dept_id = DepartmentId::new("EEE").unwrap_or_else(|_| unreachable!());
    let result = fixture.service.register_student(&fixture.admin, input).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let input = student_input(fixture.mentor, fixture.first_hod);
    let result = fixture.service.register_student(&fixture.admin, input).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn roster_update_touches_only_the_given_fields() {
    let fixture = fixture().await;

    let input = student_input(fixture.mentor, fixture.first_hod);
    let student_id = input.id;
    let created = fixture.service.register_student(&fixture.admin, input).await;
    assert!(created.is_ok());

    let updated = fixture
        .service
        .update_roster(
            &fixture.admin,
            student_id,
            UpdateRosterInput {
                batch: Some("B3".to_owned()),
                ..UpdateRosterInput::default()
            },
        )
        .await;

    let Ok(updated) = updated else {
        panic!("roster update failed");
    };
    assert_eq!(updated.batch().as_str(), "B3");
    assert_eq!(updated.mentor_id(), fixture.mentor);
    assert_eq!(updated.enrolled_subjects().len(), 1);
}

#[tokio::test]
async fn roster_update_validates_reassigned_faculty() {
    let fixture = fixture().await;

    let input = student_input(fixture.mentor, fixture.first_hod);
    let student_id = input.id;
    let _ = fixture.service.register_student(&fixture.admin, input).await;

    let result = fixture
        .service
        .update_roster(
            &fixture.admin,
            student_id,
            UpdateRosterInput {
                mentor_id: Some(FacultyId::new()),
                ..UpdateRosterInput::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn hod_replacement_moves_the_post_atomically() {
    let fixture = fixture().await;

    let appointed = fixture
        .service
        .replace_department_hod(&fixture.admin, fixture.dept_id.clone(), fixture.first_hod)
        .await;
    assert_eq!(
        appointed.ok().and_then(|dept| dept.hod_id()),
        Some(fixture.first_hod)
    );

    let replaced = fixture
        .service
        .replace_department_hod(&fixture.admin, fixture.dept_id.clone(), fixture.second_hod)
        .await;
    assert_eq!(
        replaced.ok().and_then(|dept| dept.hod_id()),
        Some(fixture.second_hod)
    );

    // Exactly one member carries the role after the move.
    let members = FacultyRepository::list(fixture.directory.as_ref())
        .await
        .unwrap_or_default();
    let holders: Vec<FacultyId> = members
        .iter()
        .filter(|m| m.has_role(FacultyRole::Hod))
        .map(|m| m.id())
        .collect();
    assert_eq!(holders, vec![fixture.second_hod]);
}

#[tokio::test]
async fn hod_replacement_requires_an_existing_member() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .replace_department_hod(&fixture.admin, fixture.dept_id.clone(), FacultyId::new())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
