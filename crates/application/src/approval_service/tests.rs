use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use clearslip_core::{AppError, AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    ApprovalRecord, DepartmentId, EmailAddress, EnrolledSubject, FacultyId, FacultyMember,
    FacultyMemberInput, FacultyRole, MiniProjectAssignment, OpenCycleInput, Stage, StageAction,
    StageKind, StageStatus, Student, StudentId, StudentInput, SubjectId, SubjectSignoff,
    TaughtSubject,
};

use crate::approval_ports::{ApprovalRepository, DecideStageInput, VerifySubjectInput};
use crate::audit_ports::{AuditEvent, AuditRepository};
use crate::directory_ports::{FacultyRepository, StudentRepository};

use super::ApprovalService;

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

#[derive(Default)]
struct FakeStudentRepository {
    students: Mutex<HashMap<StudentId, Student>>,
}

#[async_trait]
impl StudentRepository for FakeStudentRepository {
    async fn create(&self, student: Student) -> AppResult<()> {
        self.students.lock().await.insert(student.id(), student);
        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<Student>> {
        Ok(self.students.lock().await.get(&student_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Student>> {
        Ok(self
            .students
            .lock()
            .await
            .values()
            .find(|student| student.email().as_str() == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<Student>> {
        Ok(self.students.lock().await.values().cloned().collect())
    }

    async fn save(&self, student: Student) -> AppResult<()> {
        self.students.lock().await.insert(student.id(), student);
        Ok(())
    }
}

#[derive(Default)]
struct FakeFacultyRepository {
    members: Mutex<HashMap<FacultyId, FacultyMember>>,
}

#[async_trait]
impl FacultyRepository for FakeFacultyRepository {
    async fn create(&self, member: FacultyMember) -> AppResult<()> {
        self.members.lock().await.insert(member.id(), member);
        Ok(())
    }

    async fn find(&self, faculty_id: FacultyId) -> AppResult<Option<FacultyMember>> {
        Ok(self.members.lock().await.get(&faculty_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<FacultyMember>> {
        Ok(self
            .members
            .lock()
            .await
            .values()
            .find(|member| member.email().as_str() == email)
            .cloned())
    }

    async fn list(&self) -> AppResult<Vec<FacultyMember>> {
        Ok(self.members.lock().await.values().cloned().collect())
    }

    async fn save(&self, member: FacultyMember) -> AppResult<()> {
        self.members.lock().await.insert(member.id(), member);
        Ok(())
    }
}

/// CAS-checking in-memory approval store; can inject version conflicts.
#[derive(Default)]
struct FakeApprovalRepository {
    records: Mutex<HashMap<StudentId, ApprovalRecord>>,
    forced_conflicts: AtomicUsize,
}

#[async_trait]
impl ApprovalRepository for FakeApprovalRepository {
    async fn create(&self, record: ApprovalRecord) -> AppResult<()> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.student_id()) {
            return Err(AppError::Conflict(format!(
                "cycle already open for student '{}'",
                record.student_id()
            )));
        }
        records.insert(record.student_id(), record);
        Ok(())
    }

    async fn find(&self, student_id: StudentId) -> AppResult<Option<ApprovalRecord>> {
        Ok(self.records.lock().await.get(&student_id).cloned())
    }

    async fn list(&self) -> AppResult<Vec<ApprovalRecord>> {
        Ok(self.records.lock().await.values().cloned().collect())
    }

    async fn list_pending(&self, stage_kind: StageKind) -> AppResult<Vec<ApprovalRecord>> {
        Ok(self
            .records
            .lock()
            .await
            .values()
            .filter(|record| !super::pending_stages_of_kind(record, stage_kind).is_empty())
            .cloned()
            .collect())
    }

    async fn save(&self, record: ApprovalRecord, expected_version: u64) -> AppResult<()> {
        if self.forced_conflicts.load(Ordering::SeqCst) > 0 {
            self.forced_conflicts.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::Conflict("forced version conflict".to_owned()));
        }

        let mut records = self.records.lock().await;
        let Some(stored) = records.get(&record.student_id()) else {
            return Err(AppError::NotFound(format!(
                "no record for student '{}'",
                record.student_id()
            )));
        };

        if stored.version() != expected_version {
            return Err(AppError::Conflict("version mismatch".to_owned()));
        }

        records.insert(record.student_id(), record);
        Ok(())
    }
}

struct Fixture {
    service: ApprovalService,
    approvals: Arc<FakeApprovalRepository>,
    audit: Arc<FakeAuditRepository>,
    student_id: StudentId,
    teacher: UserIdentity,
    hybrid: UserIdentity,
    supervisor: UserIdentity,
    counsellor: UserIdentity,
    hod: UserIdentity,
    student_actor: UserIdentity,
    admin: UserIdentity,
}

fn subject(code: &str) -> SubjectId {
    SubjectId::new(code).unwrap_or_else(|_| unreachable!())
}

fn email(value: &str) -> EmailAddress {
    EmailAddress::new(value).unwrap_or_else(|_| unreachable!())
}

fn faculty_member(
    name: &str,
    login: &str,
    roles: BTreeSet<FacultyRole>,
    taught: Vec<TaughtSubject>,
    mentees: BTreeSet<StudentId>,
) -> FacultyMember {
    FacultyMember::new(FacultyMemberInput {
        id: FacultyId::new(),
        name: name.to_owned(),
        email: email(login),
        roles,
        taught_subjects: taught,
        mentee_ids: mentees,
    })
    .unwrap_or_else(|_| unreachable!())
}

fn identity(member_email: &str, role: PortalRole) -> UserIdentity {
    UserIdentity::new("acct-1", "Actor", member_email, role)
}

async fn fixture() -> Fixture {
    let students = Arc::new(FakeStudentRepository::default());
    let faculty = Arc::new(FakeFacultyRepository::default());
    let approvals = Arc::new(FakeApprovalRepository::default());
    let audit = Arc::new(FakeAuditRepository::default());

    let student_id = StudentId::new();

    // Subject teacher who is also the student's mentor (scenario with two
    // hats), plus a second teacher for the other subject.
    let hybrid = faculty_member(
        "Prof. Rao",
        "rao@college.ac.in",
        BTreeSet::from([FacultyRole::SubjectTeacher, FacultyRole::Mentor]),
        vec![TaughtSubject {
            subject_id: subject("CS301"),
            subject_name: "Operating Systems".to_owned(),
        }],
        BTreeSet::from([student_id]),
    );
    let teacher = faculty_member(
        "Prof. Nair",
        "nair@college.ac.in",
        BTreeSet::from([FacultyRole::SubjectTeacher]),
        vec![TaughtSubject {
            subject_id: subject("CS302"),
            subject_name: "Compiler Design".to_owned(),
        }],
        BTreeSet::new(),
    );
    let supervisor = faculty_member(
        "Prof. Iyer",
        "iyer@college.ac.in",
        BTreeSet::from([FacultyRole::SubjectTeacher]),
        Vec::new(),
        BTreeSet::new(),
    );
    let counsellor = faculty_member(
        "Prof. D'Souza",
        "dsouza@college.ac.in",
        BTreeSet::from([FacultyRole::ClassCounsellor]),
        Vec::new(),
        BTreeSet::new(),
    );
    let hod = faculty_member(
        "Prof. Bhat",
        "bhat@college.ac.in",
        BTreeSet::from([FacultyRole::Hod]),
        Vec::new(),
        BTreeSet::new(),
    );

    let student = Student::new(StudentInput {
        id: student_id,
        roll_no: "42".to_owned(),
        usn: "1DY21CS042".to_owned(),
        name: "Asha Kulkarni".to_owned(),
        email: email("asha@students.college.ac.in"),
        contact: None,
        dept_id: DepartmentId::new("CSE").unwrap_or_else(|_| unreachable!()),
        division: "B".to_owned(),
        batch: "B2".to_owned(),
        year: 3,
        semester: 5,
        enrolled_subjects: vec![
            EnrolledSubject {
                subject_id: subject("CS301"),
                subject_name: "Operating Systems".to_owned(),
                credits: 4,
            },
            EnrolledSubject {
                subject_id: subject("CS302"),
                subject_name: "Compiler Design".to_owned(),
                credits: 4,
            },
        ],
        mini_project: MiniProjectAssignment {
            title: "Campus Navigator".to_owned(),
            supervisor_name: "Prof. Iyer".to_owned(),
        },
        mentor_id: hybrid.id(),
        counsellor_id: counsellor.id(),
    })
    .unwrap_or_else(|_| unreachable!());

    let _ = students.create(student).await;
    for member in [&hybrid, &teacher, &supervisor, &counsellor, &hod] {
        let _ = faculty.create(member.clone()).await;
    }

    let record = ApprovalRecord::open(OpenCycleInput {
        student_id,
        subjects: vec![
            SubjectSignoff {
                subject_id: subject("CS301"),
                subject_name: "Operating Systems".to_owned(),
                teacher_name: "Prof. Rao".to_owned(),
            },
            SubjectSignoff {
                subject_id: subject("CS302"),
                subject_name: "Compiler Design".to_owned(),
                teacher_name: "Prof. Nair".to_owned(),
            },
        ],
        supervisor_name: "Prof. Iyer".to_owned(),
        mentor_name: "Prof. Rao".to_owned(),
        counsellor_name: "Prof. D'Souza".to_owned(),
    })
    .unwrap_or_else(|_| unreachable!());
    let _ = approvals.create(record).await;

    let service = ApprovalService::new(
        approvals.clone(),
        students.clone(),
        faculty.clone(),
        audit.clone(),
    );

    Fixture {
        service,
        approvals,
        audit,
        student_id,
        teacher: identity("nair@college.ac.in", PortalRole::Faculty),
        hybrid: identity("rao@college.ac.in", PortalRole::Faculty),
        supervisor: identity("iyer@college.ac.in", PortalRole::Faculty),
        counsellor: identity("dsouza@college.ac.in", PortalRole::Faculty),
        hod: identity("bhat@college.ac.in", PortalRole::Faculty),
        student_actor: identity("asha@students.college.ac.in", PortalRole::Student),
        admin: identity("admin@college.ac.in", PortalRole::Admin),
    }
}

/// Drives the fixture record through the full chain up to (not including)
/// the HOD stage.
async fn approve_up_to_hod(fixture: &Fixture) {
    for (actor, code) in [(&fixture.hybrid, "CS301"), (&fixture.teacher, "CS302")] {
        let verified = fixture
            .service
            .verify_subject_requirement(
                actor,
                VerifySubjectInput {
                    student_id: fixture.student_id,
                    subject_id: subject(code),
                    verified: true,
                },
            )
            .await;
        assert!(verified.is_ok());

        let decided = fixture
            .service
            .decide_stage(
                actor,
                DecideStageInput {
                    student_id: fixture.student_id,
                    stage: Stage::Subject {
                        subject_id: subject(code),
                    },
                    action: StageAction::Approve,
                },
            )
            .await;
        assert!(decided.is_ok());
    }

    for (actor, stage) in [
        (&fixture.supervisor, Stage::MiniProject),
        (&fixture.hybrid, Stage::Mentor),
        (&fixture.counsellor, Stage::Counsellor),
    ] {
        let decided = fixture
            .service
            .decide_stage(
                actor,
                DecideStageInput {
                    student_id: fixture.student_id,
                    stage,
                    action: StageAction::Approve,
                },
            )
            .await;
        assert!(decided.is_ok());
    }
}

#[tokio::test]
async fn subject_approval_requires_verification_through_the_service() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .decide_stage(
            &fixture.hybrid,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Subject {
                    subject_id: subject("CS301"),
                },
                action: StageAction::Approve,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn teacher_cannot_decide_an_unowned_subject() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .decide_stage(
            &fixture.teacher,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Subject {
                    subject_id: subject("CS301"),
                },
                action: StageAction::Reject,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn mentor_approval_blocked_until_prerequisites_complete() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .decide_stage(
            &fixture.hybrid,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Mentor,
                action: StageAction::Approve,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn one_member_acts_at_both_stages_they_hold_roles_for() {
    let fixture = fixture().await;

    // Subject hat first.
    let verified = fixture
        .service
        .verify_subject_requirement(
            &fixture.hybrid,
            VerifySubjectInput {
                student_id: fixture.student_id,
                subject_id: subject("CS301"),
                verified: true,
            },
        )
        .await;
    assert!(verified.is_ok());
    let decided = fixture
        .service
        .decide_stage(
            &fixture.hybrid,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Subject {
                    subject_id: subject("CS301"),
                },
                action: StageAction::Approve,
            },
        )
        .await;
    assert!(decided.is_ok());

    // Remaining prerequisites by their own approvers.
    let verified = fixture
        .service
        .verify_subject_requirement(
            &fixture.teacher,
            VerifySubjectInput {
                student_id: fixture.student_id,
                subject_id: subject("CS302"),
                verified: true,
            },
        )
        .await;
    assert!(verified.is_ok());
    let decided = fixture
        .service
        .decide_stage(
            &fixture.teacher,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Subject {
                    subject_id: subject("CS302"),
                },
                action: StageAction::Approve,
            },
        )
        .await;
    assert!(decided.is_ok());
    let decided = fixture
        .service
        .decide_stage(
            &fixture.supervisor,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::MiniProject,
                action: StageAction::Approve,
            },
        )
        .await;
    assert!(decided.is_ok());

    // Mentor hat of the same member.
    let record = fixture
        .service
        .decide_stage(
            &fixture.hybrid,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Mentor,
                action: StageAction::Approve,
            },
        )
        .await;

    let mentor_status = record
        .map(|r| r.mentor_approval().decision().status())
        .unwrap_or(StageStatus::Pending);
    assert_eq!(mentor_status, StageStatus::Approved);
}

#[tokio::test]
async fn hod_decision_lands_only_after_the_full_chain() {
    let fixture = fixture().await;

    approve_up_to_hod(&fixture).await;

    let record = fixture
        .service
        .decide_stage(
            &fixture.hod,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Hod,
                action: StageAction::Approve,
            },
        )
        .await;

    assert!(record.as_ref().map(|r| r.is_slip_eligible()).unwrap_or(false));

    // Audit captured every decision along the way.
    let events = fixture.audit.list_recent(50).await.unwrap_or_default();
    assert!(events.len() >= 8);
}

#[tokio::test]
async fn hod_cannot_act_before_counsellor_sign_off() {
    let fixture = fixture().await;

    let result = fixture
        .service
        .decide_stage(
            &fixture.hod,
            DecideStageInput {
                student_id: fixture.student_id,
                stage: Stage::Hod,
                action: StageAction::Approve,
            },
        )
        .await;

    // The capability itself requires an approved counsellor stage.
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn decision_retries_through_a_version_conflict() {
    let fixture = fixture().await;
    fixture.approvals.forced_conflicts.store(1, Ordering::SeqCst);

    let result = fixture
        .service
        .verify_subject_requirement(
            &fixture.hybrid,
            VerifySubjectInput {
                student_id: fixture.student_id,
                subject_id: subject("CS301"),
                verified: true,
            },
        )
        .await;

    assert!(result.is_ok());
    assert_eq!(fixture.approvals.forced_conflicts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pending_queue_is_scoped_by_capability() {
    let fixture = fixture().await;

    let queue = fixture
        .service
        .pending_queue(&fixture.teacher, StageKind::Subject)
        .await
        .unwrap_or_default();
    assert_eq!(queue.len(), 1);

    // The counsellor sees no subject work.
    let queue = fixture
        .service
        .pending_queue(&fixture.counsellor, StageKind::Subject)
        .await
        .unwrap_or_default();
    assert!(queue.is_empty());

    // Mentor queue lists the record even while prerequisites are pending;
    // the decision itself stays blocked.
    let queue = fixture
        .service
        .pending_queue(&fixture.hybrid, StageKind::Mentor)
        .await
        .unwrap_or_default();
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn students_read_their_own_record_only() {
    let fixture = fixture().await;

    let own = fixture.service.my_record(&fixture.student_actor).await;
    assert!(own.is_ok());

    let other_id = StudentId::new();
    let result = fixture
        .service
        .record_for_student(&fixture.student_actor, other_id)
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn approval_history_requires_hod_or_admin() {
    let fixture = fixture().await;

    assert!(fixture.service.approval_history(&fixture.hod).await.is_ok());
    assert!(fixture.service.approval_history(&fixture.admin).await.is_ok());

    let result = fixture.service.approval_history(&fixture.teacher).await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn open_cycle_denormalizes_approver_names_and_rejects_duplicates() {
    let fixture = fixture().await;

    // The fixture already opened a cycle for the student.
    let duplicate = fixture
        .service
        .open_cycle(&fixture.admin, fixture.student_id)
        .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // A fresh student gets a record with teacher names resolved from the
    // directory.
    let fresh = StudentId::new();
    let student = Student::new(StudentInput {
        id: fresh,
        roll_no: "43".to_owned(),
        usn: "1DY21CS043".to_owned(),
        name: "Rohan Joshi".to_owned(),
        email: email("rohan@students.college.ac.in"),
        contact: None,
        dept_id: DepartmentId::new("CSE").unwrap_or_else(|_| unreachable!()),
        division: "B".to_owned(),
        batch: "B1".to_owned(),
        year: 3,
        semester: 5,
        enrolled_subjects: vec![EnrolledSubject {
            subject_id: subject("CS302"),
            subject_name: "Compiler Design".to_owned(),
            credits: 4,
        }],
        mini_project: MiniProjectAssignment {
            title: "Mess Menu Planner".to_owned(),
            supervisor_name: "Prof. Iyer".to_owned(),
        },
        mentor_id: FacultyId::new(),
        counsellor_id: FacultyId::new(),
    })
    .unwrap_or_else(|_| unreachable!());
    let _ = fixture
        .service
        .student_repository
        .create(student)
        .await;

    let record = fixture.service.open_cycle(&fixture.admin, fresh).await;
    let teacher_name = record
        .map(|r| {
            r.subject_approvals()
                .first()
                .map(|entry| entry.teacher_name().to_owned())
                .unwrap_or_default()
        })
        .unwrap_or_default();
    assert_eq!(teacher_name, "Prof. Nair");
}
