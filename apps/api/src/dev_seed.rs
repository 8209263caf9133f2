//! Reference data set for the in-memory storage mode.
//!
//! Mirrors the original system's startup-loaded mock state: one department,
//! a small faculty covering every chain role, three students with open
//! clearance cycles, and portal accounts for each of them.

use std::collections::BTreeSet;

use clearslip_application::RegisterAccountInput;
use clearslip_core::{AppResult, PortalRole, UserIdentity};
use clearslip_domain::{
    DepartmentId, EmailAddress, EnrolledSubject, FacultyId, FacultyMember, FacultyMemberInput,
    FacultyRole, MiniProjectAssignment, Student, StudentId, StudentInput, SubjectId,
    TaughtSubject,
};
use tracing::info;

use crate::state::AppState;

const DEV_SEED_PASSWORD: &str = "clearslip-dev";
const DEV_SEED_ADMIN_EMAIL: &str = "admin@clearslip.local";
const DEV_SEED_OFFICE_EMAIL: &str = "office@clearslip.local";

const SUBJECTS: &[(&str, &str, u8)] = &[
    ("CS301", "Operating Systems", 4),
    ("CS302", "Database Systems", 4),
    ("CS303", "Computer Networks", 3),
];

pub async fn run(state: &AppState) -> AppResult<()> {
    let seeder = UserIdentity::new(
        "dev-seed",
        "Dev Seed",
        "seed@clearslip.local",
        PortalRole::Admin,
    );

    let dept_id = DepartmentId::new("CSE")?;
    state
        .directory_service
        .register_department(
            &seeder,
            dept_id.clone(),
            "Computer Science and Engineering".to_owned(),
        )
        .await?;

    let rao = register_faculty(
        state,
        &seeder,
        "Prof. Anand Rao",
        "rao@college.ac.in",
        &[FacultyRole::SubjectTeacher],
        &SUBJECTS[..2],
    )
    .await?;

    let dsouza = register_faculty(
        state,
        &seeder,
        "Prof. Sheela D'Souza",
        "dsouza@college.ac.in",
        &[FacultyRole::SubjectTeacher, FacultyRole::ClassCounsellor],
        &SUBJECTS[2..],
    )
    .await?;

    let menon = register_faculty(
        state,
        &seeder,
        "Prof. Vikram Menon",
        "menon@college.ac.in",
        &[FacultyRole::Mentor],
        &[],
    )
    .await?;

    // Supervises mini-projects only; records name supervisors by display
    // name, so no chain role is needed.
    let iyer = register_faculty(
        state,
        &seeder,
        "Prof. Lakshmi Iyer",
        "iyer@college.ac.in",
        &[],
        &[],
    )
    .await?;

    let hegde = register_faculty(
        state,
        &seeder,
        "Dr. Ramesh Hegde",
        "hegde@college.ac.in",
        &[],
        &[],
    )
    .await?;

    // Appointing through the replace operation grants the Hod role.
    state
        .directory_service
        .replace_department_hod(&seeder, dept_id.clone(), hegde.id())
        .await?;

    let students = [
        ("41", "1DY21CS041", "Asha Kulkarni", "asha.kulkarni", "Campus Navigator"),
        ("42", "1DY21CS042", "Rohan Patil", "rohan.patil", "Hostel Mess Planner"),
        ("43", "1DY21CS043", "Meera Nair", "meera.nair", "Lab Inventory Tracker"),
    ];

    let mut student_ids: BTreeSet<StudentId> = BTreeSet::new();
    let mut seeded_students: Vec<Student> = Vec::new();
    for (roll_no, usn, name, email_local, project_title) in students {
        let student = register_student(
            state,
            &seeder,
            &dept_id,
            roll_no,
            usn,
            name,
            email_local,
            project_title,
            iyer.name().as_str(),
            menon.id(),
            dsouza.id(),
        )
        .await?;

        student_ids.insert(student.id());
        seeded_students.push(student);
    }

    state
        .directory_service
        .update_faculty_assignments(
            &seeder,
            menon.id(),
            clearslip_application::UpdateFacultyAssignmentsInput {
                roles: None,
                taught_subjects: None,
                mentee_ids: Some(student_ids),
            },
        )
        .await?;

    register_account(state, &seeder, DEV_SEED_ADMIN_EMAIL, "College Admin", PortalRole::Admin)
        .await?;
    register_account(state, &seeder, DEV_SEED_OFFICE_EMAIL, "Office Desk", PortalRole::Office)
        .await?;

    for member in [&rao, &dsouza, &menon, &iyer, &hegde] {
        register_account(
            state,
            &seeder,
            member.email().as_str(),
            member.name().as_str(),
            PortalRole::Faculty,
        )
        .await?;
    }

    for student in &seeded_students {
        register_account(
            state,
            &seeder,
            student.email().as_str(),
            student.name().as_str(),
            PortalRole::Student,
        )
        .await?;
    }

    for student in &seeded_students {
        state.approval_service.open_cycle(&seeder, student.id()).await?;
    }

    info!(
        admin = DEV_SEED_ADMIN_EMAIL,
        office = DEV_SEED_OFFICE_EMAIL,
        password = DEV_SEED_PASSWORD,
        "seeded the in-memory reference data set"
    );

    Ok(())
}

async fn register_faculty(
    state: &AppState,
    seeder: &UserIdentity,
    name: &str,
    email: &str,
    roles: &[FacultyRole],
    taught: &[(&str, &str, u8)],
) -> AppResult<FacultyMember> {
    let taught_subjects = taught
        .iter()
        .map(|(subject_id, subject_name, _)| {
            Ok(TaughtSubject {
                subject_id: SubjectId::new(*subject_id)?,
                subject_name: (*subject_name).to_owned(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    state
        .directory_service
        .register_faculty(
            seeder,
            FacultyMemberInput {
                id: FacultyId::new(),
                name: name.to_owned(),
                email: EmailAddress::new(email)?,
                roles: roles.iter().copied().collect(),
                taught_subjects,
                mentee_ids: BTreeSet::new(),
            },
        )
        .await
}

#[allow(clippy::too_many_arguments)]
async fn register_student(
    state: &AppState,
    seeder: &UserIdentity,
    dept_id: &DepartmentId,
    roll_no: &str,
    usn: &str,
    name: &str,
    email_local: &str,
    project_title: &str,
    supervisor_name: &str,
    mentor_id: FacultyId,
    counsellor_id: FacultyId,
) -> AppResult<Student> {
    let enrolled_subjects = SUBJECTS
        .iter()
        .map(|(subject_id, subject_name, credits)| {
            Ok(EnrolledSubject {
                subject_id: SubjectId::new(*subject_id)?,
                subject_name: (*subject_name).to_owned(),
                credits: *credits,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    state
        .directory_service
        .register_student(
            seeder,
            StudentInput {
                id: StudentId::new(),
                roll_no: roll_no.to_owned(),
                usn: usn.to_owned(),
                name: name.to_owned(),
                email: EmailAddress::new(format!("{email_local}@students.college.ac.in"))?,
                contact: None,
                dept_id: dept_id.clone(),
                division: "B".to_owned(),
                batch: "B2".to_owned(),
                year: 3,
                semester: 5,
                enrolled_subjects,
                mini_project: MiniProjectAssignment {
                    title: project_title.to_owned(),
                    supervisor_name: supervisor_name.to_owned(),
                },
                mentor_id,
                counsellor_id,
            },
        )
        .await
}

async fn register_account(
    state: &AppState,
    seeder: &UserIdentity,
    email: &str,
    display_name: &str,
    role: PortalRole,
) -> AppResult<()> {
    state
        .auth_service
        .register_account(
            seeder,
            RegisterAccountInput {
                email: email.to_owned(),
                display_name: display_name.to_owned(),
                role,
                password: DEV_SEED_PASSWORD.to_owned(),
            },
        )
        .await
        .map(|_| ())
}
