use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;

use clearslip_core::UserIdentity;
use clearslip_domain::DepartmentId;

use crate::dto::{
    CreateDepartmentRequest, DepartmentResponse, FacultyResponse, RegisterFacultyRequest,
    RegisterStudentRequest, ReplaceHodRequest, StudentResponse, UpdateFacultyAssignmentsRequest,
    UpdateRosterRequest, parse_faculty_id, parse_student_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/students - the full student roster.
pub async fn list_students_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<StudentResponse>>> {
    let students = state.directory_service.list_students(&user).await?;
    Ok(Json(students.iter().map(StudentResponse::from).collect()))
}

/// POST /api/students - register a student.
pub async fn register_student_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RegisterStudentRequest>,
) -> ApiResult<(StatusCode, Json<StudentResponse>)> {
    let student = state
        .directory_service
        .register_student(&user, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(StudentResponse::from(&student))))
}

/// GET /api/students/{student_id} - one student.
pub async fn get_student_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
) -> ApiResult<Json<StudentResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let student = state.directory_service.get_student(&user, student_id).await?;

    Ok(Json(StudentResponse::from(&student)))
}

/// PUT /api/students/{student_id}/roster - mutate roster fields.
pub async fn update_roster_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(student_id): Path<String>,
    Json(payload): Json<UpdateRosterRequest>,
) -> ApiResult<Json<StudentResponse>> {
    let student_id = parse_student_id(&student_id)?;
    let student = state
        .directory_service
        .update_roster(&user, student_id, payload.into_input()?)
        .await?;

    Ok(Json(StudentResponse::from(&student)))
}

/// GET /api/faculty - the full faculty roster.
pub async fn list_faculty_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<FacultyResponse>>> {
    let members = state.directory_service.list_faculty(&user).await?;
    Ok(Json(members.iter().map(FacultyResponse::from).collect()))
}

/// POST /api/faculty - register a faculty member.
pub async fn register_faculty_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RegisterFacultyRequest>,
) -> ApiResult<(StatusCode, Json<FacultyResponse>)> {
    let member = state
        .directory_service
        .register_faculty(&user, payload.into_input()?)
        .await?;

    Ok((StatusCode::CREATED, Json(FacultyResponse::from(&member))))
}

/// PUT /api/faculty/{faculty_id}/assignments - mutate roles, taught
/// subjects or mentee lists.
pub async fn update_faculty_assignments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(faculty_id): Path<String>,
    Json(payload): Json<UpdateFacultyAssignmentsRequest>,
) -> ApiResult<Json<FacultyResponse>> {
    let faculty_id = parse_faculty_id(&faculty_id)?;
    let member = state
        .directory_service
        .update_faculty_assignments(&user, faculty_id, payload.into_input()?)
        .await?;

    Ok(Json(FacultyResponse::from(&member)))
}

/// GET /api/departments - every department.
pub async fn list_departments_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<DepartmentResponse>>> {
    let departments = state.directory_service.list_departments(&user).await?;

    Ok(Json(
        departments.iter().map(DepartmentResponse::from).collect(),
    ))
}

/// POST /api/departments - register a department.
pub async fn register_department_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateDepartmentRequest>,
) -> ApiResult<(StatusCode, Json<DepartmentResponse>)> {
    let department = state
        .directory_service
        .register_department(&user, DepartmentId::new(payload.dept_id)?, payload.dept_name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DepartmentResponse::from(&department)),
    ))
}

/// PUT /api/departments/{dept_id}/hod - atomically move the HOD post.
pub async fn replace_hod_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(dept_id): Path<String>,
    Json(payload): Json<ReplaceHodRequest>,
) -> ApiResult<Json<DepartmentResponse>> {
    let department = state
        .directory_service
        .replace_department_hod(
            &user,
            DepartmentId::new(dept_id)?,
            parse_faculty_id(&payload.faculty_id)?,
        )
        .await?;

    Ok(Json(DepartmentResponse::from(&department)))
}
