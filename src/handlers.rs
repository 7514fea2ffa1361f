use crate::{
    AppState,
    error::{ApiError, ErrorBody},
    models::{DeleteResponse, LoginRequest, LoginResponse, Record, RecordId, RecordInput},
};
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

fn record_not_found() -> ApiError {
    ApiError::NotFound("Record not found".to_string())
}

/// Parses the `{id}` path segment into a validated identifier.
fn record_id(path: Result<Path<String>, PathRejection>) -> Result<RecordId, ApiError> {
    let Path(raw) = path?;
    raw.parse()
}

// --- Handlers ---

/// login
///
/// [Public Route] Verifies the submitted credentials and returns a signed bearer token
/// carrying the account's email and role.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Malformed body or missing fields", body = ErrorBody),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body?;
    let authorized = state.credentials.verify(&request).await?;

    let token = state
        .tokens
        .issue(&authorized.subject, &authorized.role)
        .map_err(|e| {
            // Signing errors stay in the logs; the client only sees a generic 500.
            tracing::error!(error = %e, "failed to sign token");
            ApiError::Internal
        })?;

    tracing::info!(subject = %authorized.subject, role = %authorized.role, "login succeeded");

    Ok(Json(LoginResponse {
        status: true,
        message: "Login Success".to_string(),
        token,
    }))
}

/// list_records
///
/// [Protected Route] Returns every record in insertion order (possibly empty).
#[utoipa::path(
    get,
    path = "/records",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All records", body = [Record]),
        (status = 401, description = "Missing, invalid or under-privileged token", body = ErrorBody)
    )
)]
pub async fn list_records(State(state): State<AppState>) -> Json<Vec<Record>> {
    Json(state.repo.list().await)
}

/// get_record
///
/// [Protected Route] Fetches a single record by id.
#[utoipa::path(
    get,
    path = "/records/{id}",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Found", body = Record),
        (status = 400, description = "Invalid record ID", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Record>, ApiError> {
    let id = record_id(path)?;
    state.repo.get(id).await.map(Json).ok_or_else(record_not_found)
}

/// create_record
///
/// [Protected Route] Inserts a record and returns it with its assigned id. Any `id` in
/// the body is ignored. The record is then offered to the persistence sink; a sink
/// failure is logged and does not affect the response.
#[utoipa::path(
    post,
    path = "/records",
    security(("bearer_auth" = [])),
    request_body = RecordInput,
    responses(
        (status = 201, description = "Created", body = Record),
        (status = 400, description = "Malformed body", body = ErrorBody)
    )
)]
pub async fn create_record(
    State(state): State<AppState>,
    body: Result<Json<RecordInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Record>), ApiError> {
    let Json(input) = body?;
    let record = state.repo.insert(input).await;

    if let Err(e) = state.sink.persist(&record).await {
        tracing::error!(id = record.id, error = %e, "persistence sink failed");
    }

    Ok((StatusCode::CREATED, Json(record)))
}

/// update_record
///
/// [Protected Route] Replaces title and author of an existing record. Either both
/// fields change or nothing does.
#[utoipa::path(
    put,
    path = "/records/{id}",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Record ID")),
    request_body = RecordInput,
    responses(
        (status = 200, description = "Updated", body = Record),
        (status = 400, description = "Invalid record ID or body", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_record(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    body: Result<Json<RecordInput>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let id = record_id(path)?;
    let Json(input) = body?;
    state
        .repo
        .update(id, input)
        .await
        .map(Json)
        .ok_or_else(record_not_found)
}

/// delete_record
///
/// [Protected Route] Removes a record; the remaining records keep their order.
#[utoipa::path(
    delete,
    path = "/records/{id}",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Deleted", body = DeleteResponse),
        (status = 400, description = "Invalid record ID", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_record(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = record_id(path)?;
    if !state.repo.delete(id).await {
        return Err(record_not_found());
    }
    tracing::info!(%id, "record deleted");
    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
        message: "Record deleted".to_string(),
    }))
}
