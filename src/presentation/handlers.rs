use crate::application::service::MemberService;
use crate::data::memory::InMemoryMemberRepository;
use crate::domain::error::DomainError;
use crate::domain::member::{BulkDeleteRequest, CreateMemberRequest};
use crate::domain::pagination::{ListQuery, PageMeta};
use crate::presentation::middleware::AuthenticatedUser;
use crate::presentation::validation::{FieldErrors, field_errors};
use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse, ResponseError, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

pub struct AppState {
    pub service: MemberService<InMemoryMemberRepository>,
}

/// Envelope shared by every response, success or failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            errors: None,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl ApiResponse<()> {
    pub fn message(success: bool, message: &str) -> Self {
        Self {
            success,
            message: message.to_string(),
            data: None,
            errors: None,
            meta: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad Request")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    StoreUnavailable(String),
    #[error("{0}")]
    WriteFailed(String),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::StoreUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::WriteFailed(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(error = %message, status = %status, "Request failed");
        } else {
            warn!(error = %message, status = %status, "Request rejected");
        }

        let mut body = ApiResponse::message(false, &message);
        if let ApiError::Validation(fields) = self {
            body.errors = Some(fields.clone());
        }
        HttpResponse::build(status).json(body)
    }
}

impl From<&ValidationErrors> for ApiError {
    fn from(errors: &ValidationErrors) -> Self {
        ApiError::Validation(field_errors(errors))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<DomainError>() {
            Some(DomainError::NotFound(msg)) => ApiError::NotFound(msg.clone()),
            Some(DomainError::Conflict(msg)) => ApiError::Conflict(msg.clone()),
            Some(DomainError::StoreUnavailable(msg)) => ApiError::StoreUnavailable(msg.clone()),
            Some(DomainError::WriteFailed(msg)) => ApiError::WriteFailed(msg.clone()),
            Some(DomainError::Internal(msg)) => ApiError::Internal(msg.clone()),
            None => ApiError::Internal(err.to_string()),
        }
    }
}

/// Reads the identity `JwtAuthMiddleware` stored in the request extensions.
impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let user = req.extensions().get::<AuthenticatedUser>().cloned();
        ready(user.ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string())))
    }
}

/// Body that could not be parsed at all, as opposed to one that failed validation.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Unparseable request body");
        ApiError::BadRequest("Bad Request".to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Unparseable query string");
        ApiError::BadRequest("Invalid query parameters".to_string()).into()
    })
}

/// A path segment that is not a UUID cannot name a member.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| {
        warn!(error = %err, "Unparseable member id");
        ApiError::NotFound("member not found".to_string()).into()
    })
}

/// Registers the member routes on a scope. `/multiple-delete` must be
/// registered ahead of `/{id}`.
pub fn member_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .route("", web::post().to(create_member))
        .route("", web::get().to(list_members))
        .route("/create", web::post().to(create_member))
        .route("/multiple-delete", web::delete().to(delete_members))
        .route("/{id}", web::get().to(get_member))
        .route("/{id}", web::put().to(update_member))
        .route("/{id}", web::delete().to(delete_member));
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
}

#[instrument]
pub async fn health_check() -> HttpResponse {
    info!("Health check requested");
    let response = HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::Ok().json(response)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResult {
    pub deleted: u64,
}

#[instrument(skip(state, user, req), fields(caller = %user.user_id, member_id))]
pub async fn create_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = req.into_inner();
    info!(email = %payload.email, "Creating member");
    payload.validate().map_err(|e| ApiError::from(&e))?;

    let member = state.service.create_member(payload).await.map_err(|e| {
        error!(error = %e, "Failed to create member");
        ApiError::from(e)
    })?;

    tracing::Span::current().record("member_id", tracing::field::display(member.id));
    info!(member_id = %member.id, "Member created successfully");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Success add new data", member)))
}

#[instrument(skip(state, user), fields(caller = %user.user_id))]
pub async fn list_members(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = query.into_inner();
    query.validate().map_err(|e| ApiError::from(&e))?;

    let page = state.service.list_members(&query).await.map_err(|e| {
        error!(error = %e, "Failed to list members");
        ApiError::from(e)
    })?;

    info!(
        returned = page.items.len(),
        total = page.meta.total,
        "Members listed successfully"
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success("Success get data", page.items).with_meta(page.meta)))
}

#[instrument(skip(state, user), fields(caller = %user.user_id, member_id = %*path))]
pub async fn get_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member_id = path.into_inner();
    let member = state.service.get_member(member_id).await.map_err(|e| {
        error!(error = %e, "Failed to get member");
        ApiError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::success("Success get data", member)))
}

#[instrument(skip(state, user, req), fields(caller = %user.user_id, member_id = %*path))]
pub async fn update_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
    req: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse, ApiError> {
    let member_id = path.into_inner();
    let payload = req.into_inner();
    payload.validate().map_err(|e| ApiError::from(&e))?;

    let member = state
        .service
        .update_member(member_id, payload)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update member");
            ApiError::from(e)
        })?;

    info!("Member updated successfully");
    Ok(HttpResponse::Ok().json(ApiResponse::success("Successfully updated member", member)))
}

#[instrument(skip(state, user), fields(caller = %user.user_id, member_id = %*path))]
pub async fn delete_member(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let member_id = path.into_inner();
    state.service.delete_member(member_id).await.map_err(|e| {
        error!(error = %e, "Failed to delete member");
        ApiError::from(e)
    })?;

    info!("Member deleted successfully");
    Ok(HttpResponse::Ok().json(ApiResponse::message(true, "Member deleted successfully")))
}

/// Ids that do not exist are ignored; the request only fails with 404 when
/// none of them matched. Duplicate or missing ids are rejected with 400
/// before the store is touched.
#[instrument(skip(state, user, req), fields(caller = %user.user_id))]
pub async fn delete_members(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    req: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, ApiError> {
    let payload = req.into_inner();
    payload.validate().map_err(|e| ApiError::from(&e))?;

    let deleted = state
        .service
        .delete_members(&payload.ids)
        .await
        .map_err(|e| {
            error!(requested = payload.ids.len(), error = %e, "Failed to delete members");
            ApiError::from(e)
        })?;

    info!(requested = payload.ids.len(), deleted, "Members deleted successfully");
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Members deleted successfully",
        BulkDeleteResult { deleted },
    )))
}
