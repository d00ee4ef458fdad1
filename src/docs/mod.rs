use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Service accepts new sessions", body = HealthResponse),
        (status = 503, description = "Every session slot is taken", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Session, document and host statistics
#[utoipa::path(
    get,
    path = "/api/diagnostics",
    responses(
        (status = 200, description = "Diagnostics snapshot", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Current content of the shared document
#[utoipa::path(
    get,
    path = "/api/document",
    responses(
        (status = 200, description = "Document content and version", body = DocumentResponse)
    )
)]
#[allow(dead_code)]
pub async fn document_doc() {}

/// Compile C source in the sandbox
#[utoipa::path(
    post,
    path = "/api/build",
    request_body = BuildRequest,
    responses(
        (status = 200, description = "Build finished, see `success`", body = ExecResult),
        (status = 413, description = "Source too large", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn build_doc() {}

/// Run the last built program in the sandbox
#[utoipa::path(
    post,
    path = "/api/run",
    responses(
        (status = 200, description = "Run finished, see `success`", body = ExecResult)
    )
)]
#[allow(dead_code)]
pub async fn run_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        document_doc,
        build_doc,
        run_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, DocumentResponse, BuildRequest, ExecResult, ErrorResponse)
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;
