use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Sits behind [`admin_guard`](crate::auth::admin_guard); only authenticated
/// admins reach it.
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Admin-only area", content_type = "application/json"),
        (status = 401, description = "Not an authenticated admin"),
    ),
    tag = "auth"
)]
pub async fn admin_area() -> Response {
    Json(json!({"msg": "admin area"})).into_response()
}
