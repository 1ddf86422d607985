use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Service;
use crate::state::AppState;

// GET /services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = {
        let db = state.db()?;
        queries::list_active_services(&db)?
    };
    Ok(Json(services))
}
