use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::photo::PhotoCategory;
use crate::routes::{self, ApiError};

/// GET /api/v1/categories — photo categories in display order.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<PhotoCategory>>, ApiError> {
    let categories = queries::list_categories(&state.db)
        .await
        .map_err(routes::record_store_error)?;
    Ok(Json(categories))
}
