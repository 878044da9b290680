use axum::Json;
use axum::extract::State;

use atelier_db::models::subscriber::Subscriber;

use crate::AppState;
use crate::error::ApiError;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Subscriber>>, ApiError> {
    Ok(Json(state.subscriber_repo.list().await?))
}
