//! Profile of the calling user

use api_types::user::{UserUpdate, UserView};
use axum::{Extension, Json, extract::State};
use engine::ProfileUpdate;

use crate::{
    ServerError,
    server::{Caller, ServerState},
    views::user_view,
};

pub async fn profile(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
) -> Result<Json<UserView>, ServerError> {
    let user = state.engine.user(user_id).await?;
    Ok(Json(user_view(user)))
}

pub async fn update_profile(
    Extension(Caller(user_id)): Extension<Caller>,
    State(state): State<ServerState>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserView>, ServerError> {
    let update = ProfileUpdate {
        name: payload.name,
        email: payload.email,
    };
    let user = state.engine.update_user(user_id, update).await?;

    Ok(Json(user_view(user)))
}
