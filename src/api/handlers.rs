use crate::{
    error::Result,
    models::{ChatRequest, ChatResponse},
    AppState,
};
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
};
use tracing::debug;

pub async fn home() -> impl IntoResponse {
    Html(include_str!("../../static/index.html"))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse> {
    debug!("Incoming chat message: {:?}", payload.message);

    let reply = state.services.chat.respond(&payload.message);

    Ok(Json(ChatResponse { response: reply }))
}
