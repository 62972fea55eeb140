use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;

use crate::state::AppState;
use crate::views::{FormTemplate, render_page};

/// Upload form. The token field is only shown when no server-side token exists.
pub async fn form_handler(State(state): State<AppState>) -> Response {
    let template = FormTemplate::new(
        state.configured_token.is_none(),
        state.lock_batch_service.quoting().as_str(),
        state.default_workers,
    );

    render_page(StatusCode::OK, &template)
}
