use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{create_signed_url, get_download_url};

pub fn init_files_router() -> Router<AppState> {
    Router::new()
        .route("/signed-url", post(create_signed_url))
        .route("/download-url", get(get_download_url))
}
