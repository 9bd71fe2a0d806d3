use axum::{
    Router,
    routing::{get, patch},
};

use crate::state::AppState;

use super::controller::{
    close_gig, create_gig, get_gig, list_bids, list_gigs, list_my_bids, place_bid,
};

pub fn init_gigs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_gigs).post(create_gig))
        .route("/bids/mine", get(list_my_bids))
        .route("/{id}", get(get_gig))
        .route("/{id}/bids", get(list_bids).post(place_bid))
        .route("/{id}/close", patch(close_gig))
}
