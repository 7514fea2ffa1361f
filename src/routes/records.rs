use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Records Router Module
///
/// CRUD over the record store. `create_router` wraps this router in the token validator
/// and the authorization gate, so every handler here can assume an admitted caller.
pub fn record_routes() -> Router<AppState> {
    Router::new()
        // GET /records, POST /records
        .route(
            "/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        // GET/PUT/DELETE /records/{id}
        // The id segment is validated by the handlers so a malformed id is a 400.
        .route(
            "/records/{id}",
            get(handlers::get_record)
                .put(handlers::update_record)
                .delete(handlers::delete_record),
        )
}
