use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::CoordinatorError;
use crate::models::AppState;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBoardRequest {
    pub room_id: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub msg: String,
}

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Rooms")
}

/// Delete a stored game board
pub async fn delete_board(
    body: web::Json<DeleteBoardRequest>,
    app_state: web::Data<AppState>,
) -> HttpResponse {
    match app_state.coordinator.delete_board(&body.room_id) {
        Ok(()) => HttpResponse::Ok().json(StatusResponse {
            msg: "Board deleted".to_string(),
        }),
        Err(CoordinatorError::SessionNotFound(_)) => HttpResponse::NotFound().json(StatusResponse {
            msg: "Board not found".to_string(),
        }),
        Err(err) => {
            warn!("deleteboard for room {}: {}", body.room_id, err);
            HttpResponse::ServiceUnavailable().json(StatusResponse {
                msg: err.to_string(),
            })
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(web::resource("/ws").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/deleteboard").route(web::post().to(delete_board)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(fs::Files::new("/static", static_dir));
}
