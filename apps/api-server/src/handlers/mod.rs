//! HTTP handlers and route configuration.

mod health;
mod posts;

use actix_web::{error, web};

use crate::middleware::error::AppError;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .route("/", web::get().to(health::hello))
        .route("/ping", web::get().to(health::ping))
        .service(
            web::scope("/post")
                .route("", web::get().to(posts::find_all))
                .route("", web::post().to(posts::create))
                .route("", web::put().to(posts::update))
                // Literal before wildcard so /post/count is never read as an id
                .route("/count", web::get().to(posts::count))
                .route("/{id}", web::get().to(posts::find_by_id))
                .route("/{id}", web::delete().to(posts::delete)),
        );
}

/// Undecodable bodies become 400s with a problem document.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req| {
        AppError::BadRequest(format!("invalid path parameter: {err}")).into()
    })
}
