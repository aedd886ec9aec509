/// Route table
use actix_web::web;

use crate::handlers;
use crate::metrics;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health_check))
        .route("/metrics", web::get().to(metrics::metrics_handler))
        .service(
            web::scope("/site")
                .route("", web::get().to(handlers::index))
                .route("/index", web::get().to(handlers::index))
                .route("/error", web::get().to(handlers::error))
                .route("/login", web::get().to(handlers::login))
                .route("/login", web::post().to(handlers::login))
                .route("/logout", web::post().to(handlers::logout))
                .route("/contact", web::get().to(handlers::contact))
                .route("/contact", web::post().to(handlers::contact))
                .route("/signup", web::get().to(handlers::signup))
                .route("/signup", web::post().to(handlers::signup))
                .route(
                    "/request-password-reset",
                    web::get().to(handlers::request_password_reset),
                )
                .route(
                    "/request-password-reset",
                    web::post().to(handlers::request_password_reset),
                )
                .route("/reset-password", web::get().to(handlers::reset_password))
                .route("/reset-password", web::post().to(handlers::reset_password))
                .route("/verify-email", web::get().to(handlers::verify_email))
                .route(
                    "/resend-verification-email",
                    web::get().to(handlers::resend_verification_email),
                )
                .route(
                    "/resend-verification-email",
                    web::post().to(handlers::resend_verification_email),
                ),
        )
        .default_service(web::to(handlers::not_found));
}
