use crate::{
    api::{sales, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public auth routes. verify-session authenticates through the
    // AuthUser extractor rather than the scope middleware.
    cfg.service(
        web::scope("/api/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/verify-session")
                    .wrap(login_limiter.clone())
                    .route(web::get().to(handlers::verify_session)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes: bearer token required, role checks per handler
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/sales")
                    // /sales/upload
                    .service(
                        web::resource("/upload").route(web::post().to(sales::upload_sales)),
                    )
                    // /sales/summary
                    .service(
                        web::resource("/summary").route(web::get().to(sales::sales_summary)),
                    )
                    // /sales
                    .service(
                        web::resource("")
                            .route(web::get().to(sales::list_sales))
                            .route(web::post().to(sales::create_sale)),
                    )
                    // /sales/{id}
                    .service(web::resource("/{id}").route(web::delete().to(sales::delete_sale))),
            )
            .service(
                web::scope("/users")
                    // /users
                    .service(web::resource("").route(web::get().to(users::list_users)))
                    // /users/{id}/role
                    .service(
                        web::resource("/{id}/role")
                            .route(web::put().to(users::update_user_role)),
                    )
                    // /users/{id}
                    .service(web::resource("/{id}").route(web::delete().to(users::delete_user))),
            ),
    );
}
