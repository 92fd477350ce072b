use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use member_api::application::service::MemberService;
use member_api::data::memory::InMemoryMemberRepository;
use member_api::infrastructure::config::AppConfig;
use member_api::infrastructure::logging::init_logging;
use member_api::presentation::handlers::{AppState, health_check, member_routes};
use member_api::presentation::middleware::{JwtAuthMiddleware, RequestContextMiddleware};
use std::sync::Arc;
use tracing::info;

fn cors(origins: &[String]) -> Cors {
    origins.iter().fold(
        Cors::default()
            .allow_any_header()
            .allow_any_method()
            .supports_credentials(),
        |cors, origin| cors.allowed_origin(origin),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = AppConfig::from_env()?;
    info!(bind = %config.bind_addr(), cors_origins = config.cors_origins.len(), "Configuration loaded");

    let repository = InMemoryMemberRepository::new();
    let service = MemberService::new(Arc::new(repository));
    let state = web::Data::new(AppState { service });
    info!("Member service created");

    let server_config = config.clone();
    let server = HttpServer::new(move || {
        tracing::trace!("Creating new application instance");
        App::new()
            .app_data(state.clone())
            .wrap(cors(&server_config.cors_origins))
            .wrap(RequestContextMiddleware)
            .service(
                web::scope("/api")
                    .route("/healthchecker", web::get().to(health_check))
                    .service(
                        web::scope("/members")
                            .wrap(JwtAuthMiddleware::new(server_config.jwt_secret.clone()))
                            .configure(member_routes),
                    ),
            )
    });

    let bind_addr = config.bind_addr();
    let server = server.bind(&bind_addr)?;
    info!(
        address = %bind_addr,
        routes = %"GET /api/healthchecker, POST /api/members, GET /api/members, GET|PUT|DELETE /api/members/{id}, DELETE /api/members/multiple-delete",
        "Starting HTTP server"
    );
    server.run().await?;
    Ok(())
}
