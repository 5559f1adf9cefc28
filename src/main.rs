//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Configuração inválida.");

    let app_state = AppState::new(&settings)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let order_routes = Router::new()
        .route("/{order_id}", get(handlers::orders::get_order))
        .route("/{order_id}/items", post(handlers::orders::add_order_item))
        .route(
            "/{order_id}/items/{order_item_id}/variations",
            post(handlers::orders::add_item_variation),
        )
        .route("/{order_id}/recalculate", post(handlers::orders::recalculate_order))
        .route("/{order_id}/close", post(handlers::orders::close_order))
        .route("/{order_id}/payments", post(handlers::payments::record_payment));

    let payment_routes = Router::new()
        .route("/{payment_id}/refunds", post(handlers::payments::record_refund));

    // Todas as rotas de negócio exigem o token
    let api_routes = Router::new()
        .nest("/orders", order_routes)
        .nest("/payments", payment_routes)
        .route("/reservations", post(handlers::reservations::create_reservation))
        .route(
            "/reservations/{reservation_id}",
            put(handlers::reservations::update_reservation)
                .delete(handlers::reservations::delete_reservation),
        )
        .route("/schedules", post(handlers::schedules::add_schedule))
        .route("/taxes", post(handlers::taxes::create_tax))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .with_state(app_state);

    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
