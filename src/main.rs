//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
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

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

/// Monta o router completo; as rotas protegidas passam pelo `auth_guard`.
fn app(app_state: AppState) -> Router {
    let guard = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Sessão
    let auth_public = Router::new().route("/login", post(handlers::auth::login));
    let auth_routes = Router::new()
        .route("/profile", get(handlers::auth::profile))
        .route("/permissions", get(handlers::auth::permissions))
        .route("/refresh", post(handlers::auth::refresh))
        .layer(guard());

    // Contas: redefinição de senha e existe-admin são públicas
    let users_public = Router::new()
        .route("/forgot-password", post(handlers::auth::forgot_password))
        .route("/reset-password", post(handlers::auth::reset_password))
        .route("/existe-admin", get(handlers::users::exists_admin));
    let user_routes = Router::new()
        .route(
            "/",
            post(handlers::users::create_user).get(handlers::users::list_users),
        )
        .route("/actifs", get(handlers::users::list_active_users))
        .route("/inactifs", get(handlers::users::list_inactive_users))
        .route("/supprimes", get(handlers::users::list_deleted_users))
        .route(
            "/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/{id}/activer", post(handlers::users::activate_user))
        .route("/{id}/desactiver", post(handlers::users::deactivate_user))
        .route("/{id}/restaurer", post(handlers::users::restore_user))
        .route("/{id}/definitif", delete(handlers::users::hard_delete_user))
        .route(
            "/{old_id}/transferer-admin/{new_id}",
            post(handlers::users::transfer_admin),
        )
        .layer(guard());

    let declaration_routes = Router::new()
        .route(
            "/",
            post(handlers::declarations::create_declaration)
                .get(handlers::declarations::list_declarations),
        )
        .route("/actives", get(handlers::declarations::list_own_active))
        .route("/supprimees", get(handlers::declarations::list_own_deleted))
        .route("/actives/poste", get(handlers::declarations::list_station_active))
        .route("/supprimees/poste", get(handlers::declarations::list_station_deleted))
        .route("/reference/{reference}", get(handlers::declarations::get_by_reference))
        .route(
            "/rechercher-declarant",
            post(handlers::declarations::search_declarant),
        )
        .route(
            "/{id}",
            get(handlers::declarations::get_declaration)
                .put(handlers::declarations::update_declaration)
                .delete(handlers::declarations::soft_delete_declaration),
        )
        .route("/{id}/statut", patch(handlers::declarations::change_status))
        .route("/{id}/restaurer", patch(handlers::declarations::restore_declaration))
        .route("/{id}/definitif", delete(handlers::declarations::hard_delete_declaration))
        .route("/{id}/permissions", get(handlers::declarations::declaration_permissions))
        .route("/{id}/pdf", get(handlers::declarations::declaration_pdf))
        .layer(guard());

    let document_type_routes = Router::new()
        .route(
            "/",
            get(handlers::document_types::list_document_types)
                .post(handlers::document_types::create_document_type),
        )
        .route(
            "/{id}",
            get(handlers::document_types::get_document_type)
                .put(handlers::document_types::update_document_type)
                .delete(handlers::document_types::delete_document_type),
        )
        .layer(guard());

    // Referência pública (papéis e postos); criar posto exige sessão
    let role_routes = Router::new()
        .route("/", get(handlers::rbac::list_roles))
        .route("/{id}", get(handlers::rbac::get_role))
        .route("/libelle/{libelle}", get(handlers::rbac::get_role_by_label));

    let station_public = Router::new()
        .route("/", get(handlers::stations::list_stations))
        .route("/{id}", get(handlers::stations::get_station));
    let station_routes = Router::new()
        .route("/", post(handlers::stations::create_station))
        .layer(guard());

    let system_routes = Router::new()
        .route("/etat", get(handlers::system::system_state))
        .route("/initialiser", post(handlers::system::initialize_system));

    let dashboard_routes = Router::new()
        .route("/stats", get(handlers::dashboard::get_stats))
        .route("/stats/user/{user_id}", get(handlers::dashboard::get_user_stats))
        .route("/stats/poste", get(handlers::dashboard::get_station_stats))
        .layer(guard());

    // Combina tudo no router principal
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_public.merge(auth_routes))
        .nest("/api/utilisateurs", users_public.merge(user_routes))
        .nest("/api/declarations", declaration_routes)
        .nest("/api/types-document", document_type_routes)
        .nest("/api/roles", role_routes)
        .nest("/api/postes-police", station_public.merge(station_routes))
        .nest("/api/system", system_routes)
        .nest("/api/dashboard", dashboard_routes)
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG manda; sem ele, nível info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let bind_address = config.bind_address.clone();
    let app_state = AppState::new(config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = app(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    tracing::info!("📚 Swagger UI em /swagger-ui");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_support::lazy_state;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_answers_without_database() {
        let (state, _) = lazy_state();
        let response = app(state)
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn protected_routes_require_a_bearer_token() {
        let (state, _) = lazy_state();
        let router = app(state);

        for uri in ["/api/declarations", "/api/utilisateurs", "/api/dashboard/stats", "/api/auth/profile"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected_with_translated_message() {
        let (state, _) = lazy_state();
        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/api/declarations")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .header(header::ACCEPT_LANGUAGE, "en")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].as_str().is_some_and(|m| !m.contains("auth.invalid_token")));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (state, _) = lazy_state();
        let response = app(state)
            .oneshot(Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["paths"].get("/api/declarations/{id}/restaurer").is_some());
        assert!(json["components"]["securitySchemes"].get("api_jwt").is_some());
    }
}
