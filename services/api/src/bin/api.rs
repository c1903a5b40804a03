//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{LocalStore, OpenAiAssistantAdapter, UnconfiguredAssistant},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{header::{ACCEPT, CONTENT_TYPE}, HeaderValue, Method};
use axum::Router;
use booking_core::{assistant::system_instruction, ports::StyleAssistantService, Catalog};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Open the Store & Seed the Catalog ---
    let store = Arc::new(LocalStore::open(&config.data_path).await?);
    let catalog = Catalog::new(store.clone());
    catalog.seed_defaults().await?;

    // --- 3. Initialize the Assistant Adapter ---
    let assistant: Arc<dyn StyleAssistantService> = match &config.assistant_api_key {
        Some(api_key) => {
            let openai_config = OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(&config.assistant_base_url);
            let instruction = system_instruction(&catalog.services().await?);
            info!(model = %config.assistant_model, "Style assistant enabled.");
            Arc::new(OpenAiAssistantAdapter::new(
                Client::with_config(openai_config),
                config.assistant_model.clone(),
                instruction,
            ))
        }
        None => {
            warn!("No ASSISTANT_API_KEY or GEMINI_API_KEY set; the assistant will only apologize.");
            Arc::new(UnconfiguredAssistant)
        }
    };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(config.clone(), store, assistant));

    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CORS origin '{}': {}", config.cors_origin, e))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    let app = Router::new()
        .merge(web::router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
