use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use screener_api::{configure_routes, AppContext};
use screener_config::Settings;
use screener_graph::{GraphStore, Neo4jClient};
use screener_observability::{init_tracing, RequestLogging, TracingConfig};
use screener_search::{PgSanctionsStore, SanctionsStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

const SERVICE_NAME: &str = "sanctions-screener";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Failed to load configuration")?;

    init_tracing(TracingConfig::for_service(SERVICE_NAME).with_environment(&settings.environment))
        .context("Failed to initialize tracing")?;

    tracing::info!(environment = %settings.environment, "🚀 Starting sanctions screener");

    let graph: Option<Arc<dyn GraphStore>> = match &settings.neo4j {
        Some(neo4j) => match Neo4jClient::connect(neo4j).await {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::error!("Failed to connect to Neo4j: {}", e);
                tracing::warn!("Offshore Leaks search and connection graphs will be unavailable");
                None
            }
        },
        None => {
            tracing::warn!("⚠️ NEO4J_URI or NEO4J_PASSWORD not set, skipping Neo4j connection");
            None
        }
    };

    let sanctions_store: Option<Arc<dyn SanctionsStore>> = match &settings.database_url {
        Some(url) => {
            tracing::info!("📊 Connecting to PostgreSQL...");
            match PgPoolOptions::new().max_connections(5).connect(url).await {
                Ok(pool) => {
                    tracing::info!("✅ Database connection established");
                    Some(Arc::new(PgSanctionsStore::new(pool)))
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to connect to PostgreSQL: {}", e);
                    tracing::warn!("⚠️ Local sanctions lists will not supplement OpenSanctions");
                    None
                }
            }
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL not set, skipping local sanctions database");
            None
        }
    };

    let bind = (settings.host.clone(), settings.port);
    let context = web::Data::new(AppContext::new(settings, graph, sanctions_store));

    tracing::info!("Starting HTTP server on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(context.clone())
            .wrap(RequestLogging::for_service(SERVICE_NAME))
            .wrap(cors)
            .configure(configure_routes)
    })
    .bind(bind)?
    .run()
    .await?;

    Ok(())
}
