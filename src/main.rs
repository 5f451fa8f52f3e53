use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliolink::{config, db, schema, seed, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bibliolink=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::from_env().with_profile_arg(&args);
    tracing::info!("Starting with profile '{}'", config.profile);

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    for table in schema::catalog_schemas() {
        if let Err(e) = db::verify_foreign_keys(&db, &table).await {
            tracing::error!("Schema check failed for '{}': {}", table.name, e);
            std::process::exit(1);
        }
    }

    match db::check_foreign_keys(&db).await {
        Ok(violations) if violations.is_empty() => {}
        Ok(violations) => tracing::warn!(
            "{} row(s) reference a missing book or author",
            violations.len()
        ),
        Err(e) => tracing::warn!("Foreign key check failed: {}", e),
    }

    if config.seed_demo {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        }
    }

    let app = server::build_router(db, &config.cors_allowed_origins);

    if let Err(e) = server::serve(app, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
