use actix_web::{dev::Service, web, App, HttpServer};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recsys_service::handlers::{self, RecommendationHandlerState, ServingLimits};
use recsys_service::{metrics, Config, RecommendationService};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_file(true)
                .with_target(true),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting recsys-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    // Loading is blocking file I/O; keep it off the async workers
    let recsys_config = config.recsys.clone();
    let service = web::block(move || RecommendationService::bootstrap(&recsys_config))
        .await
        .map_err(|e| anyhow::anyhow!("bootstrap task failed: {}", e))?;

    let state = web::Data::new(RecommendationHandlerState {
        service: Arc::new(service),
        limits: ServingLimits::from(&config.recsys),
    });

    let bind_addr = config.bind_addr();
    tracing::info!("HTTP server listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
            .wrap_fn(|req, srv| {
                let method = req.method().to_string();
                let path = req
                    .match_pattern()
                    .unwrap_or_else(|| req.path().to_string());
                let start = Instant::now();

                let fut = srv.call(req);
                async move {
                    match fut.await {
                        Ok(res) => {
                            metrics::observe_http_request(
                                &method,
                                &path,
                                res.status().as_u16(),
                                start.elapsed(),
                            );
                            Ok(res)
                        }
                        Err(err) => {
                            metrics::observe_http_request(&method, &path, 500, start.elapsed());
                            Err(err)
                        }
                    }
                }
            })
    })
    .bind(&bind_addr)?
    .run()
    .await?;

    tracing::info!("Stopping");
    Ok(())
}
