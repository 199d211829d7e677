pub mod db;
pub mod model;
pub mod services;
pub mod utils;

use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::oneshot;
use tonic::transport::Server;
use utils::config::{self, Configuration};
use utils::context::ServiceContext;
use utils::errors::WardenError;
use utils::geoip::{GeoResolver, NullGeoResolver, StaticGeoResolver};
use utils::health;
use utils::rate_limit::MemoryRateLimiter;
use db::mongo::MongoDatastore;
use grpc::admin::admin_server::AdminServer;
use grpc::warden::warden_server::WardenServer;
use opentelemetry::{global, sdk::{propagation::TraceContextPropagator, trace, trace::Sampler}};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry, util::SubscriberInitExt};

///
/// These are the generated gRPC/protobuf modules which give us access to the message structures,
/// services, servers and clients to talk to our APIs. The services are implemented in
/// services/mod.rs
///
pub mod grpc {
    pub mod common {
        tonic::include_proto!("grpc.common");
    }

    pub mod warden {
        tonic::include_proto!("grpc.warden");
    }

    pub mod admin {
        tonic::include_proto!("grpc.admin");
    }
}

pub const APP_NAME: &str = "Warden";

///
/// Entry point to start the app.
///
pub async fn lib_main() -> Result<(), WardenError> {

    // Load any local dev settings as environment variables from a .env file.
    dotenv().ok();

    // Default log level to INFO if it's not specified.
    config::default_env("RUST_LOG", "INFO");

    // SIGINT/ctrl+c handling for graceful shutdown.
    let (signal_tx, signal_rx) = oneshot::channel();
    let _signal = tokio::spawn(wait_for_signal(signal_tx));

    let config = Configuration::from_env().expect("The service configuration is not correct");

    // Initialise open-telemetry distributed tracing.
    let tracing = init_tracing(&config);

    tracing::info!("{}\n{}", BANNER, config);

    // Create a MongoDB client, connect and sync the schema before proceeding.
    let db = Arc::new(MongoDatastore::connect(APP_NAME, &config).await?);

    let geo: Arc<dyn GeoResolver> = match &config.geoip_table {
        Some(path) => Arc::new(StaticGeoResolver::from_file(path)?),
        None => Arc::new(NullGeoResolver),
    };

    // The service context gives every gRPC handler access to shared stuff (datastore,
    // rate limiter, clock, etc.).
    let ctx = Arc::new(ServiceContext::new(
        config.clone(),
        db,
        Arc::new(MemoryRateLimiter::default()),
        geo));

    let (health_reporter, health_service) = health::start(ctx.clone()).await;

    // The port we'll serve on.
    let addr = format!("[::1]:{}", config.port).parse().unwrap();

    tracing::info!("{} listening on {}", APP_NAME, addr);

    Server::builder()
        .add_service(WardenServer::new(ctx.clone()))
        .add_service(AdminServer::new(ctx.clone()))
        .add_service(health_service)
        .serve_with_shutdown(addr, async {
            signal_rx.await.ok();
            tracing::info!("Graceful shutdown");
        })
        .await?;

    health::shutdown(health_reporter).await;

    if tracing {
        opentelemetry::global::shutdown_tracer_provider(); // sending remaining spans
    }

    Ok(())
}

///
/// Sends a oneshot signal when a SIGINT is received (Ctrl+C)
///
async fn wait_for_signal(tx: oneshot::Sender<()>) {
    let _ = signal::ctrl_c().await;
    tracing::info!("SIGINT received: shutting down");
    let _ = tx.send(());
}

///
/// Initialise tracing and plug-in the Jaeger feature if enabled.
///
fn init_tracing(config: &Configuration) -> bool {
    global::set_text_map_propagator(TraceContextPropagator::new());

    match config.distributed_tracing {
        true => { // Install the Jaeger pipeline.
            let tracer = opentelemetry_jaeger::new_pipeline()
                .with_service_name(APP_NAME)
                .with_trace_config(trace::config().with_sampler(Sampler::AlwaysOn))
                .with_agent_endpoint(config.jaeger_endpoint.clone().unwrap_or_default())
                .install_batch(opentelemetry::runtime::Tokio)
                .expect("Unable to build Jaeger pipeline");

            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .with(tracing_opentelemetry::layer().with_tracer(tracer))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            true
        },
        false => {
            if let Err(err) = Registry::default()
                .with(tracing_subscriber::EnvFilter::from_default_env()) // Set the tracing level to match RUST_LOG env variable.
                .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
                .try_init() {
                    tracing::info!("Tracing already initialised: {}", err.to_string()); // Allowed error here - tests call this fn repeatedly.
            }

            false
        }
    }
}

const BANNER: &str = r#"
 __      __                   .___
/  \    /  \_____ _______   __| _/____   ____
\   \/\/   /\__  \\_  __ \ / __ |/ __ \ /    \
 \        /  / __ \|  | \// /_/ \  ___/|   |  \
  \__/\  /  (____  /__|   \____ |\___  >___|  /
       \/        \/            \/    \/     \/
"#;
