use batuto_bot::bot::{runner, AppContext};
use batuto_bot::config::Settings;
use batuto_bot::llm::caller::{HttpTransport, ResilientCaller, RetryPolicy};
use batuto_bot::personas::PersonaRegistry;
use batuto_bot::supervisor::Supervisor;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting BATUTO-ART bot...");

    let settings = match Settings::new() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let registry = match PersonaRegistry::new() {
        Ok(r) => r,
        Err(e) => {
            error!("❌ Persona table invalid: {e}");
            std::process::exit(1);
        }
    };

    let transport = Arc::new(HttpTransport::new(&settings));
    let caller = ResilientCaller::new(transport, RetryPolicy::default());
    let ctx = Arc::new(AppContext::new(settings, registry, caller));

    if ctx.gate.is_enabled() {
        info!("Access gate enabled for configured owner");
    } else {
        info!("Access gate disabled (no OWNER_ID configured)");
    }

    let mut supervisor = Supervisor::new();
    let shutdown = supervisor.shutdown_token();
    supervisor.spawn("telegram", runner::run_bot(ctx, shutdown));
    supervisor.run().await;

    info!("All front ends stopped");
}
