use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_gateway::clock::{Clock, SystemClock};
use lead_gateway::config::Args;
use lead_gateway::error::ServerError;
use lead_gateway::gate::LeadGate;
use lead_gateway::rate_limit::{AttemptLog, sweeper};
use lead_gateway::server;
use lead_gateway::state::AppState;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();
    let policy = args.policy();

    let log = Arc::new(AttemptLog::new(policy));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // optional background sweep of idle origins
    if args.sweep_interval > 0 {
        let every = Duration::from_secs(args.sweep_interval);
        tokio::spawn(sweeper(Arc::clone(&log), Arc::clone(&clock), every));
    }

    let state = Arc::new(AppState::new(LeadGate::new(log), clock));

    let listener = server::bind(&args.bind_address()).await?;

    tracing::info!(port = args.port, "Lead gateway listening");
    tracing::info!(
        max_per_window = policy.max_per_window,
        window_ms = policy.window_ms,
        sweep_interval_secs = args.sweep_interval,
        "Rate limit configured"
    );

    server::serve(listener, state).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
