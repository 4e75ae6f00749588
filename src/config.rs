use clap::Parser;

use crate::rate_limit::RateLimitPolicy;

// One day
const MAX_WINDOW_SECS: u64 = 86_400;

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "lead-gateway")]
#[command(about = "Lead capture endpoint with per-origin rate limiting")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    // Accepted submissions per window per origin
    #[arg(long, default_value_t = 5)]
    pub rate_limit: usize,

    // Rate limit window in seconds
    #[arg(
        long,
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..=MAX_WINDOW_SECS)
    )]
    pub rate_window: u64,

    // Seconds between sweeps of expired origins, 0 disables the sweeper
    #[arg(long, default_value_t = 0)]
    pub sweep_interval: u64,
}

impl Args {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            max_per_window: self.rate_limit,
            window_ms: i64::try_from(self.rate_window)
                .map_or(i64::MAX, |secs| secs.saturating_mul(1000)),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
