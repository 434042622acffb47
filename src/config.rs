use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};

use crate::subscription::query::{DEFAULT_CACHE_TIME, DEFAULT_STALE_TIME, QueryConfig};
use crate::users::DEFAULT_ENDPOINT;

/// Command-line configuration. Every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "usertable", version, about = "Browse users from a REST endpoint")]
pub struct Config {
    /// URL returning a JSON array of users
    #[arg(long, env = "USERTABLE_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Maximum redraws per second
    #[arg(
        long,
        env = "USERTABLE_FRAME_RATE",
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..=240)
    )]
    pub frame_rate: u32,

    /// Seconds cached users count as fresh
    #[arg(long, env = "USERTABLE_STALE_TIME", default_value_t = DEFAULT_STALE_TIME.as_secs())]
    pub stale_time: u64,

    /// Seconds cached users are kept
    #[arg(long, env = "USERTABLE_CACHE_TIME", default_value_t = DEFAULT_CACHE_TIME.as_secs())]
    pub cache_time: u64,

    /// Request timeout in seconds; none by default
    #[arg(long, env = "USERTABLE_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Where logs are written; the terminal belongs to the UI
    #[arg(long, env = "USERTABLE_LOG_FILE", default_value = "usertable.log")]
    pub log_file: PathBuf,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    #[must_use]
    pub const fn query_config(&self) -> QueryConfig {
        QueryConfig::new(
            Duration::from_secs(self.stale_time),
            Duration::from_secs(self.cache_time),
        )
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::ERROR,
            1 => tracing::Level::WARN,
            2 => tracing::Level::INFO,
            3 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
