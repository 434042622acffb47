use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use usertable::app::{Flags, UsersApp};
use usertable::config::Config;
use usertable::runtime::Runtime;
use usertable::subscription::query::QueryClient;
use usertable::telemetry;
use usertable::users::UsersClient;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = Config::parse();
    telemetry::init(&config.log_file, config.log_level())?;
    info!(endpoint = %config.endpoint, "starting");

    let query_client = Arc::new(QueryClient::with_config(config.query_config()));
    let flags = Flags {
        users: UsersClient::new(config.endpoint.clone(), config.request_timeout())?,
        query_client: Arc::clone(&query_client),
        terminal_input: true,
    };

    let mut terminal = ratatui::init();
    let result = Runtime::<UsersApp>::new(flags, config.frame_rate)
        .run(&mut terminal)
        .await;
    ratatui::restore();

    query_client.clear();
    info!("stopped");
    result
}
