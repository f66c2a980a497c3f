use std::net::TcpListener;

use actix_web::web;
use anyhow::Context;
use env_logger::Env;
use townhouse_finder::{
    configuration::get_configuration,
    services::ReportStore,
    startup::{build_finder, run},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration.")?;
    if configuration.api_keys.gemini.trim().is_empty() {
        log::warn!("No model api key configured, every page will fail extraction");
    }

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener =
        TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;
    log::info!("Listening on {}", address);

    let finder = build_finder(&configuration).context("Failed to build http clients.")?;
    let report_store = web::Data::new(ReportStore::default());

    run(listener, finder, report_store)?.await?;

    Ok(())
}
