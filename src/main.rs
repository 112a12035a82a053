use std::net::SocketAddr;

use futures::future::join_all;
use thiserror::Error;

use crate::db::prelude::{BotRepository, Repository, store};
use crate::util::telemetry;

mod api;
mod constants;
mod db;
mod llm;
mod pipeline;
mod util;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),

    #[error(transparent)]
    Store(#[from] db::StoreErr),

    #[error(transparent)]
    Route(#[from] api::server::RouteError),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_registry = telemetry::Telemetry::new().await?.register();

    tracing::info!("starting co-learner server");

    BotRepository::new(store().await?.manager.clone())
        .seed_defaults()
        .await?;

    let (tx_server_ready, rx_server_ready) = tokio::sync::mpsc::unbounded_channel::<SocketAddr>();

    let mut handles = api::server::start_server(tx_server_ready, rx_server_ready).await?;
    handles.extend(pipeline::scheduler::start_scheduler().await);

    _ = join_all(handles).await;

    telemetry_registry.shutdown();
    Ok(())
}
