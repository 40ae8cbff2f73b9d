//! Application wiring and run loop.

use crate::config::AppConfig;
use crate::error::AppResult;
use crate::schema;
use merc_feed::FeedConnection;
use merc_pricelist::{InMemoryInventory, Pricelist};
use merc_pricer::PricesTfClient;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Capacity of the feed-to-engine update channel.
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// The assembled application.
pub struct Application {
    config: AppConfig,
    engine: Arc<Pricelist>,
    inventory: Arc<InMemoryInventory>,
}

impl Application {
    /// Wire up collaborators and the engine.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let schema = Arc::new(schema::load_schema(&config.schema_path)?);
        let pricer = Arc::new(PricesTfClient::new(
            config.pricer_url.as_str(),
            config.pricelist.pricer,
        )?);
        let inventory = InMemoryInventory::new_shared();
        let engine = Pricelist::new_shared(
            config.pricelist.clone(),
            pricer,
            schema,
            inventory.clone(),
        );
        Ok(Self {
            config,
            engine,
            inventory,
        })
    }

    pub fn engine(&self) -> &Arc<Pricelist> {
        &self.engine
    }

    pub fn inventory(&self) -> &Arc<InMemoryInventory> {
        &self.inventory
    }

    /// Bootstrap the engine, then fold feed updates and periodic
    /// refreshes until ctrl-c.
    pub async fn run(&self) -> AppResult<()> {
        info!("Bootstrapping pricelist");
        self.engine.setup_pricelist().await?;
        info!(
            entries = self.engine.get_length(),
            key_rate = %self.engine.key_price_metal(),
            "Pricelist ready"
        );

        let (update_tx, mut update_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);
        let feed = FeedConnection::new(self.config.feed.clone(), update_tx);
        let shutdown = feed.shutdown_token();
        let feed_task = tokio::spawn(async move { feed.run().await });

        let mut refresh_tick = tokio::time::interval(self.config.refresh_interval());
        // The first tick fires immediately; bootstrap just refreshed.
        refresh_tick.tick().await;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
                Some(update) = update_rx.recv() => {
                    self.engine.handle_price_change(&update);
                }
                _ = refresh_tick.tick() => {
                    if let Err(e) = self.engine.update_old_prices().await {
                        warn!(error = %e, "Stale price refresh failed");
                    }
                }
            }
        }

        shutdown.cancel();
        if let Err(e) = feed_task.await {
            warn!(error = %e, "Feed task join failed");
        }
        Ok(())
    }
}
