use std::{cell::Cell, rc::Rc};

use anyhow::Context;
use clap::Parser;
use serde_json::Value;
use topicbus::{logging, Bus, ErrorExt, Settings};

/// Publishes one message to a hierarchical topic bus and prints every
/// delivery.
#[derive(Debug, Parser)]
#[command(name = "topicbus", version, about)]
struct Cli {
    /// Topic to subscribe a printing handler to (repeatable).
    #[arg(short, long = "subscribe", value_name = "TOPIC")]
    subscribe: Vec<String>,

    /// Surface subscriber errors immediately instead of deferring them.
    #[arg(long, env = "TOPICBUS_BUS__IMMEDIATE_EXCEPTIONS")]
    immediate: bool,

    /// Publish asynchronously and drain the turn queue afterwards.
    #[arg(long = "async")]
    deferred: bool,

    /// Topic to publish to.
    topic: String,

    /// JSON payload.
    #[arg(default_value = "null")]
    data: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load settings")?;
    settings.bus.immediate_exceptions |= cli.immediate;

    logging::init_logging(&settings.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let data: Value = serde_json::from_str(&cli.data).context("payload is not valid JSON")?;

    let bus: Bus<Value> = Bus::with_settings(&settings.bus);
    let deliveries = Rc::new(Cell::new(0usize));
    for topic in &cli.subscribe {
        let name = topic.clone();
        let counter = Rc::clone(&deliveries);
        let token = bus.subscribe_fn(topic, move |published, data| {
            counter.set(counter.get() + 1);
            println!("[{name}] {published} {data}");
        });
        tracing::debug!(topic = %topic, %token, "cli subscriber registered");
    }
    bus.set_error_sink(|err| {
        eprintln!("subscriber error [{}]: {}", err.status_code(), err.client_message())
    });

    let published = if cli.deferred {
        let scheduled = bus.publish(&cli.topic, data);
        bus.run_pending()?;
        scheduled
    } else {
        bus.publish_sync(&cli.topic, data)?
    };

    println!("published={published} deliveries={}", deliveries.get());
    Ok(())
}
