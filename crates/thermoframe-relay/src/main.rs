//! Thermoframe relay binary.
//!
//! # Usage
//!
//! ```bash
//! # Answer every exchange locally with {"ignore":0}
//! thermoframe-relay aabbccddeeff 11223344 --port 1337
//!
//! # Sit between the device and the real cloud endpoint
//! thermoframe-relay aabbccddeeff 11223344 -f http://ws.example.com/services.svc/StatIn
//! ```
//!
//! Point the thermostat at the relay through its local cloud API:
//!
//! ```bash
//! curl -d '{"interval": 30, "url": "http://192.168.0.10:1337"}' http://192.168.0.11/cloud
//! ```

use std::sync::Arc;

use clap::Parser;
use thermoframe_relay::{HttpBackend, Keyring, RelayPipeline, router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Thermostat cloud-protocol relay
#[derive(Parser, Debug)]
#[command(name = "thermoframe-relay")]
#[command(about = "Decrypting relay between a thermostat and its cloud endpoint")]
#[command(version)]
struct Args {
    /// Device identity (uuid), ex. 112233445566
    uuid: String,

    /// Shared provisioning secret of the device, ex. 11223344
    secret: String,

    /// Port on which to listen for the device
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Cloud URL to forward decrypted traffic to; answer locally if unset
    #[arg(short, long)]
    fwd_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Thermoframe relay starting");

    let mut keyring = Keyring::new();
    keyring.provision(&args.uuid, args.secret.as_bytes())?;
    tracing::info!("Derived key set for device {}", args.uuid);

    let mut pipeline = RelayPipeline::new(keyring);
    match &args.fwd_url {
        Some(url) => {
            tracing::info!("Forwarding decrypted exchanges to {}", url);
            pipeline = pipeline.with_backend(Arc::new(HttpBackend::new(url.clone())));
        },
        None => {
            tracing::warn!("No forward URL configured - answering every exchange locally");
        },
    }

    let app = router(Arc::new(pipeline));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port)).await?;

    tracing::info!("Relay listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
