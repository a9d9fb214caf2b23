use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use mail_relay::config::RelayConfig;
use mail_relay::forwarder::Forwarder;
use mail_relay::notification::NotificationEvent;
use mail_relay::storage::FsObjectStore;
use mail_relay::transport::SmtpMailTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config_path = PathBuf::from(
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| "relay.json".to_string()),
    );
    let store_root =
        PathBuf::from(std::env::var("RELAY_STORE_ROOT").unwrap_or_else(|_| ".".to_string()));

    eprintln!("mail-relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Config: {}", config_path.display());
    eprintln!("   Store root: {}", store_root.display());

    let config = RelayConfig::load(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let store = Arc::new(FsObjectStore::new(store_root));
    let transport =
        Arc::new(SmtpMailTransport::new(&config.transport).context("building SMTP transport")?);

    // The notification event arrives as JSON: a file path argument, or
    // stdin when the argument is absent or "-".
    let event_arg = std::env::args().nth(1);
    let event_json = match event_arg.as_deref() {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("reading event {path}"))?
        }
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading event from stdin")?;
            buf
        }
    };
    let event: NotificationEvent =
        serde_json::from_str(&event_json).context("parsing notification event")?;

    let forwarder = Forwarder::new(config, store, transport);
    let outcome = forwarder.forward(event).await?;
    println!("{outcome}");
    Ok(())
}
