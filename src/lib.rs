pub mod bridge;
pub mod config;
pub mod device;
pub mod serial;
pub mod widget;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::sync::{broadcast, mpsc};

use bridge::BridgeRequest;
use config::AppSettings;
use device::{ControllerHandle, DeviceCommandCodec, DeviceController};
use serial::{NativePortDriver, PortDriver, SerialLink};

/// Wire a controller to `driver` and spawn it
pub fn start(settings: &AppSettings, driver: Arc<dyn PortDriver>) -> ControllerHandle {
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (events_tx, _) = broadcast::channel(settings.event_capacity);

    let link = SerialLink::new(driver, status_tx);
    let codec = DeviceCommandCodec::new(settings.indicators.clone());

    DeviceController::new(link, status_rx, codec, settings.readback.build(), events_tx)
        .with_app_info(settings.app_info())
        .with_baud_rate(settings.baud_rate)
        .spawn(settings.request_capacity)
}

/// Initialise the logger. `RUST_LOG` wins over the configured level.
pub fn init_logging(level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .try_init();
}

/// Serve the bridge over stdin/stdout until the UI closes its end
pub async fn run(settings: AppSettings) -> anyhow::Result<()> {
    settings.validate().context("invalid settings")?;

    let controller = start(&settings, Arc::new(NativePortDriver::new()));
    let client = controller.client();
    let events = client.subscribe();

    if let Some(path) = &settings.auto_connect {
        client
            .send(BridgeRequest::connect(path.as_str()))
            .await
            .context("controller stopped before auto-connect")?;
    }

    log::info!("{} started", settings.app_name);
    let served = bridge::stdio::serve(client, events, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await;

    controller.shutdown().await;
    served.context("bridge transport failed")?;
    Ok(())
}
