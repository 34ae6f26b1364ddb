use std::sync::Arc;
use std::thread;

use eyre::WrapErr;
use nfc_bridge_core::Bridge;
use nfc_bridge_http::BridgeServerBuilder;
use nfc_bridge_pcsc::{PcscDeviceManager, PcscError, TagKind, device_event_channel};
use tracing::{info, warn};

use crate::config::Settings;

/// Run the bridge until Ctrl-C
pub(crate) async fn serve(settings: &Settings) -> eyre::Result<()> {
    let manager = PcscDeviceManager::new().wrap_err("failed to connect to the PC/SC service")?;

    let (sender, receiver) = device_event_channel();
    let monitor = Arc::new(manager.monitor(settings.pcsc_config()).spawn(sender)?);
    let bridge = Arc::new(Bridge::new(settings.bridge_config(), monitor.clone()));

    // device events are applied on their own thread; the loop ends when the
    // monitor drops its sender
    let pump = thread::Builder::new().name("bridge-events".into()).spawn({
        let bridge = Arc::clone(&bridge);
        move || {
            for event in receiver {
                bridge.handle_event(event);
            }
        }
    })?;

    let server = BridgeServerBuilder::new()
        .host(settings.host)
        .port(settings.port)
        .build(bridge)?;
    let addr = server.addr();
    info!(
        readers = ?settings.readers,
        timeout_ms = settings.timeout_ms,
        "starting nfc bridge"
    );

    let result = async {
        server
            .bind()
            .await
            .wrap_err_with(|| format!("cannot listen on {addr}; is another bridge running?"))?
            .serve(shutdown_signal())
            .await?;
        eyre::Ok(())
    }
    .await;

    monitor.stop();
    if pump.join().is_err() {
        warn!("event thread panicked");
    }
    result
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
    }
}

/// Print the readers the PC/SC service knows about
pub(crate) fn list_readers(settings: &Settings) -> eyre::Result<()> {
    let manager = PcscDeviceManager::new()?;
    let readers = match manager.list_readers() {
        Ok(readers) => readers,
        Err(PcscError::NoReadersAvailable) => {
            println!("No readers found!");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let filter = settings.bridge_config();

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = if reader.has_card() {
            "card present"
        } else {
            "no card"
        };
        let allowed = if filter.accepts_reader(reader.name()) {
            ""
        } else {
            ", not allowed"
        };
        println!("{}. {} ({status}{allowed})", i + 1, reader.name());
        if let (Some(atr), Some(kind)) = (reader.atr(), reader.tag_kind()) {
            let kind = match kind {
                TagKind::Storage => "ISO 14443-3 storage tag",
                TagKind::Iso14443_4 => "ISO 14443-4 tag",
            };
            println!("   ATR: {} ({kind})", hex::encode_upper(atr));
        }
    }

    Ok(())
}

/// Print the effective settings as TOML
pub(crate) fn print_config(settings: &Settings) -> eyre::Result<()> {
    print!("{}", toml::to_string(settings)?);
    Ok(())
}
