//! Appearance-bus client.
//!
//! The desktop's appearance service exposes the display scale factor
//! via a `GetScaleFactor` call and broadcasts configuration changes as
//! `Changed(key, value)` signals. The engine never blocks on the bus:
//! replies and signals are forwarded into its event queue as
//! [`EngineMessage`]s.

use async_trait::async_trait;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zbus::dbus_proxy;

use crate::engine::EngineMessage;

/// Errors from the appearance bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The underlying bus call failed.
    #[error("appearance bus call failed: {0}")]
    Call(#[from] zbus::Error),
    /// The service returned a scale factor outside the valid range.
    #[error("invalid scale factor from appearance service: {0}")]
    InvalidScale(f64),
}

/// Asynchronous source of appearance configuration.
///
/// Faked in tests; backed by D-Bus in production.
#[async_trait]
pub trait AppearanceBus: Send + Sync {
    /// Queries the current display scale factor.
    async fn fetch_scale_factor(&self) -> Result<f64, BusError>;
}

#[dbus_proxy(
    interface = "org.decoro.Appearance1",
    default_service = "org.decoro.Appearance1",
    default_path = "/org/decoro/Appearance1"
)]
trait Appearance {
    /// The display scale factor as reported by the appearance service.
    async fn get_scale_factor(&self) -> zbus::Result<f64>;

    /// Emitted whenever a named appearance property changes.
    #[dbus_proxy(signal)]
    async fn changed(&self, key: String, value: String) -> zbus::Result<()>;
}

/// D-Bus backed [`AppearanceBus`] on the session bus.
pub struct DbusAppearanceBus {
    proxy: AppearanceProxy<'static>,
}

impl DbusAppearanceBus {
    /// Connects to the session bus and binds the appearance proxy.
    pub async fn new() -> Result<Self, BusError> {
        let connection = zbus::Connection::session().await?;
        let proxy = AppearanceProxy::new(&connection).await?;
        Ok(DbusAppearanceBus { proxy })
    }

    /// Spawns a task forwarding `Changed` signals into the engine's
    /// event queue. Runs until the signal stream or the queue closes.
    pub async fn forward_changes(
        &self,
        tx: mpsc::UnboundedSender<EngineMessage>,
    ) -> Result<(), BusError> {
        let mut stream = self.proxy.receive_changed().await?;
        tokio::spawn(async move {
            while let Some(signal) = stream.next().await {
                let args = match signal.args() {
                    Ok(args) => args,
                    Err(err) => {
                        warn!(error = %err, "malformed appearance change signal");
                        continue;
                    }
                };
                let message = EngineMessage::Bus {
                    key: args.key,
                    value: args.value,
                };
                if tx.send(message).is_err() {
                    debug!("engine queue closed; stopping appearance signal forwarding");
                    break;
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl AppearanceBus for DbusAppearanceBus {
    async fn fetch_scale_factor(&self) -> Result<f64, BusError> {
        let scale = self.proxy.get_scale_factor().await?;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BusError::InvalidScale(scale));
        }
        Ok(scale)
    }
}
