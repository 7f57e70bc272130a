//! Persistent-verify supervisor: one task per paired device that keeps an
//! encrypted session alive.
//!
//! The loop idles while the device is off the network, dials and verifies
//! when it is reachable, and backs off a fixed `retry_timeout` after
//! transient failures. Handshake failures mean the stored credentials no
//! longer match and are never retried. The task exits on unpair, on
//! mDNS loss, and on cancellation.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::Device;
use crate::events::DeviceEvent;

pub(crate) fn spawn(device: Arc<Device>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!(device = %device.name(), "supervisor started");
        run(&device).await;
        tracing::debug!(device = %device.name(), "supervisor stopped");
    })
}

async fn run(device: &Arc<Device>) {
    let cancel = device.cancel_token();
    let mut lifecycle = device.hub().subscribe_lifecycle();

    loop {
        if cancel.is_cancelled() {
            device.close().await;
            return;
        }
        if !device.is_paired() {
            return;
        }

        if !device.is_discovered() {
            // off the network; wait for rediscovery
            tokio::select! {
                () = cancel.cancelled() => {
                    device.close().await;
                    return;
                }
                event = lifecycle.recv() => match event {
                    Ok(DeviceEvent::Unpaired) | Err(RecvError::Closed) => return,
                    Ok(_) | Err(RecvError::Lagged(_)) => continue,
                }
            }
        }

        if !device.is_verified() {
            match device.pair_verify().await {
                Ok(()) => {}
                Err(e) if e.is_handshake_failure() => {
                    // credential mismatch; retrying cannot help
                    tracing::warn!(device = %device.name(), error = %e, "verify rejected");
                    device.hub().emit(DeviceEvent::Error(e.to_string()));
                    return;
                }
                Err(e) => {
                    tracing::debug!(device = %device.name(), error = %e, "verify failed; backing off");
                    device.hub().emit(DeviceEvent::Error(e.to_string()));
                    device.close().await;
                    if !backoff(device).await {
                        return;
                    }
                    continue;
                }
            }
        }

        // session up; wait for something to do
        tokio::select! {
            () = cancel.cancelled() => {
                device.close().await;
                return;
            }
            event = lifecycle.recv() => match event {
                Ok(DeviceEvent::Closed) => {
                    if !backoff(device).await {
                        return;
                    }
                }
                Ok(DeviceEvent::Unpaired) => return,
                // lost while the connection is down: leave; rediscovery
                // restarts the supervisor
                Ok(DeviceEvent::Lost) => return,
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return,
            }
        }
    }
}

// false means cancelled
async fn backoff(device: &Arc<Device>) -> bool {
    let cancel = device.cancel_token();
    tokio::select! {
        () = cancel.cancelled() => {
            device.close().await;
            false
        }
        () = tokio::time::sleep(device.retry_timeout()) => true,
    }
}
