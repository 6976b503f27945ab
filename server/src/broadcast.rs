use axum::extract::ws::Utf8Bytes;
use futures_util::future::join_all;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::world::SessionId;

/// Serialized frame; clones share the same buffer.
pub type Frame = Utf8Bytes;

/// Outbound half of a session: frames pushed here are written to the socket
/// by the session's writer task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: SessionId,
    pub outbound: mpsc::Sender<Frame>,
}

impl SessionHandle {
    pub fn new(id: SessionId, outbound: mpsc::Sender<Frame>) -> Self {
        Self { id, outbound }
    }
}

/// Outcome of one fan-out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Push one frame to every recipient concurrently and wait for all sends.
///
/// A closed session or one that stays full past `timeout` counts as a failure
/// and does not affect the others. Tearing the session down is left to the
/// transport.
pub async fn fan_out(recipients: &[SessionHandle], frame: &Frame, timeout: Duration) -> FanOutReport {
    let sends = recipients.iter().map(|session| {
        let frame = frame.clone();
        async move {
            match tokio::time::timeout(timeout, session.outbound.send(frame)).await {
                Ok(Ok(())) => true,
                Ok(Err(_)) => {
                    tracing::debug!("Session {} closed, dropping snapshot", session.id);
                    false
                }
                Err(_) => {
                    tracing::debug!("Session {} timed out, dropping snapshot", session.id);
                    false
                }
            }
        }
    });

    let mut report = FanOutReport::default();
    for delivered in join_all(sends).await {
        if delivered {
            report.delivered += 1;
        } else {
            report.failed += 1;
        }
    }
    report
}
