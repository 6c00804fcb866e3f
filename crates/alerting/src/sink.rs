//! Alert delivery sinks

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::event::AlertEvent;

/// Consumes alert events to drive operator feedback.
///
/// Delivery is fire-and-forget: implementations must not block the
/// detection loop, and no acknowledgment flows back.
pub trait AlertSink: Send + Sync {
    fn on_alert(&self, event: AlertEvent);
}

/// Marshals events onto the context that owns UI feedback.
///
/// The receiving side (UI thread, haptics driver) drains the channel at
/// its own pace; a dropped receiver silently discards further events.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AlertEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlertEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlertSink for ChannelSink {
    fn on_alert(&self, event: AlertEvent) {
        if self.tx.send(event).is_err() {
            debug!("alert receiver gone, event dropped");
        }
    }
}

/// Logs alerts through tracing; used by headless deployments
pub struct LogSink;

impl AlertSink for LogSink {
    fn on_alert(&self, event: AlertEvent) {
        warn!(
            zone = %event.zone,
            distance_m = event.distance_m,
            severity = ?event.severity(),
            "pedestrian proximity alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Zone;

    #[tokio::test]
    async fn channel_sink_delivers_in_emission_order() {
        let (sink, mut rx) = ChannelSink::new();

        sink.on_alert(AlertEvent::new(Zone::Left, 2.0));
        sink.on_alert(AlertEvent::new(Zone::Right, 4.0));

        let first = rx.recv().await.expect("first event");
        let second = rx.recv().await.expect("second event");
        assert_eq!(first.zone, Zone::Left);
        assert_eq!(second.zone, Zone::Right);
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_panic() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);

        sink.on_alert(AlertEvent::new(Zone::Center, 1.0));
    }
}
