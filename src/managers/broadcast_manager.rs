// BroadcastChannelManager: Centralized tokio broadcast channel management
// Single Responsibility: Broadcast channel lifecycle and subscription

use tokio::sync::broadcast;

use crate::engine::{IndicatorEvent, MetronomeEvent};

/// Manages the tokio broadcast channels of one transport
///
/// # Channel Types
/// - Events: `started`, `stopped` and per-beat notifications
/// - Indicator: flash on/off commands for a visual beat indicator
///
/// Publishing never fails: with no subscriber the message is dropped, and a
/// subscriber that falls behind by more than the channel capacity lags.
pub struct BroadcastChannelManager {
    events: broadcast::Sender<MetronomeEvent>,
    indicator: broadcast::Sender<IndicatorEvent>,
}

impl BroadcastChannelManager {
    /// Create both channels with `capacity` buffered messages each
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        let (indicator, _) = broadcast::channel(capacity.max(1));
        Self { events, indicator }
    }

    // ========================================================================
    // EVENTS CHANNEL
    // ========================================================================

    /// Sender handed to the emitter for beat notifications
    pub fn events_sender(&self) -> broadcast::Sender<MetronomeEvent> {
        self.events.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<MetronomeEvent> {
        self.events.subscribe()
    }

    pub fn publish_event(&self, event: MetronomeEvent) {
        let _ = self.events.send(event);
    }

    // ========================================================================
    // INDICATOR CHANNEL
    // ========================================================================

    pub fn indicator_sender(&self) -> broadcast::Sender<IndicatorEvent> {
        self.indicator.clone()
    }

    pub fn subscribe_indicator(&self) -> broadcast::Receiver<IndicatorEvent> {
        self.indicator.subscribe()
    }

    pub fn publish_indicator(&self, event: IndicatorEvent) {
        let _ = self.indicator.send(event);
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new(256)
    }
}
