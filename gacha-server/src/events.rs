//! Event sinks for quest/achievement consumers

use gacha_core::{EventSink, GachaEvent};
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Fans committed events out to any number of async listeners
pub struct BroadcastEventSink {
    tx: broadcast::Sender<GachaEvent>,
}

impl BroadcastEventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GachaEvent> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastEventSink {
    fn emit(&self, event: &GachaEvent) {
        // Lagging or absent listeners never block a commit
        if self.tx.send(event.clone()).is_err() {
            debug!(kind = event.kind(), "event dropped, no listeners");
        }
    }
}

/// Writes every event to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn emit(&self, event: &GachaEvent) {
        match event {
            GachaEvent::Pull(pull) => info!(
                entity = %pull.entity.id,
                rarity = pull.rarity.as_str(),
                shiny = pull.is_shiny,
                banner = %pull.banner_id,
                "pull"
            ),
            other => info!(kind = other.kind(), "gacha event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gacha_core::events::SacrificeEvent;
    use gacha_core::{EntityGenerator, GachaRng, GenerationModifiers};

    #[tokio::test]
    async fn test_broadcast_delivers() {
        let sink = BroadcastEventSink::new(8);
        let mut rx = sink.subscribe();
        let entity = EntityGenerator::default()
            .generate(
                &gacha_core::constants::BASE_RARITY_WEIGHTS,
                &GenerationModifiers::default(),
                &mut GachaRng::from_seed(1),
                0,
            )
            .unwrap();
        sink.emit(&GachaEvent::Sacrifice(SacrificeEvent {
            entity,
            essence_granted: 12,
            timestamp: 3,
        }));
        assert_eq!(rx.recv().await.unwrap().kind(), "sacrifice");
    }

    #[test]
    fn test_emit_without_listeners() {
        let sink = BroadcastEventSink::new(1);
        sink.emit_all(&[]);
        TracingEventSink.emit_all(&[]);
    }
}
