//! Typed publish/subscribe bus
//!
//! Handlers are registered per [`EventKind`] and run synchronously, in
//! subscription order, when a matching [`GameEvent`] is emitted. A handler that
//! returns an error is logged and skipped; the rest still run.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;

use super::entity::EntityId;
use super::pickup::PickupKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    NpcDied,
    PickupDropped,
    PlayerDamaged,
    PlayerDied,
    WaveStarted,
    WaveCleared,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::NpcDied => "NPC_DIED",
            EventKind::PickupDropped => "PICKUP_DROPPED",
            EventKind::PlayerDamaged => "PLAYER_DAMAGED",
            EventKind::PlayerDied => "PLAYER_DIED",
            EventKind::WaveStarted => "WAVE_STARTED",
            EventKind::WaveCleared => "WAVE_CLEARED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    NpcDied {
        npc: EntityId,
        pos: Vec2,
        killer: Option<EntityId>,
    },
    PickupDropped {
        pos: Vec2,
        kind: PickupKind,
    },
    PlayerDamaged {
        player: EntityId,
        amount: i32,
        remaining: i32,
    },
    PlayerDied {
        player: EntityId,
        pos: Vec2,
    },
    WaveStarted {
        wave: u32,
        count: u32,
    },
    WaveCleared {
        wave: u32,
    },
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::NpcDied { .. } => EventKind::NpcDied,
            GameEvent::PickupDropped { .. } => EventKind::PickupDropped,
            GameEvent::PlayerDamaged { .. } => EventKind::PlayerDamaged,
            GameEvent::PlayerDied { .. } => EventKind::PlayerDied,
            GameEvent::WaveStarted { .. } => EventKind::WaveStarted,
            GameEvent::WaveCleared { .. } => EventKind::WaveCleared,
        }
    }
}

/// Handle returned by [`EventManager::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub type Handler = Box<dyn FnMut(&GameEvent) -> anyhow::Result<()>>;

#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<EventKind, Vec<(SubscriptionId, Handler)>>,
    next_id: u64,
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self.listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventManager").field("listeners", &counts).finish()
    }
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&GameEvent) -> anyhow::Result<()> + 'static,
    {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.listeners.entry(kind).or_default().push((id, Box::new(handler)));
        log::debug!("{id} subscribed to {kind}");
        id
    }

    /// Remove a subscription; returns false if it was not registered
    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        let Some(handlers) = self.listeners.get_mut(&kind) else {
            log::warn!("Unsubscribe of {id} from {kind}: no listeners");
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        let removed = handlers.len() != before;
        if !removed {
            log::warn!("Unsubscribe of {id} from {kind}: not subscribed");
        }
        removed
    }

    /// Deliver `event` to every subscriber of its kind.
    ///
    /// Returns the number of handlers that completed without error.
    pub fn emit(&mut self, event: &GameEvent) -> usize {
        let kind = event.kind();
        let Some(handlers) = self.listeners.get_mut(&kind) else {
            return 0;
        };
        let mut delivered = 0;
        for (id, handler) in handlers.iter_mut() {
            match handler(event) {
                Ok(()) => delivered += 1,
                Err(e) => log::error!("{kind} handler {id} failed: {e:#}"),
            }
        }
        delivered
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.get(&kind).map_or(0, Vec::len)
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}
