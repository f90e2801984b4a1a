//! Per-room canvas state table with event fan-out.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;
use uuid::Uuid;

use dicebox_roll::{DiceRollDescriptor, Vec3};

use crate::event::{CanvasEvent, CanvasEventType};
use crate::state::{CanvasDiceState, DiceLifecycle};

/// Handle returned by [`CanvasStateManager::subscribe`]; pass it back to
/// [`CanvasStateManager::unsubscribe`] to stop receiving events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

type Subscriber = Box<dyn FnMut(&CanvasEvent) + Send>;

#[derive(Default)]
struct Room {
    dice: HashMap<String, CanvasDiceState>,
    events: Vec<CanvasEvent>,
}

/// Tracks every active die per room and broadcasts lifecycle events.
///
/// Mutating operations validate ownership (a die may only be thrown,
/// settled, or removed by the user who spawned it; highlight is exempt)
/// and return `None` on a stale id or ownership miss. Those are routine
/// races in a multi-user room, not errors, so nothing here panics or
/// returns a `Result`. On success the operation appends a [`CanvasEvent`]
/// to the room's stream and fans it out to all subscribers.
pub struct CanvasStateManager {
    rooms: HashMap<String, Room>,
    subscribers: HashMap<Uuid, Subscriber>,
}

impl CanvasStateManager {
    /// An empty manager with no rooms and no subscribers.
    pub fn new() -> Self {
        CanvasStateManager {
            rooms: HashMap::new(),
            subscribers: HashMap::new(),
        }
    }

    /// Register `descriptor` as an active die in `room`, owned by
    /// `user_id`. Returns the die's canvas id.
    pub fn spawn_dice(
        &mut self,
        room: &str,
        user_id: &str,
        descriptor: &DiceRollDescriptor,
    ) -> String {
        self.spawn_dice_at(room, user_id, descriptor, now_ms())
    }

    fn spawn_dice_at(
        &mut self,
        room: &str,
        user_id: &str,
        descriptor: &DiceRollDescriptor,
        now: u64,
    ) -> String {
        let id = descriptor.canvas_id.clone();
        let die = CanvasDiceState {
            id: id.clone(),
            dice_type: descriptor.dice_type.clone(),
            position: descriptor.position,
            velocity: None,
            is_virtual: descriptor.is_virtual,
            virtual_rolls: descriptor.virtual_rolls.clone(),
            user_id: user_id.to_string(),
            timestamp: now,
            state: DiceLifecycle::Spawning,
            // Virtual proxies never settle physically, so their result
            // is known at spawn time.
            result: descriptor.is_virtual.then_some(descriptor.result),
        };
        self.rooms
            .entry(room.to_string())
            .or_default()
            .dice
            .insert(id.clone(), die);

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Spawn,
                Some(id.clone()),
                user_id,
                now,
                json!({
                    "diceType": descriptor.dice_type,
                    "isVirtual": descriptor.is_virtual,
                }),
            ),
        );
        id
    }

    /// Mark a die as thrown with the given velocity. `None` if the die
    /// is missing or owned by someone else.
    pub fn throw_dice(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        velocity: Vec3,
    ) -> Option<()> {
        self.throw_dice_at(room, dice_id, user_id, velocity, now_ms())
    }

    fn throw_dice_at(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        velocity: Vec3,
        now: u64,
    ) -> Option<()> {
        let die = self.owned_die_mut(room, dice_id, user_id)?;
        die.state = DiceLifecycle::Throwing;
        die.velocity = Some(velocity);

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Throw,
                Some(dice_id.to_string()),
                user_id,
                now,
                json!({ "velocity": velocity }),
            ),
        );
        Some(())
    }

    /// Mark a die as settled at `position` showing `result`.
    pub fn settle_dice(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        position: Vec3,
        result: u32,
    ) -> Option<()> {
        self.settle_dice_at(room, dice_id, user_id, position, result, now_ms())
    }

    fn settle_dice_at(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        position: Vec3,
        result: u32,
        now: u64,
    ) -> Option<()> {
        let die = self.owned_die_mut(room, dice_id, user_id)?;
        die.state = DiceLifecycle::Settled;
        die.position = position;
        die.velocity = None;
        die.result = Some(result);

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Settle,
                Some(dice_id.to_string()),
                user_id,
                now,
                json!({ "result": result, "position": position }),
            ),
        );
        Some(())
    }

    /// Visually emphasize a die. Any user may highlight any die.
    pub fn highlight_dice(&mut self, room: &str, dice_id: &str, user_id: &str) -> Option<()> {
        self.highlight_dice_at(room, dice_id, user_id, now_ms())
    }

    fn highlight_dice_at(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        now: u64,
    ) -> Option<()> {
        let die = self.rooms.get_mut(room)?.dice.get_mut(dice_id)?;
        die.state = DiceLifecycle::Highlighted;

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Highlight,
                Some(dice_id.to_string()),
                user_id,
                now,
                json!({}),
            ),
        );
        Some(())
    }

    /// Remove a die from the canvas, returning its final state.
    pub fn remove_dice(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
    ) -> Option<CanvasDiceState> {
        self.remove_dice_at(room, dice_id, user_id, now_ms())
    }

    fn remove_dice_at(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
        now: u64,
    ) -> Option<CanvasDiceState> {
        {
            let die = self.rooms.get(room)?.dice.get(dice_id)?;
            if die.user_id != user_id {
                log::debug!("user {user_id} tried to remove die {dice_id} owned by {}", die.user_id);
                return None;
            }
        }
        let removed = self.rooms.get_mut(room)?.dice.remove(dice_id)?;

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Remove,
                Some(dice_id.to_string()),
                user_id,
                now,
                json!({ "diceType": removed.dice_type }),
            ),
        );
        Some(removed)
    }

    /// Remove every die in `room` regardless of owner. Returns how many
    /// were removed; zero (with no event) when the room is unknown.
    pub fn clear_canvas(&mut self, room: &str, user_id: &str) -> usize {
        self.clear_canvas_at(room, user_id, now_ms())
    }

    fn clear_canvas_at(&mut self, room: &str, user_id: &str, now: u64) -> usize {
        let removed = match self.rooms.get_mut(room) {
            Some(state) => {
                let count = state.dice.len();
                state.dice.clear();
                count
            }
            None => return 0,
        };

        self.emit(
            room,
            CanvasEvent::new(
                CanvasEventType::Clear,
                None,
                user_id,
                now,
                json!({ "removed": removed }),
            ),
        );
        removed
    }

    /// Remove every die owned by a user who left the room. Returns how
    /// many dice were removed.
    pub fn handle_user_disconnection(&mut self, room: &str, user_id: &str) -> usize {
        self.handle_user_disconnection_at(room, user_id, now_ms())
    }

    fn handle_user_disconnection_at(&mut self, room: &str, user_id: &str, now: u64) -> usize {
        let ids: Vec<String> = match self.rooms.get(room) {
            Some(state) => state
                .dice
                .values()
                .filter(|die| die.user_id == user_id)
                .map(|die| die.id.clone())
                .collect(),
            None => return 0,
        };

        for id in &ids {
            if let Some(state) = self.rooms.get_mut(room) {
                state.dice.remove(id);
            }
            self.emit(
                room,
                CanvasEvent::new(
                    CanvasEventType::Remove,
                    Some(id.clone()),
                    user_id,
                    now,
                    json!({ "reason": "disconnect" }),
                ),
            );
        }
        if !ids.is_empty() {
            log::debug!("removed {} dice for disconnected user {user_id}", ids.len());
        }
        ids.len()
    }

    /// Remove dice older than `max_age_ms`. Returns how many expired.
    pub fn cleanup_old_dice(&mut self, room: &str, max_age_ms: u64) -> usize {
        self.cleanup_old_dice_at(room, max_age_ms, now_ms())
    }

    fn cleanup_old_dice_at(&mut self, room: &str, max_age_ms: u64, now: u64) -> usize {
        let expired: Vec<(String, String)> = match self.rooms.get(room) {
            Some(state) => state
                .dice
                .values()
                .filter(|die| now.saturating_sub(die.timestamp) > max_age_ms)
                .map(|die| (die.id.clone(), die.user_id.clone()))
                .collect(),
            None => return 0,
        };

        for (id, owner) in &expired {
            if let Some(state) = self.rooms.get_mut(room) {
                state.dice.remove(id);
            }
            self.emit(
                room,
                CanvasEvent::new(
                    CanvasEventType::Remove,
                    Some(id.clone()),
                    owner,
                    now,
                    json!({ "reason": "expired" }),
                ),
            );
        }
        expired.len()
    }

    /// Register a callback for every event across all rooms.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&CanvasEvent) + Send + 'static,
    {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, Box::new(callback));
        SubscriptionId(id)
    }

    /// Drop a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id.0).is_some()
    }

    /// A die's current state, if it is still active.
    pub fn get_dice(&self, room: &str, dice_id: &str) -> Option<&CanvasDiceState> {
        self.rooms.get(room)?.dice.get(dice_id)
    }

    /// Every active die in `room`, in no particular order.
    pub fn dice_for_room(&self, room: &str) -> Vec<&CanvasDiceState> {
        self.rooms
            .get(room)
            .map(|state| state.dice.values().collect())
            .unwrap_or_default()
    }

    /// The room's full event history, oldest first. Late joiners replay
    /// this to reconstruct canvas state.
    pub fn events_for_room(&self, room: &str) -> &[CanvasEvent] {
        self.rooms
            .get(room)
            .map(|state| state.events.as_slice())
            .unwrap_or(&[])
    }

    /// Number of active dice in `room`.
    pub fn active_dice_count(&self, room: &str) -> usize {
        self.rooms.get(room).map(|state| state.dice.len()).unwrap_or(0)
    }

    fn owned_die_mut(
        &mut self,
        room: &str,
        dice_id: &str,
        user_id: &str,
    ) -> Option<&mut CanvasDiceState> {
        let die = self.rooms.get_mut(room)?.dice.get_mut(dice_id)?;
        if die.user_id != user_id {
            log::debug!(
                "user {user_id} tried to act on die {dice_id} owned by {}",
                die.user_id
            );
            return None;
        }
        Some(die)
    }

    fn emit(&mut self, room: &str, event: CanvasEvent) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .events
            .push(event.clone());
        for subscriber in self.subscribers.values_mut() {
            subscriber(&event);
        }
    }
}

impl Default for CanvasStateManager {
    fn default() -> Self {
        Self::new()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn descriptor(id: &str, dice_type: &str) -> DiceRollDescriptor {
        DiceRollDescriptor {
            canvas_id: id.to_string(),
            dice_type: dice_type.to_string(),
            position: Vec3::new(0.0, 0.0, 1.5),
            is_virtual: false,
            virtual_rolls: None,
            result: 0,
        }
    }

    #[test]
    fn lifecycle_spawn_throw_settle_highlight() {
        let mut manager = CanvasStateManager::new();
        let id = manager.spawn_dice("room", "alice", &descriptor("die-1", "d6"));

        assert_eq!(
            manager.get_dice("room", &id).unwrap().state,
            DiceLifecycle::Spawning
        );

        manager
            .throw_dice("room", &id, "alice", Vec3::new(2.0, 0.0, -1.0))
            .unwrap();
        assert_eq!(
            manager.get_dice("room", &id).unwrap().state,
            DiceLifecycle::Throwing
        );

        manager
            .settle_dice("room", &id, "alice", Vec3::new(1.0, 1.0, 0.0), 4)
            .unwrap();
        let die = manager.get_dice("room", &id).unwrap();
        assert_eq!(die.state, DiceLifecycle::Settled);
        assert_eq!(die.result, Some(4));
        assert!(die.velocity.is_none());

        // Highlight has no ownership check.
        manager.highlight_dice("room", &id, "bob").unwrap();
        assert_eq!(
            manager.get_dice("room", &id).unwrap().state,
            DiceLifecycle::Highlighted
        );

        let kinds: Vec<CanvasEventType> = manager
            .events_for_room("room")
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                CanvasEventType::Spawn,
                CanvasEventType::Throw,
                CanvasEventType::Settle,
                CanvasEventType::Highlight,
            ]
        );
    }

    #[test]
    fn ownership_miss_is_a_silent_none_with_no_event() {
        let mut manager = CanvasStateManager::new();
        let id = manager.spawn_dice("room", "alice", &descriptor("die-1", "d6"));
        let events_before = manager.events_for_room("room").len();

        assert!(manager
            .throw_dice("room", &id, "mallory", Vec3::new(1.0, 0.0, 0.0))
            .is_none());
        assert!(manager.remove_dice("room", &id, "mallory").is_none());
        assert!(manager
            .settle_dice("room", &id, "mallory", Vec3::new(0.0, 0.0, 0.0), 1)
            .is_none());

        assert_eq!(manager.events_for_room("room").len(), events_before);
        assert!(manager.get_dice("room", &id).is_some());
    }

    #[test]
    fn stale_ids_return_none() {
        let mut manager = CanvasStateManager::new();
        assert!(manager
            .throw_dice("room", "ghost", "alice", Vec3::new(0.0, 0.0, 0.0))
            .is_none());
        assert!(manager.highlight_dice("room", "ghost", "alice").is_none());
        assert!(manager.remove_dice("room", "ghost", "alice").is_none());
    }

    #[test]
    fn remove_returns_final_state() {
        let mut manager = CanvasStateManager::new();
        let id = manager.spawn_dice("room", "alice", &descriptor("die-1", "d12"));
        let removed = manager.remove_dice("room", &id, "alice").unwrap();
        assert_eq!(removed.dice_type, "d12");
        assert!(manager.get_dice("room", &id).is_none());
    }

    #[test]
    fn clear_canvas_removes_everyones_dice() {
        let mut manager = CanvasStateManager::new();
        manager.spawn_dice("room", "alice", &descriptor("a-1", "d6"));
        manager.spawn_dice("room", "bob", &descriptor("b-1", "d20"));

        assert_eq!(manager.clear_canvas("room", "alice"), 2);
        assert_eq!(manager.active_dice_count("room"), 0);
        assert_eq!(manager.clear_canvas("nowhere", "alice"), 0);

        let last = manager.events_for_room("room").last().unwrap();
        assert_eq!(last.event_type, CanvasEventType::Clear);
        assert_eq!(last.data["removed"], 2);
    }

    #[test]
    fn disconnection_removes_only_that_users_dice() {
        let mut manager = CanvasStateManager::new();
        manager.spawn_dice("room", "alice", &descriptor("a-1", "d6"));
        manager.spawn_dice("room", "alice", &descriptor("a-2", "d6"));
        manager.spawn_dice("room", "bob", &descriptor("b-1", "d8"));

        assert_eq!(manager.handle_user_disconnection("room", "alice"), 2);
        assert_eq!(manager.active_dice_count("room"), 1);
        assert!(manager.get_dice("room", "b-1").is_some());
    }

    #[test]
    fn ttl_cleanup_uses_spawn_timestamps() {
        let mut manager = CanvasStateManager::new();
        manager.spawn_dice_at("room", "alice", &descriptor("old", "d6"), 1_000);
        manager.spawn_dice_at("room", "alice", &descriptor("fresh", "d6"), 9_000);

        // At t=10_000 with a 5s TTL only the old die has expired.
        assert_eq!(manager.cleanup_old_dice_at("room", 5_000, 10_000), 1);
        assert!(manager.get_dice("room", "old").is_none());
        assert!(manager.get_dice("room", "fresh").is_some());
    }

    #[test]
    fn subscribers_see_events_until_unsubscribed() {
        let mut manager = CanvasStateManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let subscription = manager.subscribe(move |event| {
            sink.lock().unwrap().push(event.event_type);
        });

        manager.spawn_dice("room", "alice", &descriptor("die-1", "d6"));
        assert_eq!(*seen.lock().unwrap(), vec![CanvasEventType::Spawn]);

        assert!(manager.unsubscribe(subscription));
        assert!(!manager.unsubscribe(subscription));

        manager.spawn_dice("room", "alice", &descriptor("die-2", "d6"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn events_accumulate_for_late_joiners() {
        let mut manager = CanvasStateManager::new();
        let id = manager.spawn_dice("room", "alice", &descriptor("die-1", "d6"));
        manager
            .throw_dice("room", &id, "alice", Vec3::new(1.0, 0.0, 0.0))
            .unwrap();
        manager.remove_dice("room", &id, "alice").unwrap();

        // History survives the die's removal.
        assert_eq!(manager.events_for_room("room").len(), 3);
        assert!(manager.events_for_room("elsewhere").is_empty());
    }
}
