use serde::{Deserialize, Serialize};

/// A value computed at most once per turn. Reading it on a later turn misses
/// and recomputes; there is no sentinel value to forget to reset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnCached<T> {
    entry: Option<(u32, T)>,
}

impl<T> Default for TurnCached<T> {
    fn default() -> Self {
        TurnCached { entry: None }
    }
}

impl<T> TurnCached<T> {
    pub fn new() -> TurnCached<T> {
        TurnCached::default()
    }

    pub fn get(&self, turn: u32) -> Option<&T> {
        match &self.entry {
            Some((cached_turn, value)) if *cached_turn == turn => Some(value),
            _ => None,
        }
    }

    pub fn get_or_insert_with<F>(&mut self, turn: u32, fill: F) -> &T
    where
        F: FnOnce() -> T,
    {
        let fresh = matches!(&self.entry, Some((cached_turn, _)) if *cached_turn == turn);

        if !fresh {
            self.entry = None;
        }

        &self.entry.get_or_insert_with(|| (turn, fill())).1
    }

    pub fn insert(&mut self, turn: u32, value: T) {
        self.entry = Some((turn, value));
    }

    pub fn expire(&mut self) {
        self.entry = None;
    }

    pub fn has_expired(&self, turn: u32) -> bool {
        self.get(turn).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_on_new_turn_only() {
        let mut cache = TurnCached::new();
        let mut fills = 0;

        assert_eq!(*cache.get_or_insert_with(3, || { fills += 1; 10 }), 10);
        assert_eq!(*cache.get_or_insert_with(3, || { fills += 1; 20 }), 10);
        assert_eq!(*cache.get_or_insert_with(4, || { fills += 1; 30 }), 30);
        assert_eq!(fills, 2);

        cache.expire();
        assert!(cache.has_expired(4));
    }
}
