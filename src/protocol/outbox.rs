use super::radio::RadioMessage;
use super::status::StatusMessage;
use crate::error::EncodingError;
use crate::host::Host;
use log::*;
use std::collections::VecDeque;

/// One part handed to the host for transmission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transmission {
    pub value: u64,
    pub radius_sq: Option<u32>,
}

/// Pending message for one channel. At most one (possibly multi-part) message
/// is queued at a time; a new message replaces it only with strictly higher
/// priority.
#[derive(Clone, Debug, Default)]
pub struct Outbox {
    priority: Option<u32>,
    payload: VecDeque<u64>,
    radius_sq: Option<u32>,
}

impl Outbox {
    pub fn new() -> Outbox {
        Outbox::default()
    }

    /// Returns whether the message won arbitration. Callers must check this
    /// before acting on the assumption that the message will be sent.
    #[must_use]
    pub fn set_event_message(&mut self, priority: u32, payload: Vec<u64>, radius_sq: Option<u32>) -> bool {
        if payload.is_empty() {
            return false;
        }

        if let Some(current) = self.priority {
            if priority <= current {
                debug!("Outbox kept priority {} message over priority {}", current, priority);
                return false;
            }
        }

        self.priority = Some(priority);
        self.payload = payload.into();
        self.radius_sq = radius_sq;

        true
    }

    /// Pops the next part. Called once per turn by the orchestrator only.
    pub fn drain(&mut self) -> Option<Transmission> {
        let value = self.payload.pop_front()?;
        let transmission = Transmission {
            value,
            radius_sq: self.radius_sq,
        };

        if self.payload.is_empty() {
            self.priority = None;
            self.radius_sq = None;
        }

        Some(transmission)
    }

    pub fn pending_priority(&self) -> Option<u32> {
        self.priority
    }

    pub fn pending_parts(&self) -> usize {
        self.payload.len()
    }

    pub fn is_idle(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn clear(&mut self) {
        self.priority = None;
        self.payload.clear();
        self.radius_sq = None;
    }
}

/// Both channels owned by one unit.
#[derive(Clone, Debug, Default)]
pub struct Outboxes {
    pub radio: Outbox,
    pub status: Outbox,
}

impl Outboxes {
    pub fn new() -> Outboxes {
        Outboxes::default()
    }

    /// Encodes and queues a radio message. Encoding failures propagate; losing
    /// arbitration is `Ok(false)`.
    pub fn send_radio(&mut self, priority: u32, messages: &[RadioMessage], radius_sq: u32) -> Result<bool, EncodingError> {
        let payload = messages
            .iter()
            .map(|m| m.encode().map(|v| v as u64))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.radio.set_event_message(priority, payload, Some(radius_sq)))
    }

    pub fn send_status(&mut self, priority: u32, messages: &[StatusMessage]) -> Result<bool, EncodingError> {
        let payload = messages
            .iter()
            .map(|m| m.encode().map(|v| v as u64))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.status.set_event_message(priority, payload, None))
    }

    /// Transmits one part per channel through the host.
    pub fn drain<H: Host + ?Sized>(&mut self, host: &mut H) {
        if let Some(transmission) = self.radio.drain() {
            let radius_sq = transmission.radius_sq.unwrap_or(0);

            debug!("Radio {:#06x} radius {}", transmission.value, radius_sq);

            host.signal(transmission.value as u16, radius_sq);
        }

        if let Some(transmission) = self.status.drain() {
            host.castle_talk(transmission.value as u8);
        }
    }

    pub fn clear(&mut self) {
        self.radio.clear();
        self.status.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Position;

    #[test]
    fn higher_priority_replaces_pending() {
        let mut outbox = Outbox::new();

        assert!(outbox.set_event_message(10, vec![1], None));
        assert!(!outbox.set_event_message(5, vec![2], None));
        assert_eq!(outbox.pending_priority(), Some(10));
        assert!(!outbox.set_event_message(10, vec![3], None));
        assert!(outbox.set_event_message(20, vec![4], None));
        assert_eq!(outbox.drain().map(|t| t.value), Some(4));
    }

    #[test]
    fn drains_one_part_per_call_and_releases_priority() {
        let mut outbox = Outbox::new();

        assert!(outbox.set_event_message(50, vec![7, 8], Some(16)));
        assert_eq!(
            outbox.drain(),
            Some(Transmission {
                value: 7,
                radius_sq: Some(16)
            })
        );
        assert_eq!(outbox.pending_priority(), Some(50));
        assert!(!outbox.set_event_message(1, vec![9], None));
        assert_eq!(outbox.drain().map(|t| t.value), Some(8));
        assert_eq!(outbox.pending_priority(), None);
        assert!(outbox.set_event_message(1, vec![9], None));
        assert_eq!(outbox.drain().map(|t| t.value), Some(9));
        assert_eq!(outbox.drain(), None);
    }

    #[test]
    fn encoding_failures_do_not_touch_the_outbox() {
        let mut outboxes = Outboxes::new();
        let bad = RadioMessage::Hold {
            position: Position::new(100, 0),
        };

        assert!(outboxes.send_radio(10, &[bad], 4).is_err());
        assert!(outboxes.radio.is_idle());
    }
}
