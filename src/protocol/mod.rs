pub mod outbox;
pub mod radio;
pub mod status;

pub use outbox::*;
pub use radio::*;
pub use status::*;

use crate::host::{RobotInfo, Team};
use itertools::Itertools;

pub const MESSAGE_PRIORITY_CRITICAL: u32 = 100;
pub const MESSAGE_PRIORITY_HIGH: u32 = 75;
pub const MESSAGE_PRIORITY_MEDIUM: u32 = 50;
pub const MESSAGE_PRIORITY_LOW: u32 = 25;
pub const MESSAGE_PRIORITY_NONE: u32 = 0;

/// Map coordinates fit in 6 bits (maps are at most 64 tiles wide).
pub const COORDINATE_BITS: u32 = 6;

/// Radio messages heard this turn, highest priority first. Senders seen to be
/// on the other team are ignored.
#[derive(Clone, Debug, Default)]
pub struct Inbox {
    messages: Vec<(u32, RadioMessage)>,
}

impl Inbox {
    pub fn from_robots(robots: &[RobotInfo], own_id: u32, team: Team) -> Inbox {
        let messages = robots
            .iter()
            .filter(|r| r.id != own_id && r.team.map(|t| t == team).unwrap_or(true))
            .filter_map(|r| r.signal.map(|s| (r.id, RadioMessage::decode(s))))
            .filter(|(_, m)| *m != RadioMessage::Event)
            .sorted_by(|(id_a, a), (id_b, b)| b.priority().cmp(&a.priority()).then_with(|| id_a.cmp(id_b)))
            .collect();

        Inbox { messages }
    }

    pub fn iter(&self) -> impl Iterator<Item = &(u32, RadioMessage)> {
        self.messages.iter()
    }

    pub fn highest(&self) -> Option<&(u32, RadioMessage)> {
        self.messages.first()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages sent by `sender` this turn.
    pub fn from_sender(&self, sender: u32) -> impl Iterator<Item = &RadioMessage> {
        self.messages.iter().filter(move |(id, _)| *id == sender).map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Position;

    #[test]
    fn inbox_orders_by_priority_and_skips_self() {
        let hold = RadioMessage::Hold {
            position: Position::new(1, 1),
        };
        let target = RadioMessage::TargetList { clear: false, target: 9 };

        let robots = vec![
            RobotInfo {
                id: 3,
                signal: Some(hold.encode().unwrap()),
                signal_radius_sq: Some(4),
                ..Default::default()
            },
            RobotInfo {
                id: 4,
                signal: Some(target.encode().unwrap()),
                signal_radius_sq: Some(4),
                ..Default::default()
            },
            RobotInfo {
                id: 7,
                signal: Some(target.encode().unwrap()),
                signal_radius_sq: Some(4),
                ..Default::default()
            },
            RobotInfo {
                id: 5,
                signal: Some(0),
                ..Default::default()
            },
            RobotInfo {
                id: 6,
                team: Some(Team::Blue),
                signal: Some(target.encode().unwrap()),
                signal_radius_sq: Some(4),
                ..Default::default()
            },
        ];

        let inbox = Inbox::from_robots(&robots, 7, Team::Red);
        let order: Vec<u32> = inbox.iter().map(|(id, _)| *id).collect();

        assert_eq!(order, vec![4, 3]);
        assert_eq!(inbox.highest().map(|(_, m)| *m), Some(target));
    }
}
