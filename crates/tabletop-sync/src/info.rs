//! Records exchanged through the replicated store.

use serde::{Deserialize, Serialize};
use tabletop_core::{Seat, Vec3};

/// Replicated description of one thing.
///
/// Field names are camelCase on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingInfo {
    pub slot_name: String,
    pub rotation_index: usize,
    pub claimed_by: Option<Seat>,
    pub held_rotation: Vec3,
    pub shift_slot_name: Option<String>,
}

/// Visual variant of the tile set; `back` alternates with every deal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSet {
    pub back: u8,
}

impl TileSet {
    pub fn initial() -> Self {
        Self::default()
    }

    /// The same set with the other back color.
    pub fn toggled(self) -> Self {
        Self {
            back: 1 - self.back.min(1),
        }
    }
}

/// The singleton match record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfo {
    pub dealer: Seat,
    pub honba: u8,
    pub tile_set: TileSet,
}

impl Default for MatchInfo {
    fn default() -> Self {
        Self {
            dealer: Seat(0),
            honba: 0,
            tile_set: TileSet::initial(),
        }
    }
}

/// A pointer sample broadcast for remote cursors.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseInfo {
    pub mouse: Option<Vec3>,
    pub held_mouse: Option<Vec3>,
    /// Milliseconds since the epoch on the sender's clock.
    pub time: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thing_info_wire_names() {
        let info = ThingInfo {
            slot_name: "hand.0.3".into(),
            rotation_index: 1,
            claimed_by: Some(Seat(2)),
            held_rotation: Vec3::new(0.0, 1.5, 0.0),
            shift_slot_name: None,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["slotName"], "hand.0.3");
        assert_eq!(json["claimedBy"], 2);
        assert_eq!(json["shiftSlotName"], serde_json::Value::Null);

        let back: ThingInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn test_tile_set_toggle() {
        let set = TileSet::initial();
        assert_eq!(set.toggled().back, 1);
        assert_eq!(set.toggled().toggled(), set);
    }
}
