//! Persisted actor state
//!
//! The boundary format the serialization collaborator stores per actor.
//! Positions and velocities are whole centipixel integers so nothing is
//! lost to rounding across a save/load cycle.

use serde::{Deserialize, Serialize};

/// Physics-relevant actor fields, exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedActor {
    /// Position in centipixels.
    pub x: i32,
    pub y: i32,
    /// Velocity in centipixels per frame.
    pub velocity_x: i32,
    pub velocity_y: i32,
    pub zorder: i32,
    pub hitpoints: i32,
    pub cycle: i32,
    pub animation: String,
    pub time_in_frame: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_lossless() {
        let saved = SavedActor {
            x: -12_345,
            y: 678_900,
            velocity_x: -250,
            velocity_y: 501,
            zorder: 3,
            hitpoints: 7,
            cycle: 1_000_001,
            animation: "walk".to_string(),
            time_in_frame: 13,
        };
        let json = serde_json::to_string(&saved).unwrap();
        let back: SavedActor = serde_json::from_str(&json).unwrap();
        assert_eq!(saved, back);
    }
}
