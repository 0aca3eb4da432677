//! Engine-wide constants.

use crate::types::Tick;

/// Simulation rate. Every tick-denominated duration in the engine assumes
/// the host drives `tick()` at this frequency.
pub const TICK_RATE_HZ: Tick = 30;

/// Two enemy pieces within this distance (in board squares) of each other
/// collide and a capture is resolved.
pub const CAPTURE_DISTANCE: f64 = 0.4;

/// Fraction of a knight's travel during which it is airborne: excluded from
/// collision detection and unable to capture. Visibility and capture
/// ability share this constant so the two can never drift apart.
pub const KNIGHT_AIRBORNE_FRACTION: f64 = 0.85;

/// Game ids are short opaque strings drawn from a confusable-free alphabet
/// (no 0/O, 1/I/L).
pub const GAME_ID_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const GAME_ID_LENGTH: usize = 8;
