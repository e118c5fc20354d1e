//! Deterministic per-user display colors.
//!
//! Peers must agree on a user's color without coordinating, so the color
//! is a pure function of the user id: an FNV-1a hash reduced modulo a
//! fixed palette. Stable across sessions, collision-tolerant by design of
//! the palette size.

/// Display color palette. Mid-saturation tones that stay readable as
/// cursor and avatar colors on both light and dark themes.
pub const PALETTE: [&str; 12] = [
    "#e57373", "#f06292", "#ba68c8", "#9575cd", "#7986cb", "#64b5f6",
    "#4fc3f7", "#4db6ac", "#81c784", "#dce775", "#ffb74d", "#a1887f",
];

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(input: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in input.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Pick the display color for a user id.
#[must_use]
pub fn color_for_user(user_id: &str) -> &'static str {
    let index = (fnv1a(user_id) % PALETTE.len() as u64) as usize;
    PALETTE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_is_deterministic() {
        assert_eq!(color_for_user("ada"), color_for_user("ada"));
        assert_eq!(color_for_user(""), color_for_user(""));
    }

    #[test]
    fn test_color_is_from_palette() {
        for user in ["ada", "ben", "carol", "a-very-long-user-identifier"] {
            assert!(PALETTE.contains(&color_for_user(user)));
        }
    }

    #[test]
    fn test_distinct_users_spread_over_palette() {
        // Not a collision-freedom guarantee, just a sanity check that the
        // hash actually varies.
        let colors: std::collections::HashSet<_> =
            (0..32).map(|i| color_for_user(&format!("user-{i}"))).collect();
        assert!(colors.len() > 1);
    }
}
