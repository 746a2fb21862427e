//! Deterministic randomness derived from the world seed.
//!
//! Anything random that must replay identically (seed drops, NPC patrol
//! waypoints, spawn placement) derives its value from the world seed, the
//! tick and optionally an entity id. The same inputs always produce the same
//! output.

use frontier_types::ResourceId;

/// Mix a world seed and a tick into a well-distributed 64-bit value.
///
/// Suitable for seeding a `rand` generator for one tick's worth of
/// decisions.
pub const fn tick_seed(world_seed: u64, tick: u64) -> u64 {
    xorshift64(world_seed.wrapping_add(tick.wrapping_mul(0x517c_c1b7_2722_0a95)))
}

/// A percentage roll in `0..100` for a resource at a tick.
pub fn resource_roll(resource: ResourceId, tick: u64, world_seed: u64) -> u32 {
    let (hi, lo) = resource.into_inner().as_u64_pair();
    let mixed = xorshift64(tick_seed(world_seed, tick) ^ hi ^ lo.rotate_left(17));
    let remainder = mixed.checked_rem(100).unwrap_or(0);
    u32::try_from(remainder).unwrap_or(0)
}

/// One round of `xorshift64`. Zero input is replaced by a fixed non-zero
/// state.
const fn xorshift64(input: u64) -> u64 {
    let mut state = if input == 0 {
        0xdead_beef_cafe_babe
    } else {
        input
    };
    state ^= state << 13;
    state ^= state >> 7;
    state ^= state << 17;
    state
}
