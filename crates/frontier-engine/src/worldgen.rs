//! First-boot world generation.
//!
//! The core never generates terrain on its own; it only exposes the entity
//! registration operations. On a fresh database the engine scatters trees,
//! gold veins and behemoths through those same operations, using a generator
//! seeded from the world seed so two fresh boots with the same config look
//! the same.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use frontier_core::config::GenerationConfig;
use frontier_types::{
    Behemoth, BehemothId, BehemothStatus, Position, ResourceId, ResourceKind, ResourceNode,
    ResourceState,
};
use frontier_world::{WorldError, WorldState};

/// Fraction of the world side kept clear between a patrol loop and the edge.
const ROUTE_MARGIN: f64 = 0.15;

/// Patrol loop radius as a fraction of the world side.
const ROUTE_RADIUS: f64 = 0.1;

/// Counts of what [`populate`] placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// Trees placed.
    pub trees: u32,
    /// Gold veins placed.
    pub gold_veins: u32,
    /// Behemoths placed.
    pub behemoths: u32,
}

/// Populate an empty world with resources and behemoths.
///
/// # Errors
///
/// Returns [`WorldError`] if the world rejects a registration.
pub fn populate(
    world: &mut WorldState,
    config: &GenerationConfig,
) -> Result<GenerationSummary, WorldError> {
    let mut rng = StdRng::seed_from_u64(world.seed());
    let size = world.world_size();
    let mut summary = GenerationSummary::default();

    for _ in 0..config.trees {
        let position = random_position(&mut rng, size);
        world.add_resource(resource(ResourceKind::Tree, position, config.tree_capacity))?;
        summary.trees = summary.trees.saturating_add(1);
    }

    for _ in 0..config.gold_veins {
        let position = random_position(&mut rng, size);
        world.add_resource(resource(ResourceKind::GoldVein, position, config.vein_capacity))?;
        summary.gold_veins = summary.gold_veins.saturating_add(1);
    }

    for _ in 0..config.behemoths {
        let route = patrol_route(&mut rng, size, config.route_waypoints);
        let start = route.first().copied().unwrap_or_else(|| world.settings().spawn_point);
        world.add_behemoth(Behemoth {
            id: BehemothId::new(),
            position: start,
            status: BehemothStatus::Roaming,
            health: config.behemoth_health,
            max_health: config.behemoth_health,
            ore: config.behemoth_max_ore / 2,
            max_ore: config.behemoth_max_ore,
            fed: 0,
            patrol_route: route,
            waypoint_index: 0,
            status_until: None,
        })?;
        summary.behemoths = summary.behemoths.saturating_add(1);
    }

    info!(
        trees = summary.trees,
        gold_veins = summary.gold_veins,
        behemoths = summary.behemoths,
        "world generated"
    );
    Ok(summary)
}

fn resource(kind: ResourceKind, position: Position, capacity: u32) -> ResourceNode {
    ResourceNode {
        id: ResourceId::new(),
        kind,
        position,
        remaining: capacity,
        capacity,
        state: if capacity == 0 {
            ResourceState::Depleted
        } else {
            ResourceState::Available
        },
        growth_complete_tick: None,
    }
}

fn random_position(rng: &mut StdRng, size: f64) -> Position {
    Position::new(rng.random_range(0.0..size), rng.random_range(0.0..size))
}

/// A closed loop of evenly spaced waypoints around a random center.
fn patrol_route(rng: &mut StdRng, size: f64, waypoints: u32) -> Vec<Position> {
    let margin = size * ROUTE_MARGIN;
    let center = Position::new(
        rng.random_range(margin..size - margin),
        rng.random_range(margin..size - margin),
    );
    let radius = size * ROUTE_RADIUS;
    let count = waypoints.max(1);
    let phase = rng.random_range(0.0..TAU);
    (0..count)
        .map(|i| {
            let angle = phase + TAU * f64::from(i) / f64::from(count);
            Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
            .clamped(size)
        })
        .collect()
}
