//! The authoritative world state.
//!
//! [`WorldState`] owns one ordered map per entity kind, the spatial index,
//! the clock, the world seed and the per-tick transient buffers. It is
//! owned by the tick loop; nothing else writes to it.
//!
//! Positioned entities (actors, monsters, resources, behemoths, structures)
//! must be registered, moved and removed through the `add_*`, `move_*` and
//! `remove_*` methods so the spatial index stays consistent with the
//! stores. Other fields of stored entities may be mutated directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use frontier_types::{
    Actor, ActorId, ActorStatus, Alliance, AllianceId, Behemoth, BehemothId, ChatMessage,
    ClimbJob, CombatPair, CombatantRef, CraftJobId, CraftingJob, EntityRef, Equipment, GameEvent,
    GatherJob, Monster, MonsterId, Position, ResourceId, ResourceNode, ResourceState, Role, Stats,
    Structure, StructureId, Trade, TradeId, TradeStatus, WorldSnapshot,
};

use crate::clock::WorldClock;
use crate::error::WorldError;
use crate::spatial::SpatialIndex;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Geometry of the world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    /// Side length of the square world. Coordinates live in `[0, world_size)`.
    pub world_size: f64,
    /// Spatial index cell size.
    pub cell_size: f64,
    /// Where new and respawning actors appear.
    pub spawn_point: Position,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            world_size: 2000.0,
            cell_size: 100.0,
            spawn_point: Position::new(1000.0, 1000.0),
        }
    }
}

/// Stats a freshly created actor of `role` starts with.
pub const fn starting_stats(role: Role) -> Stats {
    match role {
        Role::Woodcutter => Stats::new(100, 6, 2),
        Role::Miner => Stats::new(110, 8, 3),
        Role::Monster => Stats::new(120, 12, 3),
    }
}

// ---------------------------------------------------------------------------
// WorldState
// ---------------------------------------------------------------------------

/// Every entity in the world plus the spatial index.
#[derive(Debug, Clone)]
pub struct WorldState {
    clock: WorldClock,
    seed: u64,
    settings: WorldSettings,
    spatial: SpatialIndex,

    /// Player actors, dead ones included.
    pub actors: BTreeMap<ActorId, Actor>,
    /// NPC monsters.
    pub monsters: BTreeMap<MonsterId, Monster>,
    /// Resource nodes.
    pub resources: BTreeMap<ResourceId, ResourceNode>,
    /// Behemoths.
    pub behemoths: BTreeMap<BehemothId, Behemoth>,
    /// Structures.
    pub structures: BTreeMap<StructureId, Structure>,
    /// Alliances.
    pub alliances: BTreeMap<AllianceId, Alliance>,
    /// Pending trades, plus trades resolved or expired this tick.
    pub trades: BTreeMap<TradeId, Trade>,
    /// In-progress crafting jobs.
    pub crafting_jobs: BTreeMap<CraftJobId, CraftingJob>,
    /// Gather locks, one per gathering actor.
    pub gather_jobs: BTreeMap<ActorId, GatherJob>,
    /// Climb jobs, one per climbing actor.
    pub climb_jobs: BTreeMap<ActorId, ClimbJob>,
    /// Combat pairs keyed by attacker, so each attacker holds at most one.
    pub combat_pairs: BTreeMap<CombatantRef, CombatPair>,

    /// Events emitted this tick.
    pub events: Vec<GameEvent>,
    /// Chat lines sent this tick.
    pub chat: Vec<ChatMessage>,
}

impl WorldState {
    /// An empty world at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidWorldSize`] or
    /// [`WorldError::InvalidCellSize`] for non-positive geometry.
    pub fn new(seed: u64, settings: WorldSettings) -> Result<Self, WorldError> {
        if !settings.world_size.is_finite() || settings.world_size <= 0.0 {
            return Err(WorldError::InvalidWorldSize(settings.world_size));
        }
        let spatial = SpatialIndex::new(settings.cell_size)?;
        let settings = WorldSettings {
            spawn_point: settings.spawn_point.clamped(settings.world_size),
            ..settings
        };
        Ok(Self {
            clock: WorldClock::new(),
            seed,
            settings,
            spatial,
            actors: BTreeMap::new(),
            monsters: BTreeMap::new(),
            resources: BTreeMap::new(),
            behemoths: BTreeMap::new(),
            structures: BTreeMap::new(),
            alliances: BTreeMap::new(),
            trades: BTreeMap::new(),
            crafting_jobs: BTreeMap::new(),
            gather_jobs: BTreeMap::new(),
            climb_jobs: BTreeMap::new(),
            combat_pairs: BTreeMap::new(),
            events: Vec::new(),
            chat: Vec::new(),
        })
    }

    // -- Accessors ----------------------------------------------------------

    /// Current tick.
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// The clock.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// World seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// World geometry.
    pub const fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Side length of the world.
    pub const fn world_size(&self) -> f64 {
        self.settings.world_size
    }

    /// Read-only access to the spatial index.
    pub const fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Clamp a position into the world.
    pub fn clamp(&self, pos: Position) -> Position {
        pos.clamped(self.settings.world_size)
    }

    // -- Tick lifecycle -----------------------------------------------------

    /// Start a new tick: advance the clock, clear the transient buffers and
    /// purge trades that finished last tick and inactive combat pairs.
    ///
    /// Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Clock`] if the tick counter overflows.
    pub fn begin_tick(&mut self) -> Result<u64, WorldError> {
        let tick = self.clock.advance()?;
        self.events.clear();
        self.chat.clear();
        self.trades.retain(|_, t| t.status == TradeStatus::Pending);
        self.combat_pairs.retain(|_, p| p.active);
        Ok(tick)
    }

    /// Append an event to this tick's buffer.
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    // -- Actors -------------------------------------------------------------

    /// Register an actor. Its position is clamped into bounds.
    ///
    /// Dead monster-role actors are stored but not indexed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id is taken.
    pub fn add_actor(&mut self, mut actor: Actor) -> Result<(), WorldError> {
        if self.actors.contains_key(&actor.id) {
            return Err(WorldError::DuplicateId(format!("actor {}", actor.id)));
        }
        actor.position = self.clamp(actor.position);
        if !(actor.role.is_monster() && actor.status == ActorStatus::Dead) {
            self.spatial
                .insert(EntityRef::Actor(actor.id), actor.position);
        }
        self.actors.insert(actor.id, actor);
        Ok(())
    }

    /// Remove an actor and release any job it holds.
    pub fn remove_actor(&mut self, id: ActorId) -> Option<Actor> {
        self.release_jobs(id);
        self.spatial.remove(EntityRef::Actor(id));
        self.actors.remove(&id)
    }

    /// Create a new actor of `role` at the spawn point (role selection).
    pub fn spawn_actor(&mut self, name: impl Into<String>, role: Role) -> ActorId {
        let id = ActorId::new();
        let actor = Actor {
            id,
            name: name.into(),
            role,
            position: self.settings.spawn_point,
            destination: None,
            status: ActorStatus::Idle,
            stats: starting_stats(role),
            gold: 0,
            inventory: BTreeMap::new(),
            equipment: Equipment::default(),
            alliance: None,
            kills: 0,
            eats: 0,
            evolution_stage: 0,
            cooldown_until: 0,
            respawn_tick: None,
            connected: true,
            eaten: false,
        };
        self.spatial.insert(EntityRef::Actor(id), actor.position);
        self.actors.insert(id, actor);
        debug!(actor = %id, ?role, "actor spawned");
        id
    }

    /// Mark an actor connected or disconnected.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ActorNotFound`] for an unknown id.
    pub fn set_connected(&mut self, id: ActorId, connected: bool) -> Result<(), WorldError> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(WorldError::ActorNotFound(id))?;
        actor.connected = connected;
        Ok(())
    }

    /// Move an actor, clamping into bounds. Returns the applied position.
    pub fn move_actor(&mut self, id: ActorId, pos: Position) -> Option<Position> {
        self.move_entity(EntityRef::Actor(id), pos)
    }

    /// Drop an actor from the spatial index while keeping it stored.
    ///
    /// Used for permanently dead monster-role actors.
    pub fn unindex_actor(&mut self, id: ActorId) {
        self.spatial.remove(EntityRef::Actor(id));
    }

    // -- Other positioned kinds ---------------------------------------------

    /// Register an NPC monster.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id is taken.
    pub fn add_monster(&mut self, mut monster: Monster) -> Result<(), WorldError> {
        if self.monsters.contains_key(&monster.id) {
            return Err(WorldError::duplicate_monster(monster.id));
        }
        monster.position = self.clamp(monster.position);
        monster.patrol_origin = self.clamp(monster.patrol_origin);
        self.spatial
            .insert(EntityRef::Monster(monster.id), monster.position);
        self.monsters.insert(monster.id, monster);
        Ok(())
    }

    /// Remove an NPC monster and any combat pair it holds or is targeted by.
    pub fn remove_monster(&mut self, id: MonsterId) -> Option<Monster> {
        self.spatial.remove(EntityRef::Monster(id));
        let me = CombatantRef::Monster(id);
        self.combat_pairs
            .retain(|attacker, pair| *attacker != me && pair.target != me);
        self.monsters.remove(&id)
    }

    /// Register a resource node. `remaining` is capped at `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id is taken.
    pub fn add_resource(&mut self, mut node: ResourceNode) -> Result<(), WorldError> {
        if self.resources.contains_key(&node.id) {
            return Err(WorldError::DuplicateId(format!("resource {}", node.id)));
        }
        node.position = self.clamp(node.position);
        node.remaining = node.remaining.min(node.capacity);
        self.spatial
            .insert(EntityRef::Resource(node.id), node.position);
        self.resources.insert(node.id, node);
        Ok(())
    }

    /// Remove a resource node and any gather lock on it.
    pub fn remove_resource(&mut self, id: ResourceId) -> Option<ResourceNode> {
        self.spatial.remove(EntityRef::Resource(id));
        self.gather_jobs.retain(|_, job| job.resource != id);
        self.resources.remove(&id)
    }

    /// Register a behemoth.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id is taken.
    pub fn add_behemoth(&mut self, mut behemoth: Behemoth) -> Result<(), WorldError> {
        if self.behemoths.contains_key(&behemoth.id) {
            return Err(WorldError::duplicate_behemoth(behemoth.id));
        }
        let size = self.settings.world_size;
        behemoth.position = behemoth.position.clamped(size);
        for waypoint in &mut behemoth.patrol_route {
            *waypoint = waypoint.clamped(size);
        }
        behemoth.ore = behemoth.ore.min(behemoth.max_ore);
        self.spatial
            .insert(EntityRef::Behemoth(behemoth.id), behemoth.position);
        self.behemoths.insert(behemoth.id, behemoth);
        Ok(())
    }

    /// Remove a behemoth, its climbers and any pair targeting it.
    pub fn remove_behemoth(&mut self, id: BehemothId) -> Option<Behemoth> {
        self.spatial.remove(EntityRef::Behemoth(id));
        self.climb_jobs.retain(|_, job| job.behemoth != id);
        let me = CombatantRef::Behemoth(id);
        self.combat_pairs.retain(|_, pair| pair.target != me);
        self.behemoths.remove(&id)
    }

    /// Register a structure.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id is taken.
    pub fn add_structure(&mut self, mut structure: Structure) -> Result<(), WorldError> {
        if self.structures.contains_key(&structure.id) {
            return Err(WorldError::duplicate_structure(structure.id));
        }
        structure.position = self.clamp(structure.position);
        self.spatial
            .insert(EntityRef::Structure(structure.id), structure.position);
        self.structures.insert(structure.id, structure);
        Ok(())
    }

    /// Remove a structure.
    pub fn remove_structure(&mut self, id: StructureId) -> Option<Structure> {
        self.spatial.remove(EntityRef::Structure(id));
        self.structures.remove(&id)
    }

    /// Move any positioned entity, clamping into bounds.
    ///
    /// Updates the stored position and, if the entity is indexed, the index.
    /// Returns the applied position, or `None` for an unknown entity.
    pub fn move_entity(&mut self, entity: EntityRef, pos: Position) -> Option<Position> {
        let pos = self.clamp(pos);
        let slot = match entity {
            EntityRef::Actor(id) => &mut self.actors.get_mut(&id)?.position,
            EntityRef::Monster(id) => &mut self.monsters.get_mut(&id)?.position,
            EntityRef::Resource(id) => &mut self.resources.get_mut(&id)?.position,
            EntityRef::Behemoth(id) => &mut self.behemoths.get_mut(&id)?.position,
            EntityRef::Structure(id) => &mut self.structures.get_mut(&id)?.position,
        };
        *slot = pos;
        if self.spatial.contains(entity) {
            self.spatial.move_to(entity, pos);
        }
        Some(pos)
    }

    // -- Queries ------------------------------------------------------------

    /// Typed references to every indexed entity within `radius` of `pos`.
    pub fn entities_near(&self, pos: Position, radius: f64) -> Vec<EntityRef> {
        self.spatial.query_radius(pos, radius)
    }

    /// Actor ids within `radius` of `pos`, in id order.
    pub fn actors_near(&self, pos: Position, radius: f64) -> Vec<ActorId> {
        self.entities_near(pos, radius)
            .into_iter()
            .filter_map(|e| match e {
                EntityRef::Actor(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Stored position of any positioned entity.
    pub fn position_of(&self, entity: EntityRef) -> Option<Position> {
        match entity {
            EntityRef::Actor(id) => self.actors.get(&id).map(|a| a.position),
            EntityRef::Monster(id) => self.monsters.get(&id).map(|m| m.position),
            EntityRef::Resource(id) => self.resources.get(&id).map(|r| r.position),
            EntityRef::Behemoth(id) => self.behemoths.get(&id).map(|b| b.position),
            EntityRef::Structure(id) => self.structures.get(&id).map(|s| s.position),
        }
    }

    /// Stored position of a combatant.
    pub fn combatant_position(&self, who: CombatantRef) -> Option<Position> {
        self.position_of(EntityRef::from(who))
    }

    // -- Jobs ---------------------------------------------------------------

    /// Release an actor's gather lock. The resource returns to `available`
    /// unless it is depleted. Returns whether a lock was held.
    pub fn release_gather(&mut self, actor: ActorId) -> bool {
        let Some(job) = self.gather_jobs.remove(&actor) else {
            return false;
        };
        if let Some(node) = self.resources.get_mut(&job.resource)
            && node.state == ResourceState::BeingGathered
        {
            node.state = ResourceState::Available;
        }
        true
    }

    /// Release an actor's climb job. Returns whether one was held.
    pub fn release_climb(&mut self, actor: ActorId) -> bool {
        self.climb_jobs.remove(&actor).is_some()
    }

    /// Release every gather or climb job the actor holds.
    pub fn release_jobs(&mut self, actor: ActorId) {
        self.release_gather(actor);
        self.release_climb(actor);
    }

    // -- Persistence --------------------------------------------------------

    /// Copy every persistent collection into a [`WorldSnapshot`].
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick(),
            seed: self.seed,
            actors: self.actors.values().cloned().collect(),
            monsters: self.monsters.values().cloned().collect(),
            resources: self.resources.values().cloned().collect(),
            behemoths: self.behemoths.values().cloned().collect(),
            structures: self.structures.values().cloned().collect(),
            alliances: self.alliances.values().cloned().collect(),
            trades: self.trades.values().cloned().collect(),
            crafting_jobs: self.crafting_jobs.values().cloned().collect(),
            gather_jobs: self.gather_jobs.values().copied().collect(),
            climb_jobs: self.climb_jobs.values().copied().collect(),
            combat_pairs: self.combat_pairs.values().copied().collect(),
        }
    }

    /// Rebuild a world from a snapshot, re-deriving the spatial index.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid geometry or duplicate ids in the
    /// snapshot.
    pub fn restore(snapshot: WorldSnapshot, settings: WorldSettings) -> Result<Self, WorldError> {
        let mut world = Self::new(snapshot.seed, settings)?;
        world.clock = WorldClock::from_tick(snapshot.tick);
        for actor in snapshot.actors {
            world.add_actor(actor)?;
        }
        for monster in snapshot.monsters {
            world.add_monster(monster)?;
        }
        for node in snapshot.resources {
            world.add_resource(node)?;
        }
        for behemoth in snapshot.behemoths {
            world.add_behemoth(behemoth)?;
        }
        for structure in snapshot.structures {
            world.add_structure(structure)?;
        }
        world.alliances = snapshot.alliances.into_iter().map(|a| (a.id, a)).collect();
        world.trades = snapshot.trades.into_iter().map(|t| (t.id, t)).collect();
        world.crafting_jobs = snapshot
            .crafting_jobs
            .into_iter()
            .map(|j| (j.id, j))
            .collect();
        world.gather_jobs = snapshot
            .gather_jobs
            .into_iter()
            .map(|j| (j.actor, j))
            .collect();
        world.climb_jobs = snapshot
            .climb_jobs
            .into_iter()
            .map(|j| (j.actor, j))
            .collect();
        world.combat_pairs = snapshot
            .combat_pairs
            .into_iter()
            .map(|p| (p.attacker, p))
            .collect();
        debug!(
            tick = world.tick(),
            actors = world.actors.len(),
            indexed = world.spatial.len(),
            "world restored from snapshot"
        );
        Ok(world)
    }
}
