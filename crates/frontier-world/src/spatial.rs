//! Uniform grid spatial index.
//!
//! The square world is divided into cells of `cell_size`. Every indexed
//! entity lives in exactly one cell, chosen by floor-division of its
//! coordinates. Radius queries inspect only the cells whose bounding boxes
//! intersect the query circle, then filter candidates by exact Euclidean
//! distance on their stored true position.
//!
//! Cells and per-cell sets are `BTreeMap`/`BTreeSet` so iteration order is
//! deterministic.

use std::collections::{BTreeMap, BTreeSet};

use frontier_types::{EntityRef, Position};

use crate::error::WorldError;

/// Integer cell coordinate.
pub type CellCoord = (i32, i32);

/// Grid index from cells to entity references.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Side length of a cell.
    cell_size: f64,
    /// Cell -> entities in that cell.
    cells: BTreeMap<CellCoord, BTreeSet<EntityRef>>,
    /// Entity -> true position, for exact distance filtering and removal.
    positions: BTreeMap<EntityRef, Position>,
}

impl SpatialIndex {
    /// Create an empty index.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidCellSize`] unless `cell_size` is finite
    /// and positive.
    pub fn new(cell_size: f64) -> Result<Self, WorldError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(WorldError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            cell_size,
            cells: BTreeMap::new(),
            positions: BTreeMap::new(),
        })
    }

    /// The configured cell size.
    pub const fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// The cell a coordinate pair falls into.
    pub fn cell_of(&self, pos: Position) -> CellCoord {
        (self.axis_cell(pos.x), self.axis_cell(pos.y))
    }

    // `as` saturates on out-of-range floats; world coordinates are bounded.
    #[allow(clippy::cast_possible_truncation)]
    fn axis_cell(&self, v: f64) -> i32 {
        (v / self.cell_size).floor() as i32
    }

    /// Index `entity` at `pos`. An entity already present is moved.
    pub fn insert(&mut self, entity: EntityRef, pos: Position) {
        if self.positions.contains_key(&entity) {
            self.remove(entity);
        }
        let cell = self.cell_of(pos);
        self.cells.entry(cell).or_default().insert(entity);
        self.positions.insert(entity, pos);
    }

    /// Drop `entity` from the index, returning its last position.
    pub fn remove(&mut self, entity: EntityRef) -> Option<Position> {
        let pos = self.positions.remove(&entity)?;
        let cell = self.cell_of(pos);
        if let Some(set) = self.cells.get_mut(&cell) {
            set.remove(&entity);
            if set.is_empty() {
                self.cells.remove(&cell);
            }
        }
        Some(pos)
    }

    /// Move `entity` to `pos` (remove then insert).
    pub fn move_to(&mut self, entity: EntityRef, pos: Position) {
        self.remove(entity);
        self.insert(entity, pos);
    }

    /// Stored position of an indexed entity.
    pub fn position(&self, entity: EntityRef) -> Option<Position> {
        self.positions.get(&entity).copied()
    }

    /// Whether `entity` is indexed.
    pub fn contains(&self, entity: EntityRef) -> bool {
        self.positions.contains_key(&entity)
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.positions.clear();
    }

    /// Every entity whose distance to `center` is at most `radius`.
    ///
    /// The boundary is inclusive. Results are sorted by entity reference.
    /// A negative or non-finite radius yields nothing.
    pub fn query_radius(&self, center: Position, radius: f64) -> Vec<EntityRef> {
        if !radius.is_finite() || radius < 0.0 || !center.is_finite() {
            return Vec::new();
        }
        let min_x = self.axis_cell(center.x - radius);
        let max_x = self.axis_cell(center.x + radius);
        let min_y = self.axis_cell(center.y - radius);
        let max_y = self.axis_cell(center.y + radius);

        let mut found = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                let Some(set) = self.cells.get(&(cx, cy)) else {
                    continue;
                };
                for entity in set {
                    let within = self
                        .positions
                        .get(entity)
                        .is_some_and(|p| p.distance_to(center) <= radius);
                    if within {
                        found.push(*entity);
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// Entities in the same cell as `pos`, unfiltered by distance.
    pub fn cell_members(&self, pos: Position) -> impl Iterator<Item = EntityRef> + '_ {
        self.cells
            .get(&self.cell_of(pos))
            .into_iter()
            .flatten()
            .copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use frontier_types::{ActorId, ResourceId};

    use super::*;

    fn make_index() -> SpatialIndex {
        SpatialIndex::new(100.0).unwrap()
    }

    #[test]
    fn rejects_bad_cell_size() {
        assert!(SpatialIndex::new(0.0).is_err());
        assert!(SpatialIndex::new(-5.0).is_err());
        assert!(SpatialIndex::new(f64::NAN).is_err());
    }

    #[test]
    fn cell_is_floor_division() {
        let idx = make_index();
        assert_eq!(idx.cell_of(Position::new(0.0, 0.0)), (0, 0));
        assert_eq!(idx.cell_of(Position::new(99.9, 100.0)), (0, 1));
        assert_eq!(idx.cell_of(Position::new(250.0, 1999.0)), (2, 19));
    }

    #[test]
    fn query_includes_boundary() {
        let mut idx = make_index();
        let a = EntityRef::Actor(ActorId::new());
        idx.insert(a, Position::new(130.0, 100.0));
        let hits = idx.query_radius(Position::new(100.0, 100.0), 30.0);
        assert_eq!(hits, vec![a]);
        let miss = idx.query_radius(Position::new(100.0, 100.0), 29.999);
        assert!(miss.is_empty());
    }

    #[test]
    fn query_spans_neighbor_cells() {
        let mut idx = make_index();
        let a = EntityRef::Actor(ActorId::new());
        let r = EntityRef::Resource(ResourceId::new());
        idx.insert(a, Position::new(98.0, 98.0));
        idx.insert(r, Position::new(102.0, 102.0));
        let mut hits = idx.query_radius(Position::new(100.0, 100.0), 5.0);
        hits.sort();
        assert_eq!(hits.len(), 2);
        assert!(hits.contains(&a));
        assert!(hits.contains(&r));
    }

    #[test]
    fn move_rehomes_entity() {
        let mut idx = make_index();
        let a = EntityRef::Actor(ActorId::new());
        idx.insert(a, Position::new(10.0, 10.0));
        idx.move_to(a, Position::new(510.0, 510.0));
        assert_eq!(idx.cell_members(Position::new(10.0, 10.0)).count(), 0);
        assert_eq!(idx.cell_members(Position::new(510.0, 510.0)).count(), 1);
        assert_eq!(idx.len(), 1);
        assert!(idx.query_radius(Position::new(10.0, 10.0), 50.0).is_empty());
    }

    #[test]
    fn remove_returns_last_position() {
        let mut idx = make_index();
        let a = EntityRef::Actor(ActorId::new());
        idx.insert(a, Position::new(42.0, 7.0));
        assert_eq!(idx.remove(a), Some(Position::new(42.0, 7.0)));
        assert!(idx.is_empty());
        assert_eq!(idx.remove(a), None);
    }

    #[test]
    fn negative_radius_finds_nothing() {
        let mut idx = make_index();
        idx.insert(EntityRef::Actor(ActorId::new()), Position::new(1.0, 1.0));
        assert!(idx.query_radius(Position::new(1.0, 1.0), -1.0).is_empty());
    }
}
