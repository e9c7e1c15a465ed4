use glam::Vec3;
use std::collections::HashMap;

use crate::config::PointSchema;
use crate::types::PointRecord;

/// One resident point of the accumulated set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatedPoint {
    pub id: u32,
    pub position: Vec3,
    pub color: Option<Vec3>,
}

impl AccumulatedPoint {
    /// Record for the given schema. `None` for `PointSchema::Disabled`.
    pub fn to_record(&self, schema: PointSchema) -> Option<PointRecord> {
        match schema {
            PointSchema::Colored => Some(PointRecord::Colored {
                position: self.position,
                color: self.color.unwrap_or(Vec3::ZERO),
            }),
            PointSchema::Compact => Some(PointRecord::Compact {
                id: self.id,
                position: self.position,
            }),
            PointSchema::Disabled => None,
        }
    }
}

/// Deduplicates an id-addressed stream of observations into a growing point set.
///
/// Every id gets one slot the first time it is seen and keeps it; later
/// observations overwrite the slot in place. Nothing is ever evicted.
#[derive(Debug, Default, Clone)]
pub struct PointAccumulator {
    slots: HashMap<u32, usize>,
    ids: Vec<u32>,
    positions: Vec<Vec3>,
    colors: Vec<Option<Vec3>>,
}

impl PointAccumulator {
    pub fn new() -> PointAccumulator {
        PointAccumulator::default()
    }

    pub fn with_capacity(capacity: usize) -> PointAccumulator {
        PointAccumulator {
            slots: HashMap::with_capacity(capacity),
            ids: Vec::with_capacity(capacity),
            positions: Vec::with_capacity(capacity),
            colors: Vec::with_capacity(capacity),
        }
    }

    /// Inserts or overwrites the point for `id` and returns its slot.
    pub fn append_or_update(&mut self, id: u32, position: Vec3, color: Option<Vec3>) -> usize {
        if let Some(&slot) = self.slots.get(&id) {
            self.positions[slot] = position;
            self.colors[slot] = color;
            return slot;
        }
        let slot = self.positions.len();
        self.slots.insert(id, slot);
        self.ids.push(id);
        self.positions.push(position);
        self.colors.push(color);
        slot
    }

    /// Distinct ids ever assigned a slot.
    pub fn feature_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn slot_of(&self, id: u32) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn get(&self, id: u32) -> Option<AccumulatedPoint> {
        self.slot_of(id).map(|slot| self.point_at(slot))
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Every point in slot-assignment order.
    pub fn snapshot(&self) -> impl ExactSizeIterator<Item = AccumulatedPoint> + '_ {
        (0..self.positions.len()).map(|slot| self.point_at(slot))
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.ids.clear();
        self.positions.clear();
        self.colors.clear();
    }

    fn point_at(&self, slot: usize) -> AccumulatedPoint {
        AccumulatedPoint {
            id: self.ids[slot],
            position: self.positions[slot],
            color: self.colors[slot],
        }
    }
}
