use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::draws::DrawSource;
use crate::types::{Item, ItemId};

/// How fitness values are assigned to the pool
#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FitnessModel {
    /// Every item gets a fresh uniform draw
    Uniform,
    /// Uniform draws, then `item` is pinned to `fitness`
    Dominant { item: ItemId, fitness: f64 },
}

impl Default for FitnessModel {
    fn default() -> Self {
        FitnessModel::Uniform
    }
}

impl FitnessModel {
    pub fn is_uniform(&self) -> bool {
        matches!(self, FitnessModel::Uniform)
    }
}

/// The fixed candidate pool of one trial
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    items: Vec<Item>,
}

impl Workload {
    /// Draw fitness for `size` items in id order.
    ///
    /// Must run before any scheduling draw on the same source.
    pub fn generate(size: usize, model: &FitnessModel, draws: &mut DrawSource) -> Self {
        let mut items: Vec<Item> = (0..size)
            .map(|id| Item {
                id,
                fitness: draws.fit(),
            })
            .collect();
        if let FitnessModel::Dominant { item, fitness } = *model {
            if let Some(it) = items.get_mut(item) {
                it.fitness = fitness;
            }
        }
        Self { items }
    }

    pub fn from_fitness(fitness: impl IntoIterator<Item = f64>) -> Self {
        Self {
            items: fitness
                .into_iter()
                .enumerate()
                .map(|(id, fitness)| Item { id, fitness })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }
}

impl Index<ItemId> for Workload {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.items[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_draw_order() {
        let workload = Workload::generate(5, &FitnessModel::Uniform, &mut DrawSource::new(3));
        let mut draws = DrawSource::new(3);
        for (expected_id, item) in workload.iter().enumerate() {
            assert_eq!(item.id, expected_id);
            assert_eq!(item.fitness, draws.fit());
        }
    }

    #[test]
    fn dominant_keeps_call_order() {
        let model = FitnessModel::Dominant { item: 2, fitness: 0.999 };
        let mut a = DrawSource::new(11);
        let mut b = DrawSource::new(11);
        let dominant = Workload::generate(4, &model, &mut a);
        let uniform = Workload::generate(4, &FitnessModel::Uniform, &mut b);

        assert_eq!(dominant.get(2).unwrap().fitness, 0.999);
        assert_eq!(dominant.get(0), uniform.get(0));
        assert_eq!(dominant.get(3), uniform.get(3));
        // both sources are at the same position afterwards
        assert_eq!(a.fit(), b.fit());
    }

    #[test]
    fn dominant_out_of_range_is_ignored() {
        let model = FitnessModel::Dominant { item: 10, fitness: 0.5 };
        let workload = Workload::generate(3, &model, &mut DrawSource::new(0));
        assert_eq!(workload.len(), 3);
    }

    #[test]
    fn empty_pool() {
        let workload = Workload::generate(0, &FitnessModel::Uniform, &mut DrawSource::new(0));
        assert!(workload.is_empty());
    }
}
