use crate::types::{Workout, WorkoutId};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no workout with id {id}")]
pub struct NotFound {
    pub id: WorkoutId,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("a workout with id {id} already exists")]
pub struct DuplicateId {
    pub id: WorkoutId,
}

/// Session workouts in insertion order, which is also display order.
#[derive(Debug, Default, Clone)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `workout` at the end. An id already in the store is rejected and
    /// the store is left unchanged.
    pub fn append(&mut self, workout: Workout) -> Result<(), DuplicateId> {
        if self.workouts.iter().any(|w| w.id() == workout.id()) {
            return Err(DuplicateId {
                id: workout.id().clone(),
            });
        }
        self.workouts.push(workout);
        Ok(())
    }

    pub fn find_by_id(&self, id: &WorkoutId) -> Result<&Workout, NotFound> {
        self.workouts
            .iter()
            .find(|w| w.id() == id)
            .ok_or_else(|| NotFound { id: id.clone() })
    }

    /// Replaces the whole collection. Later entries repeating an earlier id
    /// are dropped; returns how many were dropped.
    pub fn replace_all(&mut self, workouts: Vec<Workout>) -> usize {
        let before = workouts.len();
        let mut seen = HashSet::with_capacity(before);
        self.workouts = workouts
            .into_iter()
            .filter(|w| seen.insert(w.id().clone()))
            .collect();

        let dropped = before - self.workouts.len();
        if dropped > 0 {
            tracing::warn!(dropped, "dropped workouts with duplicate ids");
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.workouts.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Workout> {
        self.workouts.iter()
    }

    pub fn as_slice(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}

impl<'a> IntoIterator for &'a WorkoutStore {
    type Item = &'a Workout;
    type IntoIter = std::slice::Iter<'a, Workout>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
