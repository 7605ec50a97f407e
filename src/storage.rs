use crate::store::WorkoutStore;
use crate::types::{Coords, Workout, WorkoutDetails, WorkoutId, WorkoutKind};
use crate::dlog;
use crate::validate::{self, ValidationError, WorkoutInput};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Slot holding the JSON array of workout records.
pub const WORKOUTS_KEY: &str = "workouts";
/// Sibling slot holding the schema version of [`WORKOUTS_KEY`].
pub const VERSION_KEY: &str = "workouts.version";
pub const SCHEMA_VERSION: u32 = 1;

/// Durable string-keyed slots, the shape of browser local storage.
pub trait SlotStore {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    /// Overwrites any previous value.
    fn write(&mut self, key: &str, value: &str) -> io::Result<()>;
    fn remove(&mut self, key: &str) -> io::Result<()>;
}

/// One `<key>.json` file per slot inside a data directory.
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStore for FileSlots {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemorySlots {
    slots: HashMap<String, String>,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SlotStore for MemorySlots {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> io::Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> io::Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage slot {key:?}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("encoding workouts: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Flat persisted form of a [`Workout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    pub id: WorkoutId,
    pub created_at: DateTime<FixedOffset>,
    pub location: Coords,
    pub distance_km: f64,
    pub duration_min: f64,
    pub kind: WorkoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence_spm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_min_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation_gain_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_km_per_h: Option<f64>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("{kind} record {id} is missing {field}")]
    MissingField {
        id: WorkoutId,
        kind: WorkoutKind,
        field: &'static str,
    },

    #[error("record {id}: {source}")]
    Invalid {
        id: WorkoutId,
        #[source]
        source: ValidationError,
    },
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let (cadence_spm, elevation_gain_m) = match w.details() {
            WorkoutDetails::Running { cadence_spm, .. } => (Some(cadence_spm), None),
            WorkoutDetails::Cycling {
                elevation_gain_m, ..
            } => (None, Some(elevation_gain_m)),
        };

        Self {
            id: w.id().clone(),
            created_at: w.created_at(),
            location: w.location(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            kind: w.kind(),
            cadence_spm,
            pace_min_per_km: w.pace_min_per_km(),
            elevation_gain_m,
            speed_km_per_h: w.speed_km_per_h(),
            description: w.description().to_string(),
        }
    }
}

impl TryFrom<WorkoutRecord> for Workout {
    type Error = RecordError;

    /// Rebuilds a typed entity, re-deriving pace/speed and description from
    /// the base fields rather than trusting the stored copies.
    fn try_from(r: WorkoutRecord) -> Result<Self, Self::Error> {
        let missing = |field| RecordError::MissingField {
            id: r.id.clone(),
            kind: r.kind,
            field,
        };

        let input = match r.kind {
            WorkoutKind::Running => WorkoutInput::Running {
                distance_km: r.distance_km,
                duration_min: r.duration_min,
                cadence_spm: r.cadence_spm.ok_or_else(|| missing("cadenceSpm"))?,
            },
            WorkoutKind::Cycling => WorkoutInput::Cycling {
                distance_km: r.distance_km,
                duration_min: r.duration_min,
                elevation_gain_m: r.elevation_gain_m.ok_or_else(|| missing("elevationGainM"))?,
            },
        };

        validate::validate(&input, r.location).map_err(|source| RecordError::Invalid {
            id: r.id.clone(),
            source,
        })?;

        let workout = validate::construct(r.id, input, r.location, r.created_at);
        if workout.description() != r.description {
            dlog!(
                "description_rederived id={} stored={:?} derived={:?}",
                workout.id(),
                r.description,
                workout.description()
            );
        }
        Ok(workout)
    }
}

/// Saves and loads the workout store through a [`SlotStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    slots: S,
}

impl<S: SlotStore> Persistence<S> {
    pub const fn new(slots: S) -> Self {
        Self { slots }
    }

    pub const fn slots(&self) -> &S {
        &self.slots
    }

    /// Serialises the whole store, overwriting whatever was saved before.
    pub fn save(&mut self, store: &WorkoutStore) -> Result<(), PersistenceError> {
        let records: Vec<WorkoutRecord> = store.iter().map(WorkoutRecord::from).collect();
        let json = serde_json::to_string(&records)?;

        self.write(WORKOUTS_KEY, &json)?;
        self.write(VERSION_KEY, &SCHEMA_VERSION.to_string())?;

        tracing::info!(count = records.len(), key = WORKOUTS_KEY, "saved workouts");
        Ok(())
    }

    /// Reads back the saved workouts.
    ///
    /// Never fails: a missing or unreadable slot yields an empty list, and
    /// individual records that cannot be rebuilt are skipped.
    pub fn load(&self) -> Vec<Workout> {
        match self.read_version() {
            Some(v) if v > SCHEMA_VERSION => {
                tracing::warn!(
                    version = v,
                    supported = SCHEMA_VERSION,
                    "saved workouts use a newer schema; starting empty"
                );
                return Vec::new();
            }
            _ => {}
        }

        let raw = match self.slots.read(WORKOUTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                dlog!("no_saved_workouts key={WORKOUTS_KEY}");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(err = %e, key = WORKOUTS_KEY, "cannot read saved workouts; starting empty");
                return Vec::new();
            }
        };

        let items: Vec<JsonValue> = match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(err = %e, key = WORKOUTS_KEY, "saved workouts are unreadable; starting empty");
                return Vec::new();
            }
        };

        let total = items.len();
        let workouts: Vec<Workout> = items
            .into_iter()
            .filter_map(|item| {
                let record = serde_json::from_value::<WorkoutRecord>(item)
                    .map_err(|e| tracing::warn!(err = %e, "skipping malformed workout record"))
                    .ok()?;
                Workout::try_from(record)
                    .map_err(|e| tracing::warn!(err = %e, "skipping invalid workout record"))
                    .ok()
            })
            .collect();

        tracing::info!(
            count = workouts.len(),
            skipped = total - workouts.len(),
            "loaded workouts"
        );
        workouts
    }

    /// Forgets everything saved.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        for key in [WORKOUTS_KEY, VERSION_KEY] {
            self.slots.remove(key).map_err(|source| PersistenceError::Io {
                key: key.to_string(),
                source,
            })?;
        }
        tracing::info!("cleared saved workouts");
        Ok(())
    }

    fn read_version(&self) -> Option<u32> {
        let raw = self.slots.read(VERSION_KEY).ok().flatten()?;
        match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(raw = %raw, "ignoring unreadable schema version");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.slots
            .write(key, value)
            .map_err(|source| PersistenceError::Io {
                key: key.to_string(),
                source,
            })
    }
}
