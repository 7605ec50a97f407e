use crate::types::{Coords, Workout, WorkoutId, WorkoutKind};
use chrono::{DateTime, FixedOffset};
use std::fmt;

/// Numeric form fields, named in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    Elevation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::Elevation => "elevation gain",
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is not a number: {raw:?}")]
    NotANumber { field: Field, raw: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: Field },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: Field, value: f64 },

    #[error("invalid location: lat={lat} lng={lng}")]
    InvalidLocation { lat: f64, lng: f64 },
}

/// Raw values as typed into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkoutForm {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

/// Parsed numeric input for one workout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutInput {
    Running {
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    },
    Cycling {
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    },
}

impl WorkoutInput {
    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// Converts the form's text fields into numbers.
///
/// An empty field reads as zero, the same as numeric coercion of an empty
/// input box. Only the fields relevant to `form.kind` are parsed.
pub fn parse_form(form: &WorkoutForm) -> Result<WorkoutInput, ValidationError> {
    let distance_km = parse_number(Field::Distance, &form.distance)?;
    let duration_min = parse_number(Field::Duration, &form.duration)?;

    Ok(match form.kind {
        WorkoutKind::Running => WorkoutInput::Running {
            distance_km,
            duration_min,
            cadence_spm: parse_number(Field::Cadence, &form.cadence)?,
        },
        WorkoutKind::Cycling => WorkoutInput::Cycling {
            distance_km,
            duration_min,
            elevation_gain_m: parse_number(Field::Elevation, &form.elevation)?,
        },
    })
}

fn parse_number(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse::<f64>().map_err(|_| ValidationError::NotANumber {
        field,
        raw: raw.to_string(),
    })
}

/// Checks `input` and `location`, then builds the entity in one step.
///
/// Distance, duration and (for running) cadence must be finite and strictly
/// positive. Cycling elevation gain only has to be finite: a negative value
/// records a net descent.
pub fn build_workout(
    input: WorkoutInput,
    location: Coords,
    created_at: DateTime<FixedOffset>,
) -> Result<Workout, ValidationError> {
    validate(&input, location)?;
    Ok(construct(WorkoutId::generate(), input, location, created_at))
}

/// Validation without construction; also used when rehydrating stored records.
pub fn validate(input: &WorkoutInput, location: Coords) -> Result<(), ValidationError> {
    if !location.is_valid() {
        return Err(ValidationError::InvalidLocation {
            lat: location.lat,
            lng: location.lng,
        });
    }

    match *input {
        WorkoutInput::Running {
            distance_km,
            duration_min,
            cadence_spm,
        } => {
            positive(Field::Distance, distance_km)?;
            positive(Field::Duration, duration_min)?;
            positive(Field::Cadence, cadence_spm)?;
        }
        WorkoutInput::Cycling {
            distance_km,
            duration_min,
            elevation_gain_m,
        } => {
            positive(Field::Distance, distance_km)?;
            positive(Field::Duration, duration_min)?;
            finite(Field::Elevation, elevation_gain_m)?;
        }
    }
    Ok(())
}

pub(crate) fn construct(
    id: WorkoutId,
    input: WorkoutInput,
    location: Coords,
    created_at: DateTime<FixedOffset>,
) -> Workout {
    match input {
        WorkoutInput::Running {
            distance_km,
            duration_min,
            cadence_spm,
        } => Workout::running(
            id,
            created_at,
            location,
            distance_km,
            duration_min,
            cadence_spm,
        ),
        WorkoutInput::Cycling {
            distance_km,
            duration_min,
            elevation_gain_m,
        } => Workout::cycling(
            id,
            created_at,
            location,
            distance_km,
            duration_min,
            elevation_gain_m,
        ),
    }
}

fn finite(field: Field, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::NotFinite { field })
    }
}

fn positive(field: Field, value: f64) -> Result<(), ValidationError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field, value })
    }
}
