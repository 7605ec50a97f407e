use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A latitude/longitude pair as produced by the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque workout identifier, the join key between list entries and markers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WorkoutId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Variant-specific payload: the user-supplied field plus its derived metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkoutDetails {
    Running {
        cadence_spm: f64,
        pace_min_per_km: f64,
    },
    Cycling {
        elevation_gain_m: f64,
        speed_km_per_h: f64,
    },
}

/// An immutable workout entity.
///
/// Fields are private; the derived metric and description are computed once,
/// at construction, from the base fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<FixedOffset>,
    location: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    details: WorkoutDetails,
}

impl Workout {
    /// Builds a running workout. Inputs are assumed validated
    /// (see [`crate::validate::build_workout`]).
    pub(crate) fn running(
        id: WorkoutId,
        created_at: DateTime<FixedOffset>,
        location: Coords,
        distance_km: f64,
        duration_min: f64,
        cadence_spm: f64,
    ) -> Self {
        Self {
            id,
            created_at,
            location,
            distance_km,
            duration_min,
            description: describe(WorkoutKind::Running, &created_at),
            details: WorkoutDetails::Running {
                cadence_spm,
                pace_min_per_km: pace(distance_km, duration_min),
            },
        }
    }

    /// Builds a cycling workout. Inputs are assumed validated.
    pub(crate) fn cycling(
        id: WorkoutId,
        created_at: DateTime<FixedOffset>,
        location: Coords,
        distance_km: f64,
        duration_min: f64,
        elevation_gain_m: f64,
    ) -> Self {
        Self {
            id,
            created_at,
            location,
            distance_km,
            duration_min,
            description: describe(WorkoutKind::Cycling, &created_at),
            details: WorkoutDetails::Cycling {
                elevation_gain_m,
                speed_km_per_h: speed(distance_km, duration_min),
            },
        }
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.id
    }

    pub const fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }

    pub const fn location(&self) -> Coords {
        self.location
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn details(&self) -> WorkoutDetails {
        self.details
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Running { .. } => WorkoutKind::Running,
            WorkoutDetails::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    pub const fn pace_min_per_km(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Running {
                pace_min_per_km, ..
            } => Some(pace_min_per_km),
            WorkoutDetails::Cycling { .. } => None,
        }
    }

    pub const fn speed_km_per_h(&self) -> Option<f64> {
        match self.details {
            WorkoutDetails::Cycling { speed_km_per_h, .. } => Some(speed_km_per_h),
            WorkoutDetails::Running { .. } => None,
        }
    }
}

/// Minutes per kilometre.
pub fn pace(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// Kilometres per hour.
pub fn speed(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

/// "Running on March 7": kind label, full month name, day of month without padding.
pub fn describe(kind: WorkoutKind, created_at: &DateTime<FixedOffset>) -> String {
    let month = MONTHS[created_at.month0() as usize];
    format!("{} on {month} {}", kind.label(), created_at.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn march_7() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 9, 30, 0)
            .unwrap()
    }

    #[test]
    fn running_derives_pace_and_description() {
        let w = Workout::running(
            WorkoutId::from("r1"),
            march_7(),
            Coords::new(50.1, 8.6),
            5.2,
            24.0,
            178.0,
        );

        assert_eq!(w.kind(), WorkoutKind::Running);
        assert_eq!(w.description(), "Running on March 7");
        assert_eq!(w.pace_min_per_km(), Some(24.0 / 5.2));
        assert!((w.pace_min_per_km().unwrap() - 4.615).abs() < 1e-3);
        assert_eq!(w.speed_km_per_h(), None);
    }

    #[test]
    fn cycling_derives_speed() {
        let w = Workout::cycling(
            WorkoutId::from("c1"),
            march_7(),
            Coords::new(50.1, 8.6),
            27.0,
            95.0,
            523.0,
        );

        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert_eq!(w.description(), "Cycling on March 7");
        assert_eq!(w.speed_km_per_h(), Some(27.0 / (95.0 / 60.0)));
        assert!((w.speed_km_per_h().unwrap() - 17.05).abs() < 1e-2);
        assert_eq!(w.pace_min_per_km(), None);
    }

    #[test]
    fn derived_metrics_follow_their_formulas() {
        let cases = [
            (0.0001, 0.5),
            (1.0, 1.0),
            (3.3, 17.25),
            (10.0, 60.0),
            (42.195, 183.4),
            (160.9, 410.0),
            (0.7, 1440.0),
        ];
        for (distance, duration) in cases {
            let run = Workout::running(
                WorkoutId::generate(),
                march_7(),
                Coords::new(0.0, 0.0),
                distance,
                duration,
                170.0,
            );
            assert_eq!(run.pace_min_per_km(), Some(duration / distance));

            let ride = Workout::cycling(
                WorkoutId::generate(),
                march_7(),
                Coords::new(0.0, 0.0),
                distance,
                duration,
                0.0,
            );
            assert_eq!(ride.speed_km_per_h(), Some(distance / (duration / 60.0)));
        }
    }

    #[test]
    fn describe_is_stable_and_uses_the_stored_offset() {
        let first = describe(WorkoutKind::Cycling, &march_7());
        for _ in 0..3 {
            assert_eq!(describe(WorkoutKind::Cycling, &march_7()), first);
        }

        // 23:30 UTC on Dec 31 is already Jan 1 at +02:00.
        let ts = FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 1, 1, 30, 0)
            .unwrap();
        assert_eq!(describe(WorkoutKind::Running, &ts), "Running on January 1");
    }

    #[test]
    fn coords_validity() {
        assert!(Coords::new(50.1, 8.6).is_valid());
        assert!(Coords::new(-90.0, 180.0).is_valid());
        assert!(!Coords::new(90.5, 0.0).is_valid());
        assert!(!Coords::new(0.0, -181.0).is_valid());
        assert!(!Coords::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn coords_serialize_as_pair() {
        let json = serde_json::to_string(&Coords::new(50.1, 8.6)).unwrap();
        assert_eq!(json, "[50.1,8.6]");
        let back: Coords = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Coords::new(50.1, 8.6));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(WorkoutId::generate(), WorkoutId::generate());
    }
}
