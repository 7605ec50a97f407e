use crate::app::Renderer;
use crate::dlog;
use crate::types::{Coords, Workout, WorkoutDetails, WorkoutId};
use std::io::{self, Write};

/// One line per workout, the terminal version of a list entry:
///
/// `<id>  Running on March 7  5.2 km  24 min  4.6 min/km  178 spm`
pub fn format_entry(w: &Workout) -> String {
    let metrics = match w.details() {
        WorkoutDetails::Running {
            cadence_spm,
            pace_min_per_km,
        } => format!("{pace_min_per_km:.1} min/km  {cadence_spm} spm"),
        WorkoutDetails::Cycling {
            elevation_gain_m,
            speed_km_per_h,
        } => format!("{speed_km_per_h:.1} km/h  {elevation_gain_m} m"),
    };
    format!(
        "{}  {}  {} km  {} min  {metrics}",
        w.id(),
        w.description(),
        w.distance_km(),
        w.duration_min()
    )
}

/// Marker popup text.
pub fn format_popup(w: &Workout) -> String {
    let icon = match w.details() {
        WorkoutDetails::Running { .. } => "🏃",
        WorkoutDetails::Cycling { .. } => "🚴",
    };
    format!("{icon} {}", w.description())
}

/// Renders list entries and map focus as text lines.
///
/// There is no map in a terminal; markers, centring and form visibility are
/// only logged. List output can be switched off, e.g. while bootstrapping a
/// command that prints just one workout.
pub struct TerminalRenderer<W> {
    out: W,
    listing: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub const fn new(out: W) -> Self {
        Self { out, listing: true }
    }

    pub fn set_listing(&mut self, listing: bool) {
        self.listing = listing;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, s: &str) {
        if let Err(e) = writeln!(self.out, "{s}") {
            tracing::warn!(err = %e, "writing output failed");
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn center_map(&mut self, center: Coords, zoom: u8) {
        dlog!("map_center center={center} zoom={zoom}");
    }

    fn show_form(&mut self, location: Coords) {
        dlog!("form_open location={location}");
    }

    fn hide_form(&mut self) {
        dlog!("form_closed");
    }

    fn render_list_entry(&mut self, workout: &Workout) {
        if self.listing {
            self.line(&format_entry(workout));
        }
    }

    fn render_marker(&mut self, workout: &Workout) {
        dlog!(
            "marker id={} at={} popup={:?}",
            workout.id(),
            workout.location(),
            format_popup(workout)
        );
    }

    fn pan_to(&mut self, id: &WorkoutId, location: Coords, zoom: u8) {
        self.line(&format!("map centred on {id} at {location} (zoom {zoom})"));
    }

    fn clear(&mut self) {
        dlog!("cleared list and markers");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn ts() -> chrono::DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 7, 0, 0)
            .unwrap()
    }

    #[test]
    fn entry_lines() {
        let at = Coords::new(1.0, 2.0);
        let run = Workout::running(WorkoutId::from("r"), ts(), at, 5.2, 24.0, 178.0);
        assert_eq!(
            format_entry(&run),
            "r  Running on March 7  5.2 km  24 min  4.6 min/km  178 spm"
        );

        let ride = Workout::cycling(WorkoutId::from("c"), ts(), at, 27.0, 95.0, 523.0);
        assert_eq!(
            format_entry(&ride),
            "c  Cycling on March 7  27 km  95 min  17.1 km/h  523 m"
        );
        assert_eq!(format_popup(&ride), "🚴 Cycling on March 7");
    }

    #[test]
    fn listing_can_be_switched_off() {
        let at = Coords::new(1.0, 2.0);
        let run = Workout::running(WorkoutId::from("r"), ts(), at, 5.0, 25.0, 170.0);
        let mut r = TerminalRenderer::new(Vec::new());

        r.set_listing(false);
        r.render_list_entry(&run);
        r.set_listing(true);
        r.render_list_entry(&run);
        r.pan_to(run.id(), run.location(), 13);

        let out = String::from_utf8(r.into_inner()).unwrap();
        assert_eq!(
            out,
            "r  Running on March 7  5 km  25 min  5.0 min/km  170 spm\n\
             map centred on r at 1.00000,2.00000 (zoom 13)\n"
        );
    }
}
