//! Event-driven coordinator between the UI collaborator and the core.
//!
//! Everything runs on the caller's thread, one event at a time: a location
//! result, a map click, a form submission, a list click. A submitted workout
//! is appended, rendered and then persisted, strictly in that order.

use crate::dlog;
use crate::storage::{Persistence, PersistenceError, SlotStore};
use crate::store::{DuplicateId, NotFound, WorkoutStore};
use crate::types::{Coords, Workout, WorkoutId};
use crate::validate::{self, ValidationError, WorkoutForm};
use chrono::{DateTime, FixedOffset, Local};

pub const MAP_ZOOM_LEVEL: u8 = 13;

/// Drawing side of the UI: list entries, map markers, the input form.
pub trait Renderer {
    fn center_map(&mut self, center: Coords, zoom: u8);
    fn show_form(&mut self, location: Coords);
    fn hide_form(&mut self);
    fn render_list_entry(&mut self, workout: &Workout);
    fn render_marker(&mut self, workout: &Workout);
    /// Pan the map to the workout's marker.
    fn pan_to(&mut self, id: &WorkoutId, location: Coords, zoom: u8);
    /// Remove every list entry and marker.
    fn clear(&mut self);
}

/// The location provider could not produce a position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("could not get your position: {reason}")]
pub struct LocationError {
    pub reason: String,
}

impl LocationError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    LocationUnavailable(#[from] LocationError),

    #[error("the map is not loaded yet; a position is needed first")]
    MapNotReady,

    #[error("no map location selected; click the map first")]
    NoPendingLocation,

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    DuplicateId(#[from] DuplicateId),

    #[error("saving workouts failed: {0}")]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Bootstrapping,
    Idle,
    AwaitingFormInput { location: Coords },
}

type Clock = Box<dyn Fn() -> DateTime<FixedOffset>>;

pub struct App<S, R> {
    state: AppState,
    store: WorkoutStore,
    persistence: Persistence<S>,
    renderer: R,
    map_center: Option<Coords>,
    clock: Clock,
}

impl<S: SlotStore, R: Renderer> App<S, R> {
    pub fn new(slots: S, renderer: R) -> Self {
        Self {
            state: AppState::Bootstrapping,
            store: WorkoutStore::new(),
            persistence: Persistence::new(slots),
            renderer,
            map_center: None,
            clock: Box::new(|| Local::now().fixed_offset()),
        }
    }

    /// Replaces the source of creation timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<FixedOffset> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub const fn state(&self) -> AppState {
        self.state
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub const fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub const fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub const fn map_center(&self) -> Option<Coords> {
        self.map_center
    }

    pub fn workout(&self, id: &WorkoutId) -> Result<&Workout, NotFound> {
        self.store.find_by_id(id)
    }

    /// Rehydrates the store and lists every saved workout.
    ///
    /// Markers are drawn too if the map is already centred; otherwise they
    /// wait for [`Self::on_location`].
    pub fn bootstrap(&mut self) {
        if self.state != AppState::Bootstrapping {
            dlog!("bootstrap_skipped state={:?}", self.state);
            return;
        }

        let saved = self.persistence.load();
        self.store.replace_all(saved);
        let map_ready = self.map_center.is_some();
        for w in &self.store {
            self.renderer.render_list_entry(w);
            if map_ready {
                self.renderer.render_marker(w);
            }
        }

        self.transition(AppState::Idle);
    }

    /// Handles the location provider's one-shot answer.
    ///
    /// On success the map is centred there and markers are drawn for every
    /// workout already in the store. Once the map is centred, later answers
    /// are ignored; after a failure a new answer is accepted.
    pub fn on_location(&mut self, result: Result<Coords, LocationError>) -> Result<(), AppError> {
        if let Some(center) = self.map_center {
            dlog!("location_ignored map_center={center}");
            return Ok(());
        }

        let center = result.and_then(|c| {
            if c.is_valid() {
                Ok(c)
            } else {
                Err(LocationError::new(format!("position out of range: {c}")))
            }
        });

        let center = match center {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(err = %e, "location unavailable");
                return Err(e.into());
            }
        };

        self.map_center = Some(center);
        self.renderer.center_map(center, MAP_ZOOM_LEVEL);
        for w in &self.store {
            self.renderer.render_marker(w);
        }
        tracing::info!(center = %center, markers = self.store.len(), "map ready");
        Ok(())
    }

    /// A click on the map opens the form for that spot.
    ///
    /// Clicking again while the form is open moves the pending location.
    pub fn on_map_click(&mut self, at: Coords) -> Result<(), AppError> {
        if self.map_center.is_none() || self.state == AppState::Bootstrapping {
            return Err(AppError::MapNotReady);
        }
        if !at.is_valid() {
            return Err(ValidationError::InvalidLocation {
                lat: at.lat,
                lng: at.lng,
            }
            .into());
        }

        self.renderer.show_form(at);
        self.transition(AppState::AwaitingFormInput { location: at });
        Ok(())
    }

    /// Validates the form and, on success, appends, renders and persists
    /// the new workout.
    ///
    /// A validation failure leaves the form open and changes nothing. A
    /// persistence failure is reported after the workout has already been
    /// appended and rendered; it stays in the session.
    pub fn submit(&mut self, form: &WorkoutForm) -> Result<WorkoutId, AppError> {
        let AppState::AwaitingFormInput { location } = self.state else {
            return Err(AppError::NoPendingLocation);
        };

        let workout = validate::parse_form(form)
            .and_then(|input| validate::build_workout(input, location, (self.clock)()))
            .map_err(|e| {
                tracing::info!(err = %e, kind = %form.kind, "rejected workout input");
                e
            })?;

        let id = workout.id().clone();

        self.store.append(workout.clone())?;
        self.renderer.render_marker(&workout);
        self.renderer.render_list_entry(&workout);
        self.renderer.hide_form();
        self.transition(AppState::Idle);
        tracing::info!(id = %id, kind = %workout.kind(), "workout added");

        if let Err(e) = self.persistence.save(&self.store) {
            tracing::error!(err = %e, "could not save workouts");
            return Err(e.into());
        }
        Ok(id)
    }

    /// Closes the form without creating anything.
    pub fn cancel_form(&mut self) {
        if let AppState::AwaitingFormInput { .. } = self.state {
            self.renderer.hide_form();
            self.transition(AppState::Idle);
        }
    }

    /// Pans the map to a listed workout.
    pub fn focus(&mut self, id: &WorkoutId) -> Result<(), AppError> {
        if self.map_center.is_none() {
            return Err(AppError::MapNotReady);
        }
        let w = self.store.find_by_id(id)?;
        self.renderer.pan_to(w.id(), w.location(), MAP_ZOOM_LEVEL);
        dlog!("focus id={id}");
        Ok(())
    }

    /// Deletes all saved and in-memory workouts.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.persistence.reset()?;
        self.store.clear();
        self.renderer.clear();
        if let AppState::AwaitingFormInput { .. } = self.state {
            self.renderer.hide_form();
        }
        self.transition(AppState::Idle);
        Ok(())
    }

    fn transition(&mut self, next: AppState) {
        dlog!("state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySlots, WORKOUTS_KEY};
    use crate::types::WorkoutKind;
    use chrono::TimeZone;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl Renderer for Recorder {
        fn center_map(&mut self, center: Coords, zoom: u8) {
            self.events.push(format!("center {center} z{zoom}"));
        }
        fn show_form(&mut self, _: Coords) {
            self.events.push("show_form".into());
        }
        fn hide_form(&mut self) {
            self.events.push("hide_form".into());
        }
        fn render_list_entry(&mut self, w: &Workout) {
            self.events.push(format!("list {}", w.description()));
        }
        fn render_marker(&mut self, w: &Workout) {
            self.events.push(format!("marker {}", w.description()));
        }
        fn pan_to(&mut self, id: &WorkoutId, _: Coords, zoom: u8) {
            self.events.push(format!("pan {id} z{zoom}"));
        }
        fn clear(&mut self) {
            self.events.push("clear".into());
        }
    }

    fn app() -> App<MemorySlots, Recorder> {
        App::new(MemorySlots::new(), Recorder::default()).with_clock(|| {
            FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 3, 7, 8, 0, 0)
                .unwrap()
        })
    }

    fn run_form(distance: &str) -> WorkoutForm {
        WorkoutForm {
            kind: WorkoutKind::Running,
            distance: distance.into(),
            duration: "24".into(),
            cadence: "178".into(),
            elevation: String::new(),
        }
    }

    fn ready(app: &mut App<MemorySlots, Recorder>) {
        app.bootstrap();
        app.on_location(Ok(Coords::new(50.1, 8.6))).unwrap();
    }

    #[test]
    fn submit_appends_renders_and_persists() {
        let mut app = app();
        ready(&mut app);
        app.on_map_click(Coords::new(50.11, 8.61)).unwrap();
        assert_eq!(
            app.state(),
            AppState::AwaitingFormInput {
                location: Coords::new(50.11, 8.61)
            }
        );

        let id = app.submit(&run_form("5.2")).unwrap();

        assert_eq!(app.state(), AppState::Idle);
        let w = app.workout(&id).unwrap();
        assert_eq!(w.location(), Coords::new(50.11, 8.61));
        assert_eq!(w.description(), "Running on March 7");
        assert!(app.persistence().slots().read(WORKOUTS_KEY).unwrap().is_some());
        assert_eq!(
            app.renderer().events[1..],
            [
                "show_form",
                "marker Running on March 7",
                "list Running on March 7",
                "hide_form"
            ]
        );
    }

    #[test]
    fn invalid_submit_keeps_form_open_and_state_unchanged() {
        let mut app = app();
        ready(&mut app);
        app.on_map_click(Coords::new(50.11, 8.61)).unwrap();

        let err = app.submit(&run_form("0")).unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(matches!(app.state(), AppState::AwaitingFormInput { .. }));
        assert!(app.store().is_empty());
        assert_eq!(app.persistence().slots().read(WORKOUTS_KEY).unwrap(), None);
    }

    #[test]
    fn submit_without_click_is_rejected() {
        let mut app = app();
        ready(&mut app);
        assert!(matches!(
            app.submit(&run_form("5")),
            Err(AppError::NoPendingLocation)
        ));
    }

    #[test]
    fn location_failure_keeps_list_but_blocks_clicks() {
        let mut app = app();
        app.bootstrap();

        let err = app
            .on_location(Err(LocationError::new("permission denied")))
            .unwrap_err();
        assert!(matches!(err, AppError::LocationUnavailable(_)));
        assert_eq!(app.state(), AppState::Idle);
        assert!(matches!(
            app.on_map_click(Coords::new(1.0, 1.0)),
            Err(AppError::MapNotReady)
        ));
    }

    #[test]
    fn bootstrap_lists_saved_workouts_and_markers_follow_the_map() {
        let mut first = app();
        ready(&mut first);
        first.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        first.submit(&run_form("5")).unwrap();
        let slots = first.persistence().slots().clone();

        let mut second = App::new(slots, Recorder::default());
        second.bootstrap();
        assert_eq!(second.store().len(), 1);
        assert_eq!(second.renderer().events, ["list Running on March 7"]);

        second.on_location(Ok(Coords::new(50.0, 8.0))).unwrap();
        assert_eq!(
            second.renderer().events[1..],
            ["center 50.00000,8.00000 z13", "marker Running on March 7"]
        );
    }

    #[test]
    fn location_before_bootstrap_still_draws_saved_markers() {
        let mut first = app();
        ready(&mut first);
        first.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        first.submit(&run_form("5")).unwrap();
        let slots = first.persistence().slots().clone();

        let mut second = App::new(slots, Recorder::default());
        second.on_location(Ok(Coords::new(50.0, 8.0))).unwrap();
        second.bootstrap();

        assert_eq!(
            second.renderer().events,
            [
                "center 50.00000,8.00000 z13",
                "list Running on March 7",
                "marker Running on March 7"
            ]
        );
    }

    #[test]
    fn only_the_first_location_centres_the_map() {
        let mut app = app();
        app.bootstrap();
        assert!(app.on_location(Err(LocationError::new("timeout"))).is_err());
        app.on_location(Ok(Coords::new(50.0, 8.0))).unwrap();
        app.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        app.submit(&run_form("5")).unwrap();
        let drawn = app.renderer().events.len();

        app.on_location(Ok(Coords::new(10.0, 10.0))).unwrap();

        assert_eq!(app.renderer().events.len(), drawn);
        assert_eq!(app.map_center(), Some(Coords::new(50.0, 8.0)));
    }

    #[test]
    fn focus_pans_to_known_ids_only() {
        let mut app = app();
        ready(&mut app);
        app.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        let id = app.submit(&run_form("5")).unwrap();

        app.focus(&id).unwrap();
        assert_eq!(
            app.renderer().events.last().map(String::as_str),
            Some(format!("pan {id} z13").as_str())
        );

        assert!(matches!(
            app.focus(&WorkoutId::from("nope")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn cancel_and_reset() {
        let mut app = app();
        ready(&mut app);
        app.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        app.cancel_form();
        assert_eq!(app.state(), AppState::Idle);

        app.on_map_click(Coords::new(50.0, 8.0)).unwrap();
        app.submit(&run_form("5")).unwrap();
        app.reset().unwrap();

        assert!(app.store().is_empty());
        assert!(app.persistence().load().is_empty());
        assert_eq!(app.renderer().events.last().map(String::as_str), Some("clear"));
    }
}
