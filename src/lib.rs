//! Workout logger core: typed running/cycling entities with derived pace and
//! speed, an ordered session store, slot-based persistence and the event
//! state machine a map UI drives.

pub mod app;
pub mod cli;
pub mod render;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
pub mod validate;

pub use app::{App, AppError, AppState, LocationError, Renderer};
pub use storage::{FileSlots, MemorySlots, Persistence, SlotStore};
pub use store::{DuplicateId, NotFound, WorkoutStore};
pub use types::{Coords, Workout, WorkoutDetails, WorkoutId, WorkoutKind};
pub use validate::{ValidationError, WorkoutForm, WorkoutInput};
