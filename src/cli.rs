use crate::types::Coords;
use crate::utils::parse_coords;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = ".mapty";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts at map locations"
)]
pub struct Cli {
    /// Directory holding the saved workouts.
    #[arg(long, env = "MAPTY_DATA_DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Your current position as LAT,LNG. The map is centred here.
    #[arg(
        long,
        value_name = "LAT,LNG",
        value_parser = parse_coords,
        allow_hyphen_values = true,
        global = true
    )]
    pub at: Option<Coords>,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Log a workout at a spot on the map.
    Add {
        #[command(subcommand)]
        workout: AddCmd,
    },
    /// List saved workouts, oldest first.
    List,
    /// Show one workout and centre the map on it.
    Show { id: String },
    /// Delete every saved workout.
    Reset,
}

#[derive(Subcommand, Debug)]
pub enum AddCmd {
    Running {
        /// Where the workout happened; defaults to `--at`.
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coords, allow_hyphen_values = true)]
        pin: Option<Coords>,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute.
        #[arg(long, allow_hyphen_values = true)]
        cadence: String,
    },
    Cycling {
        /// Where the workout happened; defaults to `--at`.
        #[arg(long, value_name = "LAT,LNG", value_parser = parse_coords, allow_hyphen_values = true)]
        pin: Option<Coords>,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Elevation gain in metres; negative for a net descent.
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },
}
