#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::Parser;
use mapty::app::{App, LocationError};
use mapty::cli::{AddCmd, Cli, Cmd};
use mapty::render::{TerminalRenderer, format_entry};
use mapty::storage::FileSlots;
use mapty::types::{Coords, WorkoutId, WorkoutKind};
use mapty::utils;
use mapty::validate::WorkoutForm;

#[macro_use]
extern crate mapty;

type TerminalApp = App<FileSlots, TerminalRenderer<std::io::Stdout>>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);
    dlog!("data_dir={}", cli.data_dir.display());

    let mut app = App::new(FileSlots::new(&cli.data_dir), TerminalRenderer::stdout());

    match cli.cmd {
        Cmd::List => {
            app.bootstrap();
            if app.store().is_empty() {
                println!("No workouts yet.");
            }
            Ok(())
        }
        Cmd::Show { id } => {
            app.renderer_mut().set_listing(false);
            app.bootstrap();

            let id = WorkoutId::from(id);
            let w = app.workout(&id)?;
            println!("{}", format_entry(w));

            if locate(&mut app, cli.at).is_ok() {
                app.focus(&id)?;
            }
            Ok(())
        }
        Cmd::Reset => {
            app.bootstrap();
            let n = app.store().len();
            app.reset().context("clearing saved workouts")?;
            println!("Deleted {n} workout(s).");
            Ok(())
        }
        Cmd::Add { workout } => {
            let (pin, form) = into_form(workout);
            app.renderer_mut().set_listing(false);
            app.bootstrap();

            locate(&mut app, cli.at.or(pin))?;
            let pin = pin.or(cli.at).context("no workout location: pass --pin or --at")?;
            app.on_map_click(pin)?;

            app.renderer_mut().set_listing(true);
            let id = app.submit(&form)?;
            dlog!("added id={id}");
            Ok(())
        }
    }
}

/// The terminal's location provider: the position given with `--at`.
fn locate(app: &mut TerminalApp, at: Option<Coords>) -> Result<(), mapty::app::AppError> {
    app.on_location(at.ok_or_else(|| LocationError::new("no position given (use --at LAT,LNG)")))
}

fn into_form(cmd: AddCmd) -> (Option<Coords>, WorkoutForm) {
    match cmd {
        AddCmd::Running {
            pin,
            distance,
            duration,
            cadence,
        } => (
            pin,
            WorkoutForm {
                kind: WorkoutKind::Running,
                distance,
                duration,
                cadence,
                elevation: String::new(),
            },
        ),
        AddCmd::Cycling {
            pin,
            distance,
            duration,
            elevation,
        } => (
            pin,
            WorkoutForm {
                kind: WorkoutKind::Cycling,
                distance,
                duration,
                cadence: String::new(),
                elevation,
            },
        ),
    }
}
