//! Inspect command - Print grid statistics for a track file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::output::{format_number, print_kv, print_section, print_subsection},
    racetrack::{Grid, load_track},
    state_space::{ACTION_COUNT, VELOCITY_RANGE},
};

#[derive(Parser, Debug)]
#[command(about = "Show grid statistics and the finish line of a track")]
pub struct InspectArgs {
    /// Track file
    pub track: PathBuf,

    /// Print the grid itself
    #[arg(long, default_value_t = false)]
    pub show_grid: bool,
}

pub fn execute(args: InspectArgs) -> Result<()> {
    let grid = load_track(&args.track)
        .with_context(|| format!("failed to load track {}", args.track.display()))?;

    print_section(&format!("Track {}", args.track.display()));
    print_grid_stats(&grid);

    if args.show_grid {
        print_subsection("Grid");
        print!("{grid}");
    }
    Ok(())
}

fn print_grid_stats(grid: &Grid) {
    let states = grid.rows() * grid.cols() * VELOCITY_RANGE * VELOCITY_RANGE;

    print_kv("Rows", &grid.rows().to_string());
    print_kv("Columns", &grid.cols().to_string());
    print_kv("Start cells", &format_number(grid.start_cells().len()));
    print_kv("Track cells", &format_number(grid.track_cells().len()));
    print_kv("Finish cells", &format_number(grid.finish_cells().len()));
    print_kv("States", &format_number(states));
    print_kv("State-actions", &format_number(states * ACTION_COUNT));

    print_subsection("Finish line");
    let line = grid.finish_line();
    print_kv("Orientation", &line.orientation.to_string());
    print_kv("From", &line.first.to_string());
    print_kv("To", &line.second.to_string());
}
