//! Orbit Planner command line
//!
//! Runs one-off propagations and transfer calculations around Earth and
//! writes the results as JSON.

mod analysis;

use anyhow::Result;
use clap::{Parser, Subcommand};

use analysis::{ApsisArgs, BodiesArgs, HohmannArgs, PropagateArgs};

#[derive(Parser, Debug)]
#[command(name = "orbit-planner", version, about = "Perturbed orbit propagation and maneuver planning")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Propagate a circular Earth orbit and write the trajectory
    Propagate(PropagateArgs),
    /// Plan a Hohmann transfer from a circular orbit
    Hohmann(HohmannArgs),
    /// Next periapsis and apoapsis times of an elliptic orbit
    Apsis(ApsisArgs),
    /// List the bundled body catalog
    Bodies(BodiesArgs),
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Propagate(args) => analysis::run_propagate(args),
        Command::Hohmann(args) => analysis::run_hohmann(args),
        Command::Apsis(args) => analysis::run_apsis(args),
        Command::Bodies(args) => analysis::run_bodies(args),
    }
    .map_err(|e| {
        log::error!("{:#}", e);
        e
    })
}
