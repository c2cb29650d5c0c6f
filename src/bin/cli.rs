//! Kickturn CLI - inspect rail extraction and run scripted skate sessions

use clap::{Parser, Subcommand};
use nalgebra::{UnitQuaternion, Vector2, Vector3};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kickturn::config::{PhysicsParameterTable, SkaterConfig, SkaterStats};
use kickturn::game::constants::physics::TIMESTEP;
use kickturn::game::events::SkaterEvent;
use kickturn::game::geometry::{Layer, Rgba};
use kickturn::game::intent::Intent;
use kickturn::game::physics::PhysicsWorld;
use kickturn::game::rails::{MultiPathExtractor, RailNetwork, RailPath, RailPathBuilder, TaggedMesh};
use kickturn::game::Simulation;

#[derive(Parser)]
#[command(name = "kickturn")]
#[command(about = "Skateboard locomotion core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract grind rails from a vertex-coloured mesh (JSON)
    Rails {
        /// Path to the mesh file
        mesh: PathBuf,
        /// Minimum vertex alpha for an edge to count as grindable
        #[arg(long, default_value = "0.9")]
        threshold: f32,
        /// Extract every disjoint rail instead of a single path
        #[arg(long)]
        multi: bool,
    },
    /// Run a scripted session in the demo park and print the state timeline
    Simulate {
        /// Skater configuration (physics table plus stats)
        #[arg(long, env = "KICKTURN_CONFIG")]
        params: Option<PathBuf>,
        /// Stand-alone stat profile, overriding the config's `[stats]`
        #[arg(long, env = "KICKTURN_STATS")]
        stats: Option<PathBuf>,
        /// Seconds of simulated time
        #[arg(long, default_value = "6.0")]
        seconds: f32,
        /// Seed for balance wobble
        #[arg(long, default_value = "7")]
        seed: u64,
    },
    /// Print the physics parameter table as TOML
    Params {
        /// Print this file's table (after validation) instead of the defaults
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Rails {
            mesh,
            threshold,
            multi,
        } => print_rails(&mesh, threshold, multi),
        Commands::Simulate {
            params,
            stats,
            seconds,
            seed,
        } => simulate(params.as_deref(), stats.as_deref(), seconds, seed),
        Commands::Params { params } => print_params(params.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<SkaterConfig, String> {
    match path {
        Some(path) => SkaterConfig::from_file(path).map_err(|e| e.to_string()),
        None => Ok(SkaterConfig::default()),
    }
}

// =============================================================================
// Rails Command
// =============================================================================

fn print_rails(mesh_path: &Path, threshold: f32, multi: bool) -> Result<(), String> {
    let mesh = TaggedMesh::from_json_file(mesh_path).map_err(|e| e.to_string())?;
    let builder = RailPathBuilder::with_threshold(threshold);

    let paths = if multi {
        MultiPathExtractor::new(builder)
            .extract(&mesh)
            .map_err(|e| e.to_string())?
    } else {
        vec![builder.build(&mesh).map_err(|e| e.to_string())?]
    };

    println!(
        "{} rail(s) from {} ({} vertices, {} triangles)",
        paths.len(),
        mesh_path.display(),
        mesh.positions.len(),
        mesh.triangles.len()
    );
    for (i, path) in paths.iter().enumerate() {
        print_path(i, path);
    }
    Ok(())
}

fn print_path(index: usize, path: &RailPath) {
    let points = path.points();
    let first = points[0];
    let last = points[points.len() - 1];
    println!(
        "  rail {}: {} points, length {:.3}{}",
        index,
        points.len(),
        path.length(),
        if path.is_closed() { ", closed" } else { "" }
    );
    println!("    start ({:.3}, {:.3}, {:.3})", first.x, first.y, first.z);
    println!("    end   ({:.3}, {:.3}, {:.3})", last.x, last.y, last.z);
}

// =============================================================================
// Params Command
// =============================================================================

fn print_params(path: Option<&Path>) -> Result<(), String> {
    let table = match path {
        Some(path) => load_config(Some(path))?.physics,
        None => PhysicsParameterTable::default(),
    };
    let text = toml::to_string_pretty(&table).map_err(|e| e.to_string())?;
    print!("{}", text);
    Ok(())
}

// =============================================================================
// Simulate Command
// =============================================================================

const GREY: Rgba = Rgba::new(0.5, 0.5, 0.5, 0.0);

/// Flat floor, a low ledge straight ahead, and a vert-tagged bank at the far end.
fn demo_park(params: &PhysicsParameterTable) -> Result<(PhysicsWorld, RailNetwork), String> {
    let mut world = PhysicsWorld::new();
    let mut rails = RailNetwork::new();

    world
        .add_surface(&TaggedMesh::floor(Vector3::new(0.0, 0.0, 20.0), 20.0, 40.0, GREY), Layer::Ground)
        .map_err(|e| e.to_string())?;

    let vert = Rgba::rgb(params.vert_color);
    let bank = TaggedMesh::quad(
        [
            Vector3::new(-6.0, 0.0, 40.0),
            Vector3::new(-6.0, 4.0, 44.0),
            Vector3::new(6.0, 4.0, 44.0),
            Vector3::new(6.0, 0.0, 40.0),
        ],
        vert,
    );
    world.add_surface(&bank, Layer::Ground).map_err(|e| e.to_string())?;

    // Thin ledge whose top edge is painted with the grind colour.
    let grind = Rgba::rgb(params.grind_color);
    let ledge = TaggedMesh::new(
        vec![[0.0, 0.4, 12.0], [0.0, 0.4, 24.0], [0.0, 0.0, 12.0], [0.0, 0.0, 24.0]],
        vec![grind, grind, GREY, GREY],
        vec![[0, 1, 2], [1, 3, 2]],
    );
    world
        .add_rail_mesh(&ledge, &MultiPathExtractor::default(), &mut rails)
        .map_err(|e| e.to_string())?;

    Ok((world, rails))
}

/// Scripted controls: push, charge and pop an ollie toward the rail while
/// holding grind, then keep pushing into the bank.
fn scripted_intent(t: f32, previous_jump: bool) -> (Intent, bool) {
    let jump = (0.9..1.2).contains(&t) || (3.0..3.3).contains(&t);
    let intent = Intent {
        move_axis: Vector2::new(0.0, if t > 0.1 { 1.0 } else { 0.0 }),
        jump_down: jump && !previous_jump,
        jump_held: jump,
        jump_up: !jump && previous_jump,
        grind_down: (1.3..1.32).contains(&t),
        grind_held: (1.3..2.8).contains(&t),
        ..Intent::default()
    };
    (intent, jump)
}

fn describe(event: &SkaterEvent) -> String {
    match event {
        SkaterEvent::StateChanged { from, to } => format!("{} -> {}", from, to),
        SkaterEvent::TrickCompleted {
            name,
            rotation_degrees,
        } => format!("trick {} ({:.0} deg)", name, rotation_degrees),
        SkaterEvent::Landed {
            clean,
            trick,
            switch_stance,
        } => format!(
            "landed{}{}{}",
            if *clean { " clean" } else { " sketchy" },
            if *switch_stance { " switch" } else { "" },
            trick.map(|t| format!(" mid-{}", t)).unwrap_or_default()
        ),
        SkaterEvent::GrindStarted { rail } => format!("grind started on rail {}", rail.0),
        SkaterEvent::GrindEnded { rail, reason } => {
            format!("grind ended on rail {} ({:?})", rail.0, reason)
        }
        SkaterEvent::Bailed => "bailed".to_string(),
    }
}

fn simulate(
    config_path: Option<&Path>,
    stats_path: Option<&Path>,
    seconds: f32,
    seed: u64,
) -> Result<(), String> {
    let config = load_config(config_path)?;
    let stats = match stats_path {
        Some(path) => SkaterStats::from_file(path).map_err(|e| e.to_string())?,
        None => config.stats,
    };
    let params = Arc::new(config.physics);
    let (world, rails) = demo_park(&params)?;

    let mut sim = Simulation::new(world, rails, params).with_seed(seed);
    let id = sim.spawn_skater(Vector3::new(0.0, 0.05, 0.0), UnitQuaternion::identity(), stats);

    println!("Simulating {:.1}s in the demo park (seed {})", seconds, seed);
    let ticks = (seconds / TIMESTEP).ceil() as u32;
    let mut jump_held = false;
    for tick in 0..ticks {
        let t = tick as f32 * TIMESTEP;
        let (intent, held) = scripted_intent(t, jump_held);
        jump_held = held;
        sim.set_intent(id, &intent).map_err(|e| e.to_string())?;
        sim.step(TIMESTEP);

        for event in sim.drain_events(id).map_err(|e| e.to_string())? {
            println!("  {:>6.2}s  {}", sim.clock(), describe(&event));
        }
    }

    let skater = sim.skater(id).map_err(|e| e.to_string())?;
    let body = skater.body();
    println!(
        "Final: {} at ({:.2}, {:.2}, {:.2}), speed {:.2}",
        skater.state_kind(),
        body.position.x,
        body.position.y,
        body.position.z,
        body.velocity.norm()
    );
    Ok(())
}
