use clap::{Parser, Subcommand};
use csgworld_assets::AssetStore;
use csgworld_common::{Authority, ClientId, Transform};
use csgworld_procgen::{WorldLayout, WorldPalette, build_house, initialize_world};
use csgworld_session::GameSession;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Largest story count the `house` command accepts.
const MAX_CLI_FLOORS: i64 = 1024;

#[derive(Parser)]
#[command(name = "csgworld-cli", about = "Procedural CSG world generator")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info and the stock asset catalog
    Info,
    /// Print the operations for a single house
    House {
        /// Number of stories; zero or below gives a flat shell
        #[arg(
            short,
            long,
            default_value = "3",
            allow_hyphen_values = true,
            value_parser = clap::value_parser!(i32).range(-MAX_CLI_FLOORS..=MAX_CLI_FLOORS)
        )]
        floors: i32,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        x: f32,
        #[arg(long, default_value = "512", allow_hyphen_values = true)]
        y: f32,
        #[arg(long, default_value = "512", allow_hyphen_values = true)]
        z: f32,
    },
    /// Build the whole world and summarize it
    World {
        /// RNG seed for floor counts
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Print the world snapshot as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Join clients concurrently against a fresh session
    Join {
        /// Number of clients to join
        #[arg(short, long, default_value = "4")]
        clients: u64,
        /// Number of spawn points to place along the X axis
        #[arg(short = 'p', long, default_value = "3")]
        spawn_points: usize,
        /// Base RNG seed; each client uses seed + client id
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let assets = Arc::new(AssetStore::builtin());

    match cli.command {
        Commands::Info => {
            println!("csgworld-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", csgworld_assets::crate_info());
            for name in assets.brush_names() {
                println!("  brush    {name}");
            }
            for name in assets.material_names() {
                println!("  material {name}");
            }
            let layout = WorldLayout::default();
            println!(
                "layout: {} houses, floors {:?}, cell size {}",
                layout.house_count(),
                layout.floors,
                layout.cell_size
            );
        }
        Commands::House { floors, x, y, z } => {
            let palette = WorldPalette::resolve(&assets)?;
            let ops = build_house(glam::Vec3::new(x, y, z), floors, &palette.house());
            println!("House at ({x}, {y}, {z}) with {floors} floors: {} ops", ops.len());
            for (i, op) in ops.iter().enumerate() {
                let b = op.bounds();
                let kind = if op.is_additive() { "add" } else { "sub" };
                println!("{i:>3} {kind} min={} max={}", b.min, b.max);
            }
        }
        Commands::World { seed, json } => {
            tracing::debug!(seed, "building world");
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let world =
                initialize_world(Authority::Server, assets, &WorldLayout::default(), &mut rng)?;
            let snapshot = world.solid.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                for site in &world.sites {
                    println!("house at {} floors={}", site.base, site.floors);
                }
                println!(
                    "ops={} additive={} dirty_cells={} hash={:#x}",
                    snapshot.ops.len(),
                    snapshot.additive_count(),
                    world.solid.dirty_cells().len(),
                    snapshot.hash
                );
            }
        }
        Commands::Join {
            clients,
            spawn_points,
            seed,
        } => {
            tracing::debug!(clients, spawn_points, "simulating joins");
            let session = GameSession::new(Authority::Server, assets);
            for i in 0..spawn_points {
                session.add_spawn_point(Transform::from_position(glam::Vec3::new(
                    i as f32 * 1024.0,
                    0.0,
                    512.0,
                )))?;
            }

            let outcomes = std::thread::scope(|s| {
                let handles: Vec<_> = (0..clients)
                    .map(|client| {
                        let session = &session;
                        s.spawn(move || {
                            let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(client));
                            session
                                .client_joined(ClientId(client), &mut rng)
                                .map(|outcome| (client, outcome))
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| {
                        h.join()
                            .map_err(|_| anyhow::anyhow!("join thread panicked"))?
                            .map_err(anyhow::Error::from)
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })?;

            let builds = outcomes.iter().filter(|(_, o)| o.built_world).count();
            for (client, outcome) in &outcomes {
                println!(
                    "client {client}: position={} spawn={}",
                    outcome.transform.position,
                    if outcome.placed_at_spawn { "yes" } else { "default" }
                );
            }
            println!(
                "world built {builds} time(s); avatars={}",
                session.avatar_count()?
            );
        }
    }

    Ok(())
}
