#![deny(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::complexity)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::perf)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
//! Convert a point cloud (.ply) file into an indexed mesh (.ply)

use std::path::PathBuf;

use bpa_rs::error::Result;
use bpa_rs::io::save_mesh_ply;
use bpa_rs::reconstruct;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(version, about, long_about)]
struct Cli {
    #[arg(long = "input", short = 'i', help = "point cloud file")]
    input: PathBuf,
    #[clap(long = "radius", short = 'r')]
    radius: f32,
    #[clap(long="output", help="output mesh file", short='o', default_value=None)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    info!("starting up");

    let args = Cli::parse();
    let output = args.output.clone().unwrap_or_else(|| {
        let mut path = args.input.clone();
        path.set_extension("mesh.ply");
        path
    });

    let points = bpa_rs::io::load_ply(&args.input)?;

    match reconstruct(&points, args.radius) {
        Some(triangles) => {
            info!("reconstruction complete... saving");
            save_mesh_ply(&output, &points, &triangles)?;
        }
        None => {
            eprintln!("Exception occurred reconstructing the surface");
        }
    }

    Ok(())
}
