use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use diamond_square::config::{DEFAULT_MAX_VALUE, DEFAULT_MIN_VALUE, DEFAULT_ROUGHNESS, DEFAULT_SIZE};
use diamond_square::export::{export_csv, export_glb, export_png, export_raw};
use diamond_square::{Displacement, GeneratorConfig, Grid, RandSource, generate};
use log::info;

/// Generate a diamond-square heightmap and write it to disk
#[derive(Parser, Debug)]
#[command(name = "diamond-square", version, about)]
struct Args {
    /// Grid side length, must be 2^n + 1
    #[arg(long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Smallest cell value
    #[arg(long, default_value_t = DEFAULT_MIN_VALUE, allow_negative_numbers = true)]
    min: f64,

    /// Largest cell value
    #[arg(long, default_value_t = DEFAULT_MAX_VALUE, allow_negative_numbers = true)]
    max: f64,

    /// Displacement scale relative to the value range
    #[arg(long, default_value_t = DEFAULT_ROUGHNESS)]
    roughness: f64,

    /// Seed for a reproducible grid; omit for a fresh grid every run
    #[arg(long)]
    seed: Option<u64>,

    /// Halve the displacement amplitude at every subdivision level
    #[arg(long)]
    halving: bool,

    /// Grayscale PNG output
    #[arg(short, long, default_value = "diamond_square.png")]
    output: PathBuf,

    /// Edge length in pixels of each cell in the PNG
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=64))]
    pixel_size: u32,

    /// Also write the values as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Also write a little-endian f32 raw heightmap
    #[arg(long)]
    raw: Option<PathBuf>,

    /// Also write a GLB terrain mesh
    #[arg(long)]
    glb: Option<PathBuf>,

    /// Height multiplier for the GLB mesh
    #[arg(long, default_value_t = 10.0)]
    height_scale: f32,
}

impl Args {
    fn config(&self) -> GeneratorConfig {
        let displacement = if self.halving {
            Displacement::Halving
        } else {
            Displacement::Constant
        };
        GeneratorConfig::with_roughness(self.size, self.max, self.min, self.roughness).displacement(displacement)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.config();

    info!(
        "Generating {}x{} grid in [{}, {}] with roughness {} ({:?} displacement)",
        config.size, config.size, config.min, config.max, config.roughness, config.displacement
    );

    let grid = match args.seed {
        Some(seed) => generate(&config, &mut RandSource::seeded(seed))?,
        None => generate(&config, &mut RandSource::thread())?,
    };
    log_summary(&grid);

    let png_path = export_png(&grid, config.min, config.max, args.pixel_size, &args.output)?;
    info!("Wrote grayscale image to {}", png_path.display());

    if let Some(path) = &args.csv {
        export_csv(&grid, path)?;
        info!("Wrote CSV to {}", path.display());
    }

    if let Some(path) = &args.raw {
        export_raw(&grid, path)?;
        info!("Wrote raw heightmap to {}", path.display());
    }

    if let Some(path) = &args.glb {
        export_glb(&grid, 1.0, 1.0, args.height_scale, path)?;
        info!("Wrote terrain mesh to {}", path.display());
    }

    Ok(())
}

fn log_summary(grid: &Grid) {
    if let (Some(lo), Some(hi), Some(mean)) = (grid.min_value(), grid.max_value(), grid.mean()) {
        info!("Grid values: min {:.4}, max {:.4}, mean {:.4}", lo, hi, mean);
    }
}
