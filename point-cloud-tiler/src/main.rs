//! Point cloud to pcroot tile converter main entry point
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use point_cloud_tiler::coordinates::CoordinateTransform;
use point_cloud_tiler::las_source::{self, convert_point, create_reader};
use point_cloud_tiler::{CollisionPolicy, Decimation, ExportSettings, PcrootExporter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Convert LAS/LAZ point clouds into pcroot tiles")]
struct Cli {
    /// Input LAS/LAZ files, each exported as one batch.
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<PathBuf>,

    /// Root index output path (.pcroot); tiles are written next to it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON settings file used as the base for all other flags.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Edge length of each grid cell.
    #[arg(long)]
    grid_size: Option<f32>,

    /// Minimum points per tile; sparser cells are skipped.
    #[arg(long)]
    min_points: Option<usize>,

    /// Drop every Nth point of each tile.
    #[arg(long, value_name = "N", conflicts_with = "keep")]
    skip: Option<usize>,

    /// Keep only every Nth point of each tile.
    #[arg(long, value_name = "N")]
    keep: Option<usize>,

    /// Write points in input order instead of shuffling them.
    #[arg(long)]
    no_randomize: bool,

    /// Seed for the per-tile shuffle.
    #[arg(long)]
    seed: Option<u64>,

    /// Pack colours into positions (version 2 tiles).
    #[arg(long)]
    pack_colors: bool,

    #[arg(long)]
    pack_magic: Option<f32>,

    /// Offset subtracted from every point, in output axis order.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    offset: Option<Vec<f64>>,

    /// Use the first point of the first input as offset.
    #[arg(long, conflicts_with = "offset")]
    auto_offset: bool,

    /// Multiply input coordinates before offsetting.
    #[arg(long)]
    scale: Option<f64>,

    /// Keep the source Z-up axis order.
    #[arg(long)]
    no_swap_yz: bool,

    /// Write unpacked positions relative to their cell.
    #[arg(long)]
    local_positions: bool,

    /// Overwrite tiles from earlier runs instead of adding a timestamp suffix.
    #[arg(long)]
    overwrite: bool,

    /// Rewrite the root index after every batch.
    #[arg(long)]
    checkpoint: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let (settings, transform) = build_settings(&cli)?;

    let mut exporter = PcrootExporter::new(settings)?;
    for (batch_index, input) in cli.inputs.iter().enumerate() {
        exporter.begin_batch(batch_index)?;
        read_into(&mut exporter, input, &transform)?;
        exporter.save_batch()?;
    }

    info!("Conversion complete!");
    Ok(())
}

/// Merge config file, defaults and command line flags into run settings.
fn build_settings(
    cli: &Cli,
) -> Result<(ExportSettings, CoordinateTransform), Box<dyn std::error::Error>> {
    let mut settings = match &cli.config {
        Some(path) => ExportSettings::from_json_file(path)?,
        None => ExportSettings::default(),
    };

    if let Some(output) = &cli.output {
        settings.output = output.clone();
    } else if cli.config.is_none() {
        settings.output = cli.inputs[0].with_extension("pcroot");
    }
    if let Some(grid_size) = cli.grid_size {
        settings.grid_size = grid_size;
    }
    if let Some(min_points) = cli.min_points {
        settings.minimum_point_count = min_points;
    }
    if let Some(n) = cli.skip {
        settings.decimation = Decimation::SkipEvery(n);
    }
    if let Some(n) = cli.keep {
        settings.decimation = Decimation::KeepEvery(n);
    }
    if cli.no_randomize {
        settings.randomize = false;
    }
    if cli.seed.is_some() {
        settings.seed = cli.seed;
    }
    if cli.pack_colors {
        settings.pack_colors = true;
    }
    if let Some(magic) = cli.pack_magic {
        settings.pack_magic = magic;
    }
    if cli.local_positions {
        settings.local_positions = true;
    }
    if cli.overwrite {
        settings.collision = CollisionPolicy::Overwrite;
    }
    if cli.checkpoint {
        settings.checkpoint_root = true;
    }
    settings.batch_count = cli.inputs.len();

    let mut transform = CoordinateTransform {
        offset: settings.offset.map(f64::from),
        scale: cli.scale,
        swap_yz: !cli.no_swap_yz,
    };
    if let Some(offset) = &cli.offset {
        transform.offset = [offset[0], offset[1], offset[2]];
    }
    if cli.auto_offset {
        if let Some((x, y, z)) = las_source::first_position(&cli.inputs[0])? {
            transform.offset = transform.offset_for(x, y, z);
        }
    }
    settings.offset = transform.offset.map(|v| v as f32);

    Ok((settings, transform))
}

/// Stream every point of one input file into the exporter.
fn read_into(
    exporter: &mut PcrootExporter,
    input: &Path,
    transform: &CoordinateTransform,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = create_reader(input)?;
    let total_points = reader.header().number_of_points();
    info!("Reading {} ({} points)", input.display(), total_points);

    let pb = ProgressBar::new(total_points);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} points ({percent}%) {msg}")?
            .progress_chars("▉▊▋▌▍▎▏ "),
    );
    pb.set_message("Bucketing points");

    for (idx, point_result) in reader.points().enumerate() {
        let point = point_result?;
        exporter.add_point(convert_point(&point, transform))?;

        if idx % 50_000 == 0 {
            pb.set_position(idx as u64);
        }
    }
    pb.finish_with_message("Points bucketed");

    Ok(())
}
