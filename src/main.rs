//! # Inkpass CLI
//!
//! Command-line interface for inspecting capability catalogs and
//! simulating print jobs.
//!
//! ## Usage
//!
//! ```bash
//! # List models in the built-in catalog
//! inkpass models
//!
//! # Show what a model supports
//! inkpass describe demo-photo6
//!
//! # Resolve a job and print the setup as JSON
//! inkpass plan demo-180 --resolution 720x720 --media plain
//!
//! # Run a synthetic page through the pass emitter
//! inkpass simulate demo-photo6 --quality High --trace passes.txt
//!
//! # Disc printing with a coverage preview
//! inkpass simulate demo-photo6 --disc --png disc.png
//! ```
//!
//! Set `RUST_LOG=debug` to see the resolved parameters.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use inkpass::{
    CapabilityCatalog, InkpassError, JobOptions, JobSetup,
    emitter::{Pattern, RowSource, ScanRows, TestPattern},
    ink::ColorMode,
    ir::{Program, TraceEncoder},
    media::{FeedType, PaperSize},
    page::DiscOptions,
    raster::{apply_mask, get_dot, row_bytes},
    resolution::available_resolutions,
};

/// Inkpass - inkjet pass scheduling utility
#[derive(Parser, Debug)]
#[command(name = "inkpass")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Capability document (JSON); the built-in demo catalog if omitted
    #[arg(long, global = true, value_name = "FILE")]
    profiles: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List models in the catalog
    Models,

    /// Show resolutions, qualities, inks and papers of a model
    Describe {
        /// Model id
        model: String,
    },

    /// Resolve a job and print the setup as JSON
    Plan {
        /// Model id
        model: String,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Run a synthetic page through the pass emitter
    Simulate {
        /// Model id
        model: String,

        #[command(flatten)]
        job: JobArgs,

        /// Synthetic page content
        #[arg(long, value_enum, default_value = "solid")]
        pattern: PatternArg,

        /// Write one line per printer operation to FILE
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,

        /// Save the masked coverage as PNG
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Solid,
    Bands,
    Blank,
}

impl From<PatternArg> for Pattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Solid => Pattern::Solid,
            PatternArg::Bands => Pattern::Bands,
            PatternArg::Blank => Pattern::Blank,
        }
    }
}

/// Job options; flags override values loaded with `--options`.
#[derive(Args, Debug)]
struct JobArgs {
    /// Job options document (JSON)
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// Resolution name (wins over --quality)
    #[arg(long)]
    resolution: Option<String>,

    /// Quality tier
    #[arg(long)]
    quality: Option<String>,

    /// Paper (media) type
    #[arg(long)]
    media: Option<String>,

    /// Ink type
    #[arg(long)]
    ink: Option<String>,

    /// Print with the black channel only
    #[arg(long)]
    mono: bool,

    /// Let the printer interleave
    #[arg(long)]
    printer_weave: bool,

    /// Never use the fast-360 or black-only heads
    #[arg(long)]
    no_fast_heads: bool,

    /// Roll feed instead of sheet feed
    #[arg(long)]
    roll: bool,

    /// Zero-margin printing
    #[arg(long)]
    full_bleed: bool,

    /// Paper size (letter, a4, 4x6)
    #[arg(long)]
    paper: Option<String>,

    /// Print on a disc (CD/DVD) tray
    #[arg(long)]
    disc: bool,

    /// Density multiplier (disables dot size negotiation)
    #[arg(long)]
    density: Option<f64>,

    /// Drop size id (disables dot size negotiation)
    #[arg(long)]
    drop_size: Option<u8>,

    /// Bits per dot (disables dot size negotiation)
    #[arg(long)]
    bit_depth: Option<u8>,

    /// Keep the printed resolution class even when density exceeds 1.0
    #[arg(long)]
    no_adjust_dot_size: bool,
}

impl JobArgs {
    fn into_options(self) -> Result<JobOptions, InkpassError> {
        let mut options = match &self.options {
            Some(path) => JobOptions::from_json(&std::fs::read_to_string(path)?)?,
            None => JobOptions::default(),
        };
        if self.resolution.is_some() {
            options.resolution = self.resolution;
        }
        if self.quality.is_some() {
            options.quality = self.quality;
        }
        if self.media.is_some() {
            options.media = self.media;
        }
        if self.ink.is_some() {
            options.ink_type = self.ink;
        }
        if self.mono {
            options.color_mode = ColorMode::Monochrome;
        }
        if self.printer_weave {
            options.weave.printer_weave = true;
        }
        if self.no_fast_heads {
            options.weave.fast_heads = false;
        }
        if self.roll {
            options.feed = FeedType::Roll;
        }
        if self.full_bleed {
            options.full_bleed = true;
        }
        if let Some(name) = &self.paper {
            options.paper = PaperSize::named(name).ok_or_else(|| {
                InkpassError::InvalidOption(format!("unknown paper size '{}'", name))
            })?;
        }
        if self.disc && options.disc.is_none() {
            options.disc = Some(DiscOptions::default());
        }
        if self.density.is_some() {
            options.density.density = self.density;
        }
        if self.drop_size.is_some() {
            options.density.drop_size = self.drop_size;
        }
        if self.bit_depth.is_some() {
            options.density.bit_depth = self.bit_depth;
        }
        if self.no_adjust_dot_size {
            options.density.adjust_dot_size = false;
        }
        Ok(options)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), InkpassError> {
    let cli = Cli::parse();

    let catalog = match &cli.profiles {
        Some(path) => CapabilityCatalog::load(path)?,
        None => CapabilityCatalog::built_in()?,
    };

    match cli.command {
        Commands::Models => {
            for id in catalog.model_ids() {
                let caps = catalog.get(id)?;
                println!("{:<16} {}", id, caps.name);
            }
        }

        Commands::Describe { model } => {
            describe(&catalog, &model)?;
        }

        Commands::Plan { model, job } => {
            let setup = resolve(&catalog, &model, job)?;
            println!("{}", serde_json::to_string_pretty(&setup)?);
        }

        Commands::Simulate {
            model,
            job,
            pattern,
            trace,
            png,
        } => {
            let setup = resolve(&catalog, &model, job)?;
            let pattern = Pattern::from(pattern);
            let mut source = TestPattern::new(pattern, setup.page.image_width_dots, setup.ink.bits);

            let program = match &trace {
                Some(path) => {
                    let out = BufWriter::new(File::create(path)?);
                    let encoder = inkpass::print(&setup, &mut source, TraceEncoder::new(out))?;
                    println!("Wrote {} operations to {}", encoder.ops(), path.display());
                    None
                }
                None => Some(inkpass::print(&setup, &mut source, Program::new())?),
            };

            if let Some(program) = program {
                println!(
                    "{} operations: {} raster blocks, {} state changes",
                    program.len(),
                    program.raster_blocks().count(),
                    program.state_changes()
                );
            }

            if let Some(png_path) = png {
                save_png(&png_path, &setup, pattern)?;
                println!("Saved to {}", png_path.display());
            }
        }
    }

    Ok(())
}

fn resolve(catalog: &CapabilityCatalog, model: &str, job: JobArgs) -> Result<JobSetup, InkpassError> {
    let caps = catalog.get(model)?;
    inkpass::resolve(model, caps, &job.into_options()?)
}

fn describe(catalog: &CapabilityCatalog, model: &str) -> Result<(), InkpassError> {
    let caps = catalog.get(model)?;
    println!("{} ({})", caps.name, model);

    println!("\nResolutions:");
    for res in available_resolutions(caps, None) {
        let weave = if res.soft_weave { "soft" } else { "printer" };
        println!(
            "  {:<12} {}x{} printed {}x{} ({} weave)",
            res.name, res.hres, res.vres, res.printed_hres, res.printed_vres, weave
        );
    }

    println!("\nQualities:");
    for tier in &caps.qualities {
        match tier.desired {
            Some([h, v]) => println!("  {:<12} {}x{}", tier.name, h, v),
            None => println!("  {:<12} highest", tier.name),
        }
    }

    println!("\nInk types:");
    for ink in &caps.inks {
        let channels: Vec<&str> = ink.channels.iter().map(|c| c.name.as_str()).collect();
        println!("  {:<12} {}", ink.name, channels.join(", "));
    }

    println!("\nPapers:");
    for paper in &caps.papers {
        println!(
            "  {:<12} {:?}, density {:.2}",
            paper.name, paper.class, paper.base_density
        );
    }
    Ok(())
}

/// Save the masked page coverage as PNG (black = any channel inked)
fn save_png(path: &Path, setup: &JobSetup, pattern: Pattern) -> Result<(), InkpassError> {
    use image::{GrayImage, Luma};

    let width = setup.page.image_width_dots;
    let height = setup.page.image_height_rows;
    let bits = setup.ink.bits;
    let mut source = TestPattern::new(pattern, width, bits);
    let mut rows = ScanRows::new(setup.channel_keys().len(), row_bytes(width, bits));
    let mask = setup.page.disc_mask();
    let mut mask_row = vec![0u8; mask.map_or(0, |m| m.row_len())];

    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for y in 0..height {
        source.fetch(y, &mut rows)?;
        if let Some(mask) = &mask {
            mask.row(y, &mut mask_row);
            for row in &mut rows.channels {
                apply_mask(row, &mask_row, width, bits);
            }
        }
        for x in 0..width {
            let inked = rows
                .channels
                .iter()
                .any(|row| get_dot(row, x as usize, bits) != 0);
            if inked {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
    }

    img.save(path)
        .map_err(|e| InkpassError::Image(format!("Failed to save PNG: {}", e)))?;

    Ok(())
}
