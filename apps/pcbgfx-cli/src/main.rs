//! Board to VRML command-line exporter.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pcbgfx_core::units::iu_to_mm;
use pcbgfx_core::Board;
use pcbgfx_export::{export_vrml_file, ExportSettings};

#[derive(Parser)]
#[command(name = "pcbgfx")]
#[command(about = "Export boards as VRML 2.0 scenes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Units {
    Mm,
    Cm,
    Inch,
}

impl Units {
    fn mm_to_output(self) -> f64 {
        match self {
            Units::Mm => 1.0,
            Units::Cm => 0.1,
            Units::Inch => 1.0 / 25.4,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a board file as a VRML scene
    Export {
        /// Board JSON file
        board: PathBuf,

        /// Output .wrl file
        #[arg(short, long)]
        output: PathBuf,

        /// Export settings JSON file
        #[arg(short, long)]
        settings: Option<PathBuf>,

        /// Output units, overriding the settings file
        #[arg(short, long, value_enum)]
        units: Option<Units>,

        /// Directory relative model paths are resolved against
        #[arg(long)]
        model_root: Option<PathBuf>,

        /// Copy model files next to the output
        #[arg(long)]
        copy_models: bool,

        /// Embed .wrl model contents instead of referencing them
        #[arg(long)]
        embed_models: bool,

        /// Keep board coordinates instead of centring the board
        #[arg(long)]
        no_center: bool,
    },

    /// Write the default export settings to a file
    Settings {
        /// Settings JSON file to create
        output: PathBuf,
    },

    /// Print a summary of a board file
    Info {
        /// Board JSON file
        board: PathBuf,
    },
}

fn load_board(path: &Path) -> Result<Board> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Board::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            board,
            output,
            settings,
            units,
            model_root,
            copy_models,
            embed_models,
            no_center,
        } => {
            let pcb = load_board(&board)?;
            let mut opts = match &settings {
                Some(path) => ExportSettings::load(path).with_context(|| format!("loading {}", path.display()))?,
                None => ExportSettings::default(),
            };
            if let Some(u) = units {
                opts.mm_to_output = u.mm_to_output();
            }
            opts.copy_models |= copy_models;
            opts.embed_models |= embed_models;
            if no_center {
                opts.center_board = false;
            }

            let root = model_root.or_else(|| board.parent().map(|p| p.to_path_buf()));
            let report = export_vrml_file(&pcb, &opts, &output, root.as_deref())
                .with_context(|| format!("exporting {}", board.display()))?;

            println!(
                "Wrote {} ({} layer meshes, {} models, {} triangles, {} warnings)",
                output.display(),
                report.layer_nodes,
                report.model_nodes,
                report.triangles,
                report.warnings.len()
            );
            if report.has_warnings() {
                log::debug!("export finished with warnings");
                eprintln!("Some items were skipped; run with RUST_LOG=warn to list them");
            }
        }
        Commands::Settings { output } => {
            ExportSettings::default()
                .save(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote default settings to {}", output.display());
        }
        Commands::Info { board } => {
            let pcb = load_board(&board)?;
            println!("Board: {}", pcb.name);
            println!(
                "  Thickness: {} mm, {} copper layers",
                iu_to_mm(pcb.settings.thickness as f64),
                pcb.settings.copper_layer_count
            );
            println!("  Items: {}", pcb.entity_count());
            println!(
                "  Tracks: {}, vias: {}, zones: {}, drawings: {}, texts: {}, footprints: {}",
                pcb.tracks.len(),
                pcb.vias.len(),
                pcb.zones.len(),
                pcb.drawings.len(),
                pcb.texts.len(),
                pcb.footprints.len()
            );
            match pcb.bounding_box() {
                Some(bb) => println!(
                    "  Extent: {:.3} x {:.3} mm",
                    iu_to_mm(bb.width()),
                    iu_to_mm(bb.height())
                ),
                None => println!("  Extent: empty"),
            }
            if pcb.outline.is_none() {
                println!("  No board outline");
            }
        }
    }

    Ok(())
}
