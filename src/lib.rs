//! Labelprep: object-detection annotation preparation.
//!
//! Labelprep turns heterogeneous detection annotations (per-frame JSON with
//! named categories, Penn-Fudan style text files) into YOLO label files
//! with normalized center/size boxes, and partitions images into
//! reproducible train/val splits.
//!
//! # Modules
//!
//! - [`ir`]: Typed boxes, class ids, the category vocabulary and records
//! - [`source`]: Annotation source parsers
//! - [`dataset`]: Dataset layout, image index, splitting and file transfer
//! - [`convert`]: The conversion pipeline, label writer and report
//! - [`prepare`]: Building a split dataset from raw directories
//! - [`error`]: Error types for labelprep operations

pub mod convert;
pub mod dataset;
pub mod error;
pub mod ir;
pub mod prepare;
pub mod source;

#[cfg(test)]
mod test_support;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use convert::{write_data_yaml, ConversionPipeline, ConversionReport};
use dataset::{realize_split, DatasetLayout, DatasetSplitter, Split, SplitInventory};
use ir::{CategoryMap, CategoryPreset, ClassId};
use prepare::{prepare_dataset, PrepareOptions};
use source::{AnnotationParser, JsonAnnotationParser, SourceFormat, TextAnnotationParser};

pub use error::PrepError;

/// The labelprep CLI application.
#[derive(Parser)]
#[command(name = "labelprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert source annotations of a dataset into YOLO label files.
    Convert(ConvertArgs),
    /// Re-partition a dataset's images into train and val in place.
    Split(SplitArgs),
    /// Build a split YOLO dataset from raw image and annotation directories.
    Prepare(PrepareArgs),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Per-frame JSON (`frames[0].objects[]` with `box2d`)
    Json,
    /// Penn-Fudan style text annotations
    Text,
}

impl From<FormatArg> for SourceFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => SourceFormat::Json,
            FormatArg::Text => SourceFormat::Text,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum PresetArg {
    Bdd100k,
    PennFudan,
}

impl From<PresetArg> for CategoryPreset {
    fn from(value: PresetArg) -> Self {
        match value {
            PresetArg::Bdd100k => CategoryPreset::Bdd100k,
            PresetArg::PennFudan => CategoryPreset::PennFudan,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SplitArg {
    Train,
    Val,
}

impl From<SplitArg> for Split {
    fn from(value: SplitArg) -> Self {
        match value {
            SplitArg::Train => Split::Train,
            SplitArg::Val => Split::Val,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Source format, vocabulary and parser options shared by `convert` and
/// `prepare`.
#[derive(clap::Args)]
struct SourceArgs {
    /// Annotation source format.
    #[arg(long, value_enum, default_value = "json")]
    format: FormatArg,

    /// Built-in category vocabulary.
    #[arg(long, value_enum, default_value = "bdd100k", conflicts_with = "categories")]
    preset: PresetArg,

    /// YAML file with `names` (list or index map) and optional `aliases`.
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Class id assigned to every box of a text source.
    #[arg(long, default_value_t = 0)]
    text_class: u32,

    /// Only accept text boxes whose quoted label equals this value.
    #[arg(long)]
    text_label: Option<String>,

    /// Worker threads (0 = one per CPU core).
    #[arg(long, env = "LABELPREP_JOBS", default_value_t = 0)]
    jobs: usize,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Dataset root containing images/<split> and labels/<split>.
    #[arg(long)]
    root: PathBuf,

    /// Only convert this split (default: every split present).
    #[arg(long, value_enum)]
    split: Option<SplitArg>,

    /// Write label files under <OUTPUT>/<split> instead of next to the sources.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write <root>/data.yaml for training.
    #[arg(long)]
    data_yaml: bool,

    #[command(flatten)]
    source: SourceArgs,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Dataset root containing images/ and labels/.
    #[arg(long)]
    root: PathBuf,

    /// Fraction of images assigned to val, in (0, 1).
    #[arg(long, default_value_t = 0.2, value_parser = parse_ratio)]
    val_ratio: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Directory of raw images.
    #[arg(long)]
    images: PathBuf,

    /// Directory of raw annotation files.
    #[arg(long)]
    annotations: PathBuf,

    /// Root of the dataset to create.
    #[arg(long)]
    output: PathBuf,

    /// Fraction of images assigned to val, in (0, 1).
    #[arg(long, default_value_t = 0.2, value_parser = parse_ratio)]
    val_ratio: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    #[command(flatten)]
    source: SourceArgs,
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if val > 0.0 && val < 1.0 => Ok(val),
        _ => Err("ratio must be strictly between 0.0 and 1.0".to_string()),
    }
}

/// Run the labelprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Split(args) => run_split(args),
        Commands::Prepare(args) => run_prepare(args),
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), PrepError> {
    let layout = DatasetLayout::discover(&args.root)?;
    let (categories, pipeline) = build_pipeline(&args.source)?;

    let splits = match args.split {
        Some(split) => vec![split.into()],
        None => layout.present_splits(),
    };
    if splits.is_empty() {
        return Err(PrepError::LayoutInvalid {
            path: args.root.clone(),
            message: "no split has both images/<split> and labels/<split>".to_string(),
        });
    }

    let mut report = ConversionReport::new(pipeline.format().name());
    for split in splits {
        report.merge(pipeline.convert_split(&layout, split, args.output.as_deref())?);
    }

    if args.data_yaml {
        let path = write_data_yaml(layout.root(), &categories)?;
        info!("wrote {}", path.display());
    }

    finish(report, args.source.report, |report| {
        println!("Converted {} dataset at {}:", report.format, args.root.display());
        print!("{report}");
    })
}

fn run_split(args: SplitArgs) -> Result<(), PrepError> {
    let layout = DatasetLayout::discover(&args.root)?;
    let splitter = DatasetSplitter::new(args.val_ratio)?;

    let inventory = SplitInventory::scan(&layout)?;
    let stems = inventory.stems();
    info!(
        "splitting {} image(s) ({} in train, {} in val) with val ratio {} and seed {}",
        stems.len(),
        inventory.image_count(Split::Train),
        inventory.image_count(Split::Val),
        splitter.val_ratio(),
        args.seed
    );

    let assignment = splitter.split_seeded(&stems, args.seed);
    let summary = realize_split(&layout, &inventory, &assignment)?;

    println!(
        "Split {} image(s): {} train, {} val",
        summary.population,
        assignment.members(Split::Train).len(),
        assignment.members(Split::Val).len()
    );
    println!(
        "  moved {} image(s) and {} label file(s); {} image(s) already in place, {} without a label file",
        summary.images_transferred,
        summary.labels_transferred,
        summary.kept,
        summary.images_without_labels
    );
    Ok(())
}

fn run_prepare(args: PrepareArgs) -> Result<(), PrepError> {
    let (categories, pipeline) = build_pipeline(&args.source)?;
    let options = PrepareOptions {
        images_dir: args.images,
        annotations_dir: args.annotations,
        output_root: args.output,
        splitter: DatasetSplitter::new(args.val_ratio)?,
        seed: args.seed,
    };

    let summary = prepare_dataset(&options, &pipeline)?;
    let path = write_data_yaml(&options.output_root, &categories)?;
    info!("wrote {}", path.display());

    finish(summary.report, args.source.report, |report| {
        println!(
            "Prepared dataset at {}: {} train, {} val image(s)",
            options.output_root.display(),
            summary.train_images,
            summary.val_images
        );
        if summary.images_without_annotations > 0 {
            println!(
                "  {} image(s) had no annotation file",
                summary.images_without_annotations
            );
        }
        print!("{report}");
    })
}

/// Loads the vocabulary and builds the parser for `args.format`.
fn build_pipeline(args: &SourceArgs) -> Result<(CategoryMap, ConversionPipeline), PrepError> {
    let categories = match &args.categories {
        Some(path) => CategoryMap::from_yaml_file(path)?,
        None => CategoryMap::preset(args.preset.into()),
    };

    let format: SourceFormat = args.format.into();
    info!(
        "format {format}, {} categor{}, jobs {}",
        categories.len(),
        if categories.len() == 1 { "y" } else { "ies" },
        if args.jobs == 0 {
            "auto".to_string()
        } else {
            args.jobs.to_string()
        }
    );

    let parser: Box<dyn AnnotationParser> = match format {
        SourceFormat::Json => Box::new(JsonAnnotationParser::new(categories.clone())),
        SourceFormat::Text => {
            let class_id = ClassId::new(args.text_class);
            if categories.name_of(class_id).is_none() {
                return Err(PrepError::ParserConfig(format!(
                    "text class id {class_id} is outside the {} configured categories",
                    categories.len()
                )));
            }
            let parser = TextAnnotationParser::new(class_id)?;
            match &args.text_label {
                Some(label) => Box::new(parser.with_label_filter(label.clone())),
                None => Box::new(parser),
            }
        }
    };

    Ok((categories, ConversionPipeline::new(parser).with_jobs(args.jobs)))
}

/// Prints the report and turns write failures into the run's error.
fn finish(
    report: ConversionReport,
    format: ReportFormat,
    print_text: impl FnOnce(&ConversionReport),
) -> Result<(), PrepError> {
    match format {
        ReportFormat::Text => print_text(&report),
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).map_err(|err| PrepError::Io(err.into()))?;
            println!("{json}");
        }
    }

    if report.has_failures() {
        return Err(PrepError::ConversionFailed {
            failed: report.failed_count(),
            report: Box::new(report),
        });
    }
    Ok(())
}
