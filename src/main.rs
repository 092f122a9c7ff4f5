use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crossrig::clip::Clip;
use crossrig::engine;
use crossrig::logging::{LogLevel, ResultExt, init_logging};
use crossrig::mapping::{BoneMappingPreset, suggest_mappings};
use crossrig::settings::{RetargetSettings, load_settings};
use crossrig::skeleton::{BoneList, Skeleton, SkeletonProvider};
use crossrig::store::JsonLibrary;

/// crossrig - bone mapping and animation retargeting between skeletons
#[derive(Parser)]
#[command(name = "crossrig")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (JSON). Defaults apply when omitted
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty bone mapping between two skeletons
    Create {
        /// Source skeleton: a .gltf/.glb file or a comma-separated bone list
        #[arg(short, long)]
        source: String,

        /// Target skeleton: a .gltf/.glb file or a comma-separated bone list
        #[arg(short, long)]
        target: String,

        /// Mapping name (default: <source>_to_<target>)
        #[arg(short, long, default_value = "")]
        name: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// Output file (default: mapping directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the auto-mapper right after creating the mapping
        #[arg(long)]
        auto: bool,
    },

    /// Fill a mapping by fuzzy bone-name matching
    AutoMap {
        /// Mapping file to update
        #[arg(short, long)]
        mapping: PathBuf,

        #[arg(short, long)]
        source: String,

        #[arg(short, long)]
        target: String,

        /// Minimum confidence in [0, 1] (default: from settings)
        #[arg(long)]
        threshold: Option<f64>,

        /// Recompute bones that already have a mapping
        #[arg(long)]
        overwrite: bool,

        /// Write the result here instead of updating the mapping file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the best target candidates for one source bone
    Suggest {
        /// Source bone name
        #[arg(short, long)]
        bone: String,

        #[arg(short, long)]
        target: String,

        #[arg(long, default_value_t = 0.0)]
        threshold: f64,
    },

    /// Check how well a mapping covers an animation on a target skeleton
    Validate {
        /// Animation clip file
        #[arg(short, long)]
        clip: PathBuf,

        #[arg(short, long)]
        mapping: PathBuf,

        #[arg(short, long)]
        target: String,
    },

    /// Retarget an animation clip onto the target skeleton
    Apply {
        #[arg(short, long)]
        clip: PathBuf,

        #[arg(short, long)]
        mapping: PathBuf,

        #[arg(short, long)]
        target: String,

        /// Output clip file (default: animation directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List saved mappings or animations
    List {
        #[arg(value_enum, default_value = "mappings")]
        kind: LibraryKind,
    },

    /// Print a mapping file
    Show {
        #[arg(short, long)]
        mapping: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LibraryKind {
    Mappings,
    Animations,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => RetargetSettings::default(),
    };
    let _ = init_logging(cli.log_level.unwrap_or(settings.log_level));

    match cli.command {
        Commands::Create {
            source,
            target,
            name,
            description,
            output,
            auto,
        } => {
            let source = load_skeleton(&source, "source")?;
            let target = load_skeleton(&target, "target")?;
            let mut preset = engine::create_mapping_between(&source, &target, &name, &description)
                .context("failed to create bone mapping")?;

            if auto {
                let (mapped, summary) = engine::auto_map(
                    preset,
                    &source.bone_names(),
                    &target.bone_names(),
                    settings.auto_map_options(),
                )?;
                preset = mapped;
                println!("{}", summary.message());
            }

            let path = mapping_library(&settings).save(&mut preset, output.as_deref())?;
            println!("{}", preset.summary());
            println!("Bone mapping saved: {}", path.display());
        }

        Commands::AutoMap {
            mapping,
            source,
            target,
            threshold,
            overwrite,
            output,
        } => {
            let mut library = mapping_library(&settings);
            let preset = load_mapping(&library, &mapping)?;
            let source = load_skeleton(&source, "source")?;
            let target = load_skeleton(&target, "target")?;

            let mut options = settings.auto_map_options();
            if let Some(threshold) = threshold {
                options.threshold = threshold;
            }
            options.preserve_existing = options.preserve_existing && !overwrite;

            let (mut preset, summary) =
                engine::auto_map(preset, &source.bone_names(), &target.bone_names(), options)
                    .context("auto-mapping failed")?;

            let path = library.save(&mut preset, Some(output.as_deref().unwrap_or(&mapping)))?;
            println!("{}", summary.message());
            println!("Bone mapping saved: {}", path.display());
        }

        Commands::Suggest {
            bone,
            target,
            threshold,
        } => {
            let target = load_skeleton(&target, "target")?;
            let suggestions = suggest_mappings(&bone, &target.bone_names(), threshold);
            if suggestions.is_empty() {
                println!("No candidates for {bone}");
            }
            for (candidate, confidence) in suggestions {
                println!("{candidate}\t{confidence:.3}");
            }
        }

        Commands::Validate {
            clip,
            mapping,
            target,
        } => {
            let clip = load_clip(&clip_library(&settings), &clip)?;
            let preset = load_mapping(&mapping_library(&settings), &mapping)?;
            let target = load_skeleton(&target, "target")?;

            let report = engine::validate(&clip, &preset, &target.bone_names())
                .context("validation failed")?;
            println!("{}", report.message());
            for source in &report.unmapped {
                println!("  unmapped: {source}");
            }
            for (source, target) in &report.missing_target {
                println!("  missing target: {source} -> {target}");
            }

            if !report.is_valid() {
                return Ok(ExitCode::from(2));
            }
        }

        Commands::Apply {
            clip,
            mapping,
            target,
            output,
        } => {
            let mut clips = clip_library(&settings);
            let clip = load_clip(&clips, &clip)?;
            let preset = load_mapping(&mapping_library(&settings), &mapping)?;
            let target = load_skeleton(&target, "target")?;

            let result = engine::apply_mapping(&clip, &preset, &target.bone_names())
                .log_error(Some("retargeting failed"))
                .context("failed to apply animation with bone mapping")?;

            println!("{}", result.message(&clip, &preset));
            for warning in &result.warnings {
                println!("  {warning}");
            }

            let mut retargeted = result.action.into_clip(target.skeleton_name());
            retargeted.description = format!("{} retargeted with {}", clip.name, preset.name);
            let path = clips.save(&mut retargeted, output.as_deref())?;
            println!("Animation saved: {}", path.display());
        }

        Commands::List { kind } => {
            let listing = match kind {
                LibraryKind::Mappings => mapping_library(&settings).list()?,
                LibraryKind::Animations => clip_library(&settings).list()?,
            };
            if listing.is_empty() {
                println!("Nothing saved yet");
            }
            for (name, path) in listing {
                println!("{name}\t{}", path.display());
            }
        }

        Commands::Show { mapping } => {
            let preset = load_mapping(&mapping_library(&settings), &mapping)?;
            println!("{}", preset.summary());
            for entry in preset.mappings() {
                println!(
                    "  {} -> {} ({:.2})",
                    entry.source_bone, entry.target_bone, entry.confidence
                );
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn mapping_library(settings: &RetargetSettings) -> JsonLibrary<BoneMappingPreset> {
    JsonLibrary::with_cache(&settings.mapping_dir, settings.listing_cache())
}

fn clip_library(settings: &RetargetSettings) -> JsonLibrary<Clip> {
    JsonLibrary::with_cache(&settings.clip_dir, settings.listing_cache())
}

fn load_mapping(
    library: &JsonLibrary<BoneMappingPreset>,
    path: &Path,
) -> Result<BoneMappingPreset> {
    library
        .load(path)
        .with_context(|| format!("failed to load bone mapping: {}", path.display()))
}

fn load_clip(library: &JsonLibrary<Clip>, path: &Path) -> Result<Clip> {
    library
        .load(path)
        .with_context(|| format!("failed to load animation: {}", path.display()))
}

/// Reads a skeleton from a glTF file, or parses a comma-separated bone list.
fn load_skeleton(arg: &str, default_name: &str) -> Result<BoneList> {
    let path = Path::new(arg);
    let is_gltf = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            extension.eq_ignore_ascii_case("gltf") || extension.eq_ignore_ascii_case("glb")
        });

    if !is_gltf {
        return Ok(BoneList::parse(default_name, arg));
    }

    let skeleton = Skeleton::from_gltf(path)
        .with_context(|| format!("failed to read skeleton: {}", path.display()))?;
    Ok(BoneList::new(skeleton.skeleton_name(), &skeleton.bone_names()))
}
