use std::fs::{self, File};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use memmap2::MmapOptions;
use rayon::prelude::*;
use rootcause::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use gfbconv::convert::bundle::{BundlePart, BundleWriter};
use gfbconv::convert::skeleton::ParentIndexPolicy;
use gfbconv::data::mini::{self, Mini};
use gfbconv::models::gfb::GfbModel;
use gfbconv::{ConversionOptions, convert};

/// Convert legacy GFB models and work with mini containers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert JSON-encoded legacy models into Trinity bundles
    Convert {
        /// Output directory. Bundles are written below `bin/pokemon/` in here
        #[clap(short, long, default_value = "out")]
        out_dir: PathBuf,

        /// Legacy units per output unit
        #[clap(long, value_parser = parse_unit_scale)]
        unit_scale: Option<f32>,

        /// Rewrite skeleton parent indices after transparency groups are removed
        #[clap(long)]
        renumber_parents: bool,

        /// Override the derived `pm####_00_00` result name
        #[clap(long)]
        result_name: Option<String>,

        /// Model files or glob patterns
        #[clap(required = true)]
        inputs: Vec<String>,
    },
    /// Pack files into a mini container
    Pack {
        /// Two-character identifier, e.g. `BL`
        #[clap(short, long, value_parser = parse_identifier)]
        identifier: [u8; 2],

        /// Output file
        #[clap(short, long)]
        out: PathBuf,

        /// Files to pack, in order
        files: Vec<PathBuf>,
    },
    /// Unpack a mini container into numbered files
    Unpack {
        /// Identifier the container must carry. Sniffed when omitted
        #[clap(short, long, value_parser = parse_identifier)]
        identifier: Option<[u8; 2]>,

        #[clap(short, long, default_value = ".")]
        out_dir: PathBuf,

        input: PathBuf,
    },
    /// Print the identifier of each mini container
    Identify { files: Vec<PathBuf> },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("no input files matched")]
    NoInputs,
    #[error("{failed} of {total} conversions failed")]
    ConversionsFailed { failed: usize, total: usize },
}

fn parse_identifier(value: &str) -> Result<[u8; 2], String> {
    match value.as_bytes() {
        [a, b] => Ok([*a, *b]),
        _ => Err(format!("identifier must be exactly two bytes, got {value:?}")),
    }
}

fn parse_unit_scale(value: &str) -> Result<f32, String> {
    let scale: f32 = value.parse().map_err(|e| format!("{e}"))?;
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(format!("unit scale must be positive, got {value}"))
    }
}

/// Writes each bundle part as pretty JSON next to its logical path.
struct JsonDirWriter<'a> {
    root: &'a Path,
}

impl BundleWriter for JsonDirWriter<'_> {
    type Error = Report;

    fn write(&mut self, path: &str, part: BundlePart<'_>) -> Result<(), Self::Error> {
        let target = self.root.join(format!("{path}.json"));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .context_with(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = part.to_json().context("Failed to serialize bundle part")?;
        fs::write(&target, json).context_with(|| format!("Failed to write {}", target.display()))?;
        debug!("wrote {}", target.display());
        Ok(())
    }
}

fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>, Report> {
    let mut paths = Vec::new();
    for pattern in patterns {
        for entry in glob::glob(pattern).context_with(|| format!("Invalid pattern {pattern}"))? {
            paths.push(entry?);
        }
    }
    if paths.is_empty() {
        return Err(CliError::NoInputs.into());
    }
    Ok(paths)
}

fn convert_one(path: &Path, options: &ConversionOptions, out_dir: &Path) -> Result<(), Report> {
    let data = fs::read(path).context_with(|| format!("Failed to read {}", path.display()))?;
    let model: GfbModel = serde_json::from_slice(&data)
        .context_with(|| format!("Failed to parse {}", path.display()))?;

    let output =
        convert(&model, options).context_with(|| format!("Failed to convert {}", path.display()))?;

    for dropped in &output.diagnostics.dropped_parameters {
        debug!(
            "{}: dropped {:?} parameter {} of material {}",
            path.display(),
            dropped.kind,
            dropped.name,
            dropped.material
        );
    }
    if !output.diagnostics.dropped_parameters.is_empty() {
        info!(
            "{}: {} material parameters have no Standard shader counterpart",
            path.display(),
            output.diagnostics.dropped_parameters.len()
        );
    }

    let written = output
        .bundle
        .write_to(&mut JsonDirWriter { root: out_dir })?;
    info!(
        "{} -> {} ({written} files)",
        path.display(),
        output.bundle.base_path()
    );
    Ok(())
}

fn run_convert(
    inputs: &[String],
    out_dir: &Path,
    options: &ConversionOptions,
) -> Result<(), Report> {
    let paths = expand_inputs(inputs)?;
    let failed = paths
        .par_iter()
        .filter_map(|path| convert_one(path, options, out_dir).err())
        .inspect(|report| warn!("{report}"))
        .count();

    if failed > 0 {
        return Err(CliError::ConversionsFailed {
            failed,
            total: paths.len(),
        }
        .into());
    }
    Ok(())
}

fn run_pack(identifier: [u8; 2], out: &Path, files: &[PathBuf]) -> Result<(), Report> {
    let entries = files
        .iter()
        .map(|path| fs::read(path).context_with(|| format!("Failed to read {}", path.display())))
        .collect::<Result<Vec<_>, _>>()?;
    let mini = Mini {
        identifier,
        entries,
    };
    let packed = mini.pack().context("Failed to pack container")?;
    fs::write(out, &packed).context_with(|| format!("Failed to write {}", out.display()))?;
    info!(
        "packed {} files into {} ({} bytes)",
        files.len(),
        out.display(),
        packed.len()
    );
    Ok(())
}

fn run_unpack(identifier: Option<[u8; 2]>, out_dir: &Path, input: &Path) -> Result<(), Report> {
    let file = File::open(input).context_with(|| format!("Failed to open {}", input.display()))?;
    let mmap = unsafe { MmapOptions::new().map(&file)? };

    let identifier = identifier.or_else(|| mini::identify(&mmap));
    let container = mini::unpack(&mmap, identifier)
        .context_with(|| format!("Failed to unpack {}", input.display()))?;

    fs::create_dir_all(out_dir)?;
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    for (idx, entry) in container.entries.iter().enumerate() {
        let target = out_dir.join(format!("{stem}_{idx:03}.bin"));
        fs::write(&target, entry)
            .context_with(|| format!("Failed to write {}", target.display()))?;
    }
    info!(
        "unpacked {} entries from {} ({})",
        container.entries.len(),
        input.display(),
        container.identifier_str()
    );
    Ok(())
}

fn run_identify(files: &[PathBuf]) -> Result<(), Report> {
    for path in files {
        let file = File::open(path).context_with(|| format!("Failed to open {}", path.display()))?;
        let mmap = unsafe { MmapOptions::new().map(&file)? };
        match mini::identify(&mmap) {
            Some(identifier) => println!(
                "{}: {}",
                path.display(),
                String::from_utf8_lossy(&identifier)
            ),
            None => println!("{}: not a mini container", path.display()),
        }
    }
    Ok(())
}

fn main() -> Result<(), Report> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Convert {
            out_dir,
            unit_scale,
            renumber_parents,
            result_name,
            inputs,
        } => {
            let parent_policy = if renumber_parents {
                ParentIndexPolicy::Renumber
            } else {
                ParentIndexPolicy::Preserve
            };
            let options = ConversionOptions::builder()
                .maybe_unit_scale(unit_scale)
                .parent_policy(parent_policy)
                .maybe_result_name(result_name)
                .build();
            run_convert(&inputs, &out_dir, &options)
        }
        Command::Pack {
            identifier,
            out,
            files,
        } => run_pack(identifier, &out, &files),
        Command::Unpack {
            identifier,
            out_dir,
            input,
        } => run_unpack(identifier, &out_dir, &input),
        Command::Identify { files } => run_identify(&files),
    }
}
