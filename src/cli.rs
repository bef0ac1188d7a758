use std::path::{Path, PathBuf};

use crate::document::Dataset;
use crate::error::{Error, Result};
use crate::options::{RenderOptions, RenderOverrides};

/// Command line shared by the desktop and terminal hosts.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Args {
    /// Pre-loaded query responses offered in the dataset picker
    pub datasets: Vec<PathBuf>,
    pub options: Option<PathBuf>,
    pub no_animation: bool,
    /// Desktop host only: write this SVG file and exit
    pub export_svg: Option<PathBuf>,
}

pub fn usage(bin: &str) -> String {
    format!(
        "{bin}\n\
\n\
USAGE:\n\
  {bin} [--options <file.json>] [--no-animation] [--export-svg <out.svg>] <dataset.json>...\n\
\n\
NOTES:\n\
  - Each dataset is a JSON object with a `documents` array.\n\
  - `--options` overrides render options (camelCase keys, e.g. width, height, playAnimation).\n\
  - Set RUST_LOG=debug for render diagnostics.\n"
    )
}

/// Parse `argv` including the program name at index 0.
pub fn parse_args(argv: &[String]) -> Result<Args> {
    let bin = argv
        .first()
        .and_then(|p| Path::new(p).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mediamap".to_string());
    let usage_error = || Error::Usage(usage(&bin));

    let mut args = Args::default();
    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(usage_error()),
            "--no-animation" => args.no_animation = true,
            "--options" => {
                let Some(path) = it.next() else {
                    return Err(usage_error());
                };
                args.options = Some(PathBuf::from(path));
            }
            "--export-svg" => {
                let Some(path) = it.next() else {
                    return Err(usage_error());
                };
                args.export_svg = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => return Err(usage_error()),
            path => args.datasets.push(PathBuf::from(path)),
        }
    }
    Ok(args)
}

impl Args {
    /// Defaults, shallow-merged with the `--options` file, then `--no-animation`.
    pub fn render_options(&self) -> Result<RenderOptions> {
        let mut options = RenderOptions::default();
        if let Some(path) = &self.options {
            options = options.merged(RenderOverrides::load(path)?);
        }
        if self.no_animation {
            options = options.with_play_animation(false);
        }
        Ok(options)
    }
}

/// A dataset offered in a picker, loaded on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetEntry {
    pub name: String,
    pub path: PathBuf,
}

impl DatasetEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }

    pub fn load(&self) -> Result<Dataset> {
        Dataset::load(&self.path)
    }
}
