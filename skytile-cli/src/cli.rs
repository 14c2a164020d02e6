//! Command-line definition and request assembly.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use skytile::config::ConfigFile;
use skytile::output::OutputSelection;
use skytile::render::LayerArgs;
use skytile::request::{Bounds, TileRequest};

use crate::error::CliError;

/// Render one celestial map tile and write it to stdout.
#[derive(Debug, Parser)]
#[command(name = "skytile", version, disable_help_flag = true)]
pub struct Cli {
    /// Lower RA bound (degrees, or Mercator x with -M)
    #[arg(short = 'x', allow_negative_numbers = true)]
    pub ra_min: Option<f64>,

    /// Upper RA bound (degrees, or Mercator x with -M)
    #[arg(short = 'X', allow_negative_numbers = true)]
    pub ra_max: Option<f64>,

    /// Lower Dec bound (degrees, or Mercator y with -M)
    #[arg(short = 'y', allow_negative_numbers = true)]
    pub dec_min: Option<f64>,

    /// Upper Dec bound (degrees, or Mercator y with -M)
    #[arg(short = 'Y', allow_negative_numbers = true)]
    pub dec_max: Option<f64>,

    /// Bounds are given in unit-square Mercator coordinates
    #[arg(short = 'M')]
    pub mercator: bool,

    /// Tile width in pixels
    #[arg(short = 'w')]
    pub width: Option<u32>,

    /// Tile height in pixels
    #[arg(short = 'h')]
    pub height: Option<u32>,

    /// Layer to render; repeat for more, bottom first
    #[arg(short = 'l', value_name = "LAYER")]
    pub layers: Vec<String>,

    /// Write JPEG instead of PNG
    #[arg(short = 'J')]
    pub jpeg: bool,

    /// Write PDF instead of PNG
    #[arg(short = 'j')]
    pub pdf: bool,

    /// Write the raw float image instead of PNG
    #[arg(short = 'R')]
    pub raw: bool,

    /// File of layer arguments, one per line; may be repeated
    #[arg(short = 'A', value_name = "FILE")]
    pub arg_files: Vec<PathBuf>,

    /// Single layer argument line, e.g. "grid_color 1 1 1 0.5"
    #[arg(long = "arg", value_name = "LINE")]
    pub args: Vec<String>,

    /// Line width in pixels
    #[arg(short = 'L')]
    pub line_width: Option<f64>,

    /// Cache directory
    #[arg(short = 'D', value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Configuration file (default: ~/.skytile/config.ini)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output; repeat for more
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

impl Cli {
    /// Load the configuration named by `--config`, or the default one.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        Ok(match &self.config {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        })
    }

    /// Assemble the tile request. Flags override the config file.
    pub fn to_request(&self, config: &ConfigFile) -> Result<TileRequest, CliError> {
        let (Some(x), Some(xx), Some(y), Some(yy), Some(w), Some(h)) = (
            self.ra_min,
            self.ra_max,
            self.dec_min,
            self.dec_max,
            self.width,
            self.height,
        ) else {
            return Err(CliError::Usage(self.missing_flags()));
        };

        let bounds = if self.mercator {
            Bounds::Mercator {
                x_min: x,
                x_max: xx,
                y_min: y,
                y_max: yy,
            }
        } else {
            Bounds::Celestial {
                ra_min: x,
                ra_max: xx,
                dec_min: y,
                dec_max: yy,
            }
        };

        if self.layers.is_empty() {
            tracing::warn!("No layers requested; the tile will be empty");
        }

        let mut builder = TileRequest::builder()
            .bounds(bounds)
            .size(w, h)
            .layers(self.layers.iter().cloned())
            .output_selection(OutputSelection {
                jpeg: self.jpeg,
                pdf: self.pdf,
                raw: self.raw,
            })
            .args(self.layer_args()?);

        if let Some(limit) = config.max_dimension {
            builder = builder.max_dimension(limit);
        }
        if let Some(width) = self.line_width.or(config.line_width) {
            builder = builder.line_width(width);
        }
        if let Some(dir) = self.cache_dir.as_ref().or(config.cache_dir.as_ref()) {
            builder = builder.cache_dir(dir);
        }

        Ok(builder.build()?)
    }

    /// Argument lines from every `-A` file, in order, then every `--arg`.
    pub fn layer_args(&self) -> Result<LayerArgs, CliError> {
        let mut args = LayerArgs::new();
        for path in &self.arg_files {
            for line in read_arg_file(path)? {
                args.push(line);
            }
        }
        for line in &self.args {
            args.push(line.as_str());
        }
        Ok(args)
    }

    fn missing_flags(&self) -> String {
        let flags = [
            ("-x", self.ra_min.is_none()),
            ("-X", self.ra_max.is_none()),
            ("-y", self.dec_min.is_none()),
            ("-Y", self.dec_max.is_none()),
            ("-w", self.width.is_none()),
            ("-h", self.height.is_none()),
        ];
        let missing: Vec<&str> = flags
            .iter()
            .filter(|(_, absent)| *absent)
            .map(|(flag, _)| *flag)
            .collect();
        format!("Invalid inputs: need {}", missing.join(" "))
    }
}

fn read_arg_file(path: &Path) -> Result<Vec<String>, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ArgFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.lines().map(str::to_string).collect())
}
