//! SkyTile CLI - render one celestial map tile
//!
//! Parses the tile request from the command line, renders it with the
//! `skytile` library and writes the encoded image to stdout. Logs go to
//! stderr.
//!
//! ```text
//! skytile -x 10 -X 11 -y 0 -Y 1 -w 256 -h 256 -l solid -l grid > tile.png
//! ```

mod cli;
mod error;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;

use cli::Cli;
use error::CliError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = skytile::logging::init_logging(cli.verbose) {
        eprintln!("Warning: failed to initialise logging: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Tile request failed");
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = cli.load_config()?;
    let request = cli.to_request(&config)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    skytile::render_tile(&request, &mut out)?;
    out.flush().map_err(|e| CliError::Tile(e.into()))?;
    Ok(())
}
