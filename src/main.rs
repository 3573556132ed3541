//! Mapstitch - command-line tool for merging tile maps and recoloring tilesets

use std::process::ExitCode;

use mapstitch::cli;

fn main() -> ExitCode {
    cli::run()
}
