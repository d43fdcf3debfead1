// Powerjet
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

use powerjet::cli::parser::{CliParser, CLI_MODE_CHECK, CLI_MODE_SHOW};
use powerjet::cli::show::show_playbook;
use powerjet::util::io::quit;
use powerjet::{PlaybookRunner, PowerjetConfig, PowerjetError, Result, TerminalOutputHandler};
use std::process;
use std::sync::Arc;

fn main() {
    match liftoff() {
        Err(e) => quit(&e.to_string()),
        _ => {}
    }
}

fn liftoff() -> Result<()> {
    let mut cli_parser = CliParser::new();
    cli_parser.parse().map_err(PowerjetError::Config)?;

    // powerjet --help was given, or no arguments
    if cli_parser.needs_help {
        cli_parser.show_help();
        return Ok(());
    }
    if cli_parser.needs_version {
        cli_parser.show_version();
        return Ok(());
    }

    if !cli_parser.playbook_set {
        return Err(PowerjetError::Config("--playbook is required".into()));
    }

    // show mode never talks to an array
    if cli_parser.mode == CLI_MODE_SHOW {
        for path in cli_parser.playbook_paths.read().unwrap().iter() {
            show_playbook(path).map_err(PowerjetError::Config)?;
        }
        return Ok(());
    }

    let mut config = PowerjetConfig::new()
        .check_mode(cli_parser.mode == CLI_MODE_CHECK)
        .verbosity(cli_parser.verbosity)
        .extra_vars(cli_parser.extra_vars.clone());

    for path in cli_parser.playbook_paths.read().unwrap().iter() {
        config = config.playbook(path.clone());
    }
    if let Some(connection) = cli_parser.to_connection().map_err(PowerjetError::Config)? {
        config = config.array(connection);
    }

    let output_handler = Arc::new(TerminalOutputHandler::new(cli_parser.verbosity));
    let runner = PlaybookRunner::new(config)
        .with_output_handler(output_handler);

    match runner.run() {
        Ok(result) => {
            if !result.success {
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
