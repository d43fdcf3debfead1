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

use crate::client::ArrayConnection;
use crate::util::terminal::{banner, markdown_print, two_column_table};
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

pub const CLI_MODE_UNSET: u32 = 0;
pub const CLI_MODE_RUN: u32 = 1;
pub const CLI_MODE_CHECK: u32 = 2;
pub const CLI_MODE_SHOW: u32 = 3;

// password fallback when --password is not given on the command line
const PASSWORD_ENV: &str = "POWERJET_PASSWORD";

/// Hand-rolled argument parser; the command surface is small enough that a
/// CLI crate earns nothing but compile time.
pub struct CliParser {
    pub mode: u32,
    pub needs_help: bool,
    pub needs_version: bool,
    pub playbook_set: bool,
    pub playbook_paths: Arc<RwLock<Vec<PathBuf>>>,
    pub array_endpoint: Option<String>,
    pub array_user: String,
    pub array_password: Option<String>,
    pub verify_certs: bool,
    pub timeout: Option<u64>,
    pub verbosity: u32,
    pub extra_vars: serde_yaml::Value,
}

impl CliParser {
    pub fn new() -> Self {
        Self {
            mode: CLI_MODE_UNSET,
            needs_help: false,
            needs_version: false,
            playbook_set: false,
            playbook_paths: Arc::new(RwLock::new(Vec::new())),
            array_endpoint: None,
            array_user: String::from("admin"),
            array_password: None,
            verify_certs: false,
            timeout: None,
            verbosity: 0,
            extra_vars: serde_yaml::Value::Mapping(Default::default()),
        }
    }

    pub fn parse(&mut self) -> Result<(), String> {
        let args: Vec<String> = env::args().skip(1).collect();
        self.parse_arguments(args)
    }

    pub fn parse_arguments(&mut self, args: Vec<String>) -> Result<(), String> {
        if args.is_empty() {
            self.needs_help = true;
            return Ok(());
        }

        match args[0].as_str() {
            "run" => self.mode = CLI_MODE_RUN,
            "check" => self.mode = CLI_MODE_CHECK,
            "show" => self.mode = CLI_MODE_SHOW,
            "--help" | "-h" | "help" => {
                self.needs_help = true;
                return Ok(());
            }
            "--version" => {
                self.needs_version = true;
                return Ok(());
            }
            other => return Err(format!("unknown mode '{}', expecting run, check or show", other)),
        }

        let mut index = 1;
        while index < args.len() {
            let arg = args[index].as_str();
            match arg {
                "-v" => { self.verbosity += 1; index += 1; continue; }
                "-vv" => { self.verbosity += 2; index += 1; continue; }
                "-vvv" => { self.verbosity += 3; index += 1; continue; }
                "--verify-certs" => { self.verify_certs = true; index += 1; continue; }
                "--help" | "-h" => { self.needs_help = true; return Ok(()); }
                _ => {}
            }

            let value = match args.get(index + 1) {
                Some(value) => value.clone(),
                None => return Err(format!("missing value for argument '{}'", arg)),
            };

            match arg {
                "--playbook" | "-p" => self.store_playbooks(&value)?,
                "--array" | "-a" => self.array_endpoint = Some(value),
                "--user" | "-u" => self.array_user = value,
                "--password" => self.array_password = Some(value),
                "--timeout" => {
                    self.timeout = Some(value.parse::<u64>()
                        .map_err(|_| format!("--timeout is not a number: {}", value))?);
                }
                "--extra-vars" | "-e" => {
                    self.extra_vars = serde_yaml::from_str(&value)
                        .map_err(|e| format!("--extra-vars is not valid YAML: {}", e))?;
                }
                _ => return Err(format!("unknown argument '{}'", arg)),
            }
            index += 2;
        }

        if self.array_password.is_none() {
            self.array_password = env::var(PASSWORD_ENV).ok();
        }
        Ok(())
    }

    fn store_playbooks(&mut self, value: &str) -> Result<(), String> {
        for entry in value.split(':') {
            let path = expanduser::expanduser(entry)
                .map_err(|_| format!("unable to expand path: {}", entry))?;
            self.playbook_paths.write().unwrap().push(path);
        }
        self.playbook_set = true;
        Ok(())
    }

    /// The connection assembled from --array/--user/--password, if any. Plays
    /// carrying their own `array:` block do not need one.
    pub fn to_connection(&self) -> Result<Option<ArrayConnection>, String> {
        let endpoint = match &self.array_endpoint {
            Some(endpoint) => endpoint.clone(),
            None => return Ok(None),
        };
        let password = self.array_password.clone()
            .ok_or_else(|| format!("--array requires --password or the {} environment variable", PASSWORD_ENV))?;
        Ok(Some(ArrayConnection {
            endpoint,
            user: self.array_user.clone(),
            password,
            verify_certs: Some(self.verify_certs),
            timeout: self.timeout,
        }))
    }

    pub fn show_version(&self) {
        banner(&format!("powerjet {}", env!("CARGO_PKG_VERSION")));
    }

    pub fn show_help(&self) {
        markdown_print(&String::from("# powerjet\n\ndeclarative automation for Dell PowerStore arrays\n"));
        println!();

        let mode_table = "|:-|:-|\n\
                          |*Mode*|*Description*|\n\
                          |-|-|\n\
                          |run|run playbooks against an array|\n\
                          |-|-|\n\
                          |check|like run, but report changes without making them|\n\
                          |-|-|\n\
                          |show|summarize the plays and tasks in a playbook|\n\
                          |-|-|\n".to_string();
        markdown_print(&mode_table);
        println!();

        two_column_table(&String::from("*Flag*"), &String::from("*Description*"), &vec![
            (String::from("--playbook, -p"), String::from("colon-separated playbook paths (required)")),
            (String::from("--array, -a"), String::from("array management address, used by plays without an array block")),
            (String::from("--user, -u"), String::from("array user, default 'admin'")),
            (String::from("--password"), format!("array password, or set {}", PASSWORD_ENV)),
            (String::from("--verify-certs"), String::from("verify the array's TLS certificate")),
            (String::from("--timeout"), String::from("job wait timeout in seconds, default 120")),
            (String::from("--extra-vars, -e"), String::from("extra variables as inline YAML, highest precedence")),
            (String::from("-v, -vv, -vvv"), String::from("increase output verbosity")),
        ]);
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_arguments_asks_for_help() {
        let mut parser = CliParser::new();
        parser.parse_arguments(vec![]).unwrap();
        assert!(parser.needs_help);
    }

    #[test]
    fn test_run_mode_with_playbook() {
        let mut parser = CliParser::new();
        parser.parse_arguments(args(&["run", "--playbook", "site.yml", "-v"])).unwrap();
        assert_eq!(parser.mode, CLI_MODE_RUN);
        assert!(parser.playbook_set);
        assert_eq!(parser.playbook_paths.read().unwrap().len(), 1);
        assert_eq!(parser.verbosity, 1);
    }

    #[test]
    fn test_colon_separated_playbooks() {
        let mut parser = CliParser::new();
        parser.parse_arguments(args(&["check", "-p", "one.yml:two.yml"])).unwrap();
        assert_eq!(parser.mode, CLI_MODE_CHECK);
        assert_eq!(parser.playbook_paths.read().unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_mode_is_an_error() {
        let mut parser = CliParser::new();
        let result = parser.parse_arguments(args(&["fly", "-p", "site.yml"]));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("unknown mode"));
    }

    #[test]
    fn test_missing_value_is_an_error() {
        let mut parser = CliParser::new();
        let result = parser.parse_arguments(args(&["run", "--playbook"]));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("missing value"));
    }

    #[test]
    fn test_connection_requires_password() {
        let mut parser = CliParser::new();
        parser.parse_arguments(args(&["run", "-p", "site.yml", "--array", "10.0.0.5"])).unwrap();
        parser.array_password = None;
        assert!(parser.to_connection().is_err());

        parser.array_password = Some(String::from("secret"));
        let connection = parser.to_connection().unwrap().unwrap();
        assert_eq!(connection.endpoint, "10.0.0.5");
        assert_eq!(connection.user, "admin");
    }

    #[test]
    fn test_extra_vars_parse_as_yaml() {
        let mut parser = CliParser::new();
        parser.parse_arguments(args(&["run", "-p", "site.yml", "-e", "size: 20"])).unwrap();
        assert_eq!(parser.extra_vars["size"], serde_yaml::Value::from(20));
    }
}
