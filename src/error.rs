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

use std::fmt;
use std::error::Error as StdError;
use std::io;

/// Main error type for Powerjet operations
#[derive(Debug)]
pub enum PowerjetError {
    /// Configuration errors
    Config(String),

    /// Playbook parsing errors
    PlaybookParse(String),

    /// Task execution errors
    TaskExecution(String),

    /// Array connection errors
    Connection(String),

    /// Module errors
    Module(String),

    /// Template errors
    Template(String),

    /// IO errors
    Io(io::Error),

    /// YAML parsing errors
    Yaml(serde_yaml::Error),

    /// Variable errors
    Variable(String),

    /// Authentication errors
    Auth(String),

    /// Other errors
    Other(String),
}

impl fmt::Display for PowerjetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerjetError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PowerjetError::PlaybookParse(msg) => write!(f, "Playbook parsing error: {}", msg),
            PowerjetError::TaskExecution(msg) => write!(f, "Task execution error: {}", msg),
            PowerjetError::Connection(msg) => write!(f, "Connection error: {}", msg),
            PowerjetError::Module(msg) => write!(f, "Module error: {}", msg),
            PowerjetError::Template(msg) => write!(f, "Template error: {}", msg),
            PowerjetError::Io(err) => write!(f, "IO error: {}", err),
            PowerjetError::Yaml(err) => write!(f, "YAML error: {}", err),
            PowerjetError::Variable(msg) => write!(f, "Variable error: {}", msg),
            PowerjetError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            PowerjetError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl StdError for PowerjetError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PowerjetError::Io(err) => Some(err),
            PowerjetError::Yaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for PowerjetError {
    fn from(err: io::Error) -> Self {
        PowerjetError::Io(err)
    }
}

impl From<serde_yaml::Error> for PowerjetError {
    fn from(err: serde_yaml::Error) -> Self {
        PowerjetError::Yaml(err)
    }
}

impl From<String> for PowerjetError {
    fn from(err: String) -> Self {
        PowerjetError::Other(err)
    }
}

impl From<&str> for PowerjetError {
    fn from(err: &str) -> Self {
        PowerjetError::Other(err.to_string())
    }
}

/// Result type alias for Powerjet operations
pub type Result<T> = std::result::Result<T, PowerjetError>;

/// Helper trait to convert plain String errors to PowerjetError
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> Result<T>;
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::result::Result<T, String> {
    fn context(self, context: &str) -> Result<T> {
        self.map_err(|e| PowerjetError::Other(format!("{}: {}", context, e)))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PowerjetError::Other(format!("{}: {}", f(), e)))
    }
}
