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

use crate::output::RecapData;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Bookkeeping for one playbook run: where we are and what has happened.
pub struct PlaybookContext {
    pub playbook_path: Option<PathBuf>,
    pub play_name: Option<String>,
    pub array: Option<String>,
    pub started: DateTime<Utc>,
    pub ok_count: usize,
    pub changed_count: usize,
    pub failed_count: usize,
    pub skipped_count: usize,
}

impl PlaybookContext {
    pub fn new() -> Self {
        Self {
            playbook_path: None,
            play_name: None,
            array: None,
            started: Utc::now(),
            ok_count: 0,
            changed_count: 0,
            failed_count: 0,
            skipped_count: 0,
        }
    }

    pub fn set_playbook_path(&mut self, path: &PathBuf) {
        self.playbook_path = Some(path.clone());
    }

    /// Counters reset at play start so the recap covers one play.
    pub fn set_play(&mut self, play_name: &str, array: &str) {
        self.play_name = Some(play_name.to_string());
        self.array = Some(array.to_string());
        self.ok_count = 0;
        self.changed_count = 0;
        self.failed_count = 0;
        self.skipped_count = 0;
    }

    pub fn increment_ok(&mut self) {
        self.ok_count += 1;
    }

    pub fn increment_changed(&mut self) {
        self.changed_count += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed_count += 1;
    }

    pub fn increment_skipped(&mut self) {
        self.skipped_count += 1;
    }

    pub fn elapsed_seconds(&self) -> i64 {
        (Utc::now() - self.started).num_seconds()
    }

    pub fn recap_data(&self) -> RecapData {
        RecapData {
            array: self.array.clone().unwrap_or_else(|| String::from("?")),
            ok: self.ok_count,
            changed: self.changed_count,
            failed: self.failed_count,
            skipped: self.skipped_count,
        }
    }
}
