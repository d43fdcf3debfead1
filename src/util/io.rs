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

use std::path::Path;
use std::process;
use std::io::Read;

// open a file per the normal rust way, but map any errors to strings
pub fn jet_file_open(path: &Path) -> Result<std::fs::File, String> {
    return std::fs::File::open(path).map_err(
        |_x| format!("unable to open file: {}", path.display())
    );
}

pub fn read_local_file(path: &Path) -> Result<String,String> {
    let mut file = jet_file_open(path)?;
    let mut buffer = String::new();
    let read_result = file.read_to_string(&mut buffer);
    match read_result {
        Ok(_) => {},
        Err(x) => {
            return Err(format!("unable to read file: {}, {:?}", path.display(), x));
        }
    };
    return Ok(buffer.clone());
}

pub fn path_as_string(path: &Path) -> String {
    return path.to_str().unwrap().to_string();
}

pub fn quit(s: &String) {
    // quit with a message - don't use this except in main.rs!
    println!("{}", s);
    process::exit(0x01)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_jet_file_open_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        File::create(&file_path).unwrap();

        let result = jet_file_open(&file_path);
        assert!(result.is_ok());
    }

    #[test]
    fn test_jet_file_open_failure() {
        let non_existent = Path::new("/non/existent/file.txt");
        let result = jet_file_open(non_existent);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("unable to open file"));
    }

    #[test]
    fn test_read_local_file_success() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test.txt");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "Test content").unwrap();
        writeln!(file, "Second line").unwrap();

        let result = read_local_file(&file_path);
        assert!(result.is_ok());

        let content = result.unwrap();
        assert!(content.contains("Test content"));
        assert!(content.contains("Second line"));
    }

    #[test]
    fn test_read_local_file_failure() {
        let non_existent = Path::new("/non/existent/file.txt");
        let result = read_local_file(non_existent);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("unable to open file"));
    }

    #[test]
    fn test_path_as_string() {
        let path = Path::new("/home/user/file.txt");
        let path_str = path_as_string(path);
        assert_eq!(path_str, "/home/user/file.txt");
    }
}
