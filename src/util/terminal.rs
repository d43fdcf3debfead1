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

//! Markdown-backed terminal rendering for banners and the playbook/show
//! tables.

pub fn markdown_print(markdown: &str) {
    termimad::print_text(markdown);
}

pub fn banner(msg: &str) {
    markdown_print(&format!("|:-|\n|{}|\n|-", msg));
}

pub fn two_column_table(header_a: &str, header_b: &str, rows: &[(String, String)]) {
    let mut buffer = format!("|:-|:-\n|{}|{}\n", header_a, header_b);
    for (a, b) in rows.iter() {
        buffer.push_str(&format!("|-|-\n|{}|{}\n", a, b));
    }
    buffer.push_str("|-|-\n");
    markdown_print(&buffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_renders() {
        banner("array01 => site.yml");
    }

    #[test]
    fn test_two_column_table_renders() {
        let rows = vec![
            (String::from("create the data volume"), String::from("volume")),
            (String::from("gather facts"), String::from("info")),
        ];
        two_column_table("*Task*", "*Module*", &rows);
    }

    #[test]
    fn test_two_column_table_handles_no_rows() {
        two_column_table("*Task*", "*Module*", &[]);
    }
}
