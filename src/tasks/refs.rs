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

//! Name-or-ID addressing. Array resources are referenced either by the
//! system-generated 36-character id or by a human-readable name; the
//! classification happens once here instead of ad hoc per lookup.

use once_cell::sync::Lazy;
use regex::Regex;

static ID_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$").unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Id(String),
    Name(String),
}

impl ResourceRef {
    pub fn parse(s: &str) -> ResourceRef {
        if ID_FORMAT.is_match(s) {
            ResourceRef::Id(s.to_string())
        } else {
            ResourceRef::Name(s.to_string())
        }
    }

    /// Build from a pair of optional id/name parameters, id winning when
    /// both are supplied.
    pub fn from_params(id: &Option<String>, name: &Option<String>) -> Option<ResourceRef> {
        match (id, name) {
            (Some(id), _) => Some(ResourceRef::Id(id.clone())),
            (None, Some(name)) => Some(ResourceRef::parse(name)),
            (None, None) => None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ResourceRef::Name(n) => Some(n),
            ResourceRef::Id(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ResourceRef::Id(id) => format!("id '{}'", id),
            ResourceRef::Name(name) => format!("name '{}'", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_ids() {
        let r = ResourceRef::parse("3f4e2a1b-9c8d-4e5f-a6b7-c8d9e0f1a2b3");
        assert_eq!(r, ResourceRef::Id("3f4e2a1b-9c8d-4e5f-a6b7-c8d9e0f1a2b3".to_string()));
    }

    #[test]
    fn test_parse_classifies_names() {
        assert_eq!(ResourceRef::parse("volume-1"), ResourceRef::Name("volume-1".to_string()));
        // right length but not the id format
        assert_eq!(
            ResourceRef::parse("this-is-not-an-identifier-but-is-36c"),
            ResourceRef::Name("this-is-not-an-identifier-but-is-36c".to_string())
        );
    }

    #[test]
    fn test_from_params_prefers_id() {
        let r = ResourceRef::from_params(&Some("abc".to_string()), &Some("vol".to_string()));
        assert_eq!(r, Some(ResourceRef::Id("abc".to_string())));
        assert_eq!(ResourceRef::from_params(&None, &None), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(ResourceRef::Name("v1".to_string()).describe(), "name 'v1'");
        assert_eq!(ResourceRef::Id("x".to_string()).describe(), "id 'x'");
    }
}
