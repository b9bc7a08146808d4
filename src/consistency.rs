// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use scylla::statement::Consistency;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Consistency level applied to newly created sessions.
///
/// Names follow CQL (`LOCAL_QUORUM`, `ONE`, ...) and parse case-insensitively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsistencyLevel {
    Any,
    One,
    Two,
    Three,
    Quorum,
    All,
    LocalQuorum,
    EachQuorum,
    Serial,
    LocalSerial,
    LocalOne,
}

impl ConsistencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsistencyLevel::Any => "ANY",
            ConsistencyLevel::One => "ONE",
            ConsistencyLevel::Two => "TWO",
            ConsistencyLevel::Three => "THREE",
            ConsistencyLevel::Quorum => "QUORUM",
            ConsistencyLevel::All => "ALL",
            ConsistencyLevel::LocalQuorum => "LOCAL_QUORUM",
            ConsistencyLevel::EachQuorum => "EACH_QUORUM",
            ConsistencyLevel::Serial => "SERIAL",
            ConsistencyLevel::LocalSerial => "LOCAL_SERIAL",
            ConsistencyLevel::LocalOne => "LOCAL_ONE",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown consistency level '{0}'")]
pub struct ParseConsistencyError(String);

impl FromStr for ConsistencyLevel {
    type Err = ParseConsistencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = match s.trim().to_ascii_uppercase().as_str() {
            "ANY" => ConsistencyLevel::Any,
            "ONE" => ConsistencyLevel::One,
            "TWO" => ConsistencyLevel::Two,
            "THREE" => ConsistencyLevel::Three,
            "QUORUM" => ConsistencyLevel::Quorum,
            "ALL" => ConsistencyLevel::All,
            "LOCAL_QUORUM" => ConsistencyLevel::LocalQuorum,
            "EACH_QUORUM" => ConsistencyLevel::EachQuorum,
            "SERIAL" => ConsistencyLevel::Serial,
            "LOCAL_SERIAL" => ConsistencyLevel::LocalSerial,
            "LOCAL_ONE" => ConsistencyLevel::LocalOne,
            _ => return Err(ParseConsistencyError(s.to_string())),
        };
        Ok(level)
    }
}

impl From<ConsistencyLevel> for Consistency {
    fn from(level: ConsistencyLevel) -> Self {
        match level {
            ConsistencyLevel::Any => Consistency::Any,
            ConsistencyLevel::One => Consistency::One,
            ConsistencyLevel::Two => Consistency::Two,
            ConsistencyLevel::Three => Consistency::Three,
            ConsistencyLevel::Quorum => Consistency::Quorum,
            ConsistencyLevel::All => Consistency::All,
            ConsistencyLevel::LocalQuorum => Consistency::LocalQuorum,
            ConsistencyLevel::EachQuorum => Consistency::EachQuorum,
            ConsistencyLevel::Serial => Consistency::Serial,
            ConsistencyLevel::LocalSerial => Consistency::LocalSerial,
            ConsistencyLevel::LocalOne => Consistency::LocalOne,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("local_quorum".parse::<ConsistencyLevel>(), Ok(ConsistencyLevel::LocalQuorum));
        assert_eq!("QUORUM".parse::<ConsistencyLevel>(), Ok(ConsistencyLevel::Quorum));
        assert_eq!(" One ".parse::<ConsistencyLevel>(), Ok(ConsistencyLevel::One));
    }

    #[test]
    fn test_parse_unknown_level() {
        let err = "MOST".parse::<ConsistencyLevel>().unwrap_err();
        assert!(err.to_string().contains("MOST"));
    }

    #[test]
    fn test_display_matches_cql_name() {
        assert_eq!(ConsistencyLevel::EachQuorum.to_string(), "EACH_QUORUM");
        assert_eq!(
            ConsistencyLevel::LocalSerial.to_string().parse::<ConsistencyLevel>(),
            Ok(ConsistencyLevel::LocalSerial)
        );
    }

    #[test]
    fn test_into_driver_consistency() {
        assert_eq!(Consistency::from(ConsistencyLevel::LocalOne), Consistency::LocalOne);
        assert_eq!(Consistency::from(ConsistencyLevel::All), Consistency::All);
    }

    #[test]
    fn test_deserialize_screaming_snake_case() {
        let level: ConsistencyLevel = serde_json::from_str("\"LOCAL_QUORUM\"").unwrap();
        assert_eq!(level, ConsistencyLevel::LocalQuorum);
    }
}
