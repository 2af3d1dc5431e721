use alloy_primitives::keccak256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fmt, str::FromStr};
use thiserror::Error;

use crate::{blockchain::BlockchainFixture, StateFixture};

/// Output formats a state test can be filled into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureFormat {
    /// Single transaction state test.
    StateTest,
    /// Blockchain test, consumed by block import.
    BlockchainTest,
    /// Blockchain test, consumed through the engine API.
    BlockchainTestHive,
}

impl FixtureFormat {
    /// Every known format.
    pub const ALL: [FixtureFormat; 3] = [
        Self::StateTest,
        Self::BlockchainTest,
        Self::BlockchainTestHive,
    ];

    /// Format name as used in fixture paths.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StateTest => "state_test",
            Self::BlockchainTest => "blockchain_test",
            Self::BlockchainTestHive => "blockchain_test_hive",
        }
    }

    /// Returns `true` if the format is produced by the chain-test generator.
    pub const fn is_blockchain(&self) -> bool {
        matches!(self, Self::BlockchainTest | Self::BlockchainTestHive)
    }
}

impl fmt::Display for FixtureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixture format name that is not known.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown fixture format: {0}")]
pub struct UnknownFixtureFormat(pub String);

impl FromStr for FixtureFormat {
    type Err = UnknownFixtureFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| UnknownFixtureFormat(s.to_string()))
    }
}

/// A filled fixture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fixture {
    /// State test fixture.
    State(StateFixture),
    /// Blockchain test fixture.
    Blockchain(Box<BlockchainFixture>),
}

impl From<StateFixture> for Fixture {
    fn from(fixture: StateFixture) -> Self {
        Self::State(fixture)
    }
}

impl From<BlockchainFixture> for Fixture {
    fn from(fixture: BlockchainFixture) -> Self {
        Self::Blockchain(Box::new(fixture))
    }
}

/// Metadata recorded under the `_info` key of a fixture.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureInfo {
    /// Version string of the transition tool that filled the fixture.
    pub t8n_version: String,
    /// Free-form test comment.
    pub comment: Option<String>,
    /// Tag of the originating test.
    pub tag: Option<String>,
}

impl Fixture {
    /// Returns the state fixture, if any.
    pub fn as_state(&self) -> Option<&StateFixture> {
        match self {
            Self::State(fixture) => Some(fixture),
            Self::Blockchain(_) => None,
        }
    }

    /// Returns the blockchain fixture, if any.
    pub fn as_blockchain(&self) -> Option<&BlockchainFixture> {
        match self {
            Self::State(_) => None,
            Self::Blockchain(fixture) => Some(&**fixture),
        }
    }

    /// Keccak-256 of the canonical JSON of the fixture, `_info` excluded.
    ///
    /// Canonical JSON has object keys sorted and no whitespace.
    pub fn hash(&self) -> Result<alloy_primitives::B256, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.remove("_info");
        }
        value.sort_all_objects();
        let canonical = serde_json::to_string(&value)?;
        Ok(keccak256(canonical.as_bytes()))
    }

    /// Fills the `_info` section of the fixture.
    ///
    /// Only state fixtures carry the section; blockchain fixtures are returned unchanged.
    pub fn with_info(mut self, info: &FixtureInfo) -> Result<Self, serde_json::Error> {
        let hash = self.hash()?;
        if let Self::State(fixture) = &mut self {
            let entries = fixture.info.get_or_insert_with(BTreeMap::new);
            entries.insert("hash".to_string(), Value::String(hash.to_string()));
            entries.insert(
                "filling-transition-tool".to_string(),
                Value::String(info.t8n_version.clone()),
            );
            if let Some(comment) = &info.comment {
                entries.insert("comment".to_string(), Value::String(comment.clone()));
            }
            if let Some(tag) = &info.tag {
                entries.insert("tag".to_string(), Value::String(tag.clone()));
            }
        }
        Ok(self)
    }
}
