use primitives::hardfork::SpecId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Ethereum fork names, including the transition forks used by blockchain tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ForkName {
    /// Frontier
    Frontier,
    /// Homestead
    Homestead,
    /// Tangerine Whistle
    EIP150,
    /// Spurious Dragon
    EIP158,
    /// Byzantium
    Byzantium,
    /// Petersburg
    ConstantinopleFix,
    /// Istanbul
    Istanbul,
    /// Berlin
    Berlin,
    /// London
    London,
    /// Paris. Transition tools call it `Merge`.
    #[serde(alias = "Merge")]
    Paris,
    /// Shanghai
    Shanghai,
    /// Cancun
    Cancun,
    /// Prague
    Prague,
    /// Osaka
    Osaka,

    /// Homestead from block 5
    FrontierToHomesteadAt5,
    /// Tangerine Whistle from block 5
    HomesteadToEIP150At5,
    /// Byzantium from block 5
    EIP158ToByzantiumAt5,
    /// Petersburg from block 5
    ByzantiumToConstantinopleFixAt5,
    /// London from block 5
    BerlinToLondonAt5,
    /// Shanghai from timestamp 15 000
    ParisToShanghaiAtTime15k,
    /// Cancun from timestamp 15 000
    ShanghaiToCancunAtTime15k,
    /// Prague from timestamp 15 000
    CancunToPragueAtTime15k,
    /// Osaka from timestamp 15 000
    PragueToOsakaAtTime15k,
}

/// Point at which a transition fork switches to its target fork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForkActivation {
    /// Active from this block number on.
    Block(u64),
    /// Active from this timestamp on.
    Timestamp(u64),
}

impl ForkActivation {
    /// Returns `true` if the activation point is reached at the given block.
    pub fn is_active(&self, block_number: u64, timestamp: u64) -> bool {
        match *self {
            Self::Block(block) => block_number >= block,
            Self::Timestamp(time) => timestamp >= time,
        }
    }
}

/// A transition fork: `from` until `at`, `to` afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkTransition {
    /// Fork before the activation point.
    pub from: ForkName,
    /// Fork from the activation point on.
    pub to: ForkName,
    /// Activation point.
    pub at: ForkActivation,
}

impl ForkName {
    /// Every plain (non-transition) fork, oldest first.
    pub const PLAIN: [ForkName; 14] = [
        Self::Frontier,
        Self::Homestead,
        Self::EIP150,
        Self::EIP158,
        Self::Byzantium,
        Self::ConstantinopleFix,
        Self::Istanbul,
        Self::Berlin,
        Self::London,
        Self::Paris,
        Self::Shanghai,
        Self::Cancun,
        Self::Prague,
        Self::Osaka,
    ];

    /// Name used for the `network` field of fixtures.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Frontier => "Frontier",
            Self::Homestead => "Homestead",
            Self::EIP150 => "EIP150",
            Self::EIP158 => "EIP158",
            Self::Byzantium => "Byzantium",
            Self::ConstantinopleFix => "ConstantinopleFix",
            Self::Istanbul => "Istanbul",
            Self::Berlin => "Berlin",
            Self::London => "London",
            Self::Paris => "Paris",
            Self::Shanghai => "Shanghai",
            Self::Cancun => "Cancun",
            Self::Prague => "Prague",
            Self::Osaka => "Osaka",
            Self::FrontierToHomesteadAt5 => "FrontierToHomesteadAt5",
            Self::HomesteadToEIP150At5 => "HomesteadToEIP150At5",
            Self::EIP158ToByzantiumAt5 => "EIP158ToByzantiumAt5",
            Self::ByzantiumToConstantinopleFixAt5 => "ByzantiumToConstantinopleFixAt5",
            Self::BerlinToLondonAt5 => "BerlinToLondonAt5",
            Self::ParisToShanghaiAtTime15k => "ParisToShanghaiAtTime15k",
            Self::ShanghaiToCancunAtTime15k => "ShanghaiToCancunAtTime15k",
            Self::CancunToPragueAtTime15k => "CancunToPragueAtTime15k",
            Self::PragueToOsakaAtTime15k => "PragueToOsakaAtTime15k",
        }
    }

    /// Returns the transition description of a transition fork.
    pub const fn transition(&self) -> Option<ForkTransition> {
        use ForkActivation::{Block, Timestamp};
        let (from, to, at) = match self {
            Self::FrontierToHomesteadAt5 => (Self::Frontier, Self::Homestead, Block(5)),
            Self::HomesteadToEIP150At5 => (Self::Homestead, Self::EIP150, Block(5)),
            Self::EIP158ToByzantiumAt5 => (Self::EIP158, Self::Byzantium, Block(5)),
            Self::ByzantiumToConstantinopleFixAt5 => {
                (Self::Byzantium, Self::ConstantinopleFix, Block(5))
            }
            Self::BerlinToLondonAt5 => (Self::Berlin, Self::London, Block(5)),
            Self::ParisToShanghaiAtTime15k => (Self::Paris, Self::Shanghai, Timestamp(15_000)),
            Self::ShanghaiToCancunAtTime15k => (Self::Shanghai, Self::Cancun, Timestamp(15_000)),
            Self::CancunToPragueAtTime15k => (Self::Cancun, Self::Prague, Timestamp(15_000)),
            Self::PragueToOsakaAtTime15k => (Self::Prague, Self::Osaka, Timestamp(15_000)),
            _ => return None,
        };
        Some(ForkTransition { from, to, at })
    }

    /// The plain fork active at the given block number and timestamp.
    pub fn fork_at(&self, block_number: u64, timestamp: u64) -> ForkName {
        match self.transition() {
            Some(transition) if transition.at.is_active(block_number, timestamp) => transition.to,
            Some(transition) => transition.from,
            None => *self,
        }
    }

    /// Name the transition tool uses for the fork active at the given block.
    pub fn transition_tool_name(&self, block_number: u64, timestamp: u64) -> &'static str {
        match self.fork_at(block_number, timestamp) {
            Self::Paris => "Merge",
            fork => fork.as_str(),
        }
    }

    /// Converts to a [SpecId].
    ///
    /// Transition forks map to their target fork.
    pub fn to_spec_id(&self) -> SpecId {
        match self {
            Self::Frontier => SpecId::FRONTIER,
            Self::Homestead | Self::FrontierToHomesteadAt5 => SpecId::HOMESTEAD,
            Self::EIP150 | Self::HomesteadToEIP150At5 => SpecId::TANGERINE,
            Self::EIP158 => SpecId::SPURIOUS_DRAGON,
            Self::Byzantium | Self::EIP158ToByzantiumAt5 => SpecId::BYZANTIUM,
            Self::ConstantinopleFix | Self::ByzantiumToConstantinopleFixAt5 => SpecId::PETERSBURG,
            Self::Istanbul => SpecId::ISTANBUL,
            Self::Berlin => SpecId::BERLIN,
            Self::London | Self::BerlinToLondonAt5 => SpecId::LONDON,
            Self::Paris => SpecId::MERGE,
            Self::Shanghai | Self::ParisToShanghaiAtTime15k => SpecId::SHANGHAI,
            Self::Cancun | Self::ShanghaiToCancunAtTime15k => SpecId::CANCUN,
            Self::Prague | Self::CancunToPragueAtTime15k => SpecId::PRAGUE,
            Self::Osaka | Self::PragueToOsakaAtTime15k => SpecId::OSAKA,
        }
    }

    /// Returns `true` if this fork includes all the rules of `milestone`.
    pub fn is_enabled_in(&self, milestone: ForkName) -> bool {
        self.to_spec_id().is_enabled_in(milestone.to_spec_id())
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fork name that is not known.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown fork: {0}")]
pub struct UnknownForkName(pub String);

impl FromStr for ForkName {
    type Err = UnknownForkName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "Merge" {
            return Ok(Self::Paris);
        }
        Self::PLAIN
            .into_iter()
            .chain([
                Self::FrontierToHomesteadAt5,
                Self::HomesteadToEIP150At5,
                Self::EIP158ToByzantiumAt5,
                Self::ByzantiumToConstantinopleFixAt5,
                Self::BerlinToLondonAt5,
                Self::ParisToShanghaiAtTime15k,
                Self::ShanghaiToCancunAtTime15k,
                Self::CancunToPragueAtTime15k,
                Self::PragueToOsakaAtTime15k,
            ])
            .find(|fork| fork.as_str() == s)
            .ok_or_else(|| UnknownForkName(s.to_string()))
    }
}
