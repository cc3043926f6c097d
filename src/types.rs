//! Core vocabulary shared by the tracker: chains, timeframes and bin sizes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a chain or timeframe identifier is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownIdentifier {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Blockchain networks supported by the analytics API.
///
/// The identifiers are opaque to the tracker and are sent to the API as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    #[serde(rename = "eth-main")]
    EthMain,
    #[serde(rename = "arbitrum-main")]
    ArbitrumMain,
    #[serde(rename = "optimism-main")]
    OptimismMain,
    #[serde(rename = "poly-main")]
    PolyMain,
    #[serde(rename = "bsc-main")]
    BscMain,
    #[serde(rename = "eth-goerli")]
    EthGoerli,
}

impl Chain {
    /// Wire identifier of the chain.
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::EthMain => "eth-main",
            Chain::ArbitrumMain => "arbitrum-main",
            Chain::OptimismMain => "optimism-main",
            Chain::PolyMain => "poly-main",
            Chain::BscMain => "bsc-main",
            Chain::EthGoerli => "eth-goerli",
        }
    }

    /// Returns all supported chains.
    pub fn all() -> Vec<Chain> {
        vec![
            Chain::EthMain,
            Chain::ArbitrumMain,
            Chain::OptimismMain,
            Chain::PolyMain,
            Chain::BscMain,
            Chain::EthGoerli,
        ]
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::all()
            .into_iter()
            .find(|chain| chain.as_str() == s)
            .ok_or_else(|| UnknownIdentifier {
                kind: "chain",
                value: s.to_string(),
                expected: Chain::all()
                    .iter()
                    .map(Chain::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Aggregation bucket the API uses internally for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinSize {
    #[serde(rename = "1_HOUR")]
    OneHour,
    #[serde(rename = "1_DAY")]
    OneDay,
}

impl BinSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinSize::OneHour => "1_HOUR",
            BinSize::OneDay => "1_DAY",
        }
    }
}

impl fmt::Display for BinSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How far back the prior snapshot is taken.
///
/// Each variant maps to a fixed day-count and bin size; this is the only
/// place that mapping is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1_DAY")]
    OneDay,
    #[serde(rename = "7_DAYS")]
    SevenDays,
    #[serde(rename = "30_DAYS")]
    ThirtyDays,
}

impl Timeframe {
    /// Wire identifier sent as the `timeframe` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::OneDay => "1_DAY",
            Timeframe::SevenDays => "7_DAYS",
            Timeframe::ThirtyDays => "30_DAYS",
        }
    }

    pub fn day_count(&self) -> u32 {
        match self {
            Timeframe::OneDay => 1,
            Timeframe::SevenDays => 7,
            Timeframe::ThirtyDays => 30,
        }
    }

    pub fn bin_size(&self) -> BinSize {
        match self {
            Timeframe::OneDay => BinSize::OneHour,
            Timeframe::SevenDays | Timeframe::ThirtyDays => BinSize::OneDay,
        }
    }

    /// Returns all available timeframes.
    pub fn all() -> Vec<Timeframe> {
        vec![Timeframe::OneDay, Timeframe::SevenDays, Timeframe::ThirtyDays]
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = UnknownIdentifier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::all()
            .into_iter()
            .find(|timeframe| timeframe.as_str() == s)
            .ok_or_else(|| UnknownIdentifier {
                kind: "timeframe",
                value: s.to_string(),
                expected: Timeframe::all()
                    .iter()
                    .map(Timeframe::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}
