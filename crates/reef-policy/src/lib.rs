//! ABI policy shared by the guest runtime and host tooling.
//!
//! Every historical job template implements the same contract and differs only in two
//! knobs: how the dataset allocation is rounded, and whether a placeholder result is
//! emitted before the job body runs. This crate names those knobs so both sides agree
//! on their spelling:
//! - guest builds select a policy at compile time (`reef_job!`)
//! - host tooling reads it from flags or the environment (`std` feature)

#![cfg_attr(not(any(test, feature = "std")), no_std)]

use core::fmt;
use core::str::FromStr;

use reef_contracts::{PAGE_SIZE, WORD8_GRANULARITY};

#[cfg(feature = "std")]
mod env;

#[cfg(feature = "std")]
pub use env::{resolve_policy, resolve_policy_with_env, ENV_ALLOC_GRANULARITY, ENV_IMPLICIT_RESULT};

/// Rounding applied to the dataset allocation length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// Round up to a multiple of 8 bytes.
    Word8,
    /// Round up to whole wasm pages, page aligned.
    #[default]
    Page,
}

impl Granularity {
    pub const fn bytes(self) -> usize {
        match self {
            Granularity::Word8 => WORD8_GRANULARITY,
            Granularity::Page => PAGE_SIZE,
        }
    }

    /// Rounds `len` up to the next multiple of the granularity.
    ///
    /// Returns `None` when the rounded length does not fit in `usize`.
    pub const fn round_up(self, len: usize) -> Option<usize> {
        let mask = self.bytes() - 1;
        match len.checked_add(mask) {
            Some(v) => Some(v & !mask),
            None => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Word8 => "word8",
            Granularity::Page => "page",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "word8" | "8" => Ok(Granularity::Word8),
            "page" => Ok(Granularity::Page),
            _ => Err(PolicyParseError::Granularity),
        }
    }
}

/// What the entry point emits on the job's behalf before the body runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ImplicitResult {
    #[default]
    None,
    /// Emit `Integer(0)` ahead of the job; a later emission from the job replaces it
    /// on hosts that keep the last result.
    PlaceholderZero,
}

impl ImplicitResult {
    pub fn as_str(self) -> &'static str {
        match self {
            ImplicitResult::None => "none",
            ImplicitResult::PlaceholderZero => "placeholder-zero",
        }
    }
}

impl fmt::Display for ImplicitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImplicitResult {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(ImplicitResult::None),
            "placeholder-zero" | "placeholder" => Ok(ImplicitResult::PlaceholderZero),
            _ => Err(PolicyParseError::ImplicitResult),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AbiPolicy {
    pub granularity: Granularity,
    pub implicit_result: ImplicitResult,
}

impl AbiPolicy {
    /// Page-aligned dataset, no implicit result.
    pub const DEFAULT: AbiPolicy = AbiPolicy {
        granularity: Granularity::Page,
        implicit_result: ImplicitResult::None,
    };

    /// The C template family: 8-byte rounding and a placeholder `Integer(0)`.
    pub const LEGACY: AbiPolicy = AbiPolicy {
        granularity: Granularity::Word8,
        implicit_result: ImplicitResult::PlaceholderZero,
    };

    pub const fn new(granularity: Granularity, implicit_result: ImplicitResult) -> Self {
        AbiPolicy {
            granularity,
            implicit_result,
        }
    }
}

impl fmt::Display for AbiPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "granularity={} implicit_result={}",
            self.granularity, self.implicit_result
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyParseError {
    Granularity,
    ImplicitResult,
}

impl fmt::Display for PolicyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyParseError::Granularity => {
                f.write_str("invalid allocation granularity (expected one of: word8, page)")
            }
            PolicyParseError::ImplicitResult => {
                f.write_str("invalid implicit result (expected one of: none, placeholder-zero)")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PolicyParseError {}

#[cfg(feature = "clap")]
impl clap::ValueEnum for Granularity {
    fn value_variants<'a>() -> &'a [Self] {
        const ALL: [Granularity; 2] = [Granularity::Word8, Granularity::Page];
        &ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            Granularity::Word8 => Some(clap::builder::PossibleValue::new("word8").alias("8")),
            Granularity::Page => Some(clap::builder::PossibleValue::new("page")),
        }
    }
}

#[cfg(feature = "clap")]
impl clap::ValueEnum for ImplicitResult {
    fn value_variants<'a>() -> &'a [Self] {
        const ALL: [ImplicitResult; 2] = [ImplicitResult::None, ImplicitResult::PlaceholderZero];
        &ALL
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        match self {
            ImplicitResult::None => Some(clap::builder::PossibleValue::new("none")),
            ImplicitResult::PlaceholderZero => Some(
                clap::builder::PossibleValue::new("placeholder-zero").alias("placeholder"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_word8_matches_c_mask() {
        for len in [0usize, 1, 7, 8, 9, 15, 16, 1000] {
            let expected = (len + 7) & !0x07;
            assert_eq!(Granularity::Word8.round_up(len), Some(expected));
        }
    }

    #[test]
    fn round_up_page_uses_whole_pages() {
        assert_eq!(Granularity::Page.round_up(0), Some(0));
        assert_eq!(Granularity::Page.round_up(1), Some(PAGE_SIZE));
        assert_eq!(Granularity::Page.round_up(PAGE_SIZE), Some(PAGE_SIZE));
        assert_eq!(Granularity::Page.round_up(PAGE_SIZE + 1), Some(2 * PAGE_SIZE));
    }

    #[test]
    fn round_up_reports_overflow() {
        assert_eq!(Granularity::Word8.round_up(usize::MAX), None);
        assert_eq!(Granularity::Page.round_up(usize::MAX - 10), None);
    }

    #[test]
    fn parse_round_trips_through_as_str() {
        for g in [Granularity::Word8, Granularity::Page] {
            assert_eq!(g.as_str().parse::<Granularity>(), Ok(g));
        }
        for r in [ImplicitResult::None, ImplicitResult::PlaceholderZero] {
            assert_eq!(r.as_str().parse::<ImplicitResult>(), Ok(r));
        }
        assert_eq!(
            "placeholder".parse::<ImplicitResult>(),
            Ok(ImplicitResult::PlaceholderZero)
        );
        assert_eq!("huge".parse::<Granularity>(), Err(PolicyParseError::Granularity));
    }

    #[test]
    fn default_policy_is_page_aligned_without_placeholder() {
        assert_eq!(AbiPolicy::default(), AbiPolicy::DEFAULT);
        assert_eq!(AbiPolicy::DEFAULT.granularity, Granularity::Page);
        assert_eq!(AbiPolicy::DEFAULT.implicit_result, ImplicitResult::None);
    }
}
