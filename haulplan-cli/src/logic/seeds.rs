use anyhow::{Result, bail};
use std::collections::HashSet;

/// Seeds the `standard` keyword expands to.
pub const STANDARD_SEEDS: [u64; 5] = [1337, 42, 7, 0x00C0_FFEE, 0xDEAD_BEEF];

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve a list of CLI seed arguments into sweep seeds.
///
/// Supports decimal integers (negative values use their magnitude),
/// `0x`-prefixed hex, and the keyword `standard` which expands to
/// [`STANDARD_SEEDS`]. Duplicates are dropped, first occurrence wins.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut pending: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("standard") {
            pending.extend(STANDARD_SEEDS);
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(value.unsigned_abs());
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(value);
            continue;
        }

        if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            && let Ok(value) = u64::from_str_radix(&hex.replace('_', ""), 16)
        {
            pending.push(value);
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    let mut deduped: Vec<u64> = pending.into_iter().filter(|seed| seen.insert(*seed)).collect();

    if deduped.is_empty() {
        deduped.push(DEFAULT_SEED);
    }

    Ok(deduped)
}
