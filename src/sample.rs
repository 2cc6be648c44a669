use crate::entropy::EntropySource;
use crate::error::{Error, Result};
use std::collections::HashSet;

/// Picks `amount` distinct indices from `0..population`, every subset of
/// that size equally likely (Floyd's algorithm).
///
/// The order of the returned indices is not uniform; shuffle before use
/// when order matters.
pub fn choose_distinct<S>(source: &S, population: usize, amount: usize) -> Result<Vec<usize>>
where
    S: EntropySource + ?Sized,
{
    if amount > population {
        return Err(Error::InsufficientWordlist {
            requested: amount,
            available: population,
        });
    }

    let mut chosen = Vec::with_capacity(amount);
    let mut seen = HashSet::with_capacity(amount);

    for j in population - amount..population {
        let t = source.below(j as u64 + 1)? as usize;
        let pick = if seen.contains(&t) { j } else { t };
        seen.insert(pick);
        chosen.push(pick);
    }

    Ok(chosen)
}

/// Fisher-Yates shuffle.
pub fn shuffle<S, T>(source: &S, items: &mut [T]) -> Result<()>
where
    S: EntropySource + ?Sized,
{
    for i in (1..items.len()).rev() {
        let j = source.below(i as u64 + 1)? as usize;
        items.swap(i, j);
    }

    Ok(())
}
