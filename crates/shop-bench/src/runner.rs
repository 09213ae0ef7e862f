//! Measurement rounds against a [`StorefrontService`].

use std::time::Duration;
use tokio::time::Instant;

use crate::report::{Comparison, LatencySummary};
use shop_persistence::{PersistenceError, Result, StorefrontService};

async fn timed<T, F>(op: F) -> Result<(T, Duration)>
where
    F: Future<Output = Result<T>>,
{
    let started = Instant::now();
    let value = op.await?;
    Ok((value, started.elapsed()))
}

fn summarize(samples: &[Duration]) -> Result<LatencySummary> {
    LatencySummary::from_samples(samples)
        .ok_or_else(|| PersistenceError::InvalidRequest("at least one round is required".into()))
}

/// Alternate uncached and cached stock reads for `rounds` rounds.
///
/// # Errors
///
/// Propagates store errors, or `InvalidRequest` for zero rounds.
pub async fn stock_comparison(shop: &StorefrontService, rounds: u32) -> Result<Comparison> {
    let mut uncached = Vec::with_capacity(rounds as usize);
    let mut cached = Vec::with_capacity(rounds as usize);

    for round in 1..=rounds {
        let (db, db_elapsed) = timed(shop.get_stock_uncached()).await?;
        let (hit, hit_elapsed) = timed(shop.get_stock()).await?;
        tracing::debug!(round, uncached = db, cached = hit, "Stock round");
        uncached.push(db_elapsed);
        cached.push(hit_elapsed);
    }

    Ok(Comparison {
        name: "stock read".to_string(),
        baseline_label: "uncached".to_string(),
        baseline: summarize(&uncached)?,
        candidate_label: "cached".to_string(),
        candidate: summarize(&cached)?,
    })
}

/// Alternate substring and prefix searches for `term`.
///
/// # Errors
///
/// Propagates store errors, or `InvalidRequest` for zero rounds.
pub async fn search_comparison(
    shop: &StorefrontService,
    term: &str,
    rounds: u32,
) -> Result<Comparison> {
    let mut substring = Vec::with_capacity(rounds as usize);
    let mut prefix = Vec::with_capacity(rounds as usize);

    for round in 1..=rounds {
        let contains = shop.find_by_substring(term).await?;
        let starts = shop.find_by_prefix(term).await?;
        tracing::debug!(
            round,
            substring_rows = contains.len(),
            prefix_rows = starts.len(),
            "Search round"
        );
        substring.push(contains.elapsed);
        prefix.push(starts.elapsed);
    }

    Ok(Comparison {
        name: format!("name search '{term}'"),
        baseline_label: "substring".to_string(),
        baseline: summarize(&substring)?,
        candidate_label: "prefix".to_string(),
        candidate: summarize(&prefix)?,
    })
}
