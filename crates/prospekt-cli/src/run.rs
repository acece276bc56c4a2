//! Ingestion fan-out and the query surface of the CLI.
//!
//! Retailer runs share no mutable state besides the store pool, so they run
//! concurrently under a bounded worker pool. A retailer that yields no data
//! or fails to persist never aborts its siblings; store failures are
//! surfaced at the end so the scheduler retries the whole run.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use sqlx::SqlitePool;

use prospekt_core::week::{parse_week_key, week_for};
use prospekt_core::{AppConfig, BrandClassifier, Retailer};
use prospekt_db::DbError;
use prospekt_ingest::{FetchOrchestrator, StrategyAttempt};

use crate::spool;

/// Outcome of one retailer's run.
enum RunOutcome {
    Stored { offers: u64, strategy: String },
    NoData { attempts: Vec<StrategyAttempt> },
    StoreFailed(DbError),
}

pub async fn ingest(
    pool: &SqlitePool,
    config: &AppConfig,
    retailer: Option<&str>,
    week: Option<&str>,
) -> anyhow::Result<()> {
    let retailers: Vec<Retailer> = match retailer {
        Some(s) => vec![s
            .parse()
            .map_err(|e: prospekt_core::RetailerParseError| anyhow::anyhow!(e))?],
        None => Retailer::ALL.to_vec(),
    };

    let run_time = Utc::now();
    let week = match week {
        Some(key) => parse_week_key(key)
            .ok_or_else(|| anyhow::anyhow!("invalid week key '{key}' — expected YYYY-Www"))?,
        None => week_for(run_time),
    };

    let rules = prospekt_core::load_brand_rules(&config.brand_rules_path)?;
    let classifier = Arc::new(BrandClassifier::new(&rules.rules));
    let orchestrator = FetchOrchestrator::new(
        classifier,
        Duration::from_secs(config.strategy_timeout_secs),
    );

    tracing::info!(
        week = %week.key,
        retailers = retailers.len(),
        "starting ingestion run"
    );

    let max_concurrent = config.max_concurrent_retailers.max(1);
    let runs = stream::iter(retailers)
        .map(|retailer| {
            let orchestrator = &orchestrator;
            let week = &week;
            let spool_dir = &config.spool_dir;
            async move {
                let strategies = spool::strategies_for(spool_dir, retailer);
                let outcome = orchestrator
                    .fetch_offers(retailer, week, &strategies, run_time)
                    .await;

                if outcome.is_empty() {
                    return (
                        retailer,
                        RunOutcome::NoData {
                            attempts: outcome.attempts,
                        },
                    );
                }

                match prospekt_db::upsert_offers(pool, retailer, &week.key, &outcome.offers).await
                {
                    Ok(written) => (
                        retailer,
                        RunOutcome::Stored {
                            offers: written,
                            strategy: outcome.winner.unwrap_or_default(),
                        },
                    ),
                    Err(e) => (retailer, RunOutcome::StoreFailed(e)),
                }
            }
        })
        .buffer_unordered(max_concurrent)
        .collect::<Vec<_>>();

    // Cooperative cancellation: dropping the in-flight runs cancels their
    // strategy futures, and an interrupted upsert transaction rolls back on
    // drop — nothing partial reaches the store.
    let results = tokio::select! {
        results = runs => results,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("interrupted — in-flight retailer runs cancelled before their store write");
            anyhow::bail!("ingestion aborted by signal");
        }
    };

    let mut stored = 0usize;
    let mut no_data = 0usize;
    let mut failed = 0usize;

    for (retailer, outcome) in &results {
        match outcome {
            RunOutcome::Stored { offers, strategy } => {
                stored += 1;
                println!("{retailer}: {offers} offers ({strategy})");
            }
            RunOutcome::NoData { attempts } => {
                no_data += 1;
                println!("{retailer}: no data this run");
                for attempt in attempts {
                    println!("  {}: {}", attempt.strategy, attempt.outcome);
                }
            }
            RunOutcome::StoreFailed(e) => {
                failed += 1;
                tracing::error!(
                    retailer = %retailer,
                    error = %e,
                    "store write failed — batch rolled back"
                );
                println!("{retailer}: store write failed");
            }
        }
    }

    tracing::info!(stored, no_data, failed, week = %week.key, "ingestion run finished");

    if failed > 0 {
        anyhow::bail!("{failed} retailer batches failed to persist; retry on the next schedule");
    }
    Ok(())
}

pub async fn print_offers(
    pool: &SqlitePool,
    retailer: Option<&str>,
    week: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let retailer = retailer
        .map(str::parse::<Retailer>)
        .transpose()
        .map_err(|e| anyhow::anyhow!(e))?;
    let week = week
        .map(|key| {
            parse_week_key(key)
                .ok_or_else(|| anyhow::anyhow!("invalid week key '{key}' — expected YYYY-Www"))
        })
        .transpose()?;

    let offers =
        prospekt_db::query_offers(pool, retailer, week.as_ref().map(|w| w.key.as_str())).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&offers)?);
        return Ok(());
    }

    for offer in &offers {
        println!(
            "{:<6} {}  {:>8} €  {}  [{}]",
            offer.retailer,
            offer.week_key,
            offer.price,
            offer.title,
            offer.brand.as_deref().unwrap_or("-"),
        );
    }
    println!("{} offers", offers.len());
    Ok(())
}
