use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::PathBuf;

use bloomer::addressing::RecordCoordinate;
use bloomer::metrics;
use bloomer::word::normalize_word;
use bloomer::Verdict;

use crate::cli::{Backend, FilterOpts};
use crate::util::{collect_input, load_config, open_engine};

#[derive(Serialize)]
struct WordResult {
    input: String,
    word: Option<String>,
    verdict: Option<Verdict>,
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probes: Option<Vec<RecordCoordinate>>,
}

#[derive(Serialize)]
struct CheckOutput {
    results: Vec<WordResult>,
    failures: usize,
    metrics: metrics::MetricsSnapshot,
}

/// CLI: check - каждое слово отдельно; сбой запроса не прерывает остальные.
pub fn exec(
    backend: Backend,
    opts: FilterOpts,
    words: Vec<String>,
    words_file: Option<PathBuf>,
    trace: bool,
    json: bool,
) -> Result<()> {
    let input = collect_input(words, words_file.as_deref())?;
    if input.is_empty() {
        return Err(anyhow!("no words to check"));
    }

    let cfg = load_config(&opts)?;
    let mut engine = open_engine(&backend, &cfg)?;

    let mut results = Vec::with_capacity(input.len());
    let mut failures = 0usize;

    for raw in input {
        let Some(w) = normalize_word(&raw) else {
            if !json {
                println!("SKIPPED '{}'", raw);
            }
            results.push(WordResult {
                input: raw,
                word: None,
                verdict: None,
                error: Some("not a word".into()),
                probes: None,
            });
            continue;
        };

        let probes = if trace {
            let coords = engine.probe_trace(w.as_bytes());
            if !json {
                for c in &coords {
                    println!(
                        "  probe '{}': record {} byte {} bit {}",
                        w, c.record, c.byte_in_record, c.bit_in_byte
                    );
                }
            }
            Some(coords)
        } else {
            None
        };

        match engine.check_word(&w) {
            Ok(v) => {
                if !json {
                    match v {
                        Verdict::ProbablyPresent => println!("OK '{}'", w),
                        Verdict::DefinitelyAbsent => println!("NOT FOUND '{}'", w),
                    }
                }
                results.push(WordResult {
                    input: raw,
                    word: Some(w),
                    verdict: Some(v),
                    error: None,
                    probes,
                });
            }
            Err(e) => {
                failures += 1;
                if !json {
                    println!("ERROR '{}': {}", w, e);
                }
                if let Some(st) = engine.store().last_status() {
                    log::debug!("last drive status: {}", st);
                }
                results.push(WordResult {
                    input: raw,
                    word: Some(w),
                    verdict: None,
                    error: Some(e.to_string()),
                    probes,
                });
            }
        }
    }

    let total = results.len();
    let ms = metrics::snapshot();
    log::info!(
        "checked {} words: {} failed, {:.2} probes/query, cache hit ratio {:.2}",
        total,
        failures,
        ms.avg_probes_per_query(),
        ms.cache_hit_ratio()
    );

    if json {
        let out = CheckOutput {
            results,
            failures,
            metrics: ms,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    }

    engine.close();
    if failures > 0 {
        return Err(anyhow!("{} of {} queries failed", failures, total));
    }
    Ok(())
}
