use anyhow::{anyhow, Result};
use serde::Serialize;

use bloomer::geometry::DiskGeometry;
use bloomer::hash::HashKind;
use bloomer::stats::FilterReport;
use bloomer::DriveStatus;

use crate::cli::{Backend, FilterOpts};
use crate::util::{load_config, open_engine};

#[derive(Serialize)]
struct InfoOutput {
    probe_order: String,
    hashes: Vec<HashKind>,
    geometry: DiskGeometry,
    report: FilterReport,
    drive_status: Option<DriveStatus>,
}

/// CLI: info - параметры фильтра и оценки; --scan дополнительно читает все записи.
pub fn exec(
    backend: Backend,
    opts: FilterOpts,
    words: Option<u64>,
    scan: bool,
    json: bool,
) -> Result<()> {
    let cfg = load_config(&opts)?;
    let params = cfg.params()?;

    let mut report = FilterReport::new(&params);
    if let Some(n) = words {
        report = report.with_words(n);
    }

    let mut drive_status = None;
    if scan {
        if !backend.is_set() {
            return Err(anyhow!("--scan needs --filter or --drive/--data"));
        }
        let mut engine = open_engine(&backend, &cfg)?;
        let bits = engine.bits_set()?;
        drive_status = engine.store().last_status().cloned();
        engine.close();
        report = report.with_bits_set(bits);
    }

    let geometry = DiskGeometry::default();

    if json {
        let out = InfoOutput {
            probe_order: cfg.probe_order.to_string(),
            hashes: HashKind::ALL[..report.hash_count].to_vec(),
            geometry,
            report,
            drive_status,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("bits (M):        {}", report.bit_count);
    let names: Vec<&str> = HashKind::ALL[..report.hash_count]
        .iter()
        .map(|k| k.name())
        .collect();
    println!("hashes (K):      {} ({})", report.hash_count, names.join(", "));
    println!("record size (R): {}", report.record_size);
    println!("bytes:           {}", report.byte_count);
    println!("records:         {}", report.record_count);
    println!("probe order:     {}", cfg.probe_order);
    println!(
        "disk geometry:   {} records x {} B ({} bits)",
        geometry.records(),
        geometry.record_size,
        geometry.size_bits()
    );

    if let Some(n) = report.words {
        println!();
        println!("words (n):       {}", n);
        if let Some(bpw) = report.bits_per_word {
            println!("bits per word:   {:.2}", bpw);
        }
        if let Some(fill) = report.theoretical_fill {
            println!("theoretical fill {:.2}%", fill * 100.0);
        }
        if let Some(fp) = report.false_positive_rate {
            if fp > 0.0 {
                println!("false positives: {:.4}% (1 in {:.0})", fp * 100.0, 1.0 / fp);
            } else {
                println!("false positives: 0%");
            }
        }
        if let (Some(k), Some(fp)) = (report.optimal_k, report.optimal_fp_rate) {
            println!("optimal k:       {:.2} (fp {:.4}%)", k, fp * 100.0);
        }
    }

    if let Some(bits) = report.bits_set {
        println!();
        println!(
            "bits set:        {} / {} ({:.2}%)",
            bits,
            report.bit_count,
            report.measured_fill.unwrap_or(0.0) * 100.0
        );
        if let Some(est) = report.estimated_words {
            println!("estimated words: {:.0}", est);
        }
    }
    if let Some(st) = drive_status {
        println!("drive status:    {}", st);
    }
    Ok(())
}
