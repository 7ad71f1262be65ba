use anyhow::Result;
use std::collections::HashSet;

use bloomer::addressing::bit_positions;
use bloomer::stats::false_positive_rate;
use bloomer::{BloomEngine, FilterParams, MemRecordStore, ProbeOrder};

/// n=2000, m=20000, k=5: ни одного ложного "нет" и доля ложных "да" в разумных пределах.
#[test]
fn false_positive_rate_near_theory() -> Result<()> {
    let (n, m, k) = (2000usize, 20_000u64, 5usize);
    let p = FilterParams::new(m, k, 254)?;
    let mut rng = oorandom::Rand32::new(0xB100_F11E);

    let mut dict = HashSet::new();
    while dict.len() < n {
        dict.insert(random_word(&mut rng));
    }
    let words: Vec<String> = dict.iter().cloned().collect();

    let mut e = BloomEngine::open(p, MemRecordStore::new(build_filter(&words, &p), 254))?;

    for w in &words {
        assert!(e.check(w)?, "false negative for {w}");
    }

    let trials = 20_000usize;
    let mut tried = 0usize;
    let mut positives = 0usize;
    while tried < trials {
        let w = random_word(&mut rng);
        if dict.contains(&w) {
            continue;
        }
        tried += 1;
        if e.check(&w)? {
            positives += 1;
        }
    }

    let measured = positives as f64 / trials as f64;
    let theory = false_positive_rate(k, n as u64, m);
    assert!(
        measured < theory * 3.0,
        "fp rate {measured:.5} vs theoretical {theory:.5}"
    );
    Ok(())
}

/// Порядок проб не влияет на ответ.
#[test]
fn verdict_independent_of_probe_order() -> Result<()> {
    let p = FilterParams::new(4096, 5, 16)?;
    let mut rng = oorandom::Rand32::new(7);
    let words: Vec<String> = (0..300).map(|_| random_word(&mut rng)).collect();
    let image = build_filter(&words, &p);

    let mut engines = Vec::new();
    for order in [ProbeOrder::Descending, ProbeOrder::Ascending, ProbeOrder::AsComputed] {
        engines.push(BloomEngine::open(p, MemRecordStore::new(image.clone(), 16))?.with_order(order));
    }

    for _ in 0..2000 {
        let w = random_word(&mut rng);
        let mut verdicts = Vec::with_capacity(engines.len());
        for e in engines.iter_mut() {
            verdicts.push(e.check_word(&w)?);
        }
        assert!(
            verdicts.windows(2).all(|v| v[0] == v[1]),
            "orders disagree on {w}: {verdicts:?}"
        );
    }
    Ok(())
}

// ---------- helpers ----------

/// 3..=10 заглавных букв.
fn random_word(rng: &mut oorandom::Rand32) -> String {
    let len = rng.rand_range(3..11) as usize;
    (0..len)
        .map(|_| (b'A' + rng.rand_range(0..26) as u8) as char)
        .collect()
}

fn build_filter(words: &[String], p: &FilterParams) -> Vec<u8> {
    let mut bits = vec![0u8; p.byte_count() as usize];
    for w in words {
        for b in bit_positions(w.as_bytes(), p) {
            bits[(b / 8) as usize] |= 1 << (b % 8);
        }
    }
    bits
}
