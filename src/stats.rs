//! stats - теоретические характеристики фильтра.
//!
//!   fill(k, n, m)  = 1 - e^(-k*n/m)
//!   fp(k, n, m)    = fill^k
//!   k_opt(n, m)    = m/n * ln 2
//!
//! Плюс обратная оценка числа слов по числу установленных битов X:
//!   n ≈ -(m/k) * ln(1 - X/m)

use serde::Serialize;

use crate::config::FilterParams;

pub fn theoretical_fill_rate(k: usize, n: u64, m: u64) -> f64 {
    if m == 0 {
        return 0.0;
    }
    1.0 - (-(k as f64) * n as f64 / m as f64).exp()
}

pub fn false_positive_rate(k: usize, n: u64, m: u64) -> f64 {
    theoretical_fill_rate(k, n, m).powi(k as i32)
}

/// None при n == 0 (оптимум не определён).
pub fn optimal_k(n: u64, m: u64) -> Option<f64> {
    if n == 0 {
        return None;
    }
    Some(m as f64 / n as f64 * std::f64::consts::LN_2)
}

/// FP при целом оптимальном k (не меньше 1).
pub fn optimal_fp_rate(n: u64, m: u64) -> Option<f64> {
    let k = optimal_k(n, m)?.round().max(1.0) as usize;
    Some(false_positive_rate(k, n, m))
}

pub fn bits_per_word(n: u64, m: u64) -> Option<f64> {
    if n == 0 {
        return None;
    }
    Some(m as f64 / n as f64)
}

/// Оценка числа слов по заполненности. None, если фильтр насыщен (X >= m).
pub fn estimate_words(bits_set: u64, k: usize, m: u64) -> Option<f64> {
    if m == 0 || k == 0 || bits_set >= m {
        return None;
    }
    let x = bits_set as f64 / m as f64;
    Some(-(m as f64 / k as f64) * (1.0 - x).ln())
}

/// Сводка для `bloomer info`.
#[derive(Debug, Clone, Serialize)]
pub struct FilterReport {
    pub bit_count: u64,
    pub hash_count: usize,
    pub record_size: usize,
    pub byte_count: u64,
    pub record_count: u64,

    /// Число слов словаря (известно от builder'а или оценено по заполненности).
    pub words: Option<u64>,
    pub bits_per_word: Option<f64>,
    pub theoretical_fill: Option<f64>,
    pub false_positive_rate: Option<f64>,
    pub optimal_k: Option<f64>,
    pub optimal_fp_rate: Option<f64>,

    pub bits_set: Option<u64>,
    pub measured_fill: Option<f64>,
    pub estimated_words: Option<f64>,
}

impl FilterReport {
    pub fn new(params: &FilterParams) -> Self {
        Self {
            bit_count: params.bit_count(),
            hash_count: params.hash_count(),
            record_size: params.record_size(),
            byte_count: params.byte_count(),
            record_count: params.record_count(),
            words: None,
            bits_per_word: None,
            theoretical_fill: None,
            false_positive_rate: None,
            optimal_k: None,
            optimal_fp_rate: None,
            bits_set: None,
            measured_fill: None,
            estimated_words: None,
        }
    }

    /// Теоретические величины для n слов.
    pub fn with_words(mut self, n: u64) -> Self {
        let (k, m) = (self.hash_count, self.bit_count);
        self.words = Some(n);
        self.bits_per_word = bits_per_word(n, m);
        self.theoretical_fill = Some(theoretical_fill_rate(k, n, m));
        self.false_positive_rate = Some(false_positive_rate(k, n, m));
        self.optimal_k = optimal_k(n, m);
        self.optimal_fp_rate = optimal_fp_rate(n, m);
        self
    }

    /// Измеренная заполненность (результат полного прохода по записям).
    pub fn with_bits_set(mut self, bits_set: u64) -> Self {
        self.bits_set = Some(bits_set);
        if self.bit_count > 0 {
            self.measured_fill = Some(bits_set as f64 / self.bit_count as f64);
        }
        self.estimated_words = estimate_words(bits_set, self.hash_count, self.bit_count);
        self
    }
}
