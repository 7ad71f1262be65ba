//! hash - закрытый набор из пяти seeded строковых хэшей.
//!
//! Все вычисления - u32 с wrapping-арифметикой. Это часть формата: фильтр на диске собран
//! внешним builder'ом ровно этими формулами, и любое расхождение (например, 64-битный
//! аккумулятор без маски) молча меняет позиции битов.
//!
//! Хэш с индексом i вызывается с seed = i.

use serde::Serialize;

use crate::consts::NUM_HASH_FUNCTIONS;

pub type HashFn = fn(&[u8], u8) -> u32;

/// FNV-1a: acc = 2166136261 + seed; acc ^= b; acc *= 16777619.
pub fn hash_fnv1a(word: &[u8], seed: u8) -> u32 {
    let mut h = 2_166_136_261u32.wrapping_add(seed as u32);
    for &b in word {
        h ^= b as u32;
        h = h.wrapping_mul(16_777_619);
    }
    h
}

/// DJB2: acc = 5381 + seed; acc = acc * 33 + b.
pub fn hash_djb2(word: &[u8], seed: u8) -> u32 {
    let mut h = 5381u32.wrapping_add(seed as u32);
    for &b in word {
        h = (h << 5).wrapping_add(h).wrapping_add(b as u32);
    }
    h
}

/// SDBM: acc = seed; acc = b + (acc << 6) + (acc << 16) - acc.
pub fn hash_sdbm(word: &[u8], seed: u8) -> u32 {
    let mut h = seed as u32;
    for &b in word {
        h = (b as u32)
            .wrapping_add(h << 6)
            .wrapping_add(h << 16)
            .wrapping_sub(h);
    }
    h
}

/// Jenkins one-at-a-time (с финализацией).
pub fn hash_jenkins(word: &[u8], seed: u8) -> u32 {
    let mut h = seed as u32;
    for &b in word {
        h = h.wrapping_add(b as u32);
        h = h.wrapping_add(h << 10);
        h ^= h >> 6;
    }
    h = h.wrapping_add(h << 3);
    h ^= h >> 11;
    h = h.wrapping_add(h << 15);
    h
}

/// Murmur-style: acc = seed + 0x9747b28c; acc ^= b; acc *= 0x5bd1e995; acc ^= acc >> 15.
pub fn hash_murmur(word: &[u8], seed: u8) -> u32 {
    let mut h = (seed as u32).wrapping_add(0x9747_b28c);
    for &b in word {
        h ^= b as u32;
        h = h.wrapping_mul(0x5bd1_e995);
        h ^= h >> 15;
    }
    h
}

/// Порядок важен: индекс в массиве = seed = номер хэша у builder'а.
pub const HASH_FUNCTIONS: [HashFn; NUM_HASH_FUNCTIONS] =
    [hash_fnv1a, hash_djb2, hash_sdbm, hash_jenkins, hash_murmur];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashKind {
    Fnv1a,
    Djb2,
    Sdbm,
    Jenkins,
    Murmur,
}

impl HashKind {
    pub const ALL: [HashKind; NUM_HASH_FUNCTIONS] = [
        HashKind::Fnv1a,
        HashKind::Djb2,
        HashKind::Sdbm,
        HashKind::Jenkins,
        HashKind::Murmur,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn func(self) -> HashFn {
        HASH_FUNCTIONS[self.index()]
    }

    /// Хэш с собственным seed (= индекс).
    #[inline]
    pub fn hash(self, word: &[u8]) -> u32 {
        (self.func())(word, self.index() as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            HashKind::Fnv1a => "fnv1a",
            HashKind::Djb2 => "djb2",
            HashKind::Sdbm => "sdbm",
            HashKind::Jenkins => "jenkins",
            HashKind::Murmur => "murmur",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Векторы посчитаны эталонной реализацией builder'а.
    #[test]
    fn vectors_seed_zero() {
        let w = b"CAT";
        assert_eq!(hash_fnv1a(w, 0), 1_229_878_055);
        assert_eq!(hash_djb2(w, 0), 193_452_189);
        assert_eq!(hash_sdbm(w, 0), 557_784_854);
        assert_eq!(hash_jenkins(w, 0), 3_039_729_256);
        assert_eq!(hash_murmur(w, 0), 72_492_627);
    }

    #[test]
    fn vectors_own_seed() {
        let cat: Vec<u32> = HashKind::ALL.iter().map(|k| k.hash(b"CAT")).collect();
        assert_eq!(
            cat,
            vec![1_229_878_055, 193_488_126, 2_118_959_252, 461_868_711, 556_175_300]
        );
        let dog: Vec<u32> = HashKind::ALL.iter().map(|k| k.hash(b"DOG")).collect();
        assert_eq!(
            dog,
            vec![723_376_489, 193_489_664, 2_128_139_130, 1_163_924_004, 2_544_947_147]
        );
        let hello: Vec<u32> = HashKind::ALL.iter().map(|k| k.hash(b"HELLO")).collect();
        assert_eq!(
            hello,
            vec![844_380_939, 261_238_938, 4_142_033_808, 2_869_746_359, 1_818_278_191]
        );
    }

    #[test]
    fn empty_word_is_seeded_initial_state() {
        assert_eq!(hash_fnv1a(b"", 0), 2_166_136_261);
        assert_eq!(hash_djb2(b"", 1), 5382);
        assert_eq!(hash_sdbm(b"", 2), 2);
        assert_eq!(hash_jenkins(b"", 3), 884_763);
        assert_eq!(hash_murmur(b"", 4), 2_538_058_384);
    }

    #[test]
    fn kind_index_matches_table() {
        for (i, k) in HashKind::ALL.iter().enumerate() {
            assert_eq!(k.index(), i);
        }
        assert_eq!(HashKind::Jenkins.name(), "jenkins");
    }
}
