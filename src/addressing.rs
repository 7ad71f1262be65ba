//! addressing - глобальный индекс бита → координаты в хранилище записей.
//!
//! bit b лежит в байте b/8 (LSB-first: маска 1 << (b % 8)),
//! байт o - в записи o / R по смещению o % R. Записи здесь 0-based;
//! перевод в нумерацию транспорта - забота адаптера хранилища.

use serde::Serialize;

use crate::config::{FilterParams, ProbeOrder};
use crate::consts::BITS_PER_BYTE;
use crate::hash::HASH_FUNCTIONS;

/// Позиция бита для хэша `i` (seed = i).
#[inline]
pub fn bit_position(word: &[u8], i: usize, bit_count: u64) -> u64 {
    let h = HASH_FUNCTIONS[i](word, i as u8);
    (h as u64) % bit_count
}

/// Все K позиций слова в порядке хэшей.
pub fn bit_positions(word: &[u8], params: &FilterParams) -> Vec<u64> {
    (0..params.hash_count())
        .map(|i| bit_position(word, i, params.bit_count()))
        .collect()
}

/// Упорядочить позиции для локальности доступа. Сортировка стабильная.
pub fn order_positions(positions: &mut [u64], order: ProbeOrder) {
    match order {
        ProbeOrder::Descending => positions.sort_by(|a, b| b.cmp(a)),
        ProbeOrder::Ascending => positions.sort(),
        ProbeOrder::AsComputed => {}
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RecordCoordinate {
    /// 0-based номер записи.
    pub record: u64,
    pub byte_in_record: usize,
    pub bit_in_byte: u8,
}

impl RecordCoordinate {
    pub fn from_bit(bit: u64, record_size: usize) -> Self {
        let byte_off = bit / BITS_PER_BYTE;
        let r = record_size as u64;
        Self {
            record: byte_off / r,
            byte_in_record: (byte_off % r) as usize,
            bit_in_byte: (bit % BITS_PER_BYTE) as u8,
        }
    }

    #[inline]
    pub fn mask(&self) -> u8 {
        1u8 << self.bit_in_byte
    }

    /// Проверить бит в буфере записи.
    #[inline]
    pub fn test(&self, record_bytes: &[u8]) -> bool {
        (record_bytes[self.byte_in_record] & self.mask()) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params64() -> FilterParams {
        FilterParams::new(64, 5, 4).unwrap()
    }

    #[test]
    fn positions_cat_dog_m64() {
        let p = params64();
        assert_eq!(bit_positions(b"CAT", &p), vec![39, 62, 20, 39, 4]);
        assert_eq!(bit_positions(b"DOG", &p), vec![41, 0, 58, 36, 11]);
    }

    #[test]
    fn positions_respect_hash_count() {
        let p = FilterParams::new(64, 2, 4).unwrap();
        assert_eq!(bit_positions(b"CAT", &p), vec![39, 62]);
    }

    #[test]
    fn descending_order_groups_records() {
        let mut v = vec![39, 62, 20, 39, 4];
        order_positions(&mut v, ProbeOrder::Descending);
        assert_eq!(v, vec![62, 39, 39, 20, 4]);
        order_positions(&mut v, ProbeOrder::Ascending);
        assert_eq!(v, vec![4, 20, 39, 39, 62]);
    }

    #[test]
    fn coordinate_math() {
        // R = 254: бит 2040 → байт 255 → запись 1, смещение 1, бит 0
        let c = RecordCoordinate::from_bit(2040, 254);
        assert_eq!(c, RecordCoordinate { record: 1, byte_in_record: 1, bit_in_byte: 0 });
        let c = RecordCoordinate::from_bit(2031, 254);
        assert_eq!(c, RecordCoordinate { record: 0, byte_in_record: 253, bit_in_byte: 7 });
        assert_eq!(c.mask(), 0x80);
    }

    #[test]
    fn test_is_lsb_first() {
        let rec = [0b0000_0010u8, 0, 0, 0];
        assert!(RecordCoordinate::from_bit(1, 4).test(&rec));
        assert!(!RecordCoordinate::from_bit(6, 4).test(&rec));
    }
}
