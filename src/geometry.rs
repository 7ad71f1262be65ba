//! geometry - сколько записей фильтра помещается на носитель.
//!
//! Размер фильтра фиксируется при сборке: всё, что осталось на диске после каталога,
//! программы и служебных секторов REL-файла, отдаётся под битовый массив. Отсюда же
//! берутся параметры по умолчанию (M, R).

use serde::Serialize;

use crate::consts::DEFAULT_RECORD_SIZE;

/// Геометрия диска (по умолчанию - односторонний 1541, 35 дорожек).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DiskGeometry {
    pub total_sectors: u32,
    pub directory_sectors: u32,
    pub program_sectors: u32,
    pub rel_overhead_sectors: u32,
    pub bytes_per_sector: u32,
    pub record_size: u32,
}

impl Default for DiskGeometry {
    fn default() -> Self {
        Self {
            total_sectors: 683,
            directory_sectors: 19,
            program_sectors: 20,
            rel_overhead_sectors: 15,
            bytes_per_sector: 256,
            record_size: DEFAULT_RECORD_SIZE as u32,
        }
    }
}

impl DiskGeometry {
    /// Секторы, доступные под данные фильтра.
    pub fn available_sectors(&self) -> u32 {
        self.total_sectors
            .saturating_sub(self.directory_sectors)
            .saturating_sub(self.program_sectors)
            .saturating_sub(self.rel_overhead_sectors)
    }

    /// Число целых записей, помещающихся в доступные секторы.
    pub fn records(&self) -> u64 {
        if self.record_size == 0 {
            return 0;
        }
        (self.available_sectors() as u64 * self.bytes_per_sector as u64) / self.record_size as u64
    }

    pub fn size_bytes(&self) -> u64 {
        self.records() * self.record_size as u64
    }

    pub fn size_bits(&self) -> u64 {
        self.size_bytes() * 8
    }
}
