//! engine - запрос принадлежности слова к фильтру на внешнем хранилище записей.
//!
//! Алгоритм check_word:
//! 1. K позиций битов (addressing::bit_positions);
//! 2. упорядочить (ProbeOrder, по умолчанию по убыванию), чтобы пробы в одну запись шли подряд;
//! 3. для каждой позиции: координаты → ensure_record → тест бита; ноль → DefinitelyAbsent сразу;
//! 4. все биты стоят → ProbablyPresent.
//!
//! Сбой хранилища - это Err(StoreError), а не "слова нет": ложное "нет" для слова из словаря
//! исключено, пока ошибки не смешиваются с результатом.
//!
//! Движок владеет хранилищем и кэшем одной записи. Параллельным вызывающим нужен
//! отдельный движок каждому.

use serde::Serialize;

use crate::addressing::{bit_positions, order_positions, RecordCoordinate};
use crate::cache::{CacheStats, RecordCache};
use crate::config::{FilterParams, ProbeOrder};
use crate::metrics::{record_probe, record_query, record_query_failure};
use crate::store::{RecordStore, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Все K битов стоят (возможен false positive).
    ProbablyPresent,
    /// Хотя бы один бит ноль: слова точно нет в словаре.
    DefinitelyAbsent,
}

impl Verdict {
    #[inline]
    pub fn is_present(self) -> bool {
        matches!(self, Verdict::ProbablyPresent)
    }
}

pub struct BloomEngine<S: RecordStore> {
    params: FilterParams,
    order: ProbeOrder,
    store: S,
    cache: RecordCache,
}

impl<S: RecordStore> BloomEngine<S> {
    /// Собрать движок без открытия хранилища.
    pub fn new(params: FilterParams, store: S) -> Result<Self, StoreError> {
        if store.record_size() != params.record_size() {
            return Err(StoreError::RecordSizeMismatch {
                expected: params.record_size(),
                actual: store.record_size(),
            });
        }
        Ok(Self {
            params,
            order: ProbeOrder::default(),
            cache: RecordCache::new(params.record_size()),
            store,
        })
    }

    /// Собрать движок и открыть хранилище. Ошибка здесь - ошибка всей сессии.
    pub fn open(params: FilterParams, store: S) -> Result<Self, StoreError> {
        let mut engine = Self::new(params, store)?;
        engine.store.open()?;
        log::info!(
            "bloom engine ready: M={} K={} R={} ({} records, order={})",
            params.bit_count(),
            params.hash_count(),
            params.record_size(),
            params.record_count(),
            engine.order
        );
        Ok(engine)
    }

    pub fn with_order(mut self, order: ProbeOrder) -> Self {
        self.order = order;
        self
    }

    /// Переоткрыть хранилище (сбрасывает позиционирование и кэш).
    pub fn reopen(&mut self) -> Result<(), StoreError> {
        self.cache.invalidate();
        self.store.close();
        self.store.open()
    }

    pub fn close(&mut self) {
        self.store.close();
        self.cache.invalidate();
    }

    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    #[inline]
    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    #[inline]
    pub fn order(&self) -> ProbeOrder {
        self.order
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Закрыть и вернуть хранилище.
    pub fn into_store(mut self) -> S {
        self.close();
        self.store
    }

    /// Координаты проб слова в порядке проверки (без I/O).
    pub fn probe_trace(&self, word: &[u8]) -> Vec<RecordCoordinate> {
        let mut positions = bit_positions(word, &self.params);
        order_positions(&mut positions, self.order);
        positions
            .into_iter()
            .map(|b| RecordCoordinate::from_bit(b, self.params.record_size()))
            .collect()
    }

    /// Проверка слова как есть (байты уже нормализованы вызывающим).
    pub fn check_bytes(&mut self, word: &[u8]) -> Result<Verdict, StoreError> {
        for c in self.probe_trace(word) {
            record_probe();
            let bytes = match self.cache.ensure_record(&mut self.store, c.record) {
                Ok(b) => b,
                Err(e) => {
                    record_query_failure();
                    log::warn!("query aborted at record {}: {}", c.record, e);
                    return Err(e);
                }
            };
            if !c.test(bytes) {
                log::trace!(
                    "bit clear: record {} byte {} bit {}",
                    c.record,
                    c.byte_in_record,
                    c.bit_in_byte
                );
                record_query(false);
                return Ok(Verdict::DefinitelyAbsent);
            }
        }
        record_query(true);
        Ok(Verdict::ProbablyPresent)
    }

    pub fn check_word(&mut self, word: &str) -> Result<Verdict, StoreError> {
        self.check_bytes(word.as_bytes())
    }

    /// Внешний интерфейс: true - вероятно есть, false - точно нет.
    pub fn check(&mut self, word: &str) -> Result<bool, StoreError> {
        self.check_word(word).map(Verdict::is_present)
    }

    /// Число установленных битов во всём фильтре (полный проход по записям).
    /// Биты за пределами M в последнем байте не считаются.
    pub fn bits_set(&mut self) -> Result<u64, StoreError> {
        let p = self.params;
        let byte_count = p.byte_count();
        let rs = p.record_size() as u64;
        let tail_bits = (p.bit_count() % 8) as u32;

        let mut total = 0u64;
        for rec in 0..p.record_count() {
            let bytes = self.cache.ensure_record(&mut self.store, rec)?;
            let base = rec * rs;
            for (j, b) in bytes.iter().enumerate() {
                let gi = base + j as u64;
                if gi >= byte_count {
                    break;
                }
                let mut v = *b;
                if tail_bits != 0 && gi == byte_count - 1 {
                    v &= ((1u16 << tail_bits) - 1) as u8;
                }
                total += v.count_ones() as u64;
            }
        }
        log::debug!("fill scan: {} of {} bits set", total, p.bit_count());
        Ok(total)
    }
}
