// Базовые модули: константы, параметры, геометрия
pub mod consts;
pub mod config;
pub mod geometry;

// Хэши и адресация битов
pub mod hash;       // src/hash.rs - пять seeded хэшей (bit-exact с builder'ом)
pub mod addressing; // src/addressing.rs - bit → (record, byte, bit)

// Хранилище записей и статус-канал
pub mod status;     // src/status.rs - "NN,MESSAGE,TT,SS\r"
pub mod store;      // src/store/{mod,file,mem,channel,tcp}.rs

// Кэш одной записи и движок запросов
pub mod cache;
pub mod engine;

// Вспомогательное: нормализация слова, статистика, метрики
pub mod word;
pub mod stats;
pub mod metrics;

// Удобные реэкспорты
pub use config::{BloomerConfig, FilterParams, ProbeOrder};
pub use engine::{BloomEngine, Verdict};
pub use status::DriveStatus;
pub use store::{
    channel::{ChannelStore, DriveSession},
    file::FileRecordStore,
    mem::MemRecordStore,
    tcp::TcpSession,
    RecordStore, StoreError,
};
