//! Общие константы: параметры фильтра по умолчанию, протокол канала команд, статус-канал.

// -------- Filter --------
/// Число хэш-функций в наборе (закрытый набор, см. hash.rs).
pub const NUM_HASH_FUNCTIONS: usize = 5;
pub const BITS_PER_BYTE: u64 = 8;

/// Максимальная длина нормализованного слова (буфер 64 с терминатором у builder'а).
pub const MAX_WORD_LEN: usize = 63;

// -------- Records --------
/// Максимальный размер REL-записи CBM DOS.
pub const DEFAULT_RECORD_SIZE: usize = 254;
/// Имя файла фильтра на диске.
pub const DEFAULT_FILTER_NAME: &str = "BLOOM.DAT";

// -------- Drive channel protocol --------
/// Канал данных по умолчанию (команды идут отдельным потоком сессии).
pub const DEFAULT_DATA_CHANNEL: u8 = 2;

/// POSITION: [b'P'][channel u8][record u16 LE][start byte u8]
pub const CMD_POSITION: u8 = b'P';
pub const POSITION_CMD_LEN: usize = 5;
/// Байт внутри записи, с которого начинается чтение (1-based у драйва).
pub const POSITION_START_BYTE: u8 = 1;

// -------- Status channel --------
/// Размер буфера сообщения статуса (включая место под терминатор).
pub const STATUS_MSG_MAX: usize = 64;
/// Сколько байт максимум дочитываем после переполнения буфера, чтобы дойти до '\r'.
pub const STATUS_DRAIN_MAX: usize = 256;
pub const STATUS_TERMINATOR: u8 = b'\r';

/// Код "нет связи с каналом команд" (не приходит от драйва, выставляется локально).
pub const STATUS_COMM_ERROR: u8 = 255;
/// Сообщение о включении драйва ("CBM DOS V2.6 1541") - первый статус после reset.
pub const STATUS_DOS_VERSION: u8 = 73;
/// RECORD NOT PRESENT - позиционирование за концом REL-файла.
pub const STATUS_RECORD_NOT_PRESENT: u8 = 50;
/// FILE NOT FOUND.
pub const STATUS_FILE_NOT_FOUND: u8 = 62;
