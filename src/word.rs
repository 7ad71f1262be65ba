//! Нормализация слова перед запросом: так же, как builder готовил словарь
//! (обрезать пробелы, привести к верхнему регистру).
//!
//! Движок хэширует байты как есть, поэтому "cat" и "CAT" для него разные слова.

use crate::consts::MAX_WORD_LEN;

/// Обрезанное слово в верхнем регистре, или None, если запрашивать нечего:
/// пустая строка, длиннее MAX_WORD_LEN, не-ASCII или пробелы/управляющие символы внутри.
pub fn normalize_word(raw: &str) -> Option<String> {
    let w = raw.trim();
    if w.is_empty() || w.len() > MAX_WORD_LEN {
        return None;
    }
    if !w.bytes().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    Some(w.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize_word("  cat\r\n").as_deref(), Some("CAT"));
        assert_eq!(normalize_word("Don't").as_deref(), Some("DON'T"));
    }

    #[test]
    fn rejects_empty_long_and_odd() {
        assert_eq!(normalize_word(""), None);
        assert_eq!(normalize_word("   "), None);
        assert_eq!(normalize_word("two words"), None);
        assert_eq!(normalize_word("café"), None);
        assert_eq!(normalize_word(&"A".repeat(MAX_WORD_LEN + 1)), None);
        assert!(normalize_word(&"a".repeat(MAX_WORD_LEN)).is_some());
    }
}
