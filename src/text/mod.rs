//! Text normalization services.
//!
//! Every other stage leans on this module: watermark stripping, Turkish
//! case folding, similarity scoring and institution-name resolution.

mod bank;
mod normalizer;
mod similarity;
mod watermark;

pub use bank::BankDirectory;
pub use normalizer::{
    count_vkn, extract_vkn, fix_abbreviations, TextNormalizer, DEFAULT_BANK_THRESHOLD,
};
pub use similarity::{
    capitalize_tr, fold, folded_ratio, is_all_uppercase, lower_tr, ratio, upper_tr,
};
pub use watermark::{
    collapse_whitespace, drop_watermark_letters, is_watermark_char, strip_embedded,
    strip_flanked_tokens, strip_for_journal, strip_phrase, strip_watermark, WATERMARK_PHRASE,
};
