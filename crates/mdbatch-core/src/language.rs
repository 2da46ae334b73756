//! Supported language codes
//!
//! The repository's standard language list: mostly ISO 639-1 codes plus a
//! handful of regional and script variants. Matching is exact and
//! case-sensitive.

pub const SUPPORTED_LANGUAGE_CODES: &[&str] = &[
    "af", "am", "ar", "ast", "az", "be", "bg", "bn", "bo", "bs", "ca", "cs", "cy", "da", "de",
    "dz", "el", "en", "en-x-simple", "eo", "es", "et", "eu", "fa", "fi", "fil", "fo", "fr", "fy",
    "ga", "gd", "gl", "gsw-berne", "gu", "he", "hi", "hr", "ht", "hu", "hy", "id", "is", "it",
    "ja", "jv", "ka", "kk", "km", "kn", "ko", "ku", "ky", "lo", "lt", "lv", "mg", "mk", "ml",
    "mn", "mr", "ms", "my", "nb", "ne", "nl", "nn", "oc", "pa", "pl", "pt-br", "pt-pt", "ro",
    "ru", "sco", "se", "si", "sk", "sl", "sq", "sr", "sv", "sw", "ta", "ta-lk", "te", "th", "tr",
    "tyv", "ug", "uk", "ur", "vi", "xx-lolspeak", "zh-hans", "zh-hant",
];

/// True iff `code` is exactly one of `allowed`
pub fn is_supported_language(code: &str, allowed: &[&str]) -> bool {
    allowed.iter().any(|candidate| *candidate == code)
}
