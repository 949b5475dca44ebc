//! Unicode normalization analysis for a single file or directory name.
//!
//! The canonical form used throughout nfcfix is NFC. The decomposed and
//! compatibility forms are computed for diagnostics only and never influence
//! whether a name gets renamed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use unicode_normalization::UnicodeNormalization;

/// Coarse script classification of a codepoint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum ScriptTag {
    /// Hangul syllables, jamo and compatibility jamo.
    Korean,
    /// Hiragana and katakana.
    Japanese,
    /// CJK unified ideographs.
    #[strum(to_string = "Chinese/CJK")]
    #[serde(rename = "Chinese/CJK")]
    ChineseCjk,
    /// Latin-1 supplement letters and Latin Extended-A/B.
    #[strum(to_string = "Latin Extended")]
    #[serde(rename = "Latin Extended")]
    LatinExtended,
    Cyrillic,
    Arabic,
    Thai,
    /// Any other codepoint above the ASCII range.
    #[strum(to_string = "Other Unicode")]
    #[serde(rename = "Other Unicode")]
    OtherUnicode,
}

impl ScriptTag {
    /// Classify a single codepoint. ASCII codepoints carry no tag.
    pub fn of(c: char) -> Option<Self> {
        let code = c as u32;
        let tag = match code {
            0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => Self::Korean,
            0x3040..=0x309F | 0x30A0..=0x30FF => Self::Japanese,
            0x4E00..=0x9FFF => Self::ChineseCjk,
            0x00C0..=0x024F => Self::LatinExtended,
            0x0400..=0x04FF => Self::Cyrillic,
            0x0600..=0x06FF => Self::Arabic,
            0x0E00..=0x0E7F => Self::Thai,
            _ if code > 127 => Self::OtherUnicode,
            _ => return None,
        };
        Some(tag)
    }
}

/// Detect every script present in `text`.
pub fn detect_scripts(text: &str) -> BTreeSet<ScriptTag> {
    text.chars().filter_map(ScriptTag::of).collect()
}

/// Compute the canonical (NFC) form of a name.
pub fn canonical(text: &str) -> String {
    text.nfc().collect()
}

/// Result of analyzing one name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAnalysis {
    /// The name as found on disk.
    pub original: String,
    /// NFC form, the rename target.
    pub canonical: String,
    /// NFD form.
    pub decomposed: String,
    /// NFKC form.
    pub compat_composed: String,
    /// NFKD form.
    pub compat_decomposed: String,
    /// Whether `original` is already NFC.
    pub is_canonical: bool,
    /// Whether `original` is exactly NFD.
    pub is_decomposed: bool,
    /// Whether any codepoint lies above 127.
    pub has_non_ascii: bool,
    /// Whether this name should be renamed.
    pub needs_normalization: bool,
    /// Scripts detected in `original`.
    pub scripts: BTreeSet<ScriptTag>,
    /// UTF-8 length of the canonical form minus that of the original.
    pub byte_size_change: i64,
}

/// Analyze a name.
///
/// With `all_files` off, any name that differs from its NFC form needs
/// normalization, ASCII or not. With `all_files` on, the name must also
/// contain a non-ASCII codepoint. Callers rely on this exact asymmetry.
pub fn analyze(name: &str, all_files: bool) -> NameAnalysis {
    let canonical = canonical(name);
    let decomposed: String = name.nfd().collect();
    let compat_composed: String = name.nfkc().collect();
    let compat_decomposed: String = name.nfkd().collect();

    let has_non_ascii = name.chars().any(|c| c as u32 > 127);
    let is_canonical = name == canonical;
    let needs_normalization = if all_files {
        has_non_ascii && !is_canonical
    } else {
        !is_canonical
    };

    NameAnalysis {
        original: name.to_string(),
        is_decomposed: name == decomposed,
        byte_size_change: canonical.len() as i64 - name.len() as i64,
        canonical,
        decomposed,
        compat_composed,
        compat_decomposed,
        is_canonical,
        has_non_ascii,
        needs_normalization,
        scripts: detect_scripts(name),
    }
}
