//! Supported locales and normalization of free-form language tags.

use std::fmt;
use std::str::FromStr;

use crate::foundation::error::GridError;

/// A locale with a shipped message bundle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Locale {
    #[default]
    ZhCn,
    ZhTw,
    En,
}

/// Aliases resolved after an exact match fails. Keys are lowercase.
const ALIASES: [(&str, Locale); 9] = [
    ("zh", Locale::ZhCn),
    ("zh-hans", Locale::ZhCn),
    ("zh-cn", Locale::ZhCn),
    ("zh-tw", Locale::ZhTw),
    ("zh-hk", Locale::ZhTw),
    ("zh-hant", Locale::ZhTw),
    ("en", Locale::En),
    ("en-us", Locale::En),
    ("en-gb", Locale::En),
];

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::ZhCn, Locale::ZhTw, Locale::En];

    /// BCP 47 tag, also used as the storage-key suffix.
    pub fn tag(self) -> &'static str {
        match self {
            Self::ZhCn => "zh-CN",
            Self::ZhTw => "zh-TW",
            Self::En => "en",
        }
    }

    /// Map any language tag to a supported locale.
    ///
    /// The tag is first cut down to `lang[-subtag]` (2-3 letter language, optional 2-4 letter
    /// subtag). Then: exact match, alias, base language, and finally [`Locale::default`].
    pub fn normalize(tag: &str) -> Self {
        let Some(clean) = leading_tag(tag.trim()) else {
            return Self::default();
        };
        let lower = clean.to_ascii_lowercase();

        if let Some(l) = Self::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(&lower))
        {
            return l;
        }
        if let Some((_, l)) = ALIASES.iter().find(|(alias, _)| *alias == lower) {
            return *l;
        }
        let base = lower.split('-').next().unwrap_or_default();
        ALIASES
            .iter()
            .find(|(alias, _)| *alias == base)
            .map(|(_, l)| *l)
            .unwrap_or_default()
    }
}

/// Longest prefix shaped like `[a-zA-Z]{2,3}(-[a-zA-Z]{2,4})?`.
fn leading_tag(s: &str) -> Option<&str> {
    let lang_len = s.bytes().take_while(u8::is_ascii_alphabetic).count();
    if !(2..=3).contains(&lang_len) {
        return None;
    }
    let rest = &s[lang_len..];
    let Some(after_dash) = rest.strip_prefix('-') else {
        return Some(&s[..lang_len]);
    };
    let sub_len = after_dash
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .count();
    if sub_len >= 2 {
        Some(&s[..lang_len + 1 + sub_len.min(4)])
    } else {
        Some(&s[..lang_len])
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Strict parse: only the exact supported tags (case-insensitive) are accepted.
impl FromStr for Locale {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GridError::validation(format!("unsupported locale '{s}'")))
    }
}

impl serde::Serialize for Locale {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> serde::Deserialize<'de> for Locale {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::normalize(&s))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/i18n/locales.rs"]
mod tests;
