// crates/clipmill-ui/src/i18n.rs
//
// The localised string store: a flat key → string map loaded from
// lang/lang_{code}.json next to the executable (or under the working
// directory during development).
//
// Lookup never fails — a missing key renders as the key itself, which is
// ugly but harmless and immediately tells a translator what is missing.
// Loading can fail: a missing primary language falls back to English once;
// if English itself is missing, startup aborts with a native error dialog
// (handled by the caller in app.rs).

use std::collections::HashMap;
use std::path::PathBuf;

/// Language tried when the requested one cannot be loaded.
pub const FALLBACK_LANGUAGE: &str = "en";

/// Shipped locales: (code, native display name shown in the menu).
pub const LANGUAGES: [(&str, &str); 2] = [("en", "English"), ("vi", "Tiếng Việt")];

pub struct Translations {
    code: String,
    map:  HashMap<String, String>,
}

impl Translations {
    /// Load `code`, falling back to English once. The returned store's
    /// `code()` reports what was actually loaded, so the persisted setting
    /// tracks reality after a fallback.
    pub fn load_or_fallback(code: &str) -> Result<Translations, String> {
        match Translations::load(code) {
            Ok(tr) => Ok(tr),
            Err(e) if code != FALLBACK_LANGUAGE => {
                log::warn!("[i18n] '{code}' unavailable ({e}), falling back to {FALLBACK_LANGUAGE}");
                Translations::load(FALLBACK_LANGUAGE)
            }
            Err(e) => Err(e),
        }
    }

    /// Load one language file from the first directory that has it.
    pub fn load(code: &str) -> Result<Translations, String> {
        let file = format!("lang_{code}.json");
        for dir in lang_dirs() {
            let path = dir.join(&file);
            if path.is_file() {
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| format!("read '{}': {e}", path.display()))?;
                return Translations::from_json(code, &text)
                    .map_err(|e| format!("parse '{}': {e}", path.display()));
            }
        }
        Err(format!("no '{file}' found in any language directory"))
    }

    fn from_json(code: &str, text: &str) -> Result<Translations, String> {
        let map: HashMap<String, String> =
            serde_json::from_str(text).map_err(|e| e.to_string())?;
        Ok(Translations { code: code.to_string(), map })
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.map.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Candidate directories holding lang_{code}.json, in lookup order:
/// next to the installed executable first, then the working directory
/// (where `cargo run` finds the repo's lang/ folder).
fn lang_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.join("lang"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd.join("lang"));
    }
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_returns_value_or_key() {
        let tr = Translations::from_json("en", r#"{"browse": "Browse"}"#).unwrap();
        assert_eq!(tr.get("browse"), "Browse");
        assert_eq!(tr.get("no_such_key"), "no_such_key");
        assert_eq!(tr.code(), "en");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Translations::from_json("en", "not json").is_err());
        assert!(Translations::from_json("en", r#"{"k": 3}"#).is_err());
    }

    #[test]
    fn shipped_language_files_parse_and_agree_on_keys() {
        // The repo's lang/ directory is the deliverable — both files must
        // parse and cover the same key set so no locale shows raw keys.
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../..")
            .join("lang");
        let en = std::fs::read_to_string(dir.join("lang_en.json")).unwrap();
        let vi = std::fs::read_to_string(dir.join("lang_vi.json")).unwrap();
        let en = Translations::from_json("en", &en).unwrap();
        let vi = Translations::from_json("vi", &vi).unwrap();

        let mut en_keys: Vec<_> = en.map.keys().collect();
        let mut vi_keys: Vec<_> = vi.map.keys().collect();
        en_keys.sort();
        vi_keys.sort();
        assert_eq!(en_keys, vi_keys);
    }

    #[test]
    fn load_falls_back_once_for_unknown_code() {
        // Run from a temp dir that has only English: asking for a bogus code
        // must land on the fallback, and the store must report that.
        let tmp = tempfile::tempdir().unwrap();
        let lang = tmp.path().join("lang");
        std::fs::create_dir(&lang).unwrap();
        std::fs::write(lang.join("lang_en.json"), r#"{"browse": "Browse"}"#).unwrap();

        let old = std::env::current_dir().unwrap();
        std::env::set_current_dir(tmp.path()).unwrap();
        let result = Translations::load_or_fallback("xx");
        std::env::set_current_dir(old).unwrap();

        let tr = result.unwrap();
        assert_eq!(tr.code(), "en");
        assert_eq!(tr.get("browse"), "Browse");
    }
}
