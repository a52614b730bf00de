//! Environment variable loading.
//!
//! Fallback chains live here so business code does not repeat `or_else` ladders.

use std::env;
use std::path::Path;

/// Load `.env` from the current directory into the process environment.
/// Existing variables are never overridden. Runs at most once per process.
pub fn load_dotenv() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let path = env::current_dir()
            .map(|d| d.join(".env"))
            .unwrap_or_else(|_| std::path::PathBuf::from(".env"));
        for (key, value) in read_dotenv(&path) {
            if env::var(&key).is_err() {
                env::set_var(key, value);
            }
        }
    });
}

/// Parse `KEY=value` lines. Quotes are stripped, `#` starts a comment unless quoted.
fn read_dotenv(path: &Path) -> Vec<(String, String)> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let mut value = value.trim();
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// Read the primary variable or the first set alias, falling back to `default`.
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// Like [`env_or`] but returns `None` when unset; blank values count as unset.
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// Boolean variable: 0/false/no/off are false, anything else set is true.
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_alias_chain() {
        env::set_var("PYTOOLBOX_TEST_ALIAS_B", "from-alias");
        let v = env_or("PYTOOLBOX_TEST_PRIMARY_A", &["PYTOOLBOX_TEST_ALIAS_B"], || {
            "default".to_string()
        });
        assert_eq!(v, "from-alias");
        let d = env_or("PYTOOLBOX_TEST_UNSET_C", &[], || "default".to_string());
        assert_eq!(d, "default");
    }

    #[test]
    fn test_env_optional_blank_is_none() {
        env::set_var("PYTOOLBOX_TEST_BLANK", "   ");
        assert_eq!(env_optional("PYTOOLBOX_TEST_BLANK", &[]), None);
    }

    #[test]
    fn test_env_bool() {
        env::set_var("PYTOOLBOX_TEST_BOOL_OFF", "off");
        env::set_var("PYTOOLBOX_TEST_BOOL_ON", "yes");
        assert!(!env_bool("PYTOOLBOX_TEST_BOOL_OFF", &[], true));
        assert!(env_bool("PYTOOLBOX_TEST_BOOL_ON", &[], false));
        assert!(env_bool("PYTOOLBOX_TEST_BOOL_UNSET", &[], true));
    }

    #[test]
    fn test_read_dotenv() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(
            &path,
            "# comment\nA=1\nB = \"quoted # kept\"\nC=plain # trailing\n\nnot a pair\n",
        )
        .unwrap();
        let pairs = read_dotenv(&path);
        assert_eq!(
            pairs,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "quoted # kept".to_string()),
                ("C".to_string(), "plain".to_string()),
            ]
        );
    }
}
