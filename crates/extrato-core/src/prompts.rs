//! Prompt store for model instructions
//!
//! Prompts are a flat YAML map of name -> template text. Defaults are
//! embedded at compile time; an on-disk file takes precedence when
//! configured. The set is loaded eagerly and cached for the process
//! lifetime; `reload` re-reads the backing file on demand. A missing key is
//! a configuration error, never a per-request fallback.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
const DEFAULT_PROMPTS: &str = include_str!("../prompts/defaults.yaml");

/// Well-known key for the identification prompt
pub const IDENTIFY_PROMPT: &str = "identify_file";

/// Build the lookup key for an extraction prompt
pub fn extraction_key(bank: &str, document_type: &str) -> String {
    format!("{}_{}", bank.to_lowercase(), document_type)
}

pub struct PromptStore {
    /// Backing file, if any; `None` means embedded defaults only
    path: Option<PathBuf>,
    prompts: RwLock<HashMap<String, String>>,
}

impl PromptStore {
    /// Load prompts from a file, eagerly
    pub fn from_file(path: PathBuf) -> Result<Self> {
        let prompts = read_prompt_file(&path)?;
        Ok(Self {
            path: Some(path),
            prompts: RwLock::new(prompts),
        })
    }

    /// Load the embedded default prompts
    pub fn embedded() -> Result<Self> {
        let prompts = parse_prompts(DEFAULT_PROMPTS)?;
        Ok(Self {
            path: None,
            prompts: RwLock::new(prompts),
        })
    }

    /// Load from the file if it exists, otherwise fall back to the
    /// embedded defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            _ => Self::embedded(),
        }
    }

    /// Get a prompt by name
    pub fn get(&self, name: &str) -> Result<String> {
        let prompts = self
            .prompts
            .read()
            .map_err(|_| Error::Config("Prompt store lock poisoned".into()))?;
        prompts
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("Prompt not found: {}", name)))
    }

    /// Re-read the backing file; a no-op for embedded-only stores
    pub fn reload(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let fresh = read_prompt_file(path)?;
        let mut prompts = self
            .prompts
            .write()
            .map_err(|_| Error::Config("Prompt store lock poisoned".into()))?;
        *prompts = fresh;
        Ok(())
    }

    /// Names of all loaded prompts, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .prompts
            .read()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

fn read_prompt_file(path: &PathBuf) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read prompts file {:?}: {}", path, e)))?;
    parse_prompts(&content)
}

fn parse_prompts(content: &str) -> Result<HashMap<String, String>> {
    let prompts: HashMap<String, String> = serde_yaml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid prompts YAML: {}", e)))?;
    if prompts.is_empty() {
        return Err(Error::Config("Prompts file contains no entries".into()));
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_defaults_parse() {
        let store = PromptStore::embedded().unwrap();
        for key in [
            IDENTIFY_PROMPT,
            "picpay_bank_statement",
            "itau_bank_statement",
            "picpay_credit_card",
            "itau_credit_card",
            "xp_credit_card",
        ] {
            let prompt = store.get(key).unwrap();
            assert!(!prompt.is_empty(), "empty prompt for {}", key);
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let store = PromptStore::embedded().unwrap();
        let err = store.get("amex_bank_statement").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("amex_bank_statement"));
    }

    #[test]
    fn test_extraction_key_lowercases_bank() {
        assert_eq!(
            extraction_key("PicPay", "bank_statement"),
            "picpay_bank_statement"
        );
        assert_eq!(extraction_key("xp", "credit_card"), "xp_credit_card");
    }

    #[test]
    fn test_file_store_and_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "identify_file: first version\n").unwrap();
        file.flush().unwrap();

        let store = PromptStore::from_file(file.path().to_path_buf()).unwrap();
        assert_eq!(store.get(IDENTIFY_PROMPT).unwrap(), "first version");

        // Rewrite the backing file; the cache is unchanged until reload
        fs::write(file.path(), "identify_file: second version\n").unwrap();
        assert_eq!(store.get(IDENTIFY_PROMPT).unwrap(), "first version");

        store.reload().unwrap();
        assert_eq!(store.get(IDENTIFY_PROMPT).unwrap(), "second version");
    }

    #[test]
    fn test_load_falls_back_to_embedded() {
        let store = PromptStore::load(Some(PathBuf::from("/nonexistent/prompts.yaml"))).unwrap();
        assert!(store.get(IDENTIFY_PROMPT).is_ok());
    }
}
