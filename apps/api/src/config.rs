use std::fmt;

use anyhow::{bail, Context, Result};

/// Which hosted LLM backend the service talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Nvidia,
}

impl LlmProvider {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            "nvidia" => Ok(LlmProvider::Nvidia),
            other => bail!("LLM_PROVIDER must be 'gemini' or 'nvidia', got '{other}'"),
        }
    }

    /// Provider-specific variable consulted when `LLM_API_KEY` is unset.
    fn fallback_key_var(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "GOOGLE_API_KEY",
            LlmProvider::Nvidia => "NVIDIA_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini-1.5-flash",
            LlmProvider::Nvidia => "meta/llama3-70b-instruct",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            LlmProvider::Gemini => "https://generativelanguage.googleapis.com",
            LlmProvider::Nvidia => "https://integrate.api.nvidia.com",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Gemini => f.write_str("gemini"),
            LlmProvider::Nvidia => f.write_str("nvidia"),
        }
    }
}

/// Settings for the single LLM endpoint. Fixed for the lifetime of the process.
#[derive(Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

// Hand-written so the credential never reaches the logs.
impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if the LLM credential is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmConfig,
    pub processing_delay_ms: u64,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup("LLM_PROVIDER") {
            Some(value) => LlmProvider::parse(&value)?,
            None => LlmProvider::Gemini,
        };

        // An empty assignment (`LLM_API_KEY=` in a .env template) counts as unset.
        let key_var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let api_key = key_var("LLM_API_KEY")
            .or_else(|| key_var(provider.fallback_key_var()))
            .with_context(|| {
                format!(
                    "Required environment variable 'LLM_API_KEY' (or '{}') is not set",
                    provider.fallback_key_var()
                )
            })?;
        validate_api_key(&api_key)?;

        let temperature: f32 = parse_or("LLM_TEMPERATURE", &lookup, 0.5)?;
        if !(0.0..=2.0).contains(&temperature) {
            bail!("LLM_TEMPERATURE must be between 0.0 and 2.0, got {temperature}");
        }
        let top_p: f32 = parse_or("LLM_TOP_P", &lookup, 1.0)?;
        if !(top_p > 0.0 && top_p <= 1.0) {
            bail!("LLM_TOP_P must be in (0.0, 1.0], got {top_p}");
        }
        let max_tokens: u32 = parse_or("LLM_MAX_TOKENS", &lookup, 1024)?;
        if max_tokens == 0 {
            bail!("LLM_MAX_TOKENS must be greater than zero");
        }
        let timeout_secs: u64 = parse_or("LLM_TIMEOUT_SECS", &lookup, 120)?;
        if timeout_secs == 0 {
            bail!("LLM_TIMEOUT_SECS must be greater than zero");
        }

        let llm = LlmConfig {
            provider,
            api_key: api_key.trim().to_string(),
            model: lookup("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string()),
            base_url: lookup("LLM_BASE_URL")
                .unwrap_or_else(|| provider.default_base_url().to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature,
            top_p,
            max_tokens,
            timeout_secs,
        };

        Ok(Config {
            llm,
            processing_delay_ms: parse_or("PROCESSING_DELAY_MS", &lookup, 0)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", &lookup, 10 * 1024 * 1024)?,
            port: parse_or("PORT", &lookup, 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

/// Rejects credentials that can never authenticate: inner whitespace or control
/// characters (usually a broken copy/paste).
fn validate_api_key(key: &str) -> Result<()> {
    if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
        bail!("LLM API key is malformed: it contains whitespace or control characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_gemini() {
        let config = load(&[("GOOGLE_API_KEY", "AIzaTestKey")]).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Gemini);
        assert_eq!(config.llm.api_key, "AIzaTestKey");
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.port, 8080);
        assert_eq!(config.processing_delay_ms, 0);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_nvidia_uses_its_fallback_key_and_model() {
        let config = load(&[("LLM_PROVIDER", "NVIDIA"), ("NVIDIA_API_KEY", "nvapi-abc")]).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::Nvidia);
        assert_eq!(config.llm.api_key, "nvapi-abc");
        assert_eq!(config.llm.model, "meta/llama3-70b-instruct");
        assert_eq!(config.llm.base_url, "https://integrate.api.nvidia.com");
    }

    #[test]
    fn test_generic_key_wins_over_fallback() {
        let config = load(&[("LLM_API_KEY", "primary"), ("GOOGLE_API_KEY", "secondary")]).unwrap();
        assert_eq!(config.llm.api_key, "primary");
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = load(&[("LLM_PROVIDER", "gemini")]).unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_blank_key_is_fatal() {
        let err = load(&[("LLM_API_KEY", "   ")]).unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }

    #[test]
    fn test_empty_generic_key_falls_back_to_provider_key() {
        let config = load(&[("LLM_API_KEY", ""), ("GOOGLE_API_KEY", "AIzaFallback")]).unwrap();
        assert_eq!(config.llm.api_key, "AIzaFallback");

        let config = load(&[
            ("LLM_PROVIDER", "nvidia"),
            ("LLM_API_KEY", " \t"),
            ("NVIDIA_API_KEY", "nvapi-xyz"),
        ])
        .unwrap();
        assert_eq!(config.llm.api_key, "nvapi-xyz");
    }

    #[test]
    fn test_key_surrounding_whitespace_is_trimmed() {
        let config = load(&[("LLM_API_KEY", "  AIzaPadded\n")]).unwrap();
        assert_eq!(config.llm.api_key, "AIzaPadded");
    }

    #[test]
    fn test_key_with_inner_whitespace_is_fatal() {
        assert!(load(&[("LLM_API_KEY", "abc def")]).is_err());
    }

    #[test]
    fn test_unknown_provider_is_fatal() {
        assert!(load(&[("LLM_PROVIDER", "openai"), ("LLM_API_KEY", "k")]).is_err());
    }

    #[test]
    fn test_sampling_bounds_are_checked() {
        assert!(load(&[("LLM_API_KEY", "k"), ("LLM_TEMPERATURE", "3.5")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("LLM_TOP_P", "0")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("LLM_MAX_TOKENS", "0")]).is_err());
        assert!(load(&[("LLM_API_KEY", "k"), ("PORT", "not-a-port")]).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = load(&[("LLM_API_KEY", "k"), ("LLM_BASE_URL", "http://localhost:9000/")]).unwrap();
        assert_eq!(config.llm.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = load(&[("LLM_API_KEY", "super-secret")]).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
