use std::env;

/// Application configuration loaded from environment variables.
/// Every field has a default; provider credentials are validated at client
/// construction, not here, so a misconfigured provider surfaces as a job
/// error instead of a failed boot.
#[derive(Debug, Clone)]
pub struct Config {
    // Web server
    pub host: String,
    pub port: u16,
    pub cors_origins: String,

    // Upload limits
    pub max_file_mb: u64,
    pub max_total_mb: u64,

    // Job polling
    pub job_ttl_seconds: u64,
    pub preview_chars: usize,

    // Generation provider
    pub llm_provider: String,
    pub openrouter_api_key: String,
    pub openrouter_model: String,
    pub azure_openai_endpoint: String,
    pub azure_openai_api_key: String,
    pub azure_openai_deployment: String,
    pub azure_openai_api_version: String,
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Category keyword overrides (comma-separated; blank falls back to defaults)
    pub keywords_environmental: String,
    pub keywords_social: String,
    pub keywords_governance: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_or("PORT", "8080")
                .parse()
                .expect("PORT must be a number"),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:3000"),
            max_file_mb: env_or("MAX_FILE_MB", "25")
                .parse()
                .expect("MAX_FILE_MB must be a number"),
            max_total_mb: env_or("MAX_TOTAL_MB", "50")
                .parse()
                .expect("MAX_TOTAL_MB must be a number"),
            job_ttl_seconds: env_or("JOB_POLL_TTL_SECONDS", "3600")
                .parse()
                .expect("JOB_POLL_TTL_SECONDS must be a number"),
            preview_chars: env_or("RAW_TEXT_PREVIEW_CHARS", "2000")
                .parse()
                .expect("RAW_TEXT_PREVIEW_CHARS must be a number"),
            llm_provider: env_or("LLM_PROVIDER", "openrouter"),
            openrouter_api_key: env_or("OPENROUTER_API_KEY", ""),
            openrouter_model: env_or("OPENROUTER_MODEL", "openrouter/auto"),
            azure_openai_endpoint: env_or("AZURE_OPENAI_ENDPOINT", ""),
            azure_openai_api_key: env_or("AZURE_OPENAI_API_KEY", ""),
            azure_openai_deployment: env_or("AZURE_OPENAI_DEPLOYMENT", ""),
            azure_openai_api_version: env_or("AZURE_OPENAI_API_VERSION", "2024-02-15-preview"),
            gemini_api_key: env_or("GEMINI_API_KEY", ""),
            gemini_model: env_or("GEMINI_MODEL", "gemini-1.5-flash"),
            keywords_environmental: env_or("ESG_KEYWORDS_E", ""),
            keywords_social: env_or("ESG_KEYWORDS_S", ""),
            keywords_governance: env_or("ESG_KEYWORDS_G", ""),
        }
    }

    pub fn cors_origins_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb * 1024 * 1024
    }

    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_mb * 1024 * 1024
    }
}

/// Parse a comma-separated keyword override. Blank input keeps the defaults.
pub fn parse_keywords(value: &str, fallback: &[&str]) -> Vec<String> {
    if value.trim().is_empty() {
        return fallback.iter().map(|k| k.to_string()).collect();
    }
    value
        .split(',')
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
