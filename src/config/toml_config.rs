use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ValidatorError};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://openplzapi.org/de/Localities";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_MIN_CITY_LENGTH: usize = 3;
pub const DEFAULT_POSTAL_CODE_LENGTH: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub form: FormConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    pub debounce_ms: Option<u64>,
    pub min_city_length: Option<usize>,
    pub postal_code_length: Option<usize>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            timeout_seconds: Some(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            debounce_ms: Some(DEFAULT_DEBOUNCE_MS),
            min_city_length: Some(DEFAULT_MIN_CITY_LENGTH),
            postal_code_length: Some(DEFAULT_POSTAL_CODE_LENGTH),
        }
    }
}

impl ValidatorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ValidatorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ValidatorError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PLZ_API_ENDPOINT})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ValidatorError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.form.debounce_ms = Some(debounce_ms);
        self
    }

    pub fn with_postal_code_length(mut self, length: usize) -> Self {
        self.form.postal_code_length = Some(length);
        self
    }
}

impl ConfigProvider for ValidatorConfig {
    fn api_endpoint(&self) -> &str {
        self.api.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn debounce(&self) -> Duration {
        Duration::from_millis(self.form.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS))
    }

    fn min_city_length(&self) -> usize {
        self.form.min_city_length.unwrap_or(DEFAULT_MIN_CITY_LENGTH)
    }

    fn postal_code_length(&self) -> usize {
        self.form
            .postal_code_length
            .unwrap_or(DEFAULT_POSTAL_CODE_LENGTH)
    }
}

impl Validate for ValidatorConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.endpoint", self.api_endpoint())?;

        if let Some(timeout) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", timeout, 1)?;
        }

        // 德國 5 位、奧地利/瑞士 4 位
        validate_range("form.postal_code_length", self.postal_code_length(), 4, 5)?;
        validate_range("form.min_city_length", self.min_city_length(), 1, 10)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = ValidatorConfig::from_toml_str("").unwrap();

        assert_eq!(config.api_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.debounce(), Duration::from_millis(1000));
        assert_eq!(config.min_city_length(), 3);
        assert_eq!(config.postal_code_length(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[api]
endpoint = "http://localhost:8080/de/Localities"
timeout_seconds = 3

[form]
debounce_ms = 250
min_city_length = 2
postal_code_length = 4
"#;

        let config = ValidatorConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.api_endpoint(), "http://localhost:8080/de/Localities");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.min_city_length(), 2);
        assert_eq!(config.postal_code_length(), 4);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PLZ_TEST_ENDPOINT", "https://plz.example.com/de/Localities");

        let toml_content = r#"
[api]
endpoint = "${PLZ_TEST_ENDPOINT}"
"#;

        let config = ValidatorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_endpoint(), "https://plz.example.com/de/Localities");

        std::env::remove_var("PLZ_TEST_ENDPOINT");
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = ValidatorConfig::default().with_endpoint("not-a-url");
        assert!(invalid_url.validate().is_err());

        let invalid_length = ValidatorConfig::default().with_postal_code_length(6);
        assert!(invalid_length.validate().is_err());

        let zero_timeout = ValidatorConfig::from_toml_str("[api]\ntimeout_seconds = 0\n").unwrap();
        assert!(zero_timeout.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = ValidatorConfig::from_toml_str("[form\ndebounce_ms = 1");
        assert!(matches!(result, Err(ValidatorError::ConfigError { .. })));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[form]\ndebounce_ms = 400\n")
            .unwrap();

        let config = ValidatorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(400));
        assert_eq!(config.api_endpoint(), DEFAULT_ENDPOINT);
    }
}
