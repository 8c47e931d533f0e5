//! # Pure Data Module - Data Transfer Objects Only
//!
//! ## Responsibilities
//!
//! - ✅ Define configuration data structures
//! - ✅ Provide TOML → DTO mapping
//!
//! ## Prohibited
//!
//! ❌ **No business logic or policies**
//! ❌ **No validation logic**
//!
//! ## Iron Rule
//!
//! > **This module contains data only, no policy, no validation.**
//! > **此模块只包含数据结构定义，禁止：任何业务逻辑或策略、验证逻辑。**

use std::path::PathBuf;

/// Application configuration DTO (pure data, no logic)
/// 应用配置 DTO（纯数据，无逻辑）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Backend REST base URL (may be empty - this is a fact, not an error)
    /// 后端 REST 基础地址（可能为空 - 这就是事实，不是错误）
    pub backend_base_url: String,

    /// Per-request timeout for backend calls, in milliseconds (0 = not set)
    pub request_timeout_ms: u64,

    /// Identity provider API key
    pub identity_api_key: String,

    /// Identity provider account endpoint base URL (empty = provider default)
    pub identity_auth_base_url: String,

    /// Identity provider token endpoint base URL (empty = provider default)
    pub identity_token_base_url: String,

    /// Directory holding the durable key-value store
    pub data_dir: PathBuf,

    /// Directory for log files
    pub log_dir: PathBuf,
}

impl AppConfig {
    /// Create AppConfig from TOML value
    /// 从 TOML 值创建 AppConfig
    ///
    /// **Prohibited**: This method must NOT contain any validation.
    /// Empty strings are valid "facts".
    pub fn from_toml(toml_value: &toml::Value) -> anyhow::Result<Self> {
        let str_at = |section: &str, key: &str| -> String {
            toml_value
                .get(section)
                .and_then(|s| s.get(key))
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string()
        };

        Ok(Self {
            backend_base_url: str_at("backend", "base_url"),
            request_timeout_ms: toml_value
                .get("backend")
                .and_then(|b| b.get("request_timeout_ms"))
                .and_then(|v| v.as_integer())
                .unwrap_or(0)
                .max(0) as u64,
            identity_api_key: str_at("identity", "api_key"),
            identity_auth_base_url: str_at("identity", "auth_base_url"),
            identity_token_base_url: str_at("identity", "token_base_url"),
            data_dir: PathBuf::from(str_at("storage", "data_dir")),
            log_dir: PathBuf::from(str_at("logging", "log_dir")),
        })
    }

    /// Create empty AppConfig (all empty/default values)
    /// 创建空的 AppConfig（所有字段为空/默认值）
    pub fn empty() -> Self {
        Self {
            backend_base_url: String::new(),
            request_timeout_ms: 0,
            identity_api_key: String::new(),
            identity_auth_base_url: String::new(),
            identity_token_base_url: String::new(),
            data_dir: PathBuf::new(),
            log_dir: PathBuf::new(),
        }
    }

    /// Create AppConfig with system-default paths for production use
    /// 生产环境使用：创建具有系统默认路径的 AppConfig
    ///
    /// The base directory should be computed by the caller using
    /// platform-specific logic (e.g., `dirs` crate).
    pub fn with_system_defaults(data_dir: PathBuf) -> Self {
        Self {
            log_dir: data_dir.join("logs"),
            data_dir,
            ..Self::empty()
        }
    }

    /// Fill empty paths from system defaults, keeping every value that was set.
    pub fn or_system_defaults(mut self, data_dir: PathBuf) -> Self {
        let defaults = Self::with_system_defaults(data_dir);
        if self.data_dir.as_os_str().is_empty() {
            self.data_dir = defaults.data_dir;
        }
        if self.log_dir.as_os_str().is_empty() {
            self.log_dir = defaults.log_dir;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toml::Value;

    #[test]
    fn test_from_toml_returns_empty_values_when_missing() {
        let toml_value: Value = toml::from_str("[backend]\n").unwrap();

        let config = AppConfig::from_toml(&toml_value).unwrap();

        // Empty values are valid facts
        assert_eq!(config, AppConfig::empty());
    }

    #[test]
    fn test_from_toml_parses_all_sections() {
        let toml_str = r#"
            [backend]
            base_url = "https://api.example.com"
            request_timeout_ms = 2500

            [identity]
            api_key = "key-123"
            auth_base_url = "http://localhost:9099/v1"
            token_base_url = "http://localhost:9099/token/v1"

            [storage]
            data_dir = "/var/lib/pawpoint"

            [logging]
            log_dir = "/var/log/pawpoint"
        "#;
        let toml_value: Value = toml::from_str(toml_str).unwrap();

        let config = AppConfig::from_toml(&toml_value).unwrap();

        assert_eq!(config.backend_base_url, "https://api.example.com");
        assert_eq!(config.request_timeout_ms, 2500);
        assert_eq!(config.identity_api_key, "key-123");
        assert_eq!(config.identity_auth_base_url, "http://localhost:9099/v1");
        assert_eq!(config.identity_token_base_url, "http://localhost:9099/token/v1");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/pawpoint"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/pawpoint"));
    }

    #[test]
    fn test_negative_timeout_is_not_set() {
        let toml_value: Value = toml::from_str("[backend]\nrequest_timeout_ms = -5\n").unwrap();
        let config = AppConfig::from_toml(&toml_value).unwrap();
        assert_eq!(config.request_timeout_ms, 0);
    }

    #[test]
    fn test_with_system_defaults_creates_valid_paths() {
        let config = AppConfig::with_system_defaults(PathBuf::from("/tmp/test"));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/test"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/test/logs"));
        assert_eq!(config.backend_base_url, "");
    }

    #[test]
    fn test_or_system_defaults_keeps_explicit_paths() {
        let mut config = AppConfig::empty();
        config.data_dir = PathBuf::from("/custom");

        let config = config.or_system_defaults(PathBuf::from("/tmp/test"));

        assert_eq!(config.data_dir, PathBuf::from("/custom"));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/test/logs"));
    }
}
