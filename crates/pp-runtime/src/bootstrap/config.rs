//! # Configuration Loader / 配置加载器
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Read TOML configuration files / 读取 TOML 配置文件
//! - ✅ Parse TOML into AppConfig DTO / 将 TOML 解析为 AppConfig DTO
//! - ✅ Report I/O and parsing errors with context / 报告带上下文的 I/O 和解析错误
//!
//! ## Prohibited / 禁止事项
//!
//! ❌ **No validation logic / 禁止验证逻辑**
//! ❌ **No business rules / 禁止业务规则**

use anyhow::Context;
use std::path::PathBuf;

use pp_core::config::AppConfig;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "PAWPOINT_CONFIG";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const APP_DIR_NAME: &str = "pawpoint";

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// **NO validation is performed**: empty strings and missing sections are
/// valid facts and map to empty values.
/// **不执行任何验证**：空字符串和缺失的部分都是事实。
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: PathBuf) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    AppConfig::from_toml(&toml_value)
}

/// Platform data directory for the app (`<data_dir>/pawpoint`).
pub fn default_app_dir() -> anyhow::Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .context("Platform data directory is not available")
}

/// Locate and load the configuration for this process.
/// 定位并加载本进程的配置。
///
/// `$PAWPOINT_CONFIG` wins; otherwise `<app dir>/config.toml` is used when it
/// exists. Without a file, system defaults are returned. Empty paths are
/// always filled from the platform data directory.
pub fn resolve_config() -> anyhow::Result<AppConfig> {
    let app_dir = default_app_dir()?;
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);

    let config = match explicit {
        Some(path) => load_config(path)?,
        None => {
            let path = app_dir.join(CONFIG_FILE_NAME);
            if path.exists() {
                load_config(path)?
            } else {
                AppConfig::empty()
            }
        }
    };

    Ok(config.or_system_defaults(app_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Test that valid TOML is parsed correctly
    /// 测试有效 TOML 被正确解析
    #[test]
    fn test_load_config_reads_valid_toml() {
        let toml_content = r#"
            [backend]
            base_url = "https://api.pawpoint.example"
            request_timeout_ms = 8000

            [identity]
            api_key = "AIza-test"

            [storage]
            data_dir = "/path/to/data"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config(temp_file.path().to_path_buf()).unwrap();

        assert_eq!(config.backend_base_url, "https://api.pawpoint.example");
        assert_eq!(config.request_timeout_ms, 8000);
        assert_eq!(config.identity_api_key, "AIza-test");
        assert_eq!(config.data_dir, PathBuf::from("/path/to/data"));
        assert_eq!(config.log_dir, PathBuf::new());
    }

    /// Test that invalid TOML returns error
    /// 测试无效 TOML 返回错误
    #[test]
    fn test_load_config_rejects_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"[backend\nbase_url = ").unwrap();

        let err = load_config(temp_file.path().to_path_buf()).unwrap_err();

        assert!(err.to_string().contains("TOML"));
    }

    /// Test that missing file returns error with the path
    /// 测试缺失文件返回带路径的错误
    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config(PathBuf::from("/nonexistent/pawpoint.toml")).unwrap_err();

        assert!(err.to_string().contains("/nonexistent/pawpoint.toml"));
    }
}
