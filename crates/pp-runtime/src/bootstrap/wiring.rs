//! # Dependency Injection / 依赖注入模块
//!
//! ## Responsibilities / 职责
//!
//! - ✅ Create infra implementations (kv store, HTTP clients) / 创建 infra 层具体实现
//! - ✅ Inject them into the session controller and navigation resolver
//!   / 将依赖注入到会话控制器和导航解析器
//!
//! ## Prohibited / 禁止事项
//!
//! ❌ **No business logic / 禁止包含任何业务逻辑**
//! - Do not decide which route to show or whether a session is valid
//! - 不判断展示哪个路由或会话是否有效
//!
//! ## Architecture Principle / 架构原则
//!
//! > **This is the only place allowed to depend on pp-infra + pp-app simultaneously.**
//! > **这是唯一允许同时依赖 pp-infra 和 pp-app 的地方。**

use std::sync::Arc;
use std::time::Duration;

use pp_app::{welcome_channel, NavigationStateResolver, SessionConfig, SessionController};
use pp_core::config::AppConfig;
use pp_core::ports::{
    IdentityClientPort, KeyValueStorePort, ProfileBackendPort, ProviderAuthFlowPort,
    SessionStorePort,
};
use pp_infra::{
    DisabledProviderAuthFlow, FileKeyValueStore, HttpProfileBackend, KvSessionStore,
    RestIdentityClient,
};

use crate::runtime::AppRuntime;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
/// 依赖注入错误（基础设施初始化失败）
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),

    #[error("Backend client initialization failed: {0}")]
    BackendInit(String),

    #[error("Identity client initialization failed: {0}")]
    IdentityInit(String),
}

/// Build the runtime without a provider-hosted sign-in flow.
pub fn build_runtime(config: &AppConfig) -> WiringResult<AppRuntime> {
    build_runtime_with_provider_flow(config, Arc::new(DisabledProviderAuthFlow))
}

/// Wire all adapters and use cases into an [`AppRuntime`].
/// 组装所有适配器与用例。
///
/// 1. Durable key-value store under `data_dir` / 在 `data_dir` 下创建持久化存储
/// 2. Backend and identity HTTP clients / 创建后端与身份 HTTP 客户端
/// 3. Session controller wired to the navigation resolver via the welcome channel
///    会话控制器通过欢迎通道连接导航解析器
pub fn build_runtime_with_provider_flow(
    config: &AppConfig,
    provider_flow: Arc<dyn ProviderAuthFlowPort>,
) -> WiringResult<AppRuntime> {
    if config.backend_base_url.is_empty() {
        return Err(WiringError::MissingConfig("backend.base_url"));
    }
    if config.data_dir.as_os_str().is_empty() {
        return Err(WiringError::MissingConfig("storage.data_dir"));
    }

    let session_config = SessionConfig::from_request_timeout_ms(config.request_timeout_ms);
    let http_timeout: Duration = session_config.backend_timeout;

    // Step 1: Storage
    // 步骤 1：存储
    let kv: Arc<dyn KeyValueStorePort> =
        Arc::new(FileKeyValueStore::with_defaults(config.data_dir.clone()));
    let store: Arc<dyn SessionStorePort> = Arc::new(KvSessionStore::new(kv.clone()));

    // Step 2: Remote clients
    // 步骤 2：远程客户端
    let backend: Arc<dyn ProfileBackendPort> = Arc::new(
        HttpProfileBackend::new(config.backend_base_url.clone(), http_timeout)
            .map_err(|e| WiringError::BackendInit(format!("{e:#}")))?,
    );
    let identity = Arc::new(
        RestIdentityClient::new(
            config.identity_api_key.clone(),
            http_timeout,
            kv,
            provider_flow,
        )
        .map_err(|e| WiringError::IdentityInit(format!("{e:#}")))?
        .with_endpoints(
            &config.identity_auth_base_url,
            &config.identity_token_base_url,
        ),
    );

    // Step 3: Use cases
    // 步骤 3：用例
    let (notifier, inbox) = welcome_channel();
    let identity_port: Arc<dyn IdentityClientPort> = identity.clone();
    let controller = Arc::new(
        SessionController::new(identity_port, backend, store.clone(), session_config)
            .with_welcome_notifier(notifier),
    );
    let resolver = NavigationStateResolver::new(store.clone(), controller.subscribe(), inbox);

    Ok(AppRuntime::new(identity, controller, resolver, store))
}
