//! 网络会话模块
//!
//! 此模块包含会话本身（唯一的状态所有者）、活动日志、指标聚合、配置、
//! 集线器控制以及用户输入/剧本。

// 子模块声明
mod config;
mod hub_control;
mod log;
mod metrics;
mod scenario;
#[allow(clippy::module_inception)]
mod session;
mod viz_hooks;

// 重新导出公共接口
pub use config::{ConfigError, SessionConfig, TimingConfig, MIN_TICK_MS};
pub use hub_control::{HubCheckRestore, RecoveryTick};
pub use log::{EventLog, LogEntry, Severity, SimTimeStamp};
pub use metrics::MetricsSnapshot;
pub use scenario::{
    Action, ScenarioError, ScenarioMeta, ScenarioSpec, ScenarioStep, UserAction,
    SCENARIO_SCHEMA_VERSION,
};
pub use session::{NetworkSession, MAX_SPEED, MIN_SPEED};
pub(crate) use session::session_mut;
