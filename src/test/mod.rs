mod bulk_traffic;
mod config;
mod scenario_spec;
mod sim_time;

use crate::demo::build_session;
use crate::session::{NetworkSession, SessionConfig, Severity};
use crate::sim::Simulator;

/// 不带环境抖动的会话：`Simulator::run` 能正常结束，时延保持 0
pub(crate) fn quiet_session() -> (Simulator, NetworkSession) {
    quiet_session_with(SessionConfig::default())
}

pub(crate) fn quiet_session_with(cfg: SessionConfig) -> (Simulator, NetworkSession) {
    let cfg = SessionConfig {
        ambient_jitter: false,
        ..cfg
    };
    build_session(cfg, false)
}

pub(crate) fn messages(session: &NetworkSession, severity: Severity) -> Vec<String> {
    session
        .log()
        .entries()
        .filter(|e| e.severity == severity)
        .map(|e| e.message.clone())
        .collect()
}
