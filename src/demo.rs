//! 演示和示例代码
//!
//! 包含会话构建函数、星型拓扑特性讲解与默认剧本

use crate::net::DeviceId;
use crate::session::{
    session_mut, Action, NetworkSession, ScenarioMeta, ScenarioSpec, ScenarioStep, SessionConfig,
    Severity, SCENARIO_SCHEMA_VERSION,
};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::viz::VizLogger;

/// 特性讲解的各条日志（依次间隔 `demo_step_ms` 出现）
pub const FEATURE_NOTES: [(&str, Severity); 4] = [
    ("✓ Centralized management through hub", Severity::Success),
    ("✓ Easy to add/remove devices", Severity::Success),
    (
        "✓ Fault isolation - one device failure doesn't affect others",
        Severity::Success,
    ),
    (
        "⚠ Single point of failure: if hub fails, network fails",
        Severity::Error,
    ),
];

/// 构建并启动一个会话
///
/// `viz` 为 true 时记录可视化事件（第一条是 meta）。
pub fn build_session(cfg: SessionConfig, viz: bool) -> (Simulator, NetworkSession) {
    let mut sim = Simulator::default();
    let mut session = NetworkSession::new(cfg);
    if viz {
        session.viz = Some(VizLogger::default());
    }
    session.start(&mut sim);
    (sim, session)
}

impl NetworkSession {
    /// 依次写出星型拓扑的优缺点
    pub fn demonstrate_features(&mut self, sim: &mut Simulator) {
        self.push_log(
            sim.now(),
            "Demonstrating star topology features...",
            Severity::Info,
        );
        let step = SimTime::from_millis(self.config().timing.demo_step_ms);
        let mut at = sim.now();
        for index in 0..FEATURE_NOTES.len() {
            at = at.saturating_add(step);
            sim.schedule(
                at,
                FeatureNote {
                    index,
                    epoch: self.epoch(),
                },
            );
        }
    }
}

/// 特性讲解事件
#[derive(Debug)]
pub struct FeatureNote {
    pub index: usize,
    pub epoch: u64,
}

impl Event for FeatureNote {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let s = session_mut(world);
        if s.epoch() != self.epoch {
            return;
        }
        if let Some((message, severity)) = FEATURE_NOTES.get(self.index) {
            s.push_log(sim.now(), *message, *severity);
        }
    }
}

/// 默认剧本：点选发送、批量流量、集线器故障与恢复、拥塞
pub fn demo_scenario() -> ScenarioSpec {
    let step = |at_ms: u64, action: Action| ScenarioStep { at_ms, action };
    ScenarioSpec {
        schema_version: SCENARIO_SCHEMA_VERSION,
        meta: Some(ScenarioMeta {
            name: Some("star-topology-tour".to_string()),
            description: Some("select/send, bulk traffic, hub failure, congestion".to_string()),
        }),
        session: None,
        steps: vec![
            step(0, Action::DemonstrateFeatures),
            step(500, Action::ClickDevice { device: DeviceId(1) }),
            step(700, Action::ClickDevice { device: DeviceId(4) }),
            step(6_000, Action::TogglePower { device: DeviceId(6) }),
            step(6_500, Action::StartBulkTraffic),
            step(50_000, Action::ToggleHubFailure),
            step(50_500, Action::Transmit { from: DeviceId(2), to: DeviceId(3) }),
            step(52_000, Action::ToggleHubFailure),
            step(56_000, Action::ToggleCongestion),
            step(57_000, Action::Transmit { from: DeviceId(2), to: DeviceId(5) }),
            step(66_000, Action::ToggleCongestion),
            step(67_000, Action::ClickHub),
        ],
    }
}
