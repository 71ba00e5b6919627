//! 用户输入与剧本
//!
//! 视图层的每个按钮/点击对应一个 `Action`；`ScenarioSpec` 是一组带时间的动作，
//! 由 CLI 从 JSON 读入后以 `UserAction` 事件调度进仿真器。

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::config::{ConfigError, SessionConfig};
use super::session::{session_mut, NetworkSession};
use crate::error::SessionError;
use crate::net::DeviceId;
use crate::sim::{Event, SimTime, Simulator, World};

pub const SCENARIO_SCHEMA_VERSION: u32 = 1;

/// 一个用户输入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ClickDevice { device: DeviceId },
    TogglePower { device: DeviceId },
    SetPower { device: DeviceId, online: bool },
    Transmit { from: DeviceId, to: DeviceId },
    ClickHub,
    StartBulkTraffic,
    ToggleHubFailure,
    ToggleCongestion,
    Reset,
    ClearLog,
    SetSpeed { speed: u8 },
    DemonstrateFeatures,
}

impl Action {
    /// 动作涉及的设备
    pub fn devices(&self) -> Vec<DeviceId> {
        match self {
            Action::ClickDevice { device }
            | Action::TogglePower { device }
            | Action::SetPower { device, .. } => vec![*device],
            Action::Transmit { from, to } => vec![*from, *to],
            _ => Vec::new(),
        }
    }
}

impl NetworkSession {
    /// 执行一个用户输入。失败已写入活动日志，这里只把错误交还给调用方。
    pub fn apply(&mut self, action: &Action, sim: &mut Simulator) -> Result<(), SessionError> {
        let now = sim.now();
        match action {
            Action::ClickDevice { device } => self.click_device(*device, sim).map(|_| ()),
            Action::TogglePower { device } => self.toggle_power(*device, now).map(|_| ()),
            Action::SetPower { device, online } => self.set_power(*device, *online, now).map(|_| ()),
            Action::Transmit { from, to } => self.transmit(*from, *to, sim).map(|_| ()),
            Action::ClickHub => {
                self.check_hub(sim);
                Ok(())
            }
            Action::StartBulkTraffic => self.run_bulk_traffic(sim).map(|_| ()),
            Action::ToggleHubFailure => {
                self.toggle_hub_failure(sim);
                Ok(())
            }
            Action::ToggleCongestion => {
                self.toggle_congestion(sim);
                Ok(())
            }
            Action::Reset => {
                self.reset(sim);
                Ok(())
            }
            Action::ClearLog => {
                self.clear_log(now);
                Ok(())
            }
            Action::SetSpeed { speed } => self.set_speed(*speed, now),
            Action::DemonstrateFeatures => {
                self.demonstrate_features(sim);
                Ok(())
            }
        }
    }
}

/// 事件：在指定时刻执行一个用户输入
#[derive(Debug)]
pub struct UserAction {
    pub action: Action,
}

impl Event for UserAction {
    #[tracing::instrument(skip(self, sim, world), fields(action = ?self.action))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let UserAction { action } = *self;
        if let Err(e) = session_mut(world).apply(&action, sim) {
            debug!(error = %e, "用户输入未生效");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("unsupported scenario schema_version {0} (expected {SCENARIO_SCHEMA_VERSION})")]
    UnsupportedSchema(u32),
    #[error("step {step}: unknown device {device} (session has {devices} devices)")]
    UnknownDevice {
        step: usize,
        device: DeviceId,
        devices: usize,
    },
    #[error("step {step}: speed {speed} out of range 1..=5")]
    InvalidSpeed { step: usize, speed: u8 },
    #[error("invalid scenario json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scenario session block: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// 一个带时间的动作
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

/// 剧本文件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub meta: Option<ScenarioMeta>,
    #[serde(default)]
    pub session: Option<SessionConfig>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioSpec {
    pub fn from_json(raw: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// 检查版本号、内嵌会话配置、设备编号与速度范围
    pub fn validate(&self, devices: usize) -> Result<(), ScenarioError> {
        if self.schema_version != SCENARIO_SCHEMA_VERSION {
            return Err(ScenarioError::UnsupportedSchema(self.schema_version));
        }
        if let Some(cfg) = &self.session {
            cfg.validate()?;
        }
        for (step, s) in self.steps.iter().enumerate() {
            if let Some(device) = s
                .action
                .devices()
                .into_iter()
                .find(|d| d.0 == 0 || d.0 > devices)
            {
                return Err(ScenarioError::UnknownDevice {
                    step,
                    device,
                    devices,
                });
            }
            if let Action::SetSpeed { speed } = s.action {
                if !(1..=5).contains(&speed) {
                    return Err(ScenarioError::InvalidSpeed { step, speed });
                }
            }
        }
        Ok(())
    }

    /// 最后一个动作的时间
    pub fn last_at(&self) -> SimTime {
        self.steps
            .iter()
            .map(|s| SimTime::from_millis(s.at_ms))
            .max()
            .unwrap_or(SimTime::ZERO)
    }

    /// 把所有动作以 `UserAction` 调度进仿真器
    pub fn schedule_into(&self, sim: &mut Simulator) {
        for step in &self.steps {
            sim.schedule(
                SimTime::from_millis(step.at_ms),
                UserAction {
                    action: step.action.clone(),
                },
            );
        }
    }
}
