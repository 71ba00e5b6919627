//! 集线器故障、恢复爬坡与状态检查
//!
//! 恢复爬坡是显式的有限状态机：`RecoveryTick` 每次把健康度加一步并自我调度，
//! 其 `EventId` 保存在会话里，爬坡途中再次故障会取消它。

use tracing::{debug, info};

use super::log::Severity;
use super::session::{session_mut, NetworkSession};
use crate::net::{HubActivity, HubStatus, RecoveryProgress};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::viz::VizConnectionState;

impl NetworkSession {
    /// 集线器故障。已故障时不做任何事并返回 false。
    #[tracing::instrument(skip(self, sim), fields(status = ?self.hub.status))]
    pub fn fail_hub(&mut self, sim: &mut Simulator) -> bool {
        if !self.hub.fail() {
            return false;
        }
        let now = sim.now();
        if let Some(timer) = self.recovery_timer.take() {
            sim.cancel(timer);
            debug!("取消进行中的恢复爬坡");
        }
        self.push_log(
            now,
            "Hub failure! All network communication disrupted",
            Severity::Error,
        );
        self.emit_hub(now);
        self.emit_resting_connections(now);
        true
    }

    /// 从故障开始恢复爬坡；只有 Failed 状态可以开始
    #[tracing::instrument(skip(self, sim), fields(status = ?self.hub.status))]
    pub fn recover_hub(&mut self, sim: &mut Simulator) -> bool {
        if !self.hub.begin_recovery() {
            return false;
        }
        let now = sim.now();
        self.push_log(now, "Hub recovery initiated - restoring connections", Severity::Warning);
        self.emit_hub(now);
        self.schedule_recovery_tick(sim);
        true
    }

    /// 故障/恢复按钮：Active → 故障，Failed → 恢复，Recovering → 忽略
    pub fn toggle_hub_failure(&mut self, sim: &mut Simulator) -> HubStatus {
        match self.hub.status {
            HubStatus::Active => {
                self.fail_hub(sim);
            }
            HubStatus::Failed => {
                self.recover_hub(sim);
            }
            HubStatus::Recovering => {
                let msg = format!("Hub recovery already in progress ({}%)", self.hub.health);
                self.push_log(sim.now(), msg, Severity::Warning);
            }
        }
        self.hub.status
    }

    fn schedule_recovery_tick(&mut self, sim: &mut Simulator) {
        let timer = sim.schedule_in(self.cfg.timing.recovery_tick(), RecoveryTick);
        self.recovery_timer = Some(timer);
    }

    fn on_recovery_tick(&mut self, sim: &mut Simulator) {
        self.recovery_timer = None;
        let now = sim.now();
        match self.hub.advance_recovery(self.cfg.timing.recovery_step_pct) {
            RecoveryProgress::Ramping(health) => {
                debug!(health, "恢复爬坡");
                self.emit_hub(now);
                self.schedule_recovery_tick(sim);
            }
            RecoveryProgress::Completed => {
                info!("✅ 集线器恢复");
                self.push_log(now, "Hub recovered - Network fully operational", Severity::Success);
                self.emit_hub(now);
                self.emit_resting_connections(now);
            }
            RecoveryProgress::NotRecovering => {}
        }
    }

    /// 点击集线器：检查状态并短暂高亮所有连线
    pub fn check_hub(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        if self.hub.is_failed() {
            self.push_log(now, "Hub status checked - Hub is down", Severity::Error);
            return;
        }
        if self.hub.status == HubStatus::Recovering {
            let msg = format!("Hub status checked - Recovering ({}%)", self.hub.health);
            self.push_log(now, msg, Severity::Warning);
            return;
        }
        self.hub.activity = HubActivity::Checking;
        self.push_log(now, "Hub status checked - All connections active", Severity::Info);
        self.emit_hub(now);
        let online = self.devices.online_ids();
        for id in online {
            self.emit_connection(now, id, VizConnectionState::Active);
        }
        let restore = SimTime::from_millis(self.cfg.timing.hub_check_restore_ms);
        sim.schedule_in(restore, HubCheckRestore { epoch: self.epoch });
    }
}

/// 恢复爬坡的一步
#[derive(Debug)]
pub struct RecoveryTick;

impl Event for RecoveryTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        session_mut(world).on_recovery_tick(sim);
    }
}

/// 状态检查结束，集线器回到 Ready
#[derive(Debug)]
pub struct HubCheckRestore {
    pub epoch: u64,
}

impl Event for HubCheckRestore {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let s = session_mut(world);
        if s.epoch != self.epoch || s.hub.activity != HubActivity::Checking {
            return;
        }
        s.hub.activity = HubActivity::Ready;
        let now = sim.now();
        s.emit_hub(now);
        s.emit_resting_connections(now);
    }
}
