//! 网络会话
//!
//! 会话独占所有状态：设备、集线器、选择、拥塞、计数器、日志与随机数。
//! 所有修改都发生在仿真器的单一事件循环里，因此不需要任何锁。

use std::any::Any;
use std::collections::BTreeMap;
use std::io::Write;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::config::SessionConfig;
use super::log::{EventLog, LogEntry, Severity};
use super::metrics::MetricsSnapshot;
use crate::error::SessionError;
use crate::net::{DeviceActivity, DeviceId, DeviceRegistry, Hub, HubActivity, Stats, TransmissionId};
use crate::sim::{EventId, SimTime, Simulator, World};
use crate::traffic::{BulkRun, TransmissionPhase, TransmissionRecord};
use crate::viz::{VizConnectionState, VizLogger};

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 5;

const SPEED_LABELS: [&str; 5] = ["Very Slow", "Slow", "Normal", "Fast", "Very Fast"];

/// 星型网络会话（仿真世界）
pub struct NetworkSession {
    pub(crate) cfg: SessionConfig,
    pub(crate) devices: DeviceRegistry,
    pub(crate) hub: Hub,
    pub(crate) selection: Option<DeviceId>,
    pub(crate) speed: u8,
    pub(crate) congested: bool,
    pub(crate) latency_ms: f64,
    pub(crate) collision_rate_pct: f64,
    pub(crate) stats: Stats,
    pub(crate) log: EventLog,
    pub(crate) rng: ChaCha8Rng,
    /// 每次 reset 自增；携带旧 epoch 的延时事件一律作废
    pub(crate) epoch: u64,
    /// 每次切换拥塞自增；用于作废未执行的冲突回合
    pub(crate) congestion_epoch: u64,
    pub(crate) bulk: Option<BulkRun>,
    pub(crate) next_bulk_run: u64,
    /// 最近的传输记录（已结束的只保留有限条）
    pub(crate) transmissions: BTreeMap<TransmissionId, TransmissionRecord>,
    /// 在途传输数
    pub(crate) in_flight: usize,
    pub(crate) next_transmission: u64,
    pub(crate) recovery_timer: Option<EventId>,
    pub(crate) ambient_timer: Option<EventId>,
    pub(crate) started_at: SimTime,
    /// 可选：记录可视化事件（用于视图层渲染或离线回放）
    pub viz: Option<VizLogger>,
    pub(crate) last_metrics: Option<MetricsSnapshot>,
}

impl Default for NetworkSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl NetworkSession {
    /// 按配置创建会话（所有设备在线，集线器 Active）
    pub fn new(cfg: SessionConfig) -> Self {
        let speed = cfg.speed.clamp(MIN_SPEED, MAX_SPEED);
        Self {
            devices: DeviceRegistry::new(cfg.devices),
            hub: Hub::default(),
            selection: None,
            speed,
            congested: false,
            latency_ms: 0.0,
            collision_rate_pct: 0.0,
            stats: Stats::default(),
            log: EventLog::with_capacity(cfg.log_capacity),
            rng: ChaCha8Rng::seed_from_u64(cfg.seed),
            epoch: 0,
            congestion_epoch: 0,
            bulk: None,
            next_bulk_run: 0,
            transmissions: BTreeMap::new(),
            in_flight: 0,
            next_transmission: 0,
            recovery_timer: None,
            ambient_timer: None,
            started_at: SimTime::ZERO,
            viz: None,
            last_metrics: None,
            cfg,
        }
    }

    /// 会话开始：写初始化日志、记录拓扑元信息、启动环境抖动 tick
    #[tracing::instrument(skip(self, sim), fields(devices = self.devices.len(), speed = self.speed))]
    pub fn start(&mut self, sim: &mut Simulator) {
        info!("🌟 星型网络会话启动");
        self.started_at = sim.now();
        self.emit_viz_meta(sim.now());
        self.push_log(
            sim.now(),
            "Network topology initialized - All PCs online",
            Severity::Success,
        );
        if self.cfg.ambient_jitter {
            self.start_ambient(sim);
        }
    }

    // ---------------------------------------------------------------------
    // 只读访问
    // ---------------------------------------------------------------------

    pub fn config(&self) -> &SessionConfig {
        &self.cfg
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    pub fn selection(&self) -> Option<DeviceId> {
        self.selection
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn speed_label(&self) -> &'static str {
        SPEED_LABELS[(self.speed.clamp(MIN_SPEED, MAX_SPEED) - 1) as usize]
    }

    pub fn is_congested(&self) -> bool {
        self.congested
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn collision_rate_pct(&self) -> f64 {
        self.collision_rate_pct
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn started_at(&self) -> SimTime {
        self.started_at
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_bulk_running(&self) -> bool {
        self.bulk.is_some()
    }

    pub fn is_online(&self, id: DeviceId) -> bool {
        self.devices.is_online(id)
    }

    pub fn transmission(&self, id: TransmissionId) -> Option<&TransmissionRecord> {
        self.transmissions.get(&id)
    }

    pub fn transmissions(&self) -> impl Iterator<Item = &TransmissionRecord> {
        self.transmissions.values()
    }

    /// 正在进行中的传输数
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn metrics(&self, now: SimTime) -> MetricsSnapshot {
        MetricsSnapshot::capture(self, now)
    }

    // ---------------------------------------------------------------------
    // 日志
    // ---------------------------------------------------------------------

    pub(crate) fn push_log(&mut self, now: SimTime, message: impl Into<String>, severity: Severity) {
        let entry: LogEntry = self.log.push(now, message, severity).clone();
        debug!(severity = ?entry.severity, message = %entry.message, "📝 活动日志");
        self.viz_log(now, entry);
    }

    /// 前置条件失败：写一条 error 日志并原样返回错误
    pub(crate) fn reject<T>(&mut self, now: SimTime, err: SessionError) -> Result<T, SessionError> {
        let message = describe(&err);
        warn!(error = %err, "操作被拒绝");
        self.push_log(now, message, Severity::Error);
        Err(err)
    }

    /// 清空日志并写回初始条目
    pub fn clear_log(&mut self, now: SimTime) {
        self.log.clear();
        self.push_log(now, "Network initialized - All PCs connected to hub", Severity::Success);
    }

    /// 把日志按文本格式导出到 `out`
    pub fn export_log(&mut self, out: &mut dyn Write, now: SimTime) -> Result<(), SessionError> {
        match self.log.write_to(out) {
            Ok(()) => {
                self.push_log(now, "Network log exported successfully", Severity::Success);
                Ok(())
            }
            Err(e) => self.reject(now, SessionError::ExportFailure(e)),
        }
    }

    // ---------------------------------------------------------------------
    // 设备电源与选择
    // ---------------------------------------------------------------------

    /// 设置设备上下线；下线会取消该设备的选中状态。返回状态是否变化。
    #[tracing::instrument(skip(self), fields(device = %id))]
    pub fn set_power(&mut self, id: DeviceId, online: bool, now: SimTime) -> Result<bool, SessionError> {
        let changed = match self.devices.set_power(id, online) {
            Ok(changed) => changed,
            Err(e) => return self.reject(now, e),
        };
        if !changed {
            return Ok(false);
        }
        if online {
            self.push_log(now, format!("{id} powered ON"), Severity::Success);
        } else {
            if self.selection == Some(id) {
                self.selection = None;
            }
            self.push_log(now, format!("{id} powered OFF"), Severity::Error);
        }
        self.emit_device(now, id);
        self.emit_connection(now, id, self.resting_connection(id));
        Ok(true)
    }

    /// 电源按钮：翻转上下线
    pub fn toggle_power(&mut self, id: DeviceId, now: SimTime) -> Result<bool, SessionError> {
        let online = match self.devices.device(id) {
            Ok(dev) => dev.online,
            Err(e) => return self.reject(now, e),
        };
        self.set_power(id, !online, now)?;
        Ok(!online)
    }

    /// 选中一个在线设备作为发送方
    pub fn select(&mut self, id: DeviceId, now: SimTime) -> Result<(), SessionError> {
        let online = match self.devices.device(id) {
            Ok(dev) => dev.online,
            Err(e) => return self.reject(now, e),
        };
        if !online {
            return self.reject(now, SessionError::DeviceOffline(id));
        }
        self.deselect(now);
        self.selection = Some(id);
        self.devices.set_activity(id, DeviceActivity::Selected)?;
        self.emit_device(now, id);
        self.push_log(now, format!("{id} selected as sender"), Severity::Info);
        Ok(())
    }

    /// 取消选中（若有）
    pub fn deselect(&mut self, now: SimTime) {
        if let Some(id) = self.selection.take() {
            if self
                .devices
                .get(id)
                .is_some_and(|d| d.activity == DeviceActivity::Selected)
            {
                let _ = self.devices.set_activity(id, DeviceActivity::Idle);
                self.emit_device(now, id);
            }
        }
    }

    /// 点击设备：第一次选中发送方，再次点击同一设备取消，点击另一台设备发起传输
    #[tracing::instrument(skip(self, sim), fields(device = %id, selection = ?self.selection))]
    pub fn click_device(
        &mut self,
        id: DeviceId,
        sim: &mut Simulator,
    ) -> Result<Option<TransmissionId>, SessionError> {
        let now = sim.now();
        let online = match self.devices.device(id) {
            Ok(dev) => dev.online,
            Err(e) => return self.reject(now, e),
        };
        if !online {
            return self.reject(now, SessionError::DeviceOffline(id));
        }

        match self.selection {
            None => {
                self.select(id, now)?;
                Ok(None)
            }
            Some(sel) if sel == id => {
                self.deselect(now);
                Ok(None)
            }
            Some(sender) => {
                if !self.devices.is_online(sender) {
                    self.deselect(now);
                    self.push_log(
                        now,
                        format!("Cannot send from {sender} - Device went offline"),
                        Severity::Error,
                    );
                    return Err(SessionError::DeviceOffline(sender));
                }
                self.transmit(sender, id, sim).map(Some)
            }
        }
    }

    // ---------------------------------------------------------------------
    // 速度
    // ---------------------------------------------------------------------

    pub fn set_speed(&mut self, speed: u8, now: SimTime) -> Result<(), SessionError> {
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return self.reject(now, SessionError::InvalidSpeed(speed));
        }
        self.speed = speed;
        debug!(speed, label = self.speed_label(), "调整动画速度");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // 重置
    // ---------------------------------------------------------------------

    /// 清除所有进行中的展示状态。
    ///
    /// epoch 自增使所有在途的传输/批量流量/冲突回合失效；设备上下线与集线器健康保持不变。
    #[tracing::instrument(skip(self, sim))]
    pub fn reset(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        match self.try_reset(now) {
            Ok(()) => {
                info!(epoch = self.epoch, "🔄 网络已重置");
                self.push_log(
                    now,
                    "Network reset completed - All transmissions cleared",
                    Severity::Info,
                );
            }
            Err(e) => {
                warn!(error = %e, "重置时发现不一致，强制恢复");
                self.push_log(now, describe(&e), Severity::Error);
                self.force_consistent(now);
            }
        }
    }

    fn try_reset(&mut self, now: SimTime) -> Result<(), SessionError> {
        self.epoch = self.epoch.wrapping_add(1);
        self.bulk = None;
        self.selection = None;
        for record in self.transmissions.values_mut() {
            if record.phase.is_in_flight() {
                record.phase = TransmissionPhase::Cancelled;
                record.finished_at = Some(now);
            }
        }
        self.in_flight = 0;
        self.devices.clear_activity();
        self.hub.activity = HubActivity::Ready;
        if self.congested {
            self.congested = false;
            self.congestion_epoch = self.congestion_epoch.wrapping_add(1);
            self.collision_rate_pct = 0.0;
        }
        self.emit_all(now);
        self.check_invariants()
    }

    /// 检查会话内部一致性
    pub fn check_invariants(&self) -> Result<(), SessionError> {
        self.hub.check_invariants().map_err(SessionError::Inconsistent)?;
        if let Some(sel) = self.selection {
            if !self.devices.is_online(sel) {
                return Err(SessionError::Inconsistent(format!("{sel} selected while offline")));
            }
        }
        if !(0.0..=100.0).contains(&self.collision_rate_pct) {
            return Err(SessionError::Inconsistent(format!(
                "collision rate {}",
                self.collision_rate_pct
            )));
        }
        if !(MIN_SPEED..=MAX_SPEED).contains(&self.speed) {
            return Err(SessionError::Inconsistent(format!("speed {}", self.speed)));
        }
        Ok(())
    }

    /// 尽力恢复到一致状态：集线器 Ready、拥塞清除、计数器归零
    fn force_consistent(&mut self, now: SimTime) {
        self.hub.normalize();
        self.congested = false;
        self.collision_rate_pct = 0.0;
        self.stats = Stats::default();
        self.selection = None;
        self.speed = self.speed.clamp(MIN_SPEED, MAX_SPEED);
        self.devices.clear_activity();
        self.emit_all(now);
    }

    /// 设备空闲时连线应有的样子
    pub(crate) fn resting_connection(&self, id: DeviceId) -> VizConnectionState {
        match self.devices.get(id) {
            Some(dev) if dev.online && !self.hub.is_failed() => {
                if dev.congested {
                    VizConnectionState::Congested
                } else {
                    VizConnectionState::Idle
                }
            }
            _ => VizConnectionState::Offline,
        }
    }
}

/// 错误对应的用户可见日志文字
pub(crate) fn describe(err: &SessionError) -> String {
    match err {
        SessionError::HubUnreachable => {
            "Transmission failed - Hub is down, network unreachable".to_string()
        }
        SessionError::DeviceOffline(id) => {
            format!("Cannot communicate with {id} - Device is offline")
        }
        SessionError::AlreadyRunning => "Network traffic simulation already in progress".to_string(),
        SessionError::InsufficientOnlineDevices { .. } => {
            "Need at least 2 online PCs for network simulation".to_string()
        }
        SessionError::SelfTransmission(id) => format!("{id} cannot send data to itself"),
        SessionError::UnknownDevice(id) => format!("Unknown device {id}"),
        SessionError::InvalidSpeed(s) => format!("Invalid animation speed {s} (expected 1-5)"),
        SessionError::ExportFailure(_) => "Failed to export network log".to_string(),
        SessionError::Inconsistent(detail) => {
            format!("Network reset encountered an error: {detail}")
        }
    }
}

/// 从 `World` 取出会话
pub(crate) fn session_mut(world: &mut dyn World) -> &mut NetworkSession {
    world
        .as_any_mut()
        .downcast_mut::<NetworkSession>()
        .expect("world must be NetworkSession")
}

impl World for NetworkSession {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, sim: &mut Simulator) {
        if self.viz.is_none() {
            return;
        }
        let snapshot = MetricsSnapshot::capture(self, sim.now());
        let changed = self
            .last_metrics
            .as_ref()
            .is_none_or(|prev| !prev.same_readings(&snapshot));
        if changed {
            self.viz_metrics(sim.now(), snapshot.clone());
            self.last_metrics = Some(snapshot);
        }
    }
}
