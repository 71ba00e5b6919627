//! 传输时序器
//!
//! 一次传输分三个阶段：发送方 → 集线器、集线器处理（MAC 表查询）、集线器 → 接收方。
//! 每个阶段的结束都是一个调度事件；阶段边界处重新检查集线器与两端设备的状态，
//! 途中失效只中止本次传输，已经发生的展示变化不回滚。

use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{SessionError, SessionErrorKind};
use crate::net::{DeviceActivity, DeviceId, HubActivity, TransmissionId};
use crate::session::{session_mut, NetworkSession, Severity};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::viz::{VizConnectionState, VizEndpoint, VizPacketKind};

/// 单段动画的基准时长（毫秒）
pub const BASE_HOP_MS: f64 = 1_500.0;
/// 单段动画的最短时长（毫秒）
pub const MIN_HOP_MS: f64 = 800.0;
/// 集线器处理的最短时延（毫秒，除以速度前）
pub const MIN_HUB_PROCESSING_MS: f64 = 500.0;
/// 拥塞时的时长倍数
pub const CONGESTION_FACTOR: f64 = 1.5;
/// 最多保留的已结束传输记录数
pub const FINISHED_RECORD_LIMIT: usize = 256;

/// 单段传输时长：`max(800, 1500/speed)`，拥塞 ×1.5，并按时延成比例放大
pub fn base_duration(speed: u8, latency_ms: f64, congested: bool) -> f64 {
    let speed = speed.max(1) as f64;
    let mut ms = (BASE_HOP_MS / speed).max(MIN_HOP_MS);
    if congested {
        ms *= CONGESTION_FACTOR;
    }
    if latency_ms > 0.0 {
        ms *= 1.0 + latency_ms / 1_000.0;
    }
    ms
}

/// 集线器处理时延：`max(500, latency) / speed`
pub fn hub_processing_delay(speed: u8, latency_ms: f64) -> f64 {
    MIN_HUB_PROCESSING_MS.max(latency_ms) / speed.max(1) as f64
}

/// 传输所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransmissionPhase {
    SenderToHub,
    HubProcessing,
    HubToReceiver,
    Completed,
    Aborted(SessionErrorKind),
    /// 被 reset 取消
    Cancelled,
}

impl TransmissionPhase {
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            TransmissionPhase::SenderToHub
                | TransmissionPhase::HubProcessing
                | TransmissionPhase::HubToReceiver
        )
    }
}

/// 一次传输的记录
#[derive(Debug, Clone, Serialize)]
pub struct TransmissionRecord {
    pub id: TransmissionId,
    pub sender: DeviceId,
    pub receiver: DeviceId,
    pub phase: TransmissionPhase,
    pub started_at: SimTime,
    pub finished_at: Option<SimTime>,
    /// 属于哪次批量流量（若有）
    pub bulk_run: Option<u64>,
    pub(crate) epoch: u64,
}

impl NetworkSession {
    /// 发起一次传输。无论成功与否都会清除当前选择。
    #[tracing::instrument(skip(self, sim), fields(sender = %sender, receiver = %receiver))]
    pub fn transmit(
        &mut self,
        sender: DeviceId,
        receiver: DeviceId,
        sim: &mut Simulator,
    ) -> Result<TransmissionId, SessionError> {
        self.deselect(sim.now());
        self.start_transmission(sender, receiver, None, sim)
    }

    pub(crate) fn start_transmission(
        &mut self,
        sender: DeviceId,
        receiver: DeviceId,
        bulk_run: Option<u64>,
        sim: &mut Simulator,
    ) -> Result<TransmissionId, SessionError> {
        let now = sim.now();
        for id in [sender, receiver] {
            if self.devices.get(id).is_none() {
                return self.reject(now, SessionError::UnknownDevice(id));
            }
        }
        if self.hub.is_failed() {
            return self.reject(now, SessionError::HubUnreachable);
        }
        for id in [sender, receiver] {
            if !self.devices.is_online(id) {
                return self.reject(now, SessionError::DeviceOffline(id));
            }
        }
        if sender == receiver {
            return self.reject(now, SessionError::SelfTransmission(sender));
        }

        let id = TransmissionId(self.next_transmission);
        self.next_transmission = self.next_transmission.wrapping_add(1);
        self.transmissions.insert(
            id,
            TransmissionRecord {
                id,
                sender,
                receiver,
                phase: TransmissionPhase::SenderToHub,
                started_at: now,
                finished_at: None,
                bulk_run,
                epoch: self.epoch,
            },
        );
        self.in_flight += 1;
        info!(tx = id.0, "📤 传输开始");
        self.push_log(
            now,
            format!("Data transmission from {sender} to {receiver} initiated"),
            Severity::Info,
        );

        // 阶段 1：发送方 → 集线器
        let bandwidth = self.rng.gen_range(40..=90);
        self.devices.set_activity(sender, DeviceActivity::Sending)?;
        self.devices.set_bandwidth(sender, bandwidth)?;
        self.hub.activity = HubActivity::Processing;
        let d1 = SimTime::from_millis_f64(self.hop_duration_ms());
        let arrive = now.saturating_add(d1);
        self.emit_device(now, sender);
        self.emit_hub(now);
        self.emit_connection(now, sender, VizConnectionState::Active);
        self.emit_packet(
            Some(id),
            VizEndpoint::Device(sender.0),
            VizEndpoint::Hub,
            now,
            arrive,
            VizPacketKind::Data,
            format!("PC{}", sender.0),
        );
        trace!(d1 = ?d1, "调度阶段 1 结束");
        sim.schedule(arrive, TransmissionStep { id, epoch: self.epoch });
        Ok(id)
    }

    /// 当前速度/时延/拥塞下的单段时长（毫秒）
    pub fn hop_duration_ms(&self) -> f64 {
        base_duration(self.speed, self.latency_ms, self.congested)
    }

    fn on_transmission_step(&mut self, id: TransmissionId, epoch: u64, sim: &mut Simulator) {
        if epoch != self.epoch {
            trace!(tx = id.0, "过期的传输事件，忽略");
            return;
        }
        let Some(record) = self.transmissions.get(&id) else {
            return;
        };
        let (sender, receiver, phase) = (record.sender, record.receiver, record.phase);
        let now = sim.now();

        if self.hub.is_failed() && phase.is_in_flight() {
            self.abort_transmission(id, SessionError::HubUnreachable, sim);
            return;
        }

        match phase {
            TransmissionPhase::SenderToHub => {
                if !self.devices.is_online(sender) {
                    self.abort_transmission(id, SessionError::DeviceOffline(sender), sim);
                    return;
                }
                let mac = self.devices.get(sender).map(|d| d.mac.to_string()).unwrap_or_default();
                self.push_log(now, format!("Frame from {mac} received at hub"), Severity::Info);

                // 阶段 2：集线器处理（纯延时）
                let target = self.devices.get(receiver).map(|d| d.mac.to_string()).unwrap_or_default();
                self.push_log(
                    now,
                    format!("Hub looking up MAC table for {target}"),
                    Severity::Info,
                );
                let d2 = SimTime::from_millis_f64(hub_processing_delay(self.speed, self.latency_ms));
                self.set_phase(id, TransmissionPhase::HubProcessing);
                debug!(tx = id.0, d2 = ?d2, "阶段 2：集线器处理");
                sim.schedule_in(d2, TransmissionStep { id, epoch });
            }
            TransmissionPhase::HubProcessing => {
                if !self.devices.is_online(receiver) {
                    self.abort_transmission(id, SessionError::DeviceOffline(receiver), sim);
                    return;
                }
                // 阶段 3：集线器 → 接收方
                let bandwidth = self.rng.gen_range(40..=90);
                let _ = self.devices.set_activity(receiver, DeviceActivity::Receiving);
                let _ = self.devices.set_bandwidth(receiver, bandwidth);
                let d3 = SimTime::from_millis_f64(self.hop_duration_ms());
                let arrive = now.saturating_add(d3);
                self.emit_device(now, receiver);
                self.emit_connection(now, receiver, VizConnectionState::Active);
                self.emit_packet(
                    Some(id),
                    VizEndpoint::Hub,
                    VizEndpoint::Device(receiver.0),
                    now,
                    arrive,
                    VizPacketKind::Data,
                    format!("PC{}", sender.0),
                );
                self.set_phase(id, TransmissionPhase::HubToReceiver);
                debug!(tx = id.0, d3 = ?d3, "阶段 3：集线器 → 接收方");
                sim.schedule(arrive, TransmissionStep { id, epoch });
            }
            TransmissionPhase::HubToReceiver => {
                if !self.devices.is_online(receiver) {
                    self.abort_transmission(id, SessionError::DeviceOffline(receiver), sim);
                    return;
                }
                self.complete_transmission(id, sim);
            }
            _ => {}
        }
    }

    fn set_phase(&mut self, id: TransmissionId, phase: TransmissionPhase) {
        if let Some(record) = self.transmissions.get_mut(&id) {
            record.phase = phase;
        }
    }

    /// 结束后两端设备与集线器恢复展示。
    ///
    /// 设备若仍参与其他在途传输，按那次传输恢复 Sending/Receiving。
    fn settle_participants(&mut self, id: TransmissionId, now: SimTime) {
        let Some(record) = self.transmissions.get(&id) else {
            return;
        };
        let (sender, receiver) = (record.sender, record.receiver);
        for dev in [sender, receiver] {
            let connection = match self.busy_activity(dev) {
                Some(activity) => {
                    let shown = self.devices.get(dev).map(|d| d.activity);
                    if matches!(shown, Some(DeviceActivity::Sending | DeviceActivity::Receiving)) {
                        let _ = self.devices.set_activity(dev, activity);
                    }
                    VizConnectionState::Active
                }
                None => {
                    self.devices.settle(dev);
                    self.resting_connection(dev)
                }
            };
            self.emit_device(now, dev);
            self.emit_connection(now, dev, connection);
        }
        if self.in_flight() == 0 && self.hub.activity == HubActivity::Processing {
            self.hub.activity = HubActivity::Ready;
            self.emit_hub(now);
        }
    }

    /// 设备在其他在途传输中应有的展示状态
    fn busy_activity(&self, dev: DeviceId) -> Option<DeviceActivity> {
        let mut activity = None;
        for t in self.transmissions.values().filter(|t| t.phase.is_in_flight()) {
            if t.sender == dev {
                return Some(DeviceActivity::Sending);
            }
            if t.receiver == dev && t.phase == TransmissionPhase::HubToReceiver {
                activity = Some(DeviceActivity::Receiving);
            }
        }
        activity
    }

    /// 记录进入终态并更新在途计数；返回 (发送方, 接收方, 批量运行)
    fn finish_record(
        &mut self,
        id: TransmissionId,
        phase: TransmissionPhase,
        now: SimTime,
    ) -> Option<(DeviceId, DeviceId, Option<u64>)> {
        let record = self.transmissions.get_mut(&id)?;
        if !record.phase.is_in_flight() {
            return None;
        }
        record.phase = phase;
        record.finished_at = Some(now);
        self.in_flight = self.in_flight.saturating_sub(1);
        Some((record.sender, record.receiver, record.bulk_run))
    }

    /// 只保留最近的 `FINISHED_RECORD_LIMIT` 条已结束记录
    fn prune_finished(&mut self) {
        let finished = self.transmissions.len().saturating_sub(self.in_flight);
        let excess = finished.saturating_sub(FINISHED_RECORD_LIMIT);
        if excess == 0 {
            return;
        }
        let stale = self
            .transmissions
            .values()
            .filter(|t| !t.phase.is_in_flight())
            .take(excess)
            .map(|t| t.id)
            .collect::<Vec<_>>();
        for id in stale {
            self.transmissions.remove(&id);
        }
        trace!(pruned = excess, "清理已结束的传输记录");
    }

    fn complete_transmission(&mut self, id: TransmissionId, sim: &mut Simulator) {
        let now = sim.now();
        let Some((sender, receiver, bulk_run)) =
            self.finish_record(id, TransmissionPhase::Completed, now)
        else {
            return;
        };

        self.settle_participants(id, now);
        self.stats.packets_sent += 1;
        info!(tx = id.0, packets_sent = self.stats.packets_sent, "✅ 传输完成");
        self.push_log(
            now,
            format!("Data successfully transmitted from {sender} to {receiver}"),
            Severity::Success,
        );

        let decay = SimTime::from_millis(self.cfg.timing.bandwidth_decay_ms);
        sim.schedule_in(
            decay,
            BandwidthDecay {
                devices: [sender, receiver],
                epoch: self.epoch,
            },
        );

        if let Some(run) = bulk_run {
            self.on_bulk_transmission_done(run, id, sim);
        }
        self.prune_finished();
    }

    fn abort_transmission(&mut self, id: TransmissionId, err: SessionError, sim: &mut Simulator) {
        let now = sim.now();
        let Some((sender, receiver, bulk_run)) =
            self.finish_record(id, TransmissionPhase::Aborted(err.kind()), now)
        else {
            return;
        };

        warn!(tx = id.0, error = %err, "传输中止");
        self.settle_participants(id, now);
        self.stats.transmissions_aborted += 1;
        self.push_log(
            now,
            format!("Transmission from {sender} to {receiver} aborted - {err}"),
            Severity::Error,
        );

        if let Some(run) = bulk_run {
            self.on_bulk_transmission_done(run, id, sim);
        }
        self.prune_finished();
    }
}

/// 事件：传输的当前阶段结束
#[derive(Debug)]
pub struct TransmissionStep {
    pub id: TransmissionId,
    pub epoch: u64,
}

impl Event for TransmissionStep {
    #[tracing::instrument(skip(self, sim, world), fields(tx = self.id.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let TransmissionStep { id, epoch } = *self;
        session_mut(world).on_transmission_step(id, epoch, sim);
    }
}

/// 事件：传输结束一段时间后两端带宽归零
#[derive(Debug)]
pub struct BandwidthDecay {
    pub devices: [DeviceId; 2],
    pub epoch: u64,
}

impl Event for BandwidthDecay {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let BandwidthDecay { devices, epoch } = *self;
        let s = session_mut(world);
        if s.epoch != epoch {
            return;
        }
        for id in devices {
            // 期间又开始了新的传输则保留占用
            let busy = s
                .devices
                .get(id)
                .is_some_and(|d| matches!(d.activity, DeviceActivity::Sending | DeviceActivity::Receiving));
            if !busy {
                let _ = s.devices.set_bandwidth(id, 0);
                s.emit_device(sim.now(), id);
            }
        }
    }
}
