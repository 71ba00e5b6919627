//! 批量流量
//!
//! 串行循环而非调度器：每次随机挑一对在线设备发起传输，等它结束后再随机暂停，
//! 然后进入下一次。运行中的标志阻止重复启动；reset 通过 epoch 使整个循环失效。

use rand::Rng;
use tracing::{debug, info};

use crate::error::SessionError;
use crate::net::{DeviceId, TransmissionId};
use crate::session::{session_mut, NetworkSession, Severity};
use crate::sim::{Event, SimTime, Simulator, World};

/// 一次批量流量运行的状态
#[derive(Debug, Clone)]
pub struct BulkRun {
    pub id: u64,
    /// 启动时的在线设备快照
    pub pool: Vec<DeviceId>,
    pub total: usize,
    pub remaining: usize,
    /// 当前正在等待结束的传输
    pub waiting_on: Option<TransmissionId>,
    pub(crate) epoch: u64,
}

impl NetworkSession {
    /// 启动批量流量：`min(8, 2 × 在线数)` 次随机传输
    #[tracing::instrument(skip(self, sim))]
    pub fn run_bulk_traffic(&mut self, sim: &mut Simulator) -> Result<u64, SessionError> {
        let now = sim.now();
        if self.bulk.is_some() {
            return self.reject(now, SessionError::AlreadyRunning);
        }
        let pool = self.devices.online_ids();
        if pool.len() < 2 {
            return self.reject(
                now,
                SessionError::InsufficientOnlineDevices { online: pool.len() },
            );
        }

        let total = self
            .cfg
            .timing
            .bulk_max_transmissions
            .min(pool.len().saturating_mul(2));
        let id = self.next_bulk_run;
        self.next_bulk_run = self.next_bulk_run.wrapping_add(1);
        info!(run = id, total, online = pool.len(), "🚀 批量流量开始");
        self.bulk = Some(BulkRun {
            id,
            pool,
            total,
            remaining: total,
            waiting_on: None,
            epoch: self.epoch,
        });
        self.push_log(now, "Starting automated network traffic simulation", Severity::Info);
        sim.schedule(now, BulkStep { run: id, epoch: self.epoch });
        Ok(id)
    }

    fn on_bulk_step(&mut self, run: u64, epoch: u64, sim: &mut Simulator) {
        if epoch != self.epoch {
            return;
        }
        let Some(bulk) = self.bulk.as_mut() else {
            return;
        };
        if bulk.id != run {
            return;
        }
        let now = sim.now();

        if bulk.remaining == 0 {
            info!(run, total = bulk.total, "批量流量结束");
            self.bulk = None;
            self.push_log(now, "Network traffic simulation completed", Severity::Success);
            return;
        }
        bulk.remaining -= 1;

        // 接收方从除发送方以外的设备里抽取，等价于“重抽直到不同”
        let n = bulk.pool.len();
        let s = self.rng.gen_range(0..n);
        let mut r = self.rng.gen_range(0..n - 1);
        if r >= s {
            r += 1;
        }
        let (sender, receiver) = (bulk.pool[s], bulk.pool[r]);
        debug!(run, sender = %sender, receiver = %receiver, remaining = bulk.remaining, "批量流量：挑选设备对");

        if self.devices.is_online(sender) && self.devices.is_online(receiver) {
            match self.start_transmission(sender, receiver, Some(run), sim) {
                Ok(tx) => {
                    if let Some(bulk) = self.bulk.as_mut() {
                        bulk.waiting_on = Some(tx);
                    }
                    return;
                }
                Err(e) => debug!(error = %e, "批量流量：本次传输未能开始"),
            }
        } else {
            debug!("批量流量：设备已离线，跳过本次");
        }
        self.schedule_bulk_pause(run, sim);
    }

    /// 传输结束（完成或中止）后继续批量循环
    pub(crate) fn on_bulk_transmission_done(&mut self, run: u64, tx: TransmissionId, sim: &mut Simulator) {
        let Some(bulk) = self.bulk.as_mut() else {
            return;
        };
        if bulk.id != run || bulk.waiting_on != Some(tx) {
            return;
        }
        bulk.waiting_on = None;
        self.schedule_bulk_pause(run, sim);
    }

    fn schedule_bulk_pause(&mut self, run: u64, sim: &mut Simulator) {
        let timing = &self.cfg.timing;
        let (lo, hi) = (timing.bulk_pause_min_ms, timing.bulk_pause_max_ms.max(timing.bulk_pause_min_ms));
        let pause = SimTime::from_millis(self.rng.gen_range(lo..=hi));
        sim.schedule_in(pause, BulkStep { run, epoch: self.epoch });
    }
}

/// 事件：批量循环的下一次迭代
#[derive(Debug)]
pub struct BulkStep {
    pub run: u64,
    pub epoch: u64,
}

impl Event for BulkStep {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let BulkStep { run, epoch } = *self;
        session_mut(world).on_bulk_step(run, epoch, sim);
    }
}
