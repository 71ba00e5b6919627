//! 环境抖动
//!
//! 周期 tick：未拥塞且集线器正常时，在很小的范围内重新采样时延与冲突率。

use rand::Rng;
use tracing::trace;

use crate::session::{session_mut, NetworkSession};
use crate::sim::{Event, Simulator, World};

/// 环境时延上限（毫秒）
pub const AMBIENT_MAX_LATENCY_MS: f64 = 20.0;
/// 环境冲突率上限（百分比）
pub const AMBIENT_MAX_COLLISION_PCT: f64 = 2.0;

impl NetworkSession {
    /// 启动环境 tick（已启动则什么也不做）
    pub fn start_ambient(&mut self, sim: &mut Simulator) {
        if self.ambient_timer.is_some() {
            return;
        }
        let timer = sim.schedule_in(self.cfg.timing.ambient_tick(), AmbientTick);
        self.ambient_timer = Some(timer);
    }

    /// 停止环境 tick，之后 `Simulator::run` 可以正常结束
    pub fn stop_ambient(&mut self, sim: &mut Simulator) -> bool {
        match self.ambient_timer.take() {
            Some(timer) => sim.cancel(timer),
            None => false,
        }
    }

    fn on_ambient_tick(&mut self, sim: &mut Simulator) {
        self.ambient_timer = None;
        if !self.congested && self.hub.is_active() {
            self.latency_ms = self.rng.gen_range(0.0..=AMBIENT_MAX_LATENCY_MS);
            self.collision_rate_pct = self.rng.gen_range(0.0..=AMBIENT_MAX_COLLISION_PCT);
            trace!(latency_ms = self.latency_ms, collision_rate_pct = self.collision_rate_pct, "环境抖动");
        }
        self.start_ambient(sim);
    }
}

/// 事件：环境抖动 tick
#[derive(Debug)]
pub struct AmbientTick;

impl Event for AmbientTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        session_mut(world).on_ambient_tick(sim);
    }
}
