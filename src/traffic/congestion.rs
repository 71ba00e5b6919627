//! 拥塞与冲突回合
//!
//! 开启拥塞会抬高时延与冲突率、标记所有在线设备，并播放一段冲突演示：
//! 固定回合数，每回合两台在线设备同时向集线器发报文，互相撞车。

use rand::Rng;
use tracing::{debug, info};

use crate::session::{session_mut, NetworkSession, Severity};
use crate::sim::{Event, SimTime, Simulator, World};
use crate::viz::{VizConnectionState, VizEndpoint, VizPacketKind};

impl NetworkSession {
    /// 翻转拥塞标志，返回新的状态
    #[tracing::instrument(skip(self, sim), fields(congested = self.congested))]
    pub fn toggle_congestion(&mut self, sim: &mut Simulator) -> bool {
        let now = sim.now();
        self.congestion_epoch = self.congestion_epoch.wrapping_add(1);

        if self.congested {
            self.congested = false;
            self.latency_ms = self.rng.gen_range(0.0..=20.0);
            self.collision_rate_pct = 0.0;
            self.devices.mark_congested(false);
            info!("拥塞解除");
            self.push_log(now, "Network congestion cleared - normal operation resumed", Severity::Success);
            let ids = self.devices.ids().collect::<Vec<_>>();
            for id in ids {
                self.emit_device(now, id);
            }
            self.emit_resting_connections(now);
            return false;
        }

        self.congested = true;
        self.latency_ms = self.rng.gen_range(100.0..=300.0);
        self.collision_rate_pct = self.rng.gen_range(5.0..=20.0);
        let marked = self.devices.mark_congested(true);
        info!(latency_ms = self.latency_ms, collision_rate_pct = self.collision_rate_pct, "⚠️  网络拥塞");
        self.push_log(
            now,
            format!(
                "Network congestion detected - latency {:.0}ms, collision rate {:.1}%",
                self.latency_ms, self.collision_rate_pct
            ),
            Severity::Warning,
        );
        for id in marked {
            self.emit_device(now, id);
            self.emit_connection(now, id, VizConnectionState::Congested);
        }

        sim.schedule(
            now,
            CollisionRound {
                round: 0,
                epoch: self.epoch,
                congestion_epoch: self.congestion_epoch,
            },
        );
        true
    }

    fn on_collision_round(&mut self, round: u32, epoch: u64, congestion_epoch: u64, sim: &mut Simulator) {
        if epoch != self.epoch || congestion_epoch != self.congestion_epoch || !self.congested {
            return;
        }
        let now = sim.now();
        let online = self.devices.online_ids();

        if online.len() < 2 {
            self.push_log(
                now,
                "Collision round skipped - fewer than 2 online PCs",
                Severity::Warning,
            );
        } else {
            let n = online.len();
            let a = self.rng.gen_range(0..n);
            let mut b = self.rng.gen_range(0..n - 1);
            if b >= a {
                b += 1;
            }
            let (a, b) = (online[a], online[b]);
            let arrive = now.saturating_add(SimTime::from_millis_f64(self.hop_duration_ms()));
            for dev in [a, b] {
                self.emit_packet(
                    None,
                    VizEndpoint::Device(dev.0),
                    VizEndpoint::Hub,
                    now,
                    arrive,
                    VizPacketKind::Collision,
                    format!("PC{}", dev.0),
                );
            }
            self.stats.packets_collided += 2;
            let mac_a = self.devices.get(a).map(|d| d.mac.to_string()).unwrap_or_default();
            let mac_b = self.devices.get(b).map(|d| d.mac.to_string()).unwrap_or_default();
            debug!(round, a = %a, b = %b, collided = self.stats.packets_collided, "💥 冲突");
            self.push_log(
                now,
                format!("Collision detected between {mac_a} and {mac_b}"),
                Severity::Warning,
            );
        }

        let next = round + 1;
        if next < self.cfg.timing.collision_rounds {
            sim.schedule_in(
                SimTime::from_millis(self.cfg.timing.collision_gap_ms),
                CollisionRound {
                    round: next,
                    epoch,
                    congestion_epoch,
                },
            );
        }
    }
}

/// 事件：冲突演示的一个回合
#[derive(Debug)]
pub struct CollisionRound {
    pub round: u32,
    pub epoch: u64,
    pub congestion_epoch: u64,
}

impl Event for CollisionRound {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let CollisionRound {
            round,
            epoch,
            congestion_epoch,
        } = *self;
        session_mut(world).on_collision_round(round, epoch, congestion_epoch, sim);
    }
}
