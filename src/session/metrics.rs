//! 指标聚合
//!
//! 从会话当前状态推导出指标面板上的数字；自身不保存任何状态。

use serde::Serialize;

use super::session::NetworkSession;
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub hub_status_label: String,
    pub latency_ms: f64,
    pub collision_rate_pct: f64,
    pub total_bandwidth_pct: f64,
    pub packets_sent: u64,
    pub packets_collided: u64,
    pub online_devices: usize,
    pub congested: bool,
    pub uptime_ms: u64,
}

impl MetricsSnapshot {
    /// 对会话状态取一次快照
    pub fn capture(session: &NetworkSession, now: SimTime) -> Self {
        let stats = session.stats();
        Self {
            hub_status_label: session.hub().status_label(),
            latency_ms: session.latency_ms(),
            collision_rate_pct: session.collision_rate_pct(),
            total_bandwidth_pct: session.devices().aggregate_bandwidth(),
            packets_sent: stats.packets_sent,
            packets_collided: stats.packets_collided,
            online_devices: session.devices().online_count(),
            congested: session.is_congested(),
            uptime_ms: now.saturating_sub(session.started_at()).as_millis(),
        }
    }

    /// 忽略运行时长比较，用来判断面板是否需要重绘
    pub fn same_readings(&self, other: &Self) -> bool {
        self.hub_status_label == other.hub_status_label
            && self.latency_ms == other.latency_ms
            && self.collision_rate_pct == other.collision_rate_pct
            && self.total_bandwidth_pct == other.total_bandwidth_pct
            && self.packets_sent == other.packets_sent
            && self.packets_collided == other.packets_collided
            && self.online_devices == other.online_devices
            && self.congested == other.congested
    }
}
