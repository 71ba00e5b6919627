use serde::Serialize;

use crate::net::{DeviceActivity, HubActivity, HubStatus};
use crate::session::{LogEntry, MetricsSnapshot};

/// 可视化事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 拓扑元信息（作为 t=0 的第一条事件）
    Meta { devices: Vec<VizDeviceInfo> },
    /// 设备上下线/活动/带宽变化
    DeviceState {
        device: usize,
        online: bool,
        activity: DeviceActivity,
        congested: bool,
        bandwidth_pct: u8,
    },
    /// 集线器状态或健康度变化
    HubState {
        status: HubStatus,
        health: u8,
        activity: HubActivity,
    },
    /// 设备到集线器的连线状态
    Connection {
        device: usize,
        state: VizConnectionState,
    },
    /// 一个报文动画：从 `from` 移动到 `to`
    PacketMove {
        from: VizEndpoint,
        to: VizEndpoint,
        depart_ns: u64,
        arrive_ns: u64,
        packet: VizPacketKind,
        label: String,
    },
    /// 指标面板快照（仅在变化时记录）
    Metrics(MetricsSnapshot),
    /// 活动日志新增条目
    Log(LogEntry),
}

/// 报文动画的起止点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VizEndpoint {
    Hub,
    Device(usize),
}

/// 报文的类别（便于可视化上色）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VizPacketKind {
    Data,
    Collision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VizConnectionState {
    Idle,
    Active,
    Offline,
    Congested,
}

#[derive(Debug, Clone, Serialize)]
pub struct VizDeviceInfo {
    pub id: usize,
    pub name: String,
    pub mac: String,
}

/// 一个可回放的事件（JSON）
#[derive(Debug, Clone, Serialize)]
pub struct VizEvent {
    /// 仿真时间（纳秒，和 `SimTime.0` 同口径）
    pub t_ns: u64,
    /// 关联的传输（若有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmission: Option<u64>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }

    pub fn count(&self, pred: impl Fn(&VizEventKind) -> bool) -> usize {
        self.events.iter().filter(|ev| pred(&ev.kind)).count()
    }
}
