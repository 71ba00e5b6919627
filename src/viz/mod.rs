//! 可视化事件记录（供视图层渲染或离线回放）
//!
//! 设计目标：
//! - **结构化**：视图层消费 JSON 事件，而不是解析日志文字
//! - **轻量**：只记录状态变化与报文动画的起止时间
//! - **可回放**：按 `t_ns` 排序即可驱动动画

mod types;

pub use types::{
    VizConnectionState, VizDeviceInfo, VizEndpoint, VizEvent, VizEventKind, VizLogger,
    VizPacketKind,
};
