//! 流量编排模块
//!
//! 传输时序器、批量流量、拥塞/冲突演示与环境抖动。全部以 `NetworkSession` 的方法
//! 加上各自的调度事件实现。

mod ambient;
mod bulk;
mod congestion;
mod transmission;

pub use ambient::{AmbientTick, AMBIENT_MAX_COLLISION_PCT, AMBIENT_MAX_LATENCY_MS};
pub use bulk::{BulkRun, BulkStep};
pub use congestion::CollisionRound;
pub use transmission::{
    base_duration, hub_processing_delay, BandwidthDecay, TransmissionPhase, TransmissionRecord,
    TransmissionStep, BASE_HOP_MS, CONGESTION_FACTOR, FINISHED_RECORD_LIMIT, MIN_HOP_MS,
    MIN_HUB_PROCESSING_MS,
};
