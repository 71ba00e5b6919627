//! 星型网络模块
//!
//! 此模块包含星型拓扑的静态组成部分：终端设备、设备注册表、中心集线器与计数器。

// 子模块声明
mod id;
mod device;
mod registry;
mod hub;
mod stats;

// 重新导出公共接口
pub use id::{DeviceId, TransmissionId};
pub use device::{Device, DeviceActivity, MacAddr};
pub use registry::{DeviceRegistry, MAX_DEVICES};
pub use hub::{Hub, HubActivity, HubStatus, RecoveryProgress};
pub use stats::Stats;
