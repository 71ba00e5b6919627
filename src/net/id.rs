//! 标识符类型
//!
//! 定义终端设备与传输的唯一标识符。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 终端设备标识符（从 1 开始，对应 `PC1`…`PCn`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub usize);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PC {}", self.0)
    }
}

/// 一次传输的标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransmissionId(pub u64);
