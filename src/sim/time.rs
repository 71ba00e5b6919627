//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。动画时长按毫秒给出（可带小数），内部统一用纳秒。

use serde::Serialize;
use std::fmt;

/// 仿真时间（纳秒）。序列化为纳秒整数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }

    /// 从浮点毫秒构造；负数与 NaN 视为 0。
    pub fn from_millis_f64(ms: f64) -> SimTime {
        if !ms.is_finite() || ms <= 0.0 {
            return SimTime::ZERO;
        }
        let ns = (ms * 1_000_000.0).round();
        if ns >= u64::MAX as f64 {
            SimTime(u64::MAX)
        } else {
            SimTime(ns as u64)
        }
    }

    pub fn as_millis(self) -> u64 {
        self.0 / 1_000_000
    }

    pub fn saturating_add(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(d.0))
    }

    pub fn saturating_sub(self, d: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(d.0))
    }
}

/// 以 `mm:ss.mmm` 显示（日志时间戳使用）。
impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.as_millis();
        let mins = total_ms / 60_000;
        let secs = (total_ms / 1_000) % 60;
        let ms = total_ms % 1_000;
        write!(f, "{mins:02}:{secs:02}.{ms:03}")
    }
}
