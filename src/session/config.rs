//! 会话配置
//!
//! 可从 JSON 读取；缺省字段取默认值。所有时长单位为毫秒。

use serde::{Deserialize, Serialize};

use crate::net::MAX_DEVICES;
use crate::sim::SimTime;

/// 动画/定时参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    /// 恢复爬坡每步增加的健康度
    pub recovery_step_pct: u8,
    /// 恢复爬坡的 tick 间隔
    pub recovery_tick_ms: u64,
    /// 环境抖动 tick 间隔
    pub ambient_tick_ms: u64,
    /// 传输完成后带宽归零的延迟
    pub bandwidth_decay_ms: u64,
    /// 冲突回合数
    pub collision_rounds: u32,
    /// 冲突回合之间的间隔
    pub collision_gap_ms: u64,
    /// 批量流量两次传输之间的随机暂停
    pub bulk_pause_min_ms: u64,
    pub bulk_pause_max_ms: u64,
    /// 批量流量最多发起的传输数
    pub bulk_max_transmissions: usize,
    /// 点击集线器后恢复 Ready 的延迟
    pub hub_check_restore_ms: u64,
    /// 特性演示各条日志的间隔
    pub demo_step_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            recovery_step_pct: 10,
            recovery_tick_ms: 200,
            ambient_tick_ms: 1_000,
            bandwidth_decay_ms: 2_000,
            collision_rounds: 3,
            collision_gap_ms: 500,
            bulk_pause_min_ms: 1_000,
            bulk_pause_max_ms: 3_000,
            bulk_max_transmissions: 8,
            hub_check_restore_ms: 2_000,
            demo_step_ms: 1_000,
        }
    }
}

impl TimingConfig {
    /// 恢复爬坡间隔，至少 1ms
    pub fn recovery_tick(&self) -> SimTime {
        SimTime::from_millis(self.recovery_tick_ms.max(MIN_TICK_MS))
    }

    /// 环境抖动间隔，至少 1ms
    pub fn ambient_tick(&self) -> SimTime {
        SimTime::from_millis(self.ambient_tick_ms.max(MIN_TICK_MS))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, ms) in [
            ("recovery_tick_ms", self.recovery_tick_ms),
            ("ambient_tick_ms", self.ambient_tick_ms),
        ] {
            if ms < MIN_TICK_MS {
                return Err(ConfigError::ZeroInterval(field));
            }
        }
        if self.recovery_step_pct == 0 || self.recovery_step_pct > 100 {
            return Err(ConfigError::RecoveryStep(self.recovery_step_pct));
        }
        if self.bulk_pause_min_ms > self.bulk_pause_max_ms {
            return Err(ConfigError::BulkPauseRange {
                min: self.bulk_pause_min_ms,
                max: self.bulk_pause_max_ms,
            });
        }
        Ok(())
    }
}

/// 自我调度的 tick 的最小间隔；为 0 会在同一时刻无限重排
pub const MIN_TICK_MS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("timing.{0} must be at least {MIN_TICK_MS}ms")]
    ZeroInterval(&'static str),
    #[error("timing.recovery_step_pct {0} out of range 1..=100")]
    RecoveryStep(u8),
    #[error("timing.bulk_pause_min_ms {min} exceeds bulk_pause_max_ms {max}")]
    BulkPauseRange { min: u64, max: u64 },
    #[error("devices {0} out of range 1..={MAX_DEVICES}")]
    DeviceCount(usize),
    #[error("speed {0} out of range 1..=5")]
    Speed(u8),
}

/// 会话配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// 终端设备数量
    pub devices: usize,
    /// 动画速度 1..=5
    pub speed: u8,
    /// 随机数种子（同一种子可复现整个会话）
    pub seed: u64,
    /// 活动日志最多保留的条目数
    pub log_capacity: usize,
    /// 是否启动环境抖动 tick
    pub ambient_jitter: bool,
    pub timing: TimingConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            devices: 6,
            speed: 3,
            seed: 42,
            log_capacity: 50,
            ambient_jitter: true,
            timing: TimingConfig::default(),
        }
    }
}

impl SessionConfig {
    /// 解析并校验
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices == 0 || self.devices > MAX_DEVICES {
            return Err(ConfigError::DeviceCount(self.devices));
        }
        if !(1..=5).contains(&self.speed) {
            return Err(ConfigError::Speed(self.speed));
        }
        self.timing.validate()
    }
}
