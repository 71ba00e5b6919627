//! 中心集线器
//!
//! 星型拓扑的单点故障。健康度与状态必须一致：Failed ⇒ 0，Active ⇒ 100。

use serde::Serialize;
use tracing::{debug, info};

/// 集线器运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubStatus {
    #[default]
    Active,
    Failed,
    Recovering,
}

/// 集线器当前在做什么（纯展示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubActivity {
    #[default]
    Ready,
    Processing,
    Checking,
}

/// 恢复爬坡的一步结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryProgress {
    /// 仍在爬坡，附当前健康度
    Ramping(u8),
    Completed,
    /// 当前不处于 Recovering（例如爬坡途中再次故障）
    NotRecovering,
}

#[derive(Debug, Clone, Serialize)]
pub struct Hub {
    pub status: HubStatus,
    pub health: u8,
    pub activity: HubActivity,
}

impl Default for Hub {
    fn default() -> Self {
        Self {
            status: HubStatus::Active,
            health: 100,
            activity: HubActivity::Ready,
        }
    }
}

impl Hub {
    pub fn is_failed(&self) -> bool {
        self.status == HubStatus::Failed
    }

    pub fn is_active(&self) -> bool {
        self.status == HubStatus::Active
    }

    /// 进入故障；已故障时返回 false 且不做任何修改
    pub fn fail(&mut self) -> bool {
        if self.is_failed() {
            return false;
        }
        info!(from = ?self.status, "💥 集线器故障");
        self.status = HubStatus::Failed;
        self.health = 0;
        self.activity = HubActivity::Ready;
        true
    }

    /// 从故障进入恢复；只有 Failed 状态可以开始
    pub fn begin_recovery(&mut self) -> bool {
        if !self.is_failed() {
            return false;
        }
        debug!("开始恢复爬坡");
        self.status = HubStatus::Recovering;
        true
    }

    /// 健康度前进一步；到 100 时切换为 Active
    pub fn advance_recovery(&mut self, step: u8) -> RecoveryProgress {
        if self.status != HubStatus::Recovering {
            return RecoveryProgress::NotRecovering;
        }
        self.health = self.health.saturating_add(step.max(1)).min(100);
        if self.health == 100 {
            self.status = HubStatus::Active;
            info!("✅ 集线器恢复完成");
            RecoveryProgress::Completed
        } else {
            debug!(health = self.health, "恢复中");
            RecoveryProgress::Ramping(self.health)
        }
    }

    /// 指标面板上的状态文字
    pub fn status_label(&self) -> String {
        match self.status {
            HubStatus::Active => "Active".to_string(),
            HubStatus::Failed => "Failed".to_string(),
            HubStatus::Recovering => format!("Recovering ({}%)", self.health),
        }
    }

    /// 集线器下方的活动文字
    pub fn activity_label(&self) -> &'static str {
        match (self.status, self.activity) {
            (HubStatus::Failed, _) => "Offline",
            (HubStatus::Recovering, _) => "Recovering",
            (_, HubActivity::Ready) => "Ready",
            (_, HubActivity::Processing) => "Processing",
            (_, HubActivity::Checking) => "Hub Clicked",
        }
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        match self.status {
            HubStatus::Failed if self.health != 0 => {
                Err(format!("hub failed with health {}", self.health))
            }
            HubStatus::Active if self.health != 100 => {
                Err(format!("hub active with health {}", self.health))
            }
            _ if self.health > 100 => Err(format!("hub health {} out of range", self.health)),
            _ => Ok(()),
        }
    }

    /// 把健康度拉回与状态一致的值，展示回到 Ready
    pub fn normalize(&mut self) {
        match self.status {
            HubStatus::Failed => self.health = 0,
            HubStatus::Active => self.health = 100,
            HubStatus::Recovering => self.health = self.health.min(100),
        }
        self.activity = HubActivity::Ready;
    }
}
