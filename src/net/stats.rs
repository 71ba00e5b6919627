//! 统计信息
//!
//! 定义会话级计数器。

use serde::Serialize;

/// 会话统计信息
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// 成功完成的传输数
    pub packets_sent: u64,
    /// 冲突回合中撞车的报文数
    pub packets_collided: u64,
    /// 中途中止的传输数
    pub transmissions_aborted: u64,
}
