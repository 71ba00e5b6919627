//! 会话错误类型
//!
//! 所有错误都是非致命的：操作返回 `Err` 的同时会话会写一条 `error` 日志，状态保持不变。

use crate::net::DeviceId;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("hub is down - network unreachable")]
    HubUnreachable,

    #[error("{0} is offline")]
    DeviceOffline(DeviceId),

    #[error("network traffic simulation already in progress")]
    AlreadyRunning,

    #[error("need at least 2 online PCs, only {online} online")]
    InsufficientOnlineDevices { online: usize },

    #[error("{0} cannot transmit to itself")]
    SelfTransmission(DeviceId),

    #[error("unknown device {0}")]
    UnknownDevice(DeviceId),

    #[error("speed {0} out of range 1..=5")]
    InvalidSpeed(u8),

    #[error("failed to export network log: {0}")]
    ExportFailure(#[from] io::Error),

    #[error("inconsistent session state: {0}")]
    Inconsistent(String),
}

impl SessionError {
    /// 传输中途中止时用于比较结果（io::Error 不可比较，只比较种类）
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::HubUnreachable => SessionErrorKind::HubUnreachable,
            SessionError::DeviceOffline(_) => SessionErrorKind::DeviceOffline,
            SessionError::AlreadyRunning => SessionErrorKind::AlreadyRunning,
            SessionError::InsufficientOnlineDevices { .. } => {
                SessionErrorKind::InsufficientOnlineDevices
            }
            SessionError::SelfTransmission(_) => SessionErrorKind::SelfTransmission,
            SessionError::UnknownDevice(_) => SessionErrorKind::UnknownDevice,
            SessionError::InvalidSpeed(_) => SessionErrorKind::InvalidSpeed,
            SessionError::ExportFailure(_) => SessionErrorKind::ExportFailure,
            SessionError::Inconsistent(_) => SessionErrorKind::Inconsistent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionErrorKind {
    HubUnreachable,
    DeviceOffline,
    AlreadyRunning,
    InsufficientOnlineDevices,
    SelfTransmission,
    UnknownDevice,
    InvalidSpeed,
    ExportFailure,
    Inconsistent,
}
