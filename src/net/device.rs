//! 终端设备
//!
//! 定义星型拓扑中的终端节点（PC）及其展示状态。

use super::id::DeviceId;
use serde::Serialize;
use std::fmt;

/// 设备当前的展示状态（视图层据此选择样式）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceActivity {
    #[default]
    Idle,
    Selected,
    Sending,
    Receiving,
}

/// 类 MAC 地址（6 字节）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// 设备的固定地址：`00:1A:2B:3C:4D:NN`
    ///
    /// 注册表最多 `MAX_DEVICES` 台设备，最后一个字节足以区分。
    pub fn for_device(id: DeviceId) -> Self {
        let last = u8::try_from(id.0).unwrap_or(u8::MAX);
        MacAddr([0x00, 0x1A, 0x2B, 0x3C, 0x4D, last])
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

/// 终端设备
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub mac: MacAddr,
    pub online: bool,
    /// 带宽占用百分比（0..=100）
    pub bandwidth_usage: u8,
    pub activity: DeviceActivity,
    /// 拥塞标记（设备及其到集线器的连线）
    pub congested: bool,
}

impl Device {
    /// 创建新设备（默认在线、空闲）
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            name: format!("PC{}", id.0),
            mac: MacAddr::for_device(id),
            online: true,
            bandwidth_usage: 0,
            activity: DeviceActivity::Idle,
            congested: false,
        }
    }

    /// 状态文字（与原界面一致）
    pub fn status_label(&self) -> &'static str {
        if !self.online {
            return "Offline";
        }
        match self.activity {
            DeviceActivity::Idle if self.congested => "Congested",
            DeviceActivity::Idle => "Online",
            DeviceActivity::Selected => "Selected",
            DeviceActivity::Sending => "Sending",
            DeviceActivity::Receiving => "Receiving",
        }
    }
}
