//! 设备注册表
//!
//! 持有固定的一组终端设备：上下线标志与带宽占用。会话创建时建立，之后只改不删。

use super::device::{Device, DeviceActivity};
use super::id::DeviceId;
use crate::error::SessionError;
use tracing::{debug, trace};

/// 设备注册表
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

/// 设备数上限：MAC 地址只用最后一个字节区分设备
pub const MAX_DEVICES: usize = 255;

impl DeviceRegistry {
    /// 创建 `count` 台设备（最多 `MAX_DEVICES`），全部在线（`PC1`…`PCcount`）
    pub fn new(count: usize) -> Self {
        Self {
            devices: (1..=count.min(MAX_DEVICES))
                .map(|n| Device::new(DeviceId(n)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.devices.iter().map(|d| d.id)
    }

    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        id.0.checked_sub(1).and_then(|idx| self.devices.get(idx))
    }

    fn get_mut(&mut self, id: DeviceId) -> Option<&mut Device> {
        id.0.checked_sub(1).and_then(|idx| self.devices.get_mut(idx))
    }

    /// 获取设备；未知 id 返回 `UnknownDevice`
    pub fn device(&self, id: DeviceId) -> Result<&Device, SessionError> {
        self.get(id).ok_or(SessionError::UnknownDevice(id))
    }

    fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, SessionError> {
        self.get_mut(id).ok_or(SessionError::UnknownDevice(id))
    }

    /// 设置上下线。下线时带宽清零、展示状态回到空闲。
    ///
    /// 返回值表示状态是否真的发生了变化。
    pub fn set_power(&mut self, id: DeviceId, online: bool) -> Result<bool, SessionError> {
        let dev = self.device_mut(id)?;
        let changed = dev.online != online;
        dev.online = online;
        if !online {
            dev.bandwidth_usage = 0;
            dev.activity = DeviceActivity::Idle;
            dev.congested = false;
        }
        debug!(device = %id, online, changed, "设置设备电源");
        Ok(changed)
    }

    /// 未知设备视为离线
    pub fn is_online(&self, id: DeviceId) -> bool {
        self.get(id).is_some_and(|d| d.online)
    }

    /// 记录带宽占用（截断到 0..=100）
    pub fn set_bandwidth(&mut self, id: DeviceId, pct: u8) -> Result<(), SessionError> {
        let dev = self.device_mut(id)?;
        dev.bandwidth_usage = pct.min(100);
        trace!(device = %id, pct = dev.bandwidth_usage, "更新带宽占用");
        Ok(())
    }

    pub fn set_activity(&mut self, id: DeviceId, activity: DeviceActivity) -> Result<(), SessionError> {
        self.device_mut(id)?.activity = activity;
        Ok(())
    }

    /// 所有设备（含离线设备，按 0 计）的平均带宽占用
    pub fn aggregate_bandwidth(&self) -> f64 {
        if self.devices.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.devices.iter().map(|d| d.bandwidth_usage as u64).sum();
        sum as f64 / self.devices.len() as f64
    }

    /// 拥塞开启时标记所有在线设备；关闭时全部清除
    pub fn mark_congested(&mut self, on: bool) -> Vec<DeviceId> {
        let mut marked = Vec::new();
        for dev in &mut self.devices {
            dev.congested = on && dev.online;
            if dev.congested {
                marked.push(dev.id);
            }
        }
        marked
    }

    pub fn online_count(&self) -> usize {
        self.devices.iter().filter(|d| d.online).count()
    }

    pub fn online_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().filter(|d| d.online).map(|d| d.id).collect()
    }

    /// 所有设备回到空闲、带宽归零、拥塞标记清除；上下线状态保持不变
    pub fn clear_activity(&mut self) {
        for dev in &mut self.devices {
            dev.activity = DeviceActivity::Idle;
            dev.bandwidth_usage = 0;
            dev.congested = false;
        }
    }

    /// 传输结束后按当前上下线状态恢复展示（离线设备保持空闲）
    pub fn settle(&mut self, id: DeviceId) {
        if let Some(dev) = self.get_mut(id) {
            if matches!(dev.activity, DeviceActivity::Sending | DeviceActivity::Receiving) {
                dev.activity = DeviceActivity::Idle;
            }
        }
    }
}
