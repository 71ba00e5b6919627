//! Visualization hooks for the session.

use crate::net::{DeviceId, TransmissionId};
use crate::sim::SimTime;
use crate::viz::{
    VizConnectionState, VizDeviceInfo, VizEndpoint, VizEvent, VizEventKind, VizPacketKind,
};

use super::{LogEntry, MetricsSnapshot, NetworkSession};

impl NetworkSession {
    fn viz_push(&mut self, t: SimTime, transmission: Option<TransmissionId>, kind: VizEventKind) {
        if let Some(v) = &mut self.viz {
            v.push(VizEvent {
                t_ns: t.0,
                transmission: transmission.map(|id| id.0),
                kind,
            });
        }
    }

    pub fn emit_viz_meta(&mut self, now: SimTime) {
        if self.viz.is_none() {
            return;
        }
        let devices = self
            .devices
            .iter()
            .map(|d| VizDeviceInfo {
                id: d.id.0,
                name: d.name.clone(),
                mac: d.mac.to_string(),
            })
            .collect::<Vec<_>>();
        self.viz_push(now, None, VizEventKind::Meta { devices });
    }

    pub(crate) fn viz_log(&mut self, now: SimTime, entry: LogEntry) {
        self.viz_push(now, None, VizEventKind::Log(entry));
    }

    pub(crate) fn viz_metrics(&mut self, now: SimTime, snapshot: MetricsSnapshot) {
        self.viz_push(now, None, VizEventKind::Metrics(snapshot));
    }

    pub(crate) fn emit_device(&mut self, now: SimTime, id: DeviceId) {
        if self.viz.is_none() {
            return;
        }
        let Some(dev) = self.devices.get(id) else {
            return;
        };
        let kind = VizEventKind::DeviceState {
            device: id.0,
            online: dev.online,
            activity: dev.activity,
            congested: dev.congested,
            bandwidth_pct: dev.bandwidth_usage,
        };
        self.viz_push(now, None, kind);
    }

    pub(crate) fn emit_hub(&mut self, now: SimTime) {
        let kind = VizEventKind::HubState {
            status: self.hub.status,
            health: self.hub.health,
            activity: self.hub.activity,
        };
        self.viz_push(now, None, kind);
    }

    pub(crate) fn emit_connection(&mut self, now: SimTime, id: DeviceId, state: VizConnectionState) {
        self.viz_push(now, None, VizEventKind::Connection { device: id.0, state });
    }

    /// 所有连线回到静止状态（集线器故障时全部 Offline）
    pub(crate) fn emit_resting_connections(&mut self, now: SimTime) {
        if self.viz.is_none() {
            return;
        }
        let ids = self.devices.ids().collect::<Vec<_>>();
        for id in ids {
            self.emit_connection(now, id, self.resting_connection(id));
        }
    }

    /// 全量刷新：设备、集线器、连线
    pub(crate) fn emit_all(&mut self, now: SimTime) {
        if self.viz.is_none() {
            return;
        }
        let ids = self.devices.ids().collect::<Vec<_>>();
        for id in ids {
            self.emit_device(now, id);
        }
        self.emit_hub(now);
        self.emit_resting_connections(now);
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn emit_packet(
        &mut self,
        transmission: Option<TransmissionId>,
        from: VizEndpoint,
        to: VizEndpoint,
        depart: SimTime,
        arrive: SimTime,
        packet: VizPacketKind,
        label: String,
    ) {
        let kind = VizEventKind::PacketMove {
            from,
            to,
            depart_ns: depart.0,
            arrive_ns: arrive.0,
            packet,
            label,
        };
        self.viz_push(depart, transmission, kind);
    }
}
