//! Convenience builders for common instrument channel groups.
//!
//! These create the per-instrument channel entities an experiment
//! usually needs in one call (an AWG's quadrature pair and markers, a
//! digitizer's receiver channels) and keep handles to them for the
//! linking helpers in [`crate::factory`]. The instrument's own driver
//! settings stay local to the builder struct; only the channel
//! entities enter the library.

use serde_json::json;

use alsvid_model::{Entity, EntityId, EntityKind};

use crate::error::{LibError, LibResult};
use crate::library::ChannelLibrary;

/// AWG trigger source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    External,
    Internal,
}

/// An APS2-style AWG: one quadrature pair plus four marker outputs.
#[derive(Debug)]
pub struct Aps2 {
    /// Instrument label.
    pub label: String,
    /// The `<label>-12` quadrature channel entity.
    pub chan12: EntityId,
    /// The `<label>-12m1` .. `<label>-12m4` marker channel entities.
    pub markers: [EntityId; 4],
    /// Network address, if configured.
    pub address: Option<String>,
    /// Output delay in seconds.
    pub delay: f64,
    /// Trigger repetition interval, if internally triggered.
    pub trigger_interval: Option<f64>,
    /// Trigger source; flipped to `Internal` by `set_master`.
    pub trigger_source: TriggerSource,
    /// Whether this AWG is the master trigger source.
    pub master: bool,
}

impl Aps2 {
    /// Create the channel entities for an APS2 in the active workspace.
    pub fn new(lib: &mut ChannelLibrary, label: impl Into<String>) -> LibResult<Self> {
        let label = label.into();
        let ws = lib.workspace().id;

        let chan12 = lib.create(
            Entity::new(EntityKind::PhysicalQuadratureChannel, format!("{label}-12"), ws)
                .with_param("instrument", label.clone())
                .with_param("translator", "APS2Pattern"),
        )?;

        let mut markers = [EntityId(0); 4];
        for (i, marker) in markers.iter_mut().enumerate() {
            let entity = lib.create(
                Entity::new(
                    EntityKind::PhysicalMarkerChannel,
                    format!("{label}-12m{}", i + 1),
                    ws,
                )
                .with_param("instrument", label.clone())
                .with_param("translator", "APS2Pattern"),
            )?;
            *marker = entity.id;
        }

        Ok(Self {
            label,
            chan12: chan12.id,
            markers,
            address: None,
            delay: 0.0,
            trigger_interval: None,
            trigger_source: TriggerSource::External,
            master: false,
        })
    }

    /// Set the network address (builder style).
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// The 1-based marker channel `m<n>`.
    pub fn marker(&self, n: u8) -> LibResult<EntityId> {
        match n {
            1..=4 => Ok(self.markers[usize::from(n) - 1]),
            other => Err(LibError::MarkerOutOfRange(other)),
        }
    }
}

/// An X6-style digitizer: two receiver channels.
#[derive(Debug)]
pub struct X6 {
    /// Instrument label.
    pub label: String,
    /// The `RecvChan-<label>-1` and `RecvChan-<label>-2` entities.
    pub receivers: [EntityId; 2],
    /// Network address, if configured.
    pub address: Option<String>,
    /// Reference clock source.
    pub reference: String,
    /// Segment count per acquisition.
    pub nbr_segments: u32,
    /// Round-robin count per acquisition.
    pub nbr_round_robins: u32,
    /// Acquisition mode.
    pub acquire_mode: String,
}

impl X6 {
    /// Create the receiver channel entities for an X6 in the active
    /// workspace.
    pub fn new(lib: &mut ChannelLibrary, label: impl Into<String>) -> LibResult<Self> {
        let label = label.into();
        let ws = lib.workspace().id;

        let mut receivers = [EntityId(0); 2];
        for (i, receiver) in receivers.iter_mut().enumerate() {
            let entity = lib.create(
                Entity::new(
                    EntityKind::ReceiverChannel,
                    format!("RecvChan-{label}-{}", i + 1),
                    ws,
                )
                .with_param("channel", json!(i + 1)),
            )?;
            *receiver = entity.id;
        }

        Ok(Self {
            label,
            receivers,
            address: None,
            reference: "external".to_string(),
            nbr_segments: 1,
            nbr_round_robins: 100,
            acquire_mode: "digitizer".to_string(),
        })
    }

    /// The 1-based receiver channel.
    pub fn receiver(&self, n: u8) -> LibResult<EntityId> {
        match n {
            1..=2 => Ok(self.receivers[usize::from(n) - 1]),
            other => Err(LibError::ReceiverOutOfRange(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aps2_creates_channel_group() {
        let mut lib = ChannelLibrary::in_memory().unwrap();
        let awg = Aps2::new(&mut lib, "BBNAPS1").unwrap().with_address("192.168.5.20");

        let entities = lib.get_current_channels().unwrap();
        let labels: Vec<_> = entities.iter().map(|e| e.label.as_str()).collect();
        assert!(labels.contains(&"BBNAPS1-12"));
        assert!(labels.contains(&"BBNAPS1-12m1"));
        assert!(labels.contains(&"BBNAPS1-12m4"));
        assert_eq!(entities.len(), 5);

        let chan12 = lib.fetch(awg.chan12).unwrap();
        assert_eq!(chan12.kind, EntityKind::PhysicalQuadratureChannel);
        assert_eq!(chan12.params["translator"], "APS2Pattern");
        assert_eq!(chan12.params["instrument"], "BBNAPS1");

        assert_eq!(awg.trigger_source, TriggerSource::External);
        assert!(!awg.master);
        assert!(awg.marker(2).is_ok());
        assert!(matches!(awg.marker(5), Err(LibError::MarkerOutOfRange(5))));
    }

    #[test]
    fn test_x6_creates_receivers() {
        let mut lib = ChannelLibrary::in_memory().unwrap();
        let dig = X6::new(&mut lib, "X6-1").unwrap();

        let r1 = lib.fetch(dig.receiver(1).unwrap()).unwrap();
        assert_eq!(r1.kind, EntityKind::ReceiverChannel);
        assert_eq!(r1.label, "RecvChan-X6-1-1");
        assert_eq!(dig.reference, "external");
        assert_eq!(dig.nbr_round_robins, 100);
    }
}
