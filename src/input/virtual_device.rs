//! Virtual input device: named logical slots multiplexing physical sources.
//!
//! Client code binds application-defined button/axis slots to one or more
//! physical device controls, then queries the slots without caring which
//! device is live. Buttons OR across binds; axes sum their scaled values
//! and clamp to [-1, 1]. Unbound slots read as the neutral default.

use std::sync::Arc;

use crate::error::{Result, UiError};

use super::device::{DeviceId, InputSource, Modifiers};

/// Which half of a device a physical control lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Button,
    Axis,
}

/// Identity of one physical control, used for exclusive arbitration and
/// on-screen prompt rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalControl {
    pub device: DeviceId,
    pub kind: ControlKind,
    pub index: u16,
}

impl PhysicalControl {
    pub fn button(device: DeviceId, index: u16) -> Self {
        Self {
            device,
            kind: ControlKind::Button,
            index,
        }
    }

    pub fn axis(device: DeviceId, index: u16) -> Self {
        Self {
            device,
            kind: ControlKind::Axis,
            index,
        }
    }
}

enum BindKind {
    Button {
        button: u16,
        chord: Option<u16>,
        modifiers: Option<Modifiers>,
    },
    Axis {
        axis: u16,
        scale: f32,
    },
    /// Axis emulated by a button pair.
    AxisButtons {
        negative: u16,
        positive: u16,
    },
}

/// One mapping from a virtual slot to a physical device source.
pub struct Bind {
    source: Arc<dyn InputSource>,
    kind: BindKind,
}

impl Bind {
    fn modifiers_pass(&self) -> bool {
        match &self.kind {
            BindKind::Button {
                modifiers: Some(required),
                ..
            } => self.source.modifiers() == *required,
            _ => true,
        }
    }

    fn held(&self) -> bool {
        if !self.modifiers_pass() {
            return false;
        }
        match &self.kind {
            BindKind::Button { button, chord, .. } => {
                self.source.button_held(*button)
                    && chord.map(|c| self.source.button_held(c)).unwrap_or(true)
            }
            _ => false,
        }
    }

    fn pressed(&self) -> bool {
        if !self.modifiers_pass() {
            return false;
        }
        match &self.kind {
            BindKind::Button { button, chord, .. } => match chord {
                None => self.source.button_pressed(*button),
                // A chord fires when its last component goes down.
                Some(c) => {
                    (self.source.button_pressed(*button) && self.source.button_held(*c))
                        || (self.source.button_pressed(*c) && self.source.button_held(*button))
                }
            },
            _ => false,
        }
    }

    fn released(&self) -> bool {
        match &self.kind {
            BindKind::Button { button, chord, .. } => match chord {
                None => self.source.button_released(*button),
                Some(c) => {
                    let b_rel = self.source.button_released(*button);
                    let c_rel = self.source.button_released(*c);
                    (b_rel && (self.source.button_held(*c) || c_rel))
                        || (c_rel && self.source.button_held(*button))
                }
            },
            _ => false,
        }
    }

    fn value(&self) -> f32 {
        match &self.kind {
            BindKind::Axis { axis, scale } => self.source.axis(*axis) * scale,
            BindKind::AxisButtons { negative, positive } => {
                let mut value = 0.0;
                if self.source.button_held(*positive) {
                    value += 1.0;
                }
                if self.source.button_held(*negative) {
                    value -= 1.0;
                }
                value
            }
            BindKind::Button { .. } => 0.0,
        }
    }

    fn physical_controls(&self) -> Vec<PhysicalControl> {
        let device = self.source.id();
        match &self.kind {
            BindKind::Button { button, chord, .. } => {
                let mut controls = vec![PhysicalControl::button(device, *button)];
                if let Some(c) = chord {
                    controls.push(PhysicalControl::button(device, *c));
                }
                controls
            }
            BindKind::Axis { axis, .. } => vec![PhysicalControl::axis(device, *axis)],
            BindKind::AxisButtons { negative, positive } => vec![
                PhysicalControl::button(device, *negative),
                PhysicalControl::button(device, *positive),
            ],
        }
    }
}

/// Queryable state of the virtual slots for one frame, handed to the nodes
/// selected by the gamepad-priority pass.
#[derive(Debug, Clone, Default)]
pub struct VirtualFrame {
    pressed: Vec<bool>,
    released: Vec<bool>,
    held: Vec<bool>,
    axes: Vec<f32>,
}

impl VirtualFrame {
    pub fn pressed(&self, slot: usize) -> bool {
        self.pressed.get(slot).copied().unwrap_or(false)
    }

    pub fn released(&self, slot: usize) -> bool {
        self.released.get(slot).copied().unwrap_or(false)
    }

    pub fn held(&self, slot: usize) -> bool {
        self.held.get(slot).copied().unwrap_or(false)
    }

    pub fn axis(&self, slot: usize) -> f32 {
        self.axes.get(slot).copied().unwrap_or(0.0)
    }
}

/// Logical device with a fixed number of button and axis slots.
pub struct VirtualDevice {
    buttons: Vec<Vec<Bind>>,
    axes: Vec<Vec<Bind>>,
}

impl VirtualDevice {
    pub fn new(button_slots: usize, axis_slots: usize) -> Self {
        Self {
            buttons: (0..button_slots).map(|_| Vec::new()).collect(),
            axes: (0..axis_slots).map(|_| Vec::new()).collect(),
        }
    }

    fn button_slot(&mut self, slot: usize) -> Result<&mut Vec<Bind>> {
        let capacity = self.buttons.len();
        self.buttons.get_mut(slot).ok_or(UiError::SlotOutOfRange {
            kind: "button",
            slot,
            capacity,
        })
    }

    fn axis_slot(&mut self, slot: usize) -> Result<&mut Vec<Bind>> {
        let capacity = self.axes.len();
        self.axes.get_mut(slot).ok_or(UiError::SlotOutOfRange {
            kind: "axis",
            slot,
            capacity,
        })
    }

    pub fn bind_button(
        &mut self,
        slot: usize,
        source: Arc<dyn InputSource>,
        button: u16,
        modifiers: Option<Modifiers>,
    ) -> Result<()> {
        self.button_slot(slot)?.push(Bind {
            source,
            kind: BindKind::Button {
                button,
                chord: None,
                modifiers,
            },
        });
        Ok(())
    }

    /// Bind a two-button chord; both buttons must be down.
    pub fn bind_button_chord(
        &mut self,
        slot: usize,
        source: Arc<dyn InputSource>,
        btn0: u16,
        btn1: u16,
    ) -> Result<()> {
        self.button_slot(slot)?.push(Bind {
            source,
            kind: BindKind::Button {
                button: btn0,
                chord: Some(btn1),
                modifiers: None,
            },
        });
        Ok(())
    }

    pub fn bind_axis(
        &mut self,
        slot: usize,
        source: Arc<dyn InputSource>,
        axis: u16,
        scale: f32,
    ) -> Result<()> {
        self.axis_slot(slot)?.push(Bind {
            source,
            kind: BindKind::Axis { axis, scale },
        });
        Ok(())
    }

    /// Bind an axis slot to a negative/positive button pair.
    pub fn bind_axis_button(
        &mut self,
        slot: usize,
        source: Arc<dyn InputSource>,
        negative: u16,
        positive: u16,
    ) -> Result<()> {
        self.axis_slot(slot)?.push(Bind {
            source,
            kind: BindKind::AxisButtons { negative, positive },
        });
        Ok(())
    }

    /// Drop all binds for a button slot. No-op when already unbound or out
    /// of range.
    pub fn unbind_button(&mut self, slot: usize) {
        if let Some(binds) = self.buttons.get_mut(slot) {
            binds.clear();
        }
    }

    /// Drop all binds for an axis slot. No-op when already unbound or out
    /// of range.
    pub fn unbind_axis(&mut self, slot: usize) {
        if let Some(binds) = self.axes.get_mut(slot) {
            binds.clear();
        }
    }

    /// Drop every bind on every slot. Idempotent.
    pub fn clear_bindings(&mut self) {
        for binds in self.buttons.iter_mut().chain(self.axes.iter_mut()) {
            binds.clear();
        }
    }

    pub fn button_slots(&self) -> usize {
        self.buttons.len()
    }

    pub fn axis_slots(&self) -> usize {
        self.axes.len()
    }

    /// Button slot went down this frame. Unbound slots read false.
    pub fn pressed(&self, slot: usize) -> bool {
        self.buttons
            .get(slot)
            .map(|binds| binds.iter().any(Bind::pressed))
            .unwrap_or(false)
    }

    pub fn released(&self, slot: usize) -> bool {
        self.buttons
            .get(slot)
            .map(|binds| binds.iter().any(Bind::released))
            .unwrap_or(false)
    }

    pub fn held(&self, slot: usize) -> bool {
        self.buttons
            .get(slot)
            .map(|binds| binds.iter().any(Bind::held))
            .unwrap_or(false)
    }

    /// Scale-weighted sum of the slot's binds, clamped to [-1, 1].
    /// Unbound slots read 0.0.
    pub fn axis_value(&self, slot: usize) -> f32 {
        self.axes
            .get(slot)
            .map(|binds| binds.iter().map(Bind::value).sum::<f32>())
            .unwrap_or(0.0)
            .clamp(-1.0, 1.0)
    }

    /// Physical controls currently backing a button slot.
    pub fn button_controls(&self, slot: usize) -> Vec<PhysicalControl> {
        self.buttons
            .get(slot)
            .map(|binds| binds.iter().flat_map(Bind::physical_controls).collect())
            .unwrap_or_default()
    }

    /// Physical controls currently backing an axis slot.
    pub fn axis_controls(&self, slot: usize) -> Vec<PhysicalControl> {
        self.axes
            .get(slot)
            .map(|binds| binds.iter().flat_map(Bind::physical_controls).collect())
            .unwrap_or_default()
    }

    /// Capture every slot for delivery to gamepad-priority targets.
    pub fn snapshot(&self) -> VirtualFrame {
        VirtualFrame {
            pressed: (0..self.buttons.len()).map(|s| self.pressed(s)).collect(),
            released: (0..self.buttons.len()).map(|s| self.released(s)).collect(),
            held: (0..self.buttons.len()).map(|s| self.held(s)).collect(),
            axes: (0..self.axes.len()).map(|s| self.axis_value(s)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::device::DeviceSnapshot;

    const JUMP: usize = 0;
    const MOVE_X: usize = 0;

    fn shared(device: DeviceSnapshot) -> Arc<DeviceSnapshot> {
        Arc::new(device)
    }

    #[test]
    fn unbound_slot_reads_neutral_defaults() {
        let device = VirtualDevice::new(4, 2);
        assert!(!device.pressed(JUMP));
        assert!(!device.held(JUMP));
        assert_eq!(device.axis_value(MOVE_X), 0.0);
    }

    #[test]
    fn out_of_range_bind_is_an_error() {
        let mut virt = VirtualDevice::new(2, 1);
        let pad = shared(DeviceSnapshot::new(1));
        let err = virt.bind_button(5, pad, 0, None).unwrap_err();
        assert!(matches!(
            err,
            UiError::SlotOutOfRange {
                kind: "button",
                slot: 5,
                capacity: 2
            }
        ));
    }

    #[test]
    fn buttons_or_across_devices() {
        let mut pad = DeviceSnapshot::new(1);
        pad.press(0);
        let keyboard = DeviceSnapshot::new(2);

        let mut virt = VirtualDevice::new(1, 0);
        virt.bind_button(JUMP, shared(keyboard), 44, None).unwrap();
        virt.bind_button(JUMP, shared(pad), 0, None).unwrap();

        assert!(virt.pressed(JUMP));
        assert!(virt.held(JUMP));
    }

    #[test]
    fn chord_requires_both_buttons() {
        let mut pad = DeviceSnapshot::new(1);
        pad.press(0);
        let mut virt = VirtualDevice::new(1, 0);
        virt.bind_button_chord(JUMP, shared(pad.clone()), 0, 1)
            .unwrap();
        assert!(!virt.held(JUMP));

        pad.begin_frame();
        pad.press(1);
        let mut virt = VirtualDevice::new(1, 0);
        virt.bind_button_chord(JUMP, shared(pad), 0, 1).unwrap();
        assert!(virt.held(JUMP));
        assert!(virt.pressed(JUMP));
    }

    #[test]
    fn modifier_filter_gates_button() {
        let mut pad = DeviceSnapshot::new(1);
        pad.press(0);
        let mut virt = VirtualDevice::new(1, 0);
        virt.bind_button(JUMP, shared(pad), 0, Some(Modifiers::shift()))
            .unwrap();
        assert!(!virt.pressed(JUMP));
    }

    #[test]
    fn axis_sum_is_scaled_and_clamped() {
        let mut pad = DeviceSnapshot::new(1);
        pad.set_axis(0, 0.8);
        pad.set_axis(1, 0.9);
        let pad = shared(pad);

        let mut virt = VirtualDevice::new(0, 1);
        virt.bind_axis(MOVE_X, pad.clone(), 0, 1.0).unwrap();
        virt.bind_axis(MOVE_X, pad, 1, 1.0).unwrap();
        assert_eq!(virt.axis_value(MOVE_X), 1.0);
    }

    #[test]
    fn axis_button_pair_drives_axis() {
        let mut pad = DeviceSnapshot::new(1);
        pad.press(2);
        let mut virt = VirtualDevice::new(0, 1);
        virt.bind_axis_button(MOVE_X, shared(pad), 3, 2).unwrap();
        assert_eq!(virt.axis_value(MOVE_X), 1.0);
    }

    #[test]
    fn clear_bindings_twice_is_harmless() {
        let mut virt = VirtualDevice::new(1, 1);
        let pad = shared(DeviceSnapshot::new(1));
        virt.bind_button(JUMP, pad, 0, None).unwrap();
        virt.clear_bindings();
        virt.clear_bindings();
        assert!(!virt.pressed(JUMP));
        assert!(virt.button_controls(JUMP).is_empty());
    }

    #[test]
    fn controls_report_backing_hardware() {
        let mut virt = VirtualDevice::new(1, 0);
        let pad = shared(DeviceSnapshot::new(7));
        virt.bind_button_chord(JUMP, pad, 4, 5).unwrap();
        let controls = virt.button_controls(JUMP);
        assert_eq!(
            controls,
            vec![
                PhysicalControl::button(7, 4),
                PhysicalControl::button(7, 5)
            ]
        );
    }
}
