//! Physical device collaborator contract.
//!
//! The platform backend owns the devices; this core reads them as per-frame
//! snapshots and never mutates them. [`DeviceSnapshot`] is a concrete
//! implementation used by tests and simple backends.

use crate::geometry::Vec2;

/// Stable identifier assigned to a physical device by the backend.
pub type DeviceId = u32;

/// Modifier key state reported by a device snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }
}

/// Keyboard key identifiers used by the routing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Space,
    Char(char),
    F(u8),
}

/// A key press delivered to the router for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Read-only view of one physical device for the current frame.
pub trait InputSource {
    fn id(&self) -> DeviceId;

    /// Button went down this frame.
    fn button_pressed(&self, button: u16) -> bool;
    /// Button came up this frame.
    fn button_released(&self, button: u16) -> bool;
    /// Button is currently down.
    fn button_held(&self, button: u16) -> bool;

    /// Axis value; sticks report [-1, 1], triggers [0, 1].
    fn axis(&self, axis: u16) -> f32;

    /// Hat/wheel delta accumulated this frame.
    fn wheel(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn modifiers(&self) -> Modifiers {
        Modifiers::NONE
    }
}

/// Concrete per-frame device state, filled in by a backend between frames.
#[derive(Debug, Clone, Default)]
pub struct DeviceSnapshot {
    id: DeviceId,
    pressed: Vec<u16>,
    released: Vec<u16>,
    held: Vec<u16>,
    axes: Vec<f32>,
    wheel: Vec2,
    modifiers: Modifiers,
}

impl DeviceSnapshot {
    pub fn new(id: DeviceId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Clear per-frame edges, keeping held buttons and axis values.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.released.clear();
        self.wheel = Vec2::ZERO;
    }

    pub fn press(&mut self, button: u16) {
        if !self.held.contains(&button) {
            self.pressed.push(button);
            self.held.push(button);
        }
    }

    pub fn release(&mut self, button: u16) {
        if self.held.contains(&button) {
            self.released.push(button);
            self.held.retain(|&b| b != button);
        }
    }

    pub fn set_axis(&mut self, axis: u16, value: f32) {
        let index = axis as usize;
        if self.axes.len() <= index {
            self.axes.resize(index + 1, 0.0);
        }
        self.axes[index] = value;
    }

    pub fn add_wheel(&mut self, delta: Vec2) {
        self.wheel = self.wheel + delta;
    }

    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }
}

impl InputSource for DeviceSnapshot {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn button_pressed(&self, button: u16) -> bool {
        self.pressed.contains(&button)
    }

    fn button_released(&self, button: u16) -> bool {
        self.released.contains(&button)
    }

    fn button_held(&self, button: u16) -> bool {
        self.held.contains(&button)
    }

    fn axis(&self, axis: u16) -> f32 {
        self.axes.get(axis as usize).copied().unwrap_or(0.0)
    }

    fn wheel(&self) -> Vec2 {
        self.wheel
    }

    fn modifiers(&self) -> Modifiers {
        self.modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_release_edges_last_one_frame() {
        let mut device = DeviceSnapshot::new(1);
        device.press(3);
        assert!(device.button_pressed(3));
        assert!(device.button_held(3));

        device.begin_frame();
        assert!(!device.button_pressed(3));
        assert!(device.button_held(3));

        device.release(3);
        assert!(device.button_released(3));
        assert!(!device.button_held(3));
    }

    #[test]
    fn repeated_press_is_not_a_new_edge() {
        let mut device = DeviceSnapshot::new(1);
        device.press(3);
        device.begin_frame();
        device.press(3);
        assert!(!device.button_pressed(3));
    }

    #[test]
    fn unset_axis_reads_neutral() {
        let device = DeviceSnapshot::new(1);
        assert_eq!(device.axis(7), 0.0);
    }
}
