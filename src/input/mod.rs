//! Input virtualization: physical device snapshots, virtual button/axis
//! slots, and exclusive-claim arbitration over physical controls.

mod arbiter;
mod device;
mod virtual_device;

pub use arbiter::{BindingArbiter, ClaimPriority, ExclusiveClaim};
pub use device::{DeviceId, DeviceSnapshot, InputSource, Key, KeyEvent, Modifiers};
pub use virtual_device::{
    Bind, ControlKind, PhysicalControl, VirtualDevice, VirtualFrame,
};
