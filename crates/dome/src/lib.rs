//! Dome gallery engine.
//!
//! Arranges a flat media catalog on a simulated spherical shell, turns pointer
//! drags into shell rotation and release velocity into decaying free spin.
//!
//! - [`layout`] maps catalog items onto angular grid slots.
//! - [`projection`] computes the static per-slot transforms, the animated shell
//!   transform and the viewport radius.
//! - [`picking`] resolves taps to slots.
//! - [`interaction`] owns the shell orientation and runs the
//!   idle/dragging/inertia state machine.

pub mod config;
pub mod interaction;
pub mod layout;
pub mod orientation;
pub mod picking;
pub mod projection;

pub use config::*;
pub use interaction::*;
pub use layout::*;
pub use orientation::*;
pub use picking::*;
pub use projection::*;
