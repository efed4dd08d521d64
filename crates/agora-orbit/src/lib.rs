// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Orbit controller: autonomous camera revolution around a focus node, timed
//! transitions to connected nodes, and user-triggered jumps.

pub mod controller;
pub mod core;

pub use controller::{FocusListener, OrbitController};
pub use core::{
    azimuth_for, ease_in_out_cubic, OrbitCommand, OrbitCore, OrbitEffect, OrbitState, Transition,
};
