// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secure element authentication and provisioning controller.
//!
//! On boot the controller seeds its generator from the analog inputs,
//! personalizes a blank secure element once, and then blocks until the
//! element proves it holds the key diversified from the shared secret. The
//! check repeats at randomized intervals driven by the tick interrupt.

#![cfg_attr(not(test), no_std)]

pub mod auth;
pub mod config;
pub mod console;
pub mod controller;
pub mod element;
pub mod entropy;
pub mod error;
pub mod feedback;
pub mod host;
pub mod input;
#[cfg(feature = "logging")]
pub mod logging;
#[cfg(any(test, feature = "model"))]
pub mod model;
pub mod provision;
pub mod secret;
pub mod variant;

pub use {
    auth::AuthState,
    config::Config,
    controller::{Context, Controller},
    element::SecureElement,
    error::{Error, Status},
    variant::DeviceVariant,
};
