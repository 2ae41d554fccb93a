// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram engine lifecycle.
//!
//! Engines are stateful: an instance owns its mount target and, for the board, a key listener.
//! Both are leases that unbind on drop, so releasing an instance is simply dropping it and no
//! exit path can leak a binding.
//!
//! A render pass looks like this:
//! 1. [`DiagramMounts::begin_pass`]
//! 2. the view walks the tree and calls [`DiagramMounts::mount`] for every complete diagram
//! 3. [`DiagramMounts::end_pass`] releases hosts that were not mounted this pass, then applies the
//!    [`DeferredQueue`] of status updates posted during construction
//! 4. painting reads [`DiagramMounts::view`]

use std::fmt;

use crate::model::MountId;
use crate::render::RenderOptions;

mod deferred;
mod host;
mod mounts;
mod registry;

pub use deferred::{DeferredQueue, StatusUpdate};
pub use host::{DiagramHost, EngineContext, HostView};
pub use mounts::{InputRouter, ListenerLease, MountLease, MountTargets};
pub use registry::DiagramMounts;

/// A key routed to the focused diagram. Terminal key codes are mapped onto this before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

/// A construction or render fault, shown inline in place of the diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPanel {
    kind: &'static str,
    message: String,
}

impl ErrorPanel {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErrorPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The mount target still belongs to a live instance.
    TargetBusy { mount: MountId },
    /// Another listener is already attached for this mount.
    ListenerBusy { mount: MountId },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetBusy { mount } => write!(f, "mount target {mount} is still bound"),
            Self::ListenerBusy { mount } => {
                write!(f, "a key listener is already attached to {mount}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

/// Builds engine instances from fence content.
pub trait DiagramEngine {
    type Instance: EngineInstance;

    /// Label used for error panels raised by this engine.
    fn kind_label(&self) -> &'static str;

    /// Builds an instance bound to `lease`. On failure the lease is dropped with the error, which
    /// frees the mount target again.
    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        options: &RenderOptions,
        input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel>;
}

/// One live engine instance. Dropping it is its teardown.
pub trait EngineInstance {
    fn mount_id(&self) -> &MountId;

    fn render(&self) -> Result<String, ErrorPanel>;

    /// Whether the instance takes keyboard focus.
    fn is_interactive(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests;
