// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::{DeferredQueue, DiagramEngine, EngineInstance, ErrorPanel, InputRouter, MountTargets};
use crate::model::MountId;
use crate::render::RenderOptions;

/// Shared services handed to every host during a render pass.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    pub targets: MountTargets,
    pub input: InputRouter,
    pub deferred: DeferredQueue,
    pub options: RenderOptions,
}

impl EngineContext {
    pub fn new(options: RenderOptions) -> Self {
        Self { options, ..Self::default() }
    }
}

/// What a host shows right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostView {
    Rendered(String),
    Failed(ErrorPanel),
    /// Construction ran but its status has not been applied yet.
    Pending,
}

/// Owns at most one live instance of one engine at one mount.
pub struct DiagramHost<E: DiagramEngine> {
    engine: E,
    mount: MountId,
    content: Option<String>,
    instance: Option<E::Instance>,
    error: Option<ErrorPanel>,
    constructions: usize,
}

impl<E: DiagramEngine> DiagramHost<E> {
    pub fn new(engine: E, mount: MountId) -> Self {
        Self { engine, mount, content: None, instance: None, error: None, constructions: 0 }
    }

    pub fn mount_id(&self) -> &MountId {
        &self.mount
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn instance(&self) -> Option<&E::Instance> {
        self.instance.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorPanel> {
        self.error.as_ref()
    }

    /// Number of construction attempts so far, failed ones included.
    pub fn constructions(&self) -> usize {
        self.constructions
    }

    /// Rebuilds the instance when `content` differs from the last update; returns whether it did.
    ///
    /// The previous instance is dropped before the new one is constructed. Status changes are
    /// posted to the deferred queue and show up once the queue is applied.
    pub fn update(&mut self, content: &str, ctx: &EngineContext) -> bool {
        if self.content.as_deref() == Some(content) {
            return false;
        }

        self.release();
        self.content = Some(content.to_owned());
        self.constructions += 1;
        ctx.deferred.post(&self.mount, None);

        let lease = match ctx.targets.bind(&self.mount) {
            Ok(lease) => lease,
            Err(err) => {
                tracing::warn!(mount = %self.mount, error = %err, "mount target unavailable");
                let panel = ErrorPanel::new(self.engine.kind_label(), err.to_string());
                ctx.deferred.post(&self.mount, Some(panel));
                return true;
            }
        };

        match self.engine.construct(lease, content, &ctx.options, &ctx.input) {
            Ok(instance) => {
                tracing::debug!(
                    mount = %self.mount,
                    engine = self.engine.kind_label(),
                    "constructed diagram instance"
                );
                self.instance = Some(instance);
            }
            Err(panel) => {
                tracing::warn!(mount = %self.mount, error = %panel, "diagram construction failed");
                ctx.deferred.post(&self.mount, Some(panel));
            }
        }
        true
    }

    /// Drops the live instance, if any.
    pub fn release(&mut self) {
        if let Some(instance) = self.instance.take() {
            drop(instance);
            tracing::debug!(mount = %self.mount, "released diagram instance");
        }
    }

    pub(crate) fn apply_status(&mut self, error: Option<ErrorPanel>) {
        self.error = error;
    }

    pub fn view(&self) -> HostView {
        if let Some(error) = &self.error {
            return HostView::Failed(error.clone());
        }
        match &self.instance {
            Some(instance) => match instance.render() {
                Ok(text) => HostView::Rendered(text),
                Err(panel) => HostView::Failed(panel),
            },
            None => HostView::Pending,
        }
    }
}

impl<E: DiagramEngine> Drop for DiagramHost<E> {
    fn drop(&mut self) {
        self.release();
    }
}
