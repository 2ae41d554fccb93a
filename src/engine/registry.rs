// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use super::{DiagramHost, EngineContext, ErrorPanel, HostView, InputRouter, KeyInput, MountTargets};
use crate::model::{DiagramKind, MountId};
use crate::render::{
    BoardEngine, FlowchartEngine, ForcePlotEngine, FunctionPlotEngine, RenderOptions,
};

enum MountedHost {
    FunctionPlot(DiagramHost<FunctionPlotEngine>),
    ForcePlot(DiagramHost<ForcePlotEngine>),
    Flowchart(DiagramHost<FlowchartEngine>),
    Board(DiagramHost<BoardEngine>),
}

macro_rules! with_host {
    ($mounted:expr, $host:ident => $body:expr) => {
        match $mounted {
            MountedHost::FunctionPlot($host) => $body,
            MountedHost::ForcePlot($host) => $body,
            MountedHost::Flowchart($host) => $body,
            MountedHost::Board($host) => $body,
        }
    };
}

impl MountedHost {
    /// `None` for kinds that are not engine-backed.
    fn new(kind: DiagramKind, mount: MountId) -> Option<Self> {
        match kind {
            DiagramKind::FunctionPlot => {
                Some(Self::FunctionPlot(DiagramHost::new(FunctionPlotEngine, mount)))
            }
            DiagramKind::ForcePlot => {
                Some(Self::ForcePlot(DiagramHost::new(ForcePlotEngine, mount)))
            }
            DiagramKind::Mermaid => {
                Some(Self::Flowchart(DiagramHost::new(FlowchartEngine, mount)))
            }
            DiagramKind::ScriptedGraph => Some(Self::Board(DiagramHost::new(BoardEngine, mount))),
            DiagramKind::Plain | DiagramKind::GenericPlot | DiagramKind::Svg => None,
        }
    }

    fn kind(&self) -> DiagramKind {
        match self {
            Self::FunctionPlot(_) => DiagramKind::FunctionPlot,
            Self::ForcePlot(_) => DiagramKind::ForcePlot,
            Self::Flowchart(_) => DiagramKind::Mermaid,
            Self::Board(_) => DiagramKind::ScriptedGraph,
        }
    }

    fn update(&mut self, content: &str, ctx: &EngineContext) -> bool {
        with_host!(self, host => host.update(content, ctx))
    }

    fn apply_status(&mut self, error: Option<ErrorPanel>) {
        with_host!(self, host => host.apply_status(error))
    }

    fn view(&self) -> HostView {
        with_host!(self, host => host.view())
    }

    fn constructions(&self) -> usize {
        with_host!(self, host => host.constructions())
    }
}

/// Every mounted diagram host of one view, keyed by mount id.
pub struct DiagramMounts {
    ctx: EngineContext,
    hosts: BTreeMap<MountId, MountedHost>,
    touched: BTreeSet<MountId>,
}

impl Default for DiagramMounts {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl DiagramMounts {
    pub fn new(options: RenderOptions) -> Self {
        Self { ctx: EngineContext::new(options), hosts: BTreeMap::new(), touched: BTreeSet::new() }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.ctx.options
    }

    /// Replaces the options. Hosts are released when they change so every diagram rebuilds.
    pub fn set_options(&mut self, options: RenderOptions) {
        if self.ctx.options != options {
            self.clear();
            self.ctx.options = options;
        }
    }

    pub fn begin_pass(&mut self) {
        self.touched.clear();
    }

    /// Mounts (or updates) the host at `mount`. Returns `false` when `kind` is not engine-backed.
    pub fn mount(&mut self, mount: &MountId, kind: DiagramKind, content: &str) -> bool {
        if self.hosts.get(mount).is_some_and(|host| host.kind() != kind) {
            tracing::debug!(mount = %mount, "diagram kind changed; releasing host");
            self.hosts.remove(mount);
        }

        if !self.hosts.contains_key(mount) {
            let Some(host) = MountedHost::new(kind, mount.clone()) else {
                return false;
            };
            tracing::debug!(mount = %mount, kind = %kind, "mounting diagram host");
            self.hosts.insert(mount.clone(), host);
        }

        self.touched.insert(mount.clone());
        if let Some(host) = self.hosts.get_mut(mount) {
            host.update(content, &self.ctx);
        }
        true
    }

    /// Releases hosts that were not mounted since [`DiagramMounts::begin_pass`], then applies
    /// the deferred status updates.
    pub fn end_pass(&mut self) {
        let touched = &self.touched;
        self.hosts.retain(|mount, _| {
            let keep = touched.contains(mount);
            if !keep {
                tracing::debug!(mount = %mount, "unmounting diagram host");
            }
            keep
        });
        self.flush_deferred();
    }

    fn flush_deferred(&mut self) {
        for update in self.ctx.deferred.drain() {
            match self.hosts.get_mut(&update.mount) {
                Some(host) => host.apply_status(update.error),
                None => {
                    tracing::debug!(mount = %update.mount, "dropping status for unmounted host")
                }
            }
        }
    }

    pub fn view(&self, mount: &MountId) -> Option<HostView> {
        self.hosts.get(mount).map(MountedHost::view)
    }

    pub fn kind(&self, mount: &MountId) -> Option<DiagramKind> {
        self.hosts.get(mount).map(MountedHost::kind)
    }

    pub fn constructions(&self, mount: &MountId) -> Option<usize> {
        self.hosts.get(mount).map(MountedHost::constructions)
    }

    /// Releases every host.
    pub fn clear(&mut self) {
        if !self.hosts.is_empty() {
            tracing::debug!(count = self.hosts.len(), "releasing all diagram hosts");
        }
        self.hosts.clear();
        self.touched.clear();
        self.ctx.deferred.drain();
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn contains(&self, mount: &MountId) -> bool {
        self.hosts.contains_key(mount)
    }

    pub fn targets(&self) -> &MountTargets {
        &self.ctx.targets
    }

    pub fn input(&self) -> &InputRouter {
        &self.ctx.input
    }

    /// Mounts that take keyboard focus, in id order.
    pub fn focusable(&self) -> Vec<MountId> {
        self.ctx.input.focusable()
    }

    pub fn dispatch_key(&self, mount: &MountId, key: KeyInput) -> bool {
        self.ctx.input.dispatch(mount, key)
    }
}
