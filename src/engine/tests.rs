// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cell::RefCell;
use std::rc::Rc;

use crate::model::{DiagramKind, MountId};
use crate::render::RenderOptions;

use super::{
    DiagramEngine, DiagramHost, DiagramMounts, EngineContext, EngineInstance, ErrorPanel, HostView,
    InputRouter, KeyInput, MountLease,
};

#[derive(Debug, Clone, Default)]
struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    fn push(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

struct FakeEngine {
    journal: Journal,
}

struct FakeInstance {
    lease: MountLease,
    content: String,
    journal: Journal,
}

impl Drop for FakeInstance {
    fn drop(&mut self) {
        self.journal.push(format!("release {}", self.content));
    }
}

impl DiagramEngine for FakeEngine {
    type Instance = FakeInstance;

    fn kind_label(&self) -> &'static str {
        "Fake"
    }

    fn construct(
        &self,
        lease: MountLease,
        content: &str,
        _options: &RenderOptions,
        _input: &InputRouter,
    ) -> Result<Self::Instance, ErrorPanel> {
        self.journal.push(format!("construct {content}"));
        if content.starts_with("fail") {
            return Err(ErrorPanel::new("Fake", "cannot draw"));
        }
        Ok(FakeInstance { lease, content: content.to_owned(), journal: self.journal.clone() })
    }
}

impl EngineInstance for FakeInstance {
    fn mount_id(&self) -> &MountId {
        self.lease.mount_id()
    }

    fn render(&self) -> Result<String, ErrorPanel> {
        Ok(format!("<{}>", self.content))
    }
}

fn mount_id(ordinal: usize) -> MountId {
    MountId::scoped("msg", ordinal).expect("mount id")
}

fn fake_host() -> (DiagramHost<FakeEngine>, Journal) {
    let journal = Journal::default();
    (DiagramHost::new(FakeEngine { journal: journal.clone() }, mount_id(0)), journal)
}

fn flush(host: &mut DiagramHost<FakeEngine>, ctx: &EngineContext) {
    for update in ctx.deferred.drain() {
        assert_eq!(&update.mount, host.mount_id());
        host.apply_status(update.error);
    }
}

#[test]
fn unchanged_content_does_not_rebuild() {
    let ctx = EngineContext::default();
    let (mut host, journal) = fake_host();

    assert!(host.update("a", &ctx));
    assert!(!host.update("a", &ctx));
    assert_eq!(host.constructions(), 1);
    assert_eq!(journal.entries(), ["construct a"]);
    assert_eq!(host.view(), HostView::Rendered("<a>".to_owned()));
}

#[test]
fn changed_content_releases_before_constructing() {
    let ctx = EngineContext::default();
    let (mut host, journal) = fake_host();

    host.update("a", &ctx);
    host.update("b", &ctx);
    assert_eq!(journal.entries(), ["construct a", "release a", "construct b"]);
    assert_eq!(ctx.targets.bound_count(), 1);
}

#[test]
fn construction_faults_show_after_the_deferred_flush() {
    let ctx = EngineContext::default();
    let (mut host, _journal) = fake_host();

    host.update("fail", &ctx);
    assert_eq!(host.view(), HostView::Pending);
    assert!(!ctx.targets.is_bound(host.mount_id()));

    flush(&mut host, &ctx);
    let HostView::Failed(panel) = host.view() else {
        panic!("expected an error panel");
    };
    assert_eq!(panel.to_string(), "Fake Error: cannot draw");
}

#[test]
fn a_successful_rebuild_clears_the_error() {
    let ctx = EngineContext::default();
    let (mut host, _journal) = fake_host();

    host.update("fail", &ctx);
    flush(&mut host, &ctx);
    host.update("ok", &ctx);
    flush(&mut host, &ctx);
    assert_eq!(host.view(), HostView::Rendered("<ok>".to_owned()));
    assert!(host.error().is_none());
}

#[test]
fn busy_target_is_reported_as_a_fault() {
    let ctx = EngineContext::default();
    let (mut host, journal) = fake_host();
    let _squatter = ctx.targets.bind(&mount_id(0)).expect("bind");

    host.update("a", &ctx);
    flush(&mut host, &ctx);
    assert!(journal.entries().is_empty());
    let HostView::Failed(panel) = host.view() else {
        panic!("expected an error panel");
    };
    assert_eq!(panel.kind(), "Fake");
    assert!(panel.message().contains("still bound"));
}

#[test]
fn dropping_the_host_tears_the_instance_down() {
    let ctx = EngineContext::default();
    let (mut host, journal) = fake_host();

    host.update("a", &ctx);
    drop(host);
    assert_eq!(journal.entries(), ["construct a", "release a"]);
    assert_eq!(ctx.targets.bound_count(), 0);
}

const CHART: &str = "graph TD\nA --> B";

#[test]
fn untouched_hosts_are_swept_at_the_end_of_a_pass() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    assert!(mounts.mount(&mount_id(0), DiagramKind::Mermaid, CHART));
    assert!(mounts.mount(&mount_id(1), DiagramKind::Mermaid, CHART));
    mounts.end_pass();
    assert_eq!(mounts.len(), 2);

    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, CHART);
    mounts.end_pass();
    assert_eq!(mounts.len(), 1);
    assert_eq!(mounts.constructions(&mount_id(0)), Some(1));
    assert_eq!(mounts.targets().bound_count(), 1);
    assert!(!mounts.contains(&mount_id(1)));
}

#[test]
fn kinds_without_an_engine_are_not_mounted() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    assert!(!mounts.mount(&mount_id(0), DiagramKind::Svg, "<svg/>"));
    assert!(!mounts.mount(&mount_id(1), DiagramKind::GenericPlot, "{}"));
    mounts.end_pass();
    assert!(mounts.is_empty());
}

#[test]
fn parse_failures_become_error_panels() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, "graph XY\nA --> B");
    assert_eq!(mounts.view(&mount_id(0)), Some(HostView::Pending));
    mounts.end_pass();

    let Some(HostView::Failed(panel)) = mounts.view(&mount_id(0)) else {
        panic!("expected an error panel");
    };
    assert_eq!(panel.kind(), "Mermaid");
    assert!(!mounts.targets().is_bound(&mount_id(0)));
}

#[test]
fn kind_change_replaces_the_host() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, CHART);
    mounts.end_pass();

    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::ScriptedGraph, "A = point(1, 2);");
    mounts.end_pass();
    assert_eq!(mounts.kind(&mount_id(0)), Some(DiagramKind::ScriptedGraph));
    assert_eq!(mounts.focusable(), [mount_id(0)]);
}

#[test]
fn board_listeners_follow_the_host() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::ScriptedGraph, "A = point(1, 2);");
    mounts.end_pass();
    assert!(mounts.dispatch_key(&mount_id(0), KeyInput::Right));
    assert!(!mounts.dispatch_key(&mount_id(0), KeyInput::Char('x')));

    mounts.begin_pass();
    mounts.end_pass();
    assert!(mounts.focusable().is_empty());
    assert!(!mounts.dispatch_key(&mount_id(0), KeyInput::Right));
}

#[test]
fn clear_drops_hosts_and_pending_status() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, "graph XY");
    mounts.clear();
    assert!(mounts.is_empty());
    assert_eq!(mounts.targets().bound_count(), 0);

    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, CHART);
    mounts.end_pass();
    assert!(matches!(mounts.view(&mount_id(0)), Some(HostView::Rendered(_))));
}

#[test]
fn changing_options_rebuilds_every_host() {
    let mut mounts = DiagramMounts::default();
    mounts.begin_pass();
    mounts.mount(&mount_id(0), DiagramKind::Mermaid, CHART);
    mounts.end_pass();

    mounts.set_options(RenderOptions::default());
    assert_eq!(mounts.len(), 1);

    mounts.set_options(RenderOptions { plot_width: 40, ..RenderOptions::default() });
    assert!(mounts.is_empty());
}
