// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::{Rc, Weak};

use super::{EngineError, KeyInput};
use crate::model::MountId;

/// Exclusive bindings of mount targets to live instances.
///
/// Clones share the same table. A target can only be bound again after the previous
/// [`MountLease`] was dropped.
#[derive(Debug, Clone, Default)]
pub struct MountTargets {
    bound: Rc<RefCell<BTreeSet<MountId>>>,
}

impl MountTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, mount: &MountId) -> Result<MountLease, EngineError> {
        let mut bound = self.bound.borrow_mut();
        if !bound.insert(mount.clone()) {
            return Err(EngineError::TargetBusy { mount: mount.clone() });
        }
        Ok(MountLease { mount: mount.clone(), targets: Rc::downgrade(&self.bound) })
    }

    pub fn is_bound(&self, mount: &MountId) -> bool {
        self.bound.borrow().contains(mount)
    }

    pub fn bound_count(&self) -> usize {
        self.bound.borrow().len()
    }
}

/// Ownership of one mount target. Unbinds on drop.
pub struct MountLease {
    mount: MountId,
    targets: Weak<RefCell<BTreeSet<MountId>>>,
}

impl MountLease {
    pub fn mount_id(&self) -> &MountId {
        &self.mount
    }
}

impl fmt::Debug for MountLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountLease").field("mount", &self.mount).finish()
    }
}

impl Drop for MountLease {
    fn drop(&mut self) {
        if let Some(targets) = self.targets.upgrade() {
            targets.borrow_mut().remove(&self.mount);
        }
    }
}

type Listener = Box<dyn FnMut(KeyInput) -> bool>;

/// Key-listener registrations keyed by mount.
///
/// Clones share the same table. Listeners are attached by an instance during construction and
/// detached when its [`ListenerLease`] drops, so a listener never outlives its instance.
#[derive(Clone, Default)]
pub struct InputRouter {
    listeners: Rc<RefCell<BTreeMap<MountId, Listener>>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(
        &self,
        mount: &MountId,
        listener: impl FnMut(KeyInput) -> bool + 'static,
    ) -> Result<ListenerLease, EngineError> {
        let mut listeners = self.listeners.borrow_mut();
        if listeners.contains_key(mount) {
            return Err(EngineError::ListenerBusy { mount: mount.clone() });
        }
        listeners.insert(mount.clone(), Box::new(listener));
        Ok(ListenerLease { mount: mount.clone(), listeners: Rc::downgrade(&self.listeners) })
    }

    /// Delivers `key` to the listener of `mount`; returns whether it was handled.
    pub fn dispatch(&self, mount: &MountId, key: KeyInput) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        match listeners.get_mut(mount) {
            Some(listener) => listener(key),
            None => false,
        }
    }

    pub fn has_listener(&self, mount: &MountId) -> bool {
        self.listeners.borrow().contains_key(mount)
    }

    /// Mounts with a listener, in id order.
    pub fn focusable(&self) -> Vec<MountId> {
        self.listeners.borrow().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl fmt::Debug for InputRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputRouter").field("focusable", &self.focusable()).finish()
    }
}

/// One attached key listener. Detaches on drop.
pub struct ListenerLease {
    mount: MountId,
    listeners: Weak<RefCell<BTreeMap<MountId, Listener>>>,
}

impl fmt::Debug for ListenerLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerLease").field("mount", &self.mount).finish()
    }
}

impl Drop for ListenerLease {
    fn drop(&mut self) {
        let Some(listeners) = self.listeners.upgrade() else {
            return;
        };
        // Take the listener out before dropping it so its captures never run under the borrow.
        let removed = listeners.borrow_mut().remove(&self.mount);
        drop(removed);
    }
}
