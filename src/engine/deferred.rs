// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Stepmark and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::ErrorPanel;
use crate::model::MountId;

/// A host status change. `error: None` clears a previously reported error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub mount: MountId,
    pub error: Option<ErrorPanel>,
}

/// Status updates posted while hosts reconcile, applied once the reconcile phase is over.
///
/// Posting never touches host state directly, so a host can report from inside its own update
/// without re-entering itself.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    pending: Rc<RefCell<VecDeque<StatusUpdate>>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&self, mount: &MountId, error: Option<ErrorPanel>) {
        self.pending.borrow_mut().push_back(StatusUpdate { mount: mount.clone(), error });
    }

    /// Takes every pending update in posting order.
    pub fn drain(&self) -> Vec<StatusUpdate> {
        self.pending.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}
