// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ordering stamps for store writes.

use std::fmt;

/// Identity of one opened connection session inside a [`StateStore`](super::StateStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    pub(crate) const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw epoch number.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Epoch({})", self.0)
    }
}

/// Stamp attached to every arrival written to the store.
///
/// `seq` is allocated from a store-wide counter: the initial fetch takes its
/// number when the request is issued, a push when it is received. Between
/// two arrivals without backend timestamps, the higher `seq` wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision {
    epoch: Epoch,
    seq: u64,
}

impl Revision {
    pub(crate) const fn new(epoch: Epoch, seq: u64) -> Self {
        Self { epoch, seq }
    }

    /// Session that produced the arrival.
    #[must_use]
    pub const fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Position in the store-wide arrival order.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.epoch.0, self.seq)
    }
}
