//! Ordering fence between registration and update sequences.
//!
//! An update holds the shared side from the state change through its last
//! notification. A registration holds the exclusive side across the swap-in
//! and the initial push, so a late joiner never sees part of an update that
//! was in flight when it joined.
//!
//! A thread that already holds a gate passes straight through it. Subscriber
//! code running inside a sequence can therefore call back into the same
//! producer without deadlocking; such a nested call is fenced only by the
//! outer sequence it runs in.

use std::cell::RefCell;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::recover;

thread_local! {
    /// Addresses of the gates held by this thread.
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

fn held_here(addr: usize) -> bool {
    HELD.with(|held| held.borrow().contains(&addr))
}

#[derive(Debug, Default)]
pub(crate) struct DeliveryGate {
    lock: RwLock<()>,
}

impl DeliveryGate {
    fn addr(&self) -> usize {
        std::ptr::from_ref(self) as usize
    }

    /// Enter as an update sequence.
    pub(crate) fn shared(&self) -> GateGuard<'_> {
        let addr = self.addr();
        if held_here(addr) {
            return GateGuard::reentered();
        }
        let guard = recover(self.lock.read());
        GateGuard::entered(addr, Some(guard), None)
    }

    /// Enter as a registration.
    pub(crate) fn exclusive(&self) -> GateGuard<'_> {
        let addr = self.addr();
        if held_here(addr) {
            return GateGuard::reentered();
        }
        let guard = recover(self.lock.write());
        GateGuard::entered(addr, None, Some(guard))
    }
}

/// Releases the gate and forgets it for this thread on drop.
pub(crate) struct GateGuard<'a> {
    addr: Option<usize>,
    _shared: Option<RwLockReadGuard<'a, ()>>,
    _exclusive: Option<RwLockWriteGuard<'a, ()>>,
}

impl<'a> GateGuard<'a> {
    fn entered(
        addr: usize,
        shared: Option<RwLockReadGuard<'a, ()>>,
        exclusive: Option<RwLockWriteGuard<'a, ()>>,
    ) -> Self {
        HELD.with(|held| held.borrow_mut().push(addr));
        Self {
            addr: Some(addr),
            _shared: shared,
            _exclusive: exclusive,
        }
    }

    const fn reentered() -> Self {
        Self {
            addr: None,
            _shared: None,
            _exclusive: None,
        }
    }
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if let Some(addr) = self.addr {
            HELD.with(|held| {
                let mut held = held.borrow_mut();
                if let Some(pos) = held.iter().rposition(|&a| a == addr) {
                    held.remove(pos);
                }
            });
        }
    }
}
