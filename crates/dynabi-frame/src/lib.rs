//! Fixed-shape argument frames and the reusable frame pool.
//!
//! A [`Frame`] is a register image for one native call: one slot for the
//! target function address, fifteen integer/pointer-sized slots, and eight
//! floating-point slots holding raw IEEE-754 bit patterns. The frame never
//! owns the memory its slots refer to; it is a transient bit-pattern
//! snapshot that is populated immediately before a call and wiped
//! immediately after.
//!
//! Frames are fungible and are recycled through a [`FramePool`]. The pool is
//! an explicit, injectable resource: the call surface uses the process-wide
//! pool from [`FramePool::global`], while tests can construct a
//! deterministic pool of their own (including a single-slot one).
//!
//! Zeroing on both borrow and release is a correctness requirement, not an
//! optimization: a stale pointer bit pattern left in a slot must never be
//! observed as live data by a later, unrelated call.

use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// Number of integer/pointer register-image slots in a frame.
///
/// Matches the widest fixed-arity call primitive the engine exposes.
pub const INT_SLOTS: usize = 15;

/// Number of floating-point register-image slots in a frame.
pub const FLOAT_SLOTS: usize = 8;

/// Register image for a single native call.
///
/// Slot 1 (`ints[0]`) doubles as the primary return-value slot after the
/// trampoline comes back; `ints[1]` carries the auxiliary value register for
/// ABIs that split a result across two registers. `floats[0]` carries a
/// floating-point return as a raw bit pattern.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// Target function address. Never zero at call time.
    pub addr: u64,
    /// Integer/pointer argument slots, positional.
    pub ints: [u64; INT_SLOTS],
    /// Floating-point argument slots as raw bit patterns, positional.
    pub floats: [u64; FLOAT_SLOTS],
}

impl Frame {
    /// A frame with every slot zeroed.
    pub const fn zeroed() -> Self {
        Self {
            addr: 0,
            ints: [0; INT_SLOTS],
            floats: [0; FLOAT_SLOTS],
        }
    }

    /// Zero every slot, including the address slot.
    pub fn clear(&mut self) {
        *self = Self::zeroed();
    }

    /// True when every slot reads zero.
    pub fn is_clear(&self) -> bool {
        self.addr == 0
            && self.ints.iter().all(|&w| w == 0)
            && self.floats.iter().all(|&w| w == 0)
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// A concurrent pool of fungible [`Frame`]s.
///
/// `acquire` never fails and never blocks indefinitely: a pool miss
/// allocates a fresh frame rather than waiting for one to come back. A
/// frame is owned by at most one in-flight call at a time; the only
/// ownership transfers are pool -> caller (borrow), caller -> trampoline
/// (by reference, for the duration of the call) and caller -> pool
/// (guard drop).
pub struct FramePool {
    free: Mutex<Vec<Box<Frame>>>,
}

/// Frames kept warm in the process-wide pool at first use.
const GLOBAL_SEED: usize = 4;

static GLOBAL_POOL: Lazy<FramePool> = Lazy::new(|| FramePool::with_capacity(GLOBAL_SEED));

impl FramePool {
    /// An empty pool; every initial `acquire` is a miss.
    pub const fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
        }
    }

    /// A pool pre-seeded with `capacity` zeroed frames.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut free = Vec::with_capacity(capacity);
        for _ in 0..capacity {
            free.push(Box::new(Frame::zeroed()));
        }
        Self {
            free: Mutex::new(free),
        }
    }

    /// The process-wide pool shared by the raw call surface.
    pub fn global() -> &'static FramePool {
        &GLOBAL_POOL
    }

    /// Borrow a frame. Pops a recycled frame when one is idle, otherwise
    /// allocates. The returned frame is fully zeroed either way.
    pub fn acquire(&self) -> FrameGuard<'_> {
        let mut frame = match self.free.lock().pop() {
            Some(frame) => frame,
            None => {
                log::trace!("frame pool miss; allocating a fresh frame");
                Box::new(Frame::zeroed())
            }
        };
        frame.clear();
        FrameGuard {
            frame: Some(frame),
            pool: self,
        }
    }

    /// Number of idle frames currently sitting in the pool.
    pub fn idle(&self) -> usize {
        self.free.lock().len()
    }

    fn release(&self, frame: Box<Frame>) {
        debug_assert!(frame.is_clear(), "released frame must be zeroed");
        self.free.lock().push(frame);
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII borrow of a pooled frame.
///
/// Dereferences to the [`Frame`]. On drop, every slot is zeroed and the
/// frame goes back to its pool, on all exit paths.
pub struct FrameGuard<'p> {
    frame: Option<Box<Frame>>,
    pool: &'p FramePool,
}

impl std::ops::Deref for FrameGuard<'_> {
    type Target = Frame;
    fn deref(&self) -> &Frame {
        self.frame.as_deref().expect("frame guard already released")
    }
}

impl std::ops::DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Frame {
        self.frame.as_deref_mut().expect("frame guard already released")
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut frame) = self.frame.take() {
            frame.clear();
            self.pool.release(frame);
        }
    }
}
