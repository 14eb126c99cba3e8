//! Arena-backed operation tape with mark / rewind / backward propagation.

use std::cell::RefCell;

/// Nodes per arena block. Rewinding never returns blocks, so after the first
/// few paths the hot loop records without touching the allocator.
const BLOCK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, Copy)]
enum Op {
    /// Input or constant; propagation stops here.
    Leaf,
    Unary { arg: usize, partial: f64 },
    Binary {
        lhs: usize,
        rhs: usize,
        dlhs: f64,
        drhs: f64,
    },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    adjoint: f64,
    op: Op,
}

/// Append-only log of elementary operations.
///
/// Values are carried by the recording [`super::Number`]s; the tape stores
/// only the dependency structure, local partials, and one adjoint per node.
/// Each thread owns exactly one tape, reachable through the free functions
/// of this module; none of the operations here ever fail at runtime.
#[derive(Debug, Default)]
pub struct Tape {
    blocks: Vec<Vec<Node>>,
    len: usize,
    mark: usize,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of arena blocks ever allocated (high-water mark).
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Saved mark position: nodes `0..mark` survive [`Tape::rewind_to_mark`].
    #[inline]
    pub fn mark_position(&self) -> usize {
        self.mark
    }

    /// Records the current end of the tape as the mark.
    #[inline]
    pub fn mark(&mut self) {
        self.mark = self.len;
    }

    /// Releases every node and drops the mark. Blocks stay allocated.
    pub fn rewind(&mut self) {
        self.len = 0;
        self.mark = 0;
    }

    /// Releases all nodes recorded after the mark; nodes up to the mark keep
    /// their adjoints. Blocks stay allocated, so re-recording is malloc-free.
    #[inline]
    pub fn rewind_to_mark(&mut self) {
        self.len = self.mark;
    }

    #[inline]
    fn node(&self, id: usize) -> Node {
        self.blocks[id / BLOCK_SIZE][id % BLOCK_SIZE]
    }

    #[inline]
    fn node_mut(&mut self, id: usize) -> &mut Node {
        &mut self.blocks[id / BLOCK_SIZE][id % BLOCK_SIZE]
    }

    #[inline]
    fn push(&mut self, op: Op) -> usize {
        let block = self.len / BLOCK_SIZE;
        let offset = self.len % BLOCK_SIZE;
        if block == self.blocks.len() {
            self.blocks.push(Vec::with_capacity(BLOCK_SIZE));
        }
        let storage = &mut self.blocks[block];
        let node = Node {
            adjoint: 0.0,
            op,
        };
        if offset < storage.len() {
            storage[offset] = node;
        } else {
            storage.push(node);
        }
        self.len += 1;
        self.len - 1
    }

    #[inline]
    pub(crate) fn push_leaf(&mut self) -> usize {
        self.push(Op::Leaf)
    }

    #[inline]
    pub(crate) fn push_unary(&mut self, arg: usize, partial: f64) -> usize {
        debug_assert!(arg < self.len);
        self.push(Op::Unary { arg, partial })
    }

    #[inline]
    pub(crate) fn push_binary(&mut self, lhs: usize, rhs: usize, dlhs: f64, drhs: f64) -> usize {
        debug_assert!(lhs < self.len && rhs < self.len);
        self.push(Op::Binary {
            lhs,
            rhs,
            dlhs,
            drhs,
        })
    }

    #[inline]
    pub(crate) fn adjoint(&self, id: usize) -> f64 {
        self.node(id).adjoint
    }

    #[inline]
    pub(crate) fn add_adjoint(&mut self, id: usize, delta: f64) {
        self.node_mut(id).adjoint += delta;
    }

    /// Backward sweep over `lo..hi` (reverse order), scattering each node's
    /// adjoint onto its inputs. Inputs below `lo` accumulate and are not
    /// themselves visited.
    fn propagate_range(&mut self, hi: usize, lo: usize) {
        for id in (lo..hi).rev() {
            let node = self.node(id);
            if node.adjoint == 0.0 {
                continue;
            }
            match node.op {
                Op::Leaf => {}
                Op::Unary { arg, partial } => {
                    self.node_mut(arg).adjoint += node.adjoint * partial;
                }
                Op::Binary {
                    lhs,
                    rhs,
                    dlhs,
                    drhs,
                } => {
                    self.node_mut(lhs).adjoint += node.adjoint * dlhs;
                    self.node_mut(rhs).adjoint += node.adjoint * drhs;
                }
            }
        }
    }

    /// Seeds `from` with adjoint 1 and sweeps backward down to (but not
    /// past) the mark. With `reset_inputs == false`, adjoints of nodes at or
    /// before the mark accumulate across calls; with `true` they are zeroed
    /// first.
    pub(crate) fn propagate_to_mark(&mut self, from: usize, reset_inputs: bool) {
        debug_assert!(self.mark <= from && from < self.len);
        if reset_inputs {
            for id in 0..self.mark {
                self.node_mut(id).adjoint = 0.0;
            }
        }
        self.node_mut(from).adjoint = 1.0;
        self.propagate_range(from + 1, self.mark);
    }

    /// Sweeps the pre-mark segment so adjoints accumulated at the mark flow
    /// back to the input leaves. Called once after all paths are done.
    pub(crate) fn propagate_mark_to_start(&mut self) {
        self.propagate_range(self.mark, 0);
    }
}

thread_local! {
    static TAPE: RefCell<Tape> = RefCell::new(Tape::new());
}

/// Runs `f` against the calling thread's tape.
///
/// The closure must not record nodes itself (arithmetic on `Number`s would
/// re-borrow the tape).
pub fn with_tape<R>(f: impl FnOnce(&mut Tape) -> R) -> R {
    TAPE.with(|t| f(&mut t.borrow_mut()))
}

/// Releases every node on the calling thread's tape and drops the mark.
pub fn rewind() {
    with_tape(Tape::rewind);
}

/// Marks the current end of the calling thread's tape.
pub fn mark() {
    with_tape(Tape::mark);
}

/// Truncates the calling thread's tape back to the mark.
pub fn rewind_to_mark() {
    with_tape(Tape::rewind_to_mark);
}

/// Propagates the pre-mark segment of the calling thread's tape.
pub fn propagate_mark_to_start() {
    with_tape(Tape::propagate_mark_to_start);
}

/// Live node count of the calling thread's tape.
pub fn len() -> usize {
    with_tape(|t| t.len())
}

/// Arena block count of the calling thread's tape.
pub fn block_count() -> usize {
    with_tape(|t| t.block_count())
}
