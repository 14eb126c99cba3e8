//! Parallel Monte-Carlo drivers over the rayon worker pool.
//!
//! Paths are chunked into fixed-size batches, one pool task per batch. A
//! batch clones the RNG and skips it to the batch's first path, so the
//! pathwise output is written at absolute indices and is deterministic
//! regardless of scheduling (bit-identical to the sequential drivers when
//! the RNG supports exact skip-ahead). The calling thread blocks inside the
//! parallel iterator until the pool drains the batch queue; pool threads
//! keep each other busy by work-stealing.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use rayon::prelude::*;

use crate::core::SimulationError;
use crate::math::aad::{tape, Number};
use crate::mc::simulation::{
    check_sim_dim, next_gaussians, setup_aad, validate_request, AadResults,
};
use crate::mc::{GaussianRng, Model, Product, Scenario};

/// Paths per pool task.
pub const BATCH_SIZE: usize = 64;

/// Parallel Monte-Carlo valuation.
///
/// Same contract and output as [`crate::mc::mc_simul`]; scratch buffers are
/// allocated per worker, not per path.
pub fn mc_parallel_simul(
    product: &dyn Product<f64>,
    model: &dyn Model<f64>,
    rng: &dyn GaussianRng,
    n_path: usize,
    antithetic: bool,
) -> Result<Vec<f64>, SimulationError> {
    validate_request(product, n_path)?;

    let mut mdl = model.clone_box();
    let mut base_rng = rng.clone_box();

    mdl.init(product.timeline());
    let dim = mdl.sim_dim();
    check_sim_dim(dim)?;
    base_rng.init(dim);

    let n_dates = product.timeline().len();
    let mdl = &*mdl;
    let base_rng = &*base_rng;

    let mut res = vec![0.0; n_path];
    res.par_chunks_mut(BATCH_SIZE)
        .enumerate()
        .for_each_init(
            || (vec![0.0; dim], vec![Scenario { spot: 0.0 }; n_dates]),
            |(gauss, path), (batch, chunk)| {
                let first_path = batch * BATCH_SIZE;
                let mut task_rng = base_rng.clone_box();
                task_rng.skip_to(if antithetic {
                    first_path / 2
                } else {
                    first_path
                });

                let mut anti_path = false;
                for slot in chunk.iter_mut() {
                    next_gaussians(&mut *task_rng, gauss, antithetic, &mut anti_path);
                    mdl.generate_path(gauss, path);
                    *slot = product.payoff(path);
                }
            },
        );

    Ok(res)
}

/// Monotone simulation counter; a new parallel AAD run invalidates every
/// thread context left over from the previous one.
static SIM_EPOCH: AtomicU64 = AtomicU64::new(0);

/// The pool threads' tapes and contexts belong to one simulation at a time.
static DRIVER_LOCK: Mutex<()> = Mutex::new(());

/// Per-thread simulation state: the thread's model clone (parameters on the
/// thread's own tape), positioned RNG prototype, and scratch buffers.
struct ThreadContext {
    epoch: u64,
    model: Box<dyn Model<Number>>,
    rng: Box<dyn GaussianRng>,
    gauss: Vec<f64>,
    path: Vec<Scenario<Number>>,
}

thread_local! {
    static CONTEXT: RefCell<Option<ThreadContext>> = const { RefCell::new(None) };
}

fn init_thread_context(
    epoch: u64,
    product: &dyn Product<Number>,
    model: &dyn Model<Number>,
    rng: &dyn GaussianRng,
) -> ThreadContext {
    let (mdl, mut rng) = setup_aad(product.timeline(), model, rng);
    let dim = mdl.sim_dim();
    rng.init(dim);
    ThreadContext {
        epoch,
        gauss: vec![0.0; dim],
        path: vec![
            Scenario {
                spot: Number::new(0.0)
            };
            product.timeline().len()
        ],
        model: mdl,
        rng,
    }
}

/// Parallel Monte-Carlo valuation with path-wise reverse-mode
/// differentiation.
///
/// Every executing thread owns its tape, model clone, RNG clone, and
/// buffers; a batch's first touch of a thread runs the derivative setup
/// protocol there. After all batches retire, each participating thread
/// sweeps its own pre-mark tape segment and the per-thread parameter
/// adjoints are reduced into the calling thread's model clone in
/// thread-index order, so the returned sensitivities are deterministic up
/// to that fixed floating-point ordering.
///
/// One parallel derivative-recording simulation runs at a time per process
/// (concurrent callers are serialized on an internal lock; plain
/// simulations are unrestricted). Must not be invoked from inside a rayon
/// pool thread.
pub fn mc_parallel_simul_aad(
    product: &dyn Product<Number>,
    model: &dyn Model<Number>,
    rng: &dyn GaussianRng,
    n_path: usize,
    antithetic: bool,
) -> Result<AadResults, SimulationError> {
    validate_request(product, n_path)?;

    let _guard = DRIVER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let epoch = SIM_EPOCH.fetch_add(1, Ordering::Relaxed) + 1;

    // The calling thread initializes eagerly: its clone is the one
    // returned, with every worker's adjoints reduced into it at the end.
    let (caller_model, mut caller_rng) = setup_aad(product.timeline(), model, rng);
    let dim = caller_model.sim_dim();
    check_sim_dim(dim)?;
    caller_rng.init(dim);
    CONTEXT.with(|cell| {
        *cell.borrow_mut() = Some(ThreadContext {
            epoch,
            gauss: vec![0.0; dim],
            path: vec![
                Scenario {
                    spot: Number::new(0.0)
                };
                product.timeline().len()
            ],
            model: caller_model,
            rng: caller_rng,
        });
    });

    let mut payoffs = vec![0.0; n_path];
    payoffs
        .par_chunks_mut(BATCH_SIZE)
        .enumerate()
        .for_each(|(batch, chunk)| {
            CONTEXT.with(|cell| {
                let mut slot = cell.borrow_mut();
                let stale = !matches!(&*slot, Some(ctx) if ctx.epoch == epoch);
                if stale {
                    *slot = Some(init_thread_context(epoch, product, model, rng));
                }
                let ctx = slot.as_mut().expect("context initialized for this epoch");

                let first_path = batch * BATCH_SIZE;
                let mut task_rng = ctx.rng.clone_box();
                task_rng.skip_to(if antithetic {
                    first_path / 2
                } else {
                    first_path
                });

                let mut anti_path = false;
                for out in chunk.iter_mut() {
                    tape::rewind_to_mark();
                    next_gaussians(&mut *task_rng, &mut ctx.gauss, antithetic, &mut anti_path);
                    ctx.model.generate_path(&ctx.gauss, &mut ctx.path);
                    let result = product.payoff(&ctx.path);
                    result.propagate_to_mark(false);
                    *out = result.value();
                }
            });
        });

    // The calling thread sweeps its own pre-mark segment.
    Number::propagate_mark_to_start();

    // Each pool thread that ran a batch sweeps its tape and hands back its
    // parameter adjoints; threads that never participated are no-ops. The
    // result arrives indexed by pool-thread number.
    let harvested: Vec<Option<Vec<f64>>> = rayon::broadcast(|_| {
        CONTEXT.with(|cell| {
            let mut slot = cell.borrow_mut();
            match slot.take() {
                Some(ctx) if ctx.epoch == epoch => {
                    Number::propagate_mark_to_start();
                    Some(ctx.model.parameters().iter().map(|p| p.adjoint()).collect())
                }
                stale => {
                    *slot = stale;
                    None
                }
            }
        })
    });

    let ctx = CONTEXT
        .with(|cell| cell.borrow_mut().take())
        .expect("calling thread context initialized above");

    // Reduce worker adjoints into the calling thread's clone, in thread order.
    let params = ctx.model.parameters();
    for thread_adjoints in harvested.into_iter().flatten() {
        debug_assert_eq!(thread_adjoints.len(), params.len());
        for (param, adjoint) in params.iter().zip(thread_adjoints) {
            param.add_adjoint(adjoint);
        }
    }

    Ok(AadResults::new(payoffs, ctx.model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mc::simulation::{mc_simul, mc_simul_aad};
    use crate::models::BlackScholes;
    use crate::products::EuropeanCall;
    use crate::rng::{SobolNormal, XoshiroNormal};
    use approx::assert_relative_eq;

    #[test]
    fn parallel_matches_sequential_under_exact_skip() {
        let product = EuropeanCall::new(100.0, 1.0);
        let model = BlackScholes::<f64>::new(100.0, 0.2);
        let rng = SobolNormal::new(11);

        for &antithetic in &[false, true] {
            let sequential = mc_simul(&product, &model, &rng, 1000, antithetic).unwrap();
            let parallel = mc_parallel_simul(&product, &model, &rng, 1000, antithetic).unwrap();
            assert_eq!(sequential, parallel);
        }
    }

    #[test]
    fn parallel_aad_sensitivities_match_sequential() {
        let product = EuropeanCall::new(100.0, 1.0);
        let model = BlackScholes::<Number>::new(100.0, 0.2);
        let rng = SobolNormal::new(5);

        let sequential = mc_simul_aad(&product, &model, &rng, 2048, true).unwrap();
        // Read before the next derivative run rewinds the calling tape.
        let s = sequential.sensitivities();

        let parallel = mc_parallel_simul_aad(&product, &model, &rng, 2048, true).unwrap();
        let p = parallel.sensitivities();

        assert_eq!(sequential.payoffs, parallel.payoffs);
        assert_eq!(s.len(), p.len());
        for (a, b) in s.iter().zip(p.iter()) {
            // Same pathwise contributions, different summation order.
            assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
        }
    }

    #[test]
    fn repeated_parallel_aad_runs_are_stable() {
        let product = EuropeanCall::new(100.0, 1.0);
        let model = BlackScholes::<Number>::new(100.0, 0.2);
        let rng = XoshiroNormal::new(17);

        let first = mc_parallel_simul_aad(&product, &model, &rng, 512, false).unwrap();
        let first_risks = first.sensitivities();
        for _ in 0..3 {
            let again = mc_parallel_simul_aad(&product, &model, &rng, 512, false).unwrap();
            assert_eq!(first.payoffs, again.payoffs);
            let risks = again.sensitivities();
            for (a, b) in first_risks.iter().zip(risks.iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
            }
        }
    }
}
