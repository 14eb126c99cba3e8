//! Sequential Monte-Carlo drivers, plain and derivative-recording.

use crate::core::{McEstimate, SimulationError, Time};
use crate::math::aad::{tape, Number};
use crate::math::Scalar;
use crate::mc::{GaussianRng, Model, Product, Scenario};

/// Checks the caller-side contracts shared by every driver.
pub(crate) fn validate_request<T: Scalar>(
    product: &dyn Product<T>,
    n_path: usize,
) -> Result<(), SimulationError> {
    if n_path == 0 {
        return Err(SimulationError::InvalidInput(
            "n_path must be at least 1".to_string(),
        ));
    }
    let timeline = product.timeline();
    if timeline.is_empty() {
        return Err(SimulationError::InvalidTimeline(
            "product timeline is empty".to_string(),
        ));
    }
    if !timeline.iter().all(|t| t.is_finite()) {
        return Err(SimulationError::InvalidTimeline(
            "product timeline contains non-finite dates".to_string(),
        ));
    }
    if !timeline.windows(2).all(|w| w[0] < w[1]) {
        return Err(SimulationError::InvalidTimeline(
            "product timeline must be strictly increasing".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn check_sim_dim(sim_dim: usize) -> Result<(), SimulationError> {
    if sim_dim == 0 {
        return Err(SimulationError::InvalidModel(
            "model simulation dimension must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Fills `gauss` for the next path. Antithetic sampling alternates: a
/// primary step consults the RNG and arms the toggle, the mirrored step
/// negates the previous draw elementwise without consuming one.
#[inline]
pub(crate) fn next_gaussians(
    rng: &mut dyn GaussianRng,
    gauss: &mut [f64],
    antithetic: bool,
    anti_path: &mut bool,
) {
    if !antithetic {
        rng.next_g(gauss);
    } else if !*anti_path {
        rng.next_g(gauss);
        *anti_path = true;
    } else {
        for g in gauss.iter_mut() {
            *g = -*g;
        }
        *anti_path = false;
    }
}

/// Sequential Monte-Carlo valuation.
///
/// Clones the model and RNG (the originals are left untouched), initializes
/// them against the product timeline, and returns the `n_path` pathwise
/// payoffs. Gaussian and path buffers are allocated once; the per-path loop
/// is allocation-free.
pub fn mc_simul(
    product: &dyn Product<f64>,
    model: &dyn Model<f64>,
    rng: &dyn GaussianRng,
    n_path: usize,
    antithetic: bool,
) -> Result<Vec<f64>, SimulationError> {
    validate_request(product, n_path)?;

    let mut mdl = model.clone_box();
    let mut rng = rng.clone_box();

    mdl.init(product.timeline());
    let dim = mdl.sim_dim();
    check_sim_dim(dim)?;
    rng.init(dim);

    let mut gauss = vec![0.0; dim];
    let mut path = vec![Scenario { spot: 0.0 }; product.timeline().len()];
    let mut res = vec![0.0; n_path];

    let mut anti_path = false;
    for slot in res.iter_mut() {
        next_gaussians(&mut *rng, &mut gauss, antithetic, &mut anti_path);
        mdl.generate_path(&gauss, &mut path);
        *slot = product.payoff(&path);
    }

    Ok(res)
}

/// Outcome of a derivative-recording simulation: pathwise payoffs plus a
/// model clone whose parameter adjoints hold the accumulated sensitivity of
/// the *sum* of payoffs to each parameter.
///
/// The adjoints live on the tape of the thread that ran the driver; read
/// them (or call [`AadResults::sensitivities`]) from that thread, before
/// the next derivative-recording simulation rewinds the tape.
pub struct AadResults {
    /// Pathwise payoffs, as plain values.
    pub payoffs: Vec<f64>,
    /// Model clone carrying accumulated parameter adjoints.
    pub model: Box<dyn Model<Number>>,
    n_path: usize,
}

impl AadResults {
    pub(crate) fn new(payoffs: Vec<f64>, model: Box<dyn Model<Number>>) -> Self {
        let n_path = payoffs.len();
        Self {
            payoffs,
            model,
            n_path,
        }
    }

    /// Number of simulated paths.
    pub fn n_path(&self) -> usize {
        self.n_path
    }

    /// Sample statistics of the pathwise payoffs.
    pub fn estimate(&self) -> McEstimate {
        McEstimate::from_payoffs(&self.payoffs)
    }

    /// Derivatives of the Monte-Carlo mean with respect to each model
    /// parameter, in [`Model::parameters`] order.
    pub fn sensitivities(&self) -> Vec<f64> {
        let scale = 1.0 / self.n_path as f64;
        self.model
            .parameters()
            .iter()
            .map(|p| p.adjoint() * scale)
            .collect()
    }
}

/// Runs the derivative-recording setup protocol on the calling thread's
/// tape: full rewind, parameter registration, model init (so init-time
/// arithmetic depends on the parameter leaves), then the mark. The RNG
/// clone is returned uninitialized; callers configure it once the model
/// dimension is validated.
pub(crate) fn setup_aad(
    product_timeline: &[Time],
    model: &dyn Model<Number>,
    rng: &dyn GaussianRng,
) -> (Box<dyn Model<Number>>, Box<dyn GaussianRng>) {
    let mut mdl = model.clone_box();
    let rng = rng.clone_box();

    tape::rewind();
    mdl.put_on_tape();
    mdl.init(product_timeline);
    tape::mark();

    (mdl, rng)
}

/// Sequential Monte-Carlo valuation with path-wise reverse-mode
/// differentiation.
///
/// Each path is recorded past the tape mark, back-propagated into the
/// parameter adjoints, and released by rewinding to the mark, so tape
/// memory stays bounded by a single path regardless of `n_path`. One final
/// sweep of the pre-mark segment pushes the accumulated mark-level
/// adjoints down to the parameter leaves.
pub fn mc_simul_aad(
    product: &dyn Product<Number>,
    model: &dyn Model<Number>,
    rng: &dyn GaussianRng,
    n_path: usize,
    antithetic: bool,
) -> Result<AadResults, SimulationError> {
    validate_request(product, n_path)?;

    let (mdl, mut rng) = setup_aad(product.timeline(), model, rng);
    let dim = mdl.sim_dim();
    check_sim_dim(dim)?;
    rng.init(dim);

    let mut gauss = vec![0.0; dim];
    let mut path = vec![
        Scenario {
            spot: Number::new(0.0)
        };
        product.timeline().len()
    ];
    let mut payoffs = vec![0.0; n_path];

    let mut anti_path = false;
    for slot in payoffs.iter_mut() {
        // Parameters stay on tape; the previous path's nodes are released.
        tape::rewind_to_mark();

        next_gaussians(&mut *rng, &mut gauss, antithetic, &mut anti_path);
        mdl.generate_path(&gauss, &mut path);
        let result = product.payoff(&path);

        // No reset: parameter adjoints accumulate across paths.
        result.propagate_to_mark(false);
        *slot = result.value();
    }

    Number::propagate_mark_to_start();

    Ok(AadResults::new(payoffs, mdl))
}
