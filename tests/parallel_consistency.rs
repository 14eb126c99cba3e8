//! Sequential vs parallel agreement, with and without derivative recording.

use approx::assert_relative_eq;
use pathwise::math::aad::Number;
use pathwise::mc::{mc_parallel_simul, mc_parallel_simul_aad, mc_simul, mc_simul_aad};
use pathwise::models::{BlackScholes, MertonJump};
use pathwise::products::EuropeanCall;
use pathwise::rng::{SobolNormal, XoshiroNormal};

#[test]
fn parallel_output_is_bit_identical_under_sobol() {
    let product = EuropeanCall::new(100.0, 1.0);
    let model = BlackScholes::<f64>::new(100.0, 0.2);
    let rng = SobolNormal::new(2048);

    let sequential = mc_simul(&product, &model, &rng, 2048, false).unwrap();
    let parallel = mc_parallel_simul(&product, &model, &rng, 2048, false).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_output_is_bit_identical_with_antithetic_and_ragged_batches() {
    let product = EuropeanCall::new(100.0, 1.0);
    let model = BlackScholes::<f64>::new(100.0, 0.2);
    let rng = SobolNormal::new(5);

    // 1000 is not a multiple of the batch size; the tail batch is short.
    let sequential = mc_simul(&product, &model, &rng, 1000, true).unwrap();
    let parallel = mc_parallel_simul(&product, &model, &rng, 1000, true).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn functional_skip_gives_the_same_paths_as_sequential_draws() {
    let product = EuropeanCall::new(100.0, 1.0);
    let model = BlackScholes::<f64>::new(100.0, 0.2);
    let rng = XoshiroNormal::new(12);

    let sequential = mc_simul(&product, &model, &rng, 300, true).unwrap();
    let parallel = mc_parallel_simul(&product, &model, &rng, 300, true).unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_aad_agrees_with_sequential_aad() {
    let product = EuropeanCall::new(100.0, 1.0);
    let model = BlackScholes::<Number>::new(100.0, 0.2);
    let rng = SobolNormal::new(77);

    let sequential = mc_simul_aad(&product, &model, &rng, 4096, true).unwrap();
    // Sensitivities live on the calling thread's tape; read them before the
    // parallel run rewinds it.
    let s = sequential.sensitivities();

    let parallel = mc_parallel_simul_aad(&product, &model, &rng, 4096, true).unwrap();
    let p = parallel.sensitivities();

    assert_eq!(sequential.payoffs, parallel.payoffs);
    for (a, b) in s.iter().zip(p.iter()) {
        // Identical pathwise contributions, reduction order differs.
        assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
    }
}

#[test]
fn parallel_aad_handles_many_parameters() {
    let product = EuropeanCall::new(100.0, 1.0);
    let model = MertonJump::<Number>::new(100.0, 0.15, 0.8, -0.05, 0.1);
    let rng = XoshiroNormal::new(13);

    let sequential = mc_simul_aad(&product, &model, &rng, 2000, false).unwrap();
    let s = sequential.sensitivities();

    let parallel = mc_parallel_simul_aad(&product, &model, &rng, 2000, false).unwrap();
    let p = parallel.sensitivities();

    assert_eq!(sequential.payoffs, parallel.payoffs);
    assert_eq!(s.len(), 4);
    for (a, b) in s.iter().zip(p.iter()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-9, max_relative = 1e-9);
    }
}
