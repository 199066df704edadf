//! Reproducibility and batch/incremental equivalence.
//!
//! Each test states a null hypothesis and the observation that would
//! falsify it.

use lorenz_engine::prelude::*;

const P: LorenzParameters = LorenzParameters::STANDARD;

// H0: generate returns something other than n+1 points starting at s0
// Falsification: check length and exact first element for several n
#[test]
fn h0_1_generate_length_and_initial_state() {
    let s0 = State::new(-3.25, 7.5, 12.0);
    for n in [0, 1, 2, 17, 1000] {
        let traj = generate(s0, 0.01, n, &P).unwrap();
        assert_eq!(traj.len(), n + 1, "length for n = {n}");
        assert_eq!(traj[0].state, s0);
        assert_eq!(traj[0].t.to_bits(), 0.0_f64.to_bits());
    }
}

// H0: repeated generate calls differ
// Falsification: compare two runs bitwise via serialized form
#[test]
fn h0_2_generate_is_bit_identical() {
    let a = generate(State::DEFAULT_INITIAL, 0.005, 3000, &P).unwrap();
    let b = generate(State::DEFAULT_INITIAL, 0.005, 3000, &P).unwrap();

    for (pa, pb) in a.iter().zip(b.iter()) {
        assert_eq!(pa.state.x.to_bits(), pb.state.x.to_bits());
        assert_eq!(pa.state.y.to_bits(), pb.state.y.to_bits());
        assert_eq!(pa.state.z.to_bits(), pb.state.z.to_bits());
        assert_eq!(pa.t.to_bits(), pb.t.to_bits());
    }
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

// H0: an RK4 step leaves the origin equilibrium
// Falsification: step from the origin and measure the displacement
#[test]
fn h0_3_origin_is_fixed() {
    let next = IntegratorMethod::Rk4.step(&State::origin(), &P, 0.01);
    assert!(next.norm() < 1e-12);

    let traj = generate(State::origin(), 0.01, 100, &P).unwrap();
    assert!(traj.states().all(|s| s.norm() < 1e-12));
}

// H0: advance(n) after reset produces a different history than generate
// Falsification: compare full retained history against the batch result
#[test]
fn h0_4_incremental_matches_batch() {
    let s0 = State::new(1.0, 1.0, 1.0);
    let mut sim = Simulation::builder()
        .dt(0.02)
        .history(HistoryPolicy::Unbounded)
        .seed(7)
        .build()
        .unwrap();
    sim.reset(s0.x, s0.y, s0.z);
    sim.advance(750).unwrap();

    let batch = generate(s0, 0.02, 750, &P).unwrap();
    assert_eq!(sim.snapshot(), batch);
}

// H0: splitting advance calls changes the result
// Falsification: advance in uneven chunks and compare against one call
#[test]
fn h0_5_chunked_advance_matches_single_call() {
    let build = || {
        Simulation::builder()
            .history(HistoryPolicy::Unbounded)
            .seed(1)
            .build()
            .unwrap()
    };
    let mut whole = build();
    whole.advance(600).unwrap();

    let mut chunked = build();
    for k in [1, 99, 250, 3, 247] {
        chunked.advance(k).unwrap();
    }

    assert_eq!(whole.snapshot(), chunked.snapshot());
    assert_eq!(whole.current_time().to_bits(), chunked.current_time().to_bits());
}

// H0: bounded history grows past M or loses the current state
// Falsification: advance well past M and inspect the retained tail
#[test]
fn h0_6_bounded_history_keeps_most_recent() {
    let m = 256;
    let mut sim = Simulation::builder()
        .history(HistoryPolicy::bounded(m).unwrap())
        .seed(3)
        .build()
        .unwrap();
    sim.advance(1000).unwrap();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.len(), m);
    assert_eq!(snapshot.last().unwrap().state, sim.current_state());
    assert_eq!(sim.evicted(), 1001 - m as u64);

    let batch = generate(State::DEFAULT_INITIAL, 0.01, 1000, &P).unwrap();
    assert_eq!(snapshot.points(), batch.tail(m));
}

// H0: perturb moves further than epsilon or keeps old history
// Falsification: perturb repeatedly and check the bound on each axis
#[test]
fn h0_7_perturb_bounds() {
    let mut sim = Simulation::builder().seed(11).build().unwrap();
    for eps in [1e-2, 1e-5, 0.5] {
        sim.advance(123).unwrap();
        let before = sim.current_state();
        let after = sim.perturb(eps).unwrap();

        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.current_state(), after);
        assert!(before.max_component_distance(&after) <= eps + 1e-12);
        assert!(sim.current_time().abs() < f64::EPSILON);
    }
}

// H0: seeded perturbation is not reproducible
// Falsification: two simulations with the same seed perturb differently
#[test]
fn h0_8_seeded_perturb_is_reproducible() {
    let run = |seed| {
        let mut sim = Simulation::builder().seed(seed).build().unwrap();
        sim.advance(200).unwrap();
        sim.perturb(1e-2).unwrap()
    };
    assert_eq!(run(42), run(42));
    assert_ne!(run(42), run(43));
}

// H0: invalid calls fail silently or panic
// Falsification: pass dt = 0, negative dt, NaN dt and k = 0
#[test]
fn h0_9_invalid_calls_are_rejected() {
    for dt in [0.0, -0.01, f64::NAN, f64::INFINITY] {
        let err = generate(State::DEFAULT_INITIAL, dt, 10, &P).unwrap_err();
        assert!(matches!(err, LorenzError::InvalidTimestep { .. }), "dt = {dt}");
        assert!(Simulation::new(State::DEFAULT_INITIAL, dt).is_err());
    }

    let mut sim = Simulation::builder().seed(1).build().unwrap();
    let err = sim.advance(0).unwrap_err();
    assert!(matches!(err, LorenzError::InvalidStepCount { .. }));
    assert!(err.is_invalid_call());
    assert_eq!(sim.history().len(), 1);
}

// H0: a simulation built from config differs from one built directly
// Falsification: build both ways and compare after advancing
#[test]
fn h0_10_config_matches_builder() {
    let config = EngineConfig::builder()
        .dt(0.005)
        .max_points(Some(500))
        .seed(99)
        .build();
    let mut from_config = Simulation::from_config(&config).unwrap();
    let mut direct = Simulation::builder()
        .dt(0.005)
        .history(HistoryPolicy::bounded(500).unwrap())
        .seed(99)
        .build()
        .unwrap();

    from_config.advance(800).unwrap();
    direct.advance(800).unwrap();
    assert_eq!(from_config.snapshot(), direct.snapshot());
    assert_eq!(from_config.perturb(1e-3).unwrap(), direct.perturb(1e-3).unwrap());
}
