//! The engine must reproduce a plain serial loop over the public kernels bit
//! for bit, whether or not the `parallel` feature is enabled.

use despac_warrant::core::PricingEngine;
use despac_warrant::engines::monte_carlo::{
    Discounter, ExerciseEngine, GridPoint, RedemptionTracker, WarrantMcEngine,
};
use despac_warrant::instruments::DespacWarrant;
use despac_warrant::market::Market;
use despac_warrant::math::{FastRng, FastRngKind, mean_and_stderr, stream_seed};
use despac_warrant::mc::PathSimulator;

fn serial_reference(
    warrant: &DespacWarrant,
    market: &Market,
    num_paths: usize,
    seed: u64,
    rng_kind: FastRngKind,
) -> (f64, f64) {
    let dt = 1.0 / 252.0;
    let steps = (warrant.expiry / dt).round() as usize;
    let sim = PathSimulator::new(market.spot, market.rate, market.vol, dt, steps);
    let tracker = RedemptionTracker::new(&warrant.redemption, warrant.lockout_days);
    let exercise = ExerciseEngine::new(warrant.strike, warrant.lockout_days);
    let disc = Discounter::per_step(market.rate, dt);

    let half = num_paths / 2;
    let mut base_pvs = Vec::with_capacity(half);
    let mut anti_pvs = Vec::with_capacity(half);
    let mut z = vec![0.0; steps];
    let mut counts = vec![0_u32; steps + 1];
    let mut cf = vec![0.0; steps + 1];
    let mut sr = vec![0_u8; steps + 1];
    let mut shared = FastRng::from_seed(rng_kind, seed);
    for pair in 0..half {
        let mut base = vec![0.0; steps + 1];
        let mut anti = vec![0.0; steps + 1];
        let simulated = if rng_kind.is_single_stream() {
            sim.simulate_pair_from(&mut shared, &mut z, &mut base, &mut anti)
        } else {
            let mut rng = FastRng::from_seed(rng_kind, stream_seed(seed, pair));
            sim.simulate_pair_from(&mut rng, &mut z, &mut base, &mut anti)
        };
        simulated.unwrap();
        for (row, out) in [(&mut base, &mut base_pvs), (&mut anti, &mut anti_pvs)] {
            tracker.apply(row, &mut counts);
            exercise.allocate(row, &mut cf, &mut sr);
            out.push(disc.present_value(&cf[1..]));
        }
    }
    base_pvs.extend(anti_pvs);
    mean_and_stderr(&base_pvs)
}

#[test]
fn engine_matches_serial_kernel_loop() {
    let warrant = DespacWarrant::standard(2.0);
    let market = Market::builder().spot(14.0).flat_vol(0.3).build().unwrap();
    for (seed, kind) in [
        (1234, FastRngKind::Xoshiro256PlusPlus),
        (42, FastRngKind::Pcg64),
        (7, FastRngKind::StdRng),
        (1234, FastRngKind::NumpyLegacy),
    ] {
        let result = WarrantMcEngine::default()
            .with_num_paths(1_000)
            .with_seed(seed)
            .with_rng_kind(kind)
            .price(&warrant, &market)
            .unwrap();
        let (price, stderr) = serial_reference(&warrant, &market, 1_000, seed, kind);
        assert_eq!(result.price, price, "seed={seed} kind={kind:?}");
        assert_eq!(result.stderr, Some(stderr), "seed={seed} kind={kind:?}");
    }
}

#[test]
fn engine_matches_serial_kernel_loop_with_lockout() {
    let warrant = DespacWarrant::builder()
        .expiry(1.0)
        .lockout_days(15)
        .build()
        .unwrap();
    let market = Market::builder()
        .spot(17.0)
        .rate(0.03)
        .flat_vol(0.5)
        .build()
        .unwrap();
    let result = WarrantMcEngine::default()
        .with_num_paths(600)
        .with_seed(99)
        .price(&warrant, &market)
        .unwrap();
    let (price, stderr) =
        serial_reference(&warrant, &market, 600, 99, FastRngKind::Xoshiro256PlusPlus);
    assert_eq!(result.price, price);
    assert_eq!(result.stderr, Some(stderr));
}

#[test]
fn grid_is_ordered_like_its_input() {
    let engine = WarrantMcEngine::default().with_num_paths(200);
    let points: Vec<GridPoint> = [10.0, 12.0, 14.0, 16.0, 18.0]
        .iter()
        .map(|&spot| GridPoint {
            spot,
            expiry: 1.0,
            vol: 0.3,
        })
        .collect();
    let grid = engine
        .price_grid(&DespacWarrant::standard(1.0), 0.05, &points)
        .unwrap();
    for (valuation, point) in grid.iter().zip(&points) {
        assert_eq!(&valuation.point, point);
    }
    // More valuable the higher the stock.
    assert!(grid.windows(2).all(|w| w[0].price < w[1].price));
}
