use approx::assert_relative_eq;
use despac_warrant::core::{PricingEngine, PricingResult, ValuationConfig, from_json, to_json_pretty};
use despac_warrant::engines::monte_carlo::{GridPoint, GridValuation, WarrantMcEngine};
use despac_warrant::instruments::{DespacWarrant, RedemptionTerms};
use despac_warrant::market::Market;
use despac_warrant::math::FastRngKind;
use serde_json::Value;

#[test]
fn full_config_document_roundtrips() {
    let cfg = ValuationConfig {
        engine: WarrantMcEngine::default()
            .with_num_paths(5_000)
            .with_seed(99)
            .with_rng_kind(FastRngKind::StdRng)
            .config,
        warrant: DespacWarrant {
            strike: 11.5,
            expiry: 3.0,
            lockout_days: 12,
            redemption: RedemptionTerms {
                barrier: 18.0,
                window: 30,
                trigger_count: 20,
                delay: 30,
            },
        },
        rate: 0.04,
    };
    let json = to_json_pretty(&cfg).unwrap();
    let decoded: ValuationConfig = from_json(&json).unwrap();
    assert_eq!(decoded, cfg);

    let raw: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(raw["engine"]["rng_kind"], "std_rng");
    assert_eq!(raw["warrant"]["redemption"]["delay"], 30);
}

#[test]
fn config_drives_a_valuation() {
    let cfg: ValuationConfig = from_json(
        r#"{ "engine": { "num_paths": 400, "seed": 5 }, "warrant": { "lockout_days": 3 } }"#,
    )
    .unwrap();
    let engine = WarrantMcEngine::new(cfg.engine);
    let result = engine
        .price(&cfg.warrant_for(1.0), &cfg.market_for(14.0, 0.3))
        .unwrap();
    let direct = WarrantMcEngine::default()
        .with_num_paths(400)
        .with_seed(5)
        .price(
            &DespacWarrant::builder().expiry(1.0).lockout_days(3).build().unwrap(),
            &Market::builder().spot(14.0).flat_vol(0.3).build().unwrap(),
        )
        .unwrap();
    assert_eq!(result, direct);
}

#[test]
fn pricing_result_serializes_diagnostics_as_a_map() {
    let result: PricingResult = WarrantMcEngine::default()
        .with_num_paths(100)
        .price(
            &DespacWarrant::standard(1.0),
            &Market::builder().spot(14.0).flat_vol(0.3).build().unwrap(),
        )
        .unwrap();
    let raw: Value = serde_json::from_str(&to_json_pretty(&result).unwrap()).unwrap();
    assert_relative_eq!(raw["price"].as_f64().unwrap(), result.price, max_relative = 1e-15);
    assert_relative_eq!(
        raw["stderr"].as_f64().unwrap(),
        result.stderr.unwrap(),
        max_relative = 1e-15
    );
    assert_eq!(raw["diagnostics"]["num_paths"].as_f64(), Some(100.0));
    assert_eq!(raw["diagnostics"]["num_steps"].as_f64(), Some(252.0));
    assert!(raw["diagnostics"]["discount_factor"].as_f64().is_some());
}

#[test]
fn grid_valuation_flattens_its_point() {
    let v = GridValuation {
        point: GridPoint {
            spot: 14.0,
            expiry: 2.0,
            vol: 0.3,
        },
        price: 4.0,
        stderr: 0.01,
    };
    let raw: Value = serde_json::from_str(&to_json_pretty(&v).unwrap()).unwrap();
    assert_eq!(raw["spot"], 14.0);
    assert_eq!(raw["expiry"], 2.0);
    assert_eq!(raw["price"], 4.0);
    let back: GridValuation = from_json(&raw.to_string()).unwrap();
    assert_eq!(back, v);
}
