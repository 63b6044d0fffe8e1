//! Integration tests: calibrating short-rate models to market instruments.
//!
//! Market prices come from reference models with known parameters, so a
//! successful calibration must recover those parameters.

use std::rc::Rc;

use approx::assert_relative_eq;
use arbor_core::prelude::*;
use arbor_curves::prelude::*;
use arbor_math::prelude::{BoundaryConstraint, EndCriteria, LevenbergMarquardt, Simplex};
use arbor_models::prelude::*;

fn today() -> Date {
    Date::from_ymd(2025, 1, 15).unwrap()
}

fn flat_handle(rate: f64) -> CurveHandle {
    let curve: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(today(), rate, DayCountConvention::Act365Fixed);
    Handle::new(curve)
}

fn tight() -> EndCriteria {
    EndCriteria::new(1000, 100, 1e-12, 1e-20, 1e-16)
}

/// (option type, strike, expiry, bond maturity)
const OPTIONS: [(OptionType, f64, f64, f64); 4] = [
    (OptionType::Call, 0.8, 1.0, 5.0),
    (OptionType::Call, 0.8, 2.0, 7.0),
    (OptionType::Put, 0.75, 3.0, 10.0),
    (OptionType::Call, 0.9, 0.5, 2.0),
];

fn option_helpers(
    reference: &dyn AffineModel,
    model: &Rc<HullWhite>,
    error_type: CalibrationErrorType,
) -> Vec<Rc<dyn CalibrationHelper>> {
    OPTIONS
        .iter()
        .map(|&(option_type, strike, expiry, bond)| {
            let helper = BondOptionHelper::from_reference_model(
                option_type,
                strike,
                expiry,
                bond,
                reference,
                Rc::clone(model) as Rc<dyn AffineModel>,
            )
            .unwrap()
            .with_error_type(error_type);
            Rc::new(helper) as Rc<dyn CalibrationHelper>
        })
        .collect()
}

fn rms(helpers: &[Rc<dyn CalibrationHelper>]) -> f64 {
    let sum: f64 = helpers
        .iter()
        .map(|h| h.calibration_error().unwrap().powi(2))
        .sum();
    (sum / helpers.len() as f64).sqrt()
}

#[test]
fn hull_white_recovers_reference_parameters() {
    let handle = flat_handle(0.04);
    let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
    let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
    let helpers = option_helpers(&*reference, &model, CalibrationErrorType::PriceError);

    let flag = Rc::new(Flag::new());
    register_with(&flag, &*model).unwrap();

    let report = model
        .calibrate(&helpers, &LevenbergMarquardt::new(), &tight(), None, &[])
        .unwrap();

    assert!(report.converged());
    assert_eq!(model.end_criteria(), report.end_criteria);
    assert_relative_eq!(model.a(), 0.1, epsilon = 1e-6);
    assert_relative_eq!(model.sigma(), 0.012, epsilon = 1e-8);
    assert!(report.rms_error < 1e-10);
    assert!(report.max_error >= report.rms_error);
    assert_eq!(report.parameters, model.params());
    assert_eq!(report.errors.len(), helpers.len());

    // Candidates never notify; the committed result notifies exactly once.
    assert_eq!(flag.times_raised(), 1);
}

#[test]
fn hull_white_relative_errors() {
    let handle = flat_handle(0.04);
    let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
    let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
    let helpers = option_helpers(
        &*reference,
        &model,
        CalibrationErrorType::RelativePriceError,
    );
    let before = rms(&helpers);

    let report = model
        .calibrate(&helpers, &LevenbergMarquardt::new(), &tight(), None, &[])
        .unwrap();

    assert!(report.converged());
    assert!(report.rms_error < 1e-5);
    assert!(report.rms_error < before);
    assert_relative_eq!(model.a(), 0.1, epsilon = 1e-4);
    assert_relative_eq!(model.sigma(), 0.012, epsilon = 1e-5);
}

#[test]
fn calibrated_hull_white_still_fits_its_curve() {
    let dates: Vec<Date> = [0, 1, 2, 5, 10, 30]
        .iter()
        .map(|&y| today().add_years(y).unwrap())
        .collect();
    let curve: Rc<dyn YieldTermStructure> = Rc::new(
        InterpolatedForwardCurve::new(
            dates,
            vec![0.031, 0.031, 0.034, 0.037, 0.041, 0.043],
            DayCountConvention::Act365Fixed,
        )
        .unwrap(),
    );
    let handle = Handle::new(Rc::clone(&curve));
    let reference = HullWhite::new(handle.clone(), 0.07, 0.01).unwrap();
    let model = HullWhite::new(handle, 0.2, 0.02).unwrap();
    let helpers = option_helpers(&*reference, &model, CalibrationErrorType::PriceError);

    model
        .calibrate(&helpers, &LevenbergMarquardt::new(), &tight(), None, &[])
        .unwrap();

    for t in [0.5, 3.0, 12.0, 25.0] {
        assert_relative_eq!(
            model.discount(t).unwrap(),
            curve.discount_t(t).unwrap(),
            max_relative = 1e-14
        );
    }
    let grid = TimeGrid::from_times(&[1.0, 5.0, 10.0], 40).unwrap();
    let tree = model.tree(&grid).unwrap();
    for i in 0..=grid.steps() {
        assert_relative_eq!(
            tree.discount_bond(i).unwrap(),
            curve.discount_t(grid.time(i)).unwrap(),
            epsilon = 1e-12
        );
    }
}

#[test]
fn vasicek_calibration_reduces_error() {
    let reference = Vasicek::new(0.04, 0.25, 0.055, 0.012, 0.1).unwrap();
    let model = Vasicek::new(0.04, 0.1, 0.04, 0.02, 0.0).unwrap();
    let helpers: Vec<Rc<dyn CalibrationHelper>> = [1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0]
        .iter()
        .map(|&t| {
            let price = reference.discount(t).unwrap();
            let helper =
                DiscountBondHelper::with_price(t, price, Rc::clone(&model) as Rc<dyn AffineModel>)
                    .unwrap();
            Rc::new(helper) as Rc<dyn CalibrationHelper>
        })
        .collect();
    let before = rms(&helpers);

    let simplex = Simplex::new(0.05).unwrap();
    let report = model
        .calibrate(&helpers, &simplex, &EndCriteria::default(), None, &[])
        .unwrap();

    assert!(report.rms_error < before);
    assert_relative_eq!(report.rms_error, rms(&helpers), max_relative = 1e-12);
    assert!(model.a() > 0.0 && model.sigma() > 0.0);
}

#[test]
fn extra_constraint_bounds_the_search() {
    let handle = flat_handle(0.04);
    let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
    let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
    let helpers = option_helpers(&*reference, &model, CalibrationErrorType::PriceError);

    let cap = BoundaryConstraint::new(0.0, 0.08).unwrap();
    model
        .calibrate(&helpers, &LevenbergMarquardt::new(), &tight(), Some(&cap), &[])
        .unwrap();

    assert!(model.a() <= 0.08);
    assert!(model.sigma() <= 0.08);
}

#[test]
fn calibration_driven_by_config() {
    let handle = flat_handle(0.04);
    let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
    let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
    let helpers = option_helpers(&*reference, &model, CalibrationErrorType::PriceError);

    let config = CalibrationConfig::from_toml_str(
        r#"
        weights = [1.0, 1.0, 2.0, 0.5]

        [method]
        type = "levenberg_marquardt"

        [end_criteria]
        root_epsilon = 1e-12
        function_epsilon = 1e-20
        gradient_norm_epsilon = 1e-16
        "#,
    )
    .unwrap();
    let method = config.build_method().unwrap();
    let report = model
        .calibrate(
            &helpers,
            method.as_ref(),
            &config.end_criteria,
            None,
            config.weights(),
        )
        .unwrap();

    assert!(report.converged());
    assert_relative_eq!(model.a(), 0.1, epsilon = 1e-5);
}

#[test]
fn helper_failure_aborts_calibration() {
    let handle = flat_handle(0.04);
    let reference = HullWhite::new(handle.clone(), 0.1, 0.012).unwrap();
    let model = HullWhite::new(handle, 0.05, 0.008).unwrap();
    let mut helpers = option_helpers(&*reference, &model, CalibrationErrorType::PriceError);

    let missing: RelinkableHandle<dyn Quote> = RelinkableHandle::empty();
    let broken =
        DiscountBondHelper::new(3.0, missing.handle(), Rc::clone(&model) as Rc<dyn AffineModel>)
            .unwrap();
    helpers.push(Rc::new(broken));

    let flag = Rc::new(Flag::new());
    register_with(&flag, &*model).unwrap();

    let result = model.calibrate(&helpers, &LevenbergMarquardt::new(), &tight(), None, &[]);
    assert!(matches!(
        result,
        Err(ModelError::Core(ArborError::EmptyHandle { .. }))
    ));
    assert_eq!(model.params(), vec![0.05, 0.008]);
    assert!(!flag.is_up());
}

#[test]
fn set_params_round_trip_is_exact() {
    let model = HullWhite::new(flat_handle(0.03), 0.0731, 0.0117).unwrap();
    let flag = Rc::new(Flag::new());
    register_with(&flag, &*model).unwrap();

    let before = model.params();
    let phi = model.phi(4.0).unwrap();
    model.set_params(&before).unwrap();

    let after = model.params();
    assert_eq!(
        before.iter().map(|p| p.to_bits()).collect::<Vec<_>>(),
        after.iter().map(|p| p.to_bits()).collect::<Vec<_>>()
    );
    assert_eq!(model.phi(4.0).unwrap(), phi);
    assert!(!flag.is_up());
    assert!(model.set_params(&[0.1]).is_err());
}

#[test]
fn curve_relink_propagates_to_helpers() {
    let curve: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
    let model = HullWhite::new(curve.handle(), 0.1, 0.01).unwrap();
    let helper = DiscountBondHelper::with_price(
        5.0,
        (-0.2_f64).exp(),
        Rc::clone(&model) as Rc<dyn AffineModel>,
    )
    .unwrap()
    .with_error_type(CalibrationErrorType::PriceError);

    assert!(helper.calibration_error().is_err());

    let linked: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(today(), 0.04, DayCountConvention::Act365Fixed);
    curve.link_to(Some(linked));
    assert_relative_eq!(helper.calibration_error().unwrap(), 0.0, epsilon = 1e-14);
}
