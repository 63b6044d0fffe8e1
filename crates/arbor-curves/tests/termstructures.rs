//! Integration tests: decorators over real curves.
//!
//! The base curves are backward-flat forward curves built from a November
//! 2017 market snapshot (instantaneous forwards, Actual/365 Fixed).

use std::rc::Rc;

use arbor_core::prelude::*;
use arbor_curves::prelude::*;

const TOLERANCE: f64 = 1.0e-10;

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::from_ymd(y, m, d).unwrap()
}

fn first_curve() -> Rc<dyn YieldTermStructure> {
    let dates = vec![
        date(2017, 11, 10),
        date(2017, 11, 13),
        date(2018, 2, 12),
        date(2018, 5, 10),
        date(2018, 8, 10),
        date(2018, 11, 12),
        date(2018, 12, 21),
        date(2020, 1, 15),
        date(2021, 3, 31),
        date(2023, 2, 28),
        date(2026, 12, 21),
        date(2030, 1, 31),
        date(2031, 2, 28),
        date(2036, 3, 31),
        date(2041, 2, 28),
        date(2048, 2, 28),
        date(2141, 12, 31),
    ];
    let forwards = vec![
        0.0655823213132524,
        0.0655823213132524,
        0.0699455024156877,
        0.0799107139233497,
        0.0813931951022577,
        0.0841615820666691,
        0.0501297919004145,
        0.0823483583439658,
        0.0860720030924466,
        0.0922887604375688,
        0.10588902278996,
        0.117021968693922,
        0.109824660896137,
        0.109231572878364,
        0.119218123236241,
        0.128647300167664,
        0.0506086995288751,
    ];
    Rc::new(
        InterpolatedForwardCurve::new(dates, forwards, DayCountConvention::Act365Fixed).unwrap(),
    )
}

fn second_curve() -> Rc<dyn YieldTermStructure> {
    let dates = vec![
        date(2017, 11, 10),
        date(2017, 11, 13),
        date(2017, 12, 11),
        date(2018, 2, 12),
        date(2018, 5, 10),
        date(2022, 1, 31),
        date(2023, 12, 7),
        date(2025, 1, 31),
        date(2028, 3, 31),
        date(2033, 12, 7),
        date(2038, 2, 1),
        date(2046, 4, 2),
        date(2051, 1, 2),
        date(2141, 12, 31),
    ];
    let forwards = vec![
        0.056656806197189,
        0.056656806197189,
        0.0419541633454473,
        0.0286681050019797,
        0.0148840226959593,
        0.0246680238374363,
        0.0255349067810599,
        0.0298907184711927,
        0.0263943927922053,
        0.0291924526539802,
        0.0270049276163556,
        0.028775807327614,
        0.0293567711641792,
        0.010518655099659,
    ];
    Rc::new(
        InterpolatedForwardCurve::new(dates, forwards, DayCountConvention::Act365Fixed).unwrap(),
    )
}

fn quote(value: f64) -> (Rc<SimpleQuote>, Handle<dyn Quote>) {
    let quote = Rc::new(SimpleQuote::new(value));
    let as_quote: Rc<dyn Quote> = quote.clone();
    (quote, Handle::new(as_quote))
}

#[test]
fn test_reference_change() {
    let today = date(2025, 3, 3);
    let evaluation = Rc::new(EvaluationDate::new(today));
    let (rate, rate_handle) = quote(0.0);
    let curve = FlatForward::moving(
        Rc::clone(&evaluation),
        2,
        rate_handle,
        DayCountConvention::Act360,
        Compounding::Continuous,
    );
    rate.set_value(0.03);

    let days = [10, 30, 60, 120, 360, 720];
    let expected: Vec<f64> = days
        .iter()
        .map(|&n| curve.discount(today.add_days(n)).unwrap())
        .collect();

    evaluation.set(today.add_days(30));
    for (&n, expected) in days.iter().zip(&expected) {
        let calculated = curve.discount(today.add_days(30 + n)).unwrap();
        assert_eq!(calculated, *expected, "discount at {n} days");
    }
}

#[test]
fn test_implied() {
    let base = first_curve();
    let today = base.reference_date().unwrap();
    let new_settlement = today.add_years(3).unwrap().add_days(2);
    let test_date = new_settlement.add_years(5).unwrap();

    let implied = ImpliedTermStructure::new(Handle::new(Rc::clone(&base)), new_settlement);

    let base_discount = base.discount(new_settlement).unwrap();
    let discount = base.discount(test_date).unwrap();
    let implied_discount = implied.discount(test_date).unwrap();
    assert!(
        (discount - base_discount * implied_discount).abs() < TOLERANCE,
        "calculated {}, expected {discount}",
        base_discount * implied_discount
    );
}

#[test]
fn test_implied_observability() {
    let h: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
    let implied = ImpliedTermStructure::new(h.handle(), date(2020, 11, 12));
    let flag = Rc::new(Flag::new());
    register_with(&flag, &*implied).unwrap();

    h.link_to(Some(first_curve()));
    assert!(flag.is_up(), "observer was not notified of term structure change");
}

#[test]
fn test_forward_spreaded() {
    let base = first_curve();
    let (spread, spread_handle) = quote(0.01);
    let spreaded = ForwardSpreadedTermStructure::new(Handle::new(Rc::clone(&base)), spread_handle);

    let test_date = base.reference_date().unwrap().add_years(5).unwrap();
    let base_dc = base.day_counter().unwrap();
    let spreaded_dc = spreaded.day_counter().unwrap();
    let forward = base
        .forward_rate(test_date, test_date, base_dc, Compounding::Continuous)
        .unwrap()
        .rate();
    let spreaded_forward = spreaded
        .forward_rate(test_date, test_date, spreaded_dc, Compounding::Continuous)
        .unwrap()
        .rate();

    let spread = spread.value().unwrap();
    assert!(
        (forward - (spreaded_forward - spread)).abs() < TOLERANCE,
        "calculated {}, expected {forward}",
        spreaded_forward - spread
    );
}

#[test]
fn test_forward_spreaded_observability() {
    let (spread, spread_handle) = quote(0.01);
    let h: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
    let spreaded = ForwardSpreadedTermStructure::new(h.handle(), spread_handle);
    let flag = Rc::new(Flag::new());
    register_with(&flag, &*spreaded).unwrap();

    h.link_to(Some(first_curve()));
    assert!(flag.is_up(), "observer was not notified of term structure change");
    flag.lower();
    spread.set_value(0.005);
    assert!(flag.is_up(), "observer was not notified of spread change");
}

#[test]
fn test_zero_spreaded() {
    let base = first_curve();
    let (spread, spread_handle) = quote(0.01);
    let spreaded = ZeroSpreadedTermStructure::new(Handle::new(Rc::clone(&base)), spread_handle);

    let test_date = base.reference_date().unwrap().add_years(5).unwrap();
    let dc = base.day_counter().unwrap();
    let zero = base
        .zero_rate(test_date, dc, Compounding::Continuous)
        .unwrap()
        .rate();
    let spreaded_zero = spreaded
        .zero_rate(test_date, dc, Compounding::Continuous)
        .unwrap()
        .rate();

    let spread = spread.value().unwrap();
    assert!(
        (zero - (spreaded_zero - spread)).abs() < TOLERANCE,
        "calculated {}, expected {zero}",
        spreaded_zero - spread
    );
}

#[test]
fn test_zero_spreaded_observability() {
    let (spread, spread_handle) = quote(0.01);
    let h = RelinkableHandle::new(second_curve());
    let spreaded = ZeroSpreadedTermStructure::new(h.handle(), spread_handle);
    let flag = Rc::new(Flag::new());
    register_with(&flag, &*spreaded).unwrap();

    h.link_to(Some(first_curve()));
    assert!(flag.is_up(), "observer was not notified of term structure change");
    assert_eq!(flag.times_raised(), 1);
    flag.lower();
    spread.set_value(0.005);
    assert!(flag.is_up(), "observer was not notified of spread change");
}

#[test]
fn test_create_with_null_underlying() {
    let (_spread, spread_handle) = quote(0.01);
    let underlying: RelinkableHandle<dyn YieldTermStructure> = RelinkableHandle::empty();
    let spreaded = ZeroSpreadedTermStructure::new(underlying.handle(), spread_handle);
    assert_eq!(spreaded.reference_date(), Err(CurveError::NoUnderlyingCurve));

    underlying.link_to(Some(first_curve()));
    assert_eq!(spreaded.reference_date().unwrap(), date(2017, 11, 10));
}

#[test]
fn test_link_to_null_underlying() {
    let (_spread, spread_handle) = quote(0.01);
    let underlying = RelinkableHandle::new(first_curve());
    let spreaded = ZeroSpreadedTermStructure::new(underlying.handle(), spread_handle);
    assert!(spreaded.reference_date().is_ok());

    let flag = Rc::new(Flag::new());
    register_with(&flag, &*spreaded).unwrap();
    underlying.link_to(None);
    assert!(flag.is_up());
    assert_eq!(spreaded.reference_date(), Err(CurveError::NoUnderlyingCurve));
}

#[test]
fn test_composite_zero_yield_structures() {
    let composite = CompositeZeroYieldStructure::new(
        Handle::new(first_curve()),
        Handle::new(second_curve()),
        |x: f64, y: f64| x - y,
    );

    let expected = [
        (date(2017, 11, 10), 0.00892551511527986),
        (date(2017, 12, 15), 0.0412773974133423),
        (date(2018, 6, 15), 0.0567251712638837),
        (date(2029, 9, 15), 0.0878295160422323),
        (date(2038, 9, 15), 0.0904423159037861),
        (date(2046, 3, 15), 0.0998714928415959),
        (date(2141, 12, 15), 0.0400900444382439),
    ];

    for (d, expected) in expected {
        let actual = composite
            .forward_rate(d, d, DayCountConvention::Act365Fixed, Compounding::Continuous)
            .unwrap()
            .rate();
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "{d}: calculated {actual}, expected {expected}"
        );
    }
}
