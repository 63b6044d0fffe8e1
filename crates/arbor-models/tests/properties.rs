//! Property tests for parameter constraints and affine bond prices.

use std::rc::Rc;

use arbor_core::prelude::*;
use arbor_curves::prelude::*;
use arbor_math::prelude::{BoundaryConstraint, Constraint, NoConstraint, PositiveConstraint};
use arbor_models::prelude::*;
use proptest::prelude::*;

fn parameters() -> Vec<Parameter> {
    vec![
        Parameter::constant(0.1, PositiveConstraint).unwrap(),
        Parameter::piecewise_constant(
            vec![1.0, 2.0],
            vec![0.2, 0.3, 0.4],
            BoundaryConstraint::new(0.0, 1.0).unwrap(),
        )
        .unwrap(),
        Parameter::null(),
        Parameter::constant(-0.5, NoConstraint).unwrap(),
    ]
}

proptest! {
    #[test]
    fn composed_constraint_is_conjunction_of_slices(
        x in prop::collection::vec(-2.0f64..2.0, 5)
    ) {
        let composed = ParameterConstraint::new(&parameters());
        prop_assert_eq!(composed.size(), 5);

        let expected = PositiveConstraint.test(&x[0..1])
            && BoundaryConstraint::new(0.0, 1.0).unwrap().test(&x[1..4])
            && NoConstraint.test(&x[4..5]);
        prop_assert_eq!(composed.test(&x), expected);
    }

    #[test]
    fn composed_bounds_are_concatenated(x in prop::collection::vec(0.01f64..0.99, 5)) {
        let composed = ParameterConstraint::new(&parameters());
        let upper = composed.upper_bound(&x);
        let lower = composed.lower_bound(&x);
        prop_assert_eq!(upper.len(), 5);
        prop_assert_eq!(lower.len(), 5);
        prop_assert_eq!(&upper[1..4], &[1.0, 1.0, 1.0][..]);
        prop_assert_eq!(&lower[1..4], &[0.0, 0.0, 0.0][..]);
    }

    #[test]
    fn vasicek_bond_prices_are_consistent(
        a in 0.01f64..1.0,
        sigma in 0.001f64..0.03,
        r0 in -0.01f64..0.08,
        t in 0.0f64..30.0,
    ) {
        let model = Vasicek::new(r0, a, 0.04, sigma, 0.0).unwrap();
        let discount = model.discount(t).unwrap();
        prop_assert!(discount > 0.0);
        prop_assert_eq!(discount, model.discount_bond(0.0, t, &[r0]).unwrap());
    }

    #[test]
    fn hull_white_reproduces_flat_curve(
        rate in -0.01f64..0.08,
        a in 0.001f64..1.0,
        sigma in 0.001f64..0.03,
        t in 0.0f64..30.0,
    ) {
        let reference = Date::from_ymd(2025, 1, 15).unwrap();
        let curve: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(reference, rate, DayCountConvention::Act365Fixed);
        let model = HullWhite::new(Handle::new(Rc::clone(&curve)), a, sigma).unwrap();
        let expected = curve.discount_t(t).unwrap();
        prop_assert!((model.discount(t).unwrap() - expected).abs() <= 1e-13 * expected);
    }
}
