//! Property tests shared by all optimization methods.

use arbor_math::optimization::{
    BoundaryConstraint, Constraint, EndCriteria, LevenbergMarquardt, NoConstraint,
    OptimizationMethod, PositiveConstraint, Problem, ResidualFn, Simplex, SteepestDescent,
};
use proptest::prelude::*;

fn tight() -> EndCriteria {
    EndCriteria::new(5000, 50, 1e-12, 1e-20, 1e-14)
}

proptest! {
    #[test]
    fn levenberg_marquardt_recovers_shifted_bowl(a in -5.0f64..5.0, b in -5.0f64..5.0) {
        let cost = ResidualFn::new(move |x: &[f64]| vec![x[0] - a, x[1] - b]);
        let problem = Problem::new(&cost, &NoConstraint, vec![0.0, 0.0]);

        let result = LevenbergMarquardt::default().minimize(&problem, &tight()).unwrap();

        prop_assert!(result.converged());
        prop_assert!((result.parameters[0] - a).abs() < 1e-8);
        prop_assert!((result.parameters[1] - b).abs() < 1e-8);
    }

    #[test]
    fn simplex_recovers_shifted_bowl(a in -2.0f64..2.0, b in -2.0f64..2.0) {
        let cost = ResidualFn::new(move |x: &[f64]| vec![x[0] - a, 2.0 * (x[1] - b)]);
        let problem = Problem::new(&cost, &NoConstraint, vec![0.0, 0.0]);

        let result = Simplex::default().minimize(&problem, &tight()).unwrap();

        prop_assert!(result.converged());
        prop_assert!((result.parameters[0] - a).abs() < 1e-6);
        prop_assert!((result.parameters[1] - b).abs() < 1e-6);
    }

    #[test]
    fn every_method_stays_feasible(target in -3.0f64..3.0, start in 0.1f64..0.9) {
        let cost = ResidualFn::new(move |x: &[f64]| vec![x[0] - target]);
        let bounded = BoundaryConstraint::new(0.0, 1.0).unwrap();
        let methods: [&dyn OptimizationMethod; 3] =
            [&LevenbergMarquardt::default(), &Simplex::default(), &SteepestDescent::default()];

        for method in methods {
            let problem = Problem::new(&cost, &bounded, vec![start]);
            let result = method.minimize(&problem, &EndCriteria::default()).unwrap();
            prop_assert!(bounded.test(&result.parameters), "{} left the box", method.name());
        }
    }
}

#[test]
fn methods_never_evaluate_infeasible_points() {
    let cost = ResidualFn::new(|x: &[f64]| {
        assert!(x[0] > 0.0, "evaluated at {}", x[0]);
        vec![x[0].ln()]
    });
    let methods: [&dyn OptimizationMethod; 3] =
        [&LevenbergMarquardt::default(), &Simplex::default(), &SteepestDescent::default()];

    for method in methods {
        let problem = Problem::new(&cost, &PositiveConstraint, vec![0.05]);
        let result = method.minimize(&problem, &EndCriteria::default()).unwrap();
        assert!((result.parameters[0] - 1.0).abs() < 1e-3, "{}", method.name());
    }
}
