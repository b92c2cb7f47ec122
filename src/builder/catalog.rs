//! Force inputs shared by both propagators
//!
//! The catalog resolves every configured perturbation once (ephemerides,
//! atmosphere, spacecraft coefficients, empirical accelerations). The
//! numerical and DSST stacks are then two views of the same catalog, so
//! they cannot disagree on what is modelled.

use std::sync::Arc;

use crate::config::ComparisonSettings;
use crate::error::Result;
use crate::propagation::atmosphere::{AtmosphereModel, Nrlmsise00};
use crate::propagation::bodies::{BodyEphemeris, CelestialBody};
use crate::propagation::dsst::{DsstForceModel, DsstNewtonian, DsstTesseral, DsstZonal, GaussianContribution};
use crate::propagation::forces::{
    ForceModel, HolmesFeatherstoneAttraction, IsotropicDrag, NewtonianAttraction, PolynomialAcceleration, Relativity,
    SolarRadiationPressure, SolidTides, ThirdBodyAttraction,
};
use crate::propagation::state::WGS84_EARTH_ANGULAR_VELOCITY;

use super::environment::Environment;

/// Samples per orbit when averaging the relativistic and empirical accelerations
const EXTRA_POINTS: usize = 48;

/// Highest mean-anomaly harmonic kept for those accelerations
const EXTRA_HARMONICS: usize = 12;

struct ThirdBody {
    ephemeris: BodyEphemeris,
    with_solid_tides: bool,
}

pub struct ForceCatalog<'a> {
    environment: &'a Environment,
    non_spherical: bool,
    drag: Option<IsotropicDrag>,
    srp: Option<SolarRadiationPressure>,
    third_bodies: Vec<ThirdBody>,
    /// Relativity and polynomial accelerations, in configuration order
    extras: Vec<Arc<dyn ForceModel>>,
}

fn ephemeris(settings: &ComparisonSettings, body: CelestialBody) -> Result<BodyEphemeris> {
    let ephemeris = BodyEphemeris::new(body, settings.ephemeris);
    ephemeris.validate()?;
    Ok(ephemeris)
}

impl<'a> ForceCatalog<'a> {
    /// Resolve the configured perturbations against `environment`
    ///
    /// Fails on an ephemeris the selected source cannot provide.
    pub fn build(settings: &ComparisonSettings, environment: &'a Environment) -> Result<Self> {
        let forces = &settings.forces;

        let drag = forces.drag.map(|d| {
            let atmosphere: Arc<dyn AtmosphereModel> = Arc::new(Nrlmsise00::new(environment.body));
            IsotropicDrag::new(atmosphere, environment.body_frame, d.area, d.cd)
        });

        let srp = match forces.srp {
            Some(s) => Some(SolarRadiationPressure::new(
                ephemeris(settings, CelestialBody::Sun)?,
                environment.normalized.ae,
                s.area,
                s.cr,
            )),
            None => None,
        };

        let third_bodies = forces
            .third_bodies
            .iter()
            .map(|third_body| -> Result<ThirdBody> {
                Ok(ThirdBody {
                    ephemeris: ephemeris(settings, third_body.body)?,
                    with_solid_tides: third_body.with_solid_tides,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut extras: Vec<Arc<dyn ForceModel>> = Vec::new();
        if forces.relativity {
            extras.push(Arc::new(Relativity::new(environment.mu())));
        }
        for polynomial in &forces.polynomial {
            extras.push(Arc::new(PolynomialAcceleration::new(
                polynomial.name.clone(),
                polynomial.direction,
                polynomial.coefficients.clone(),
                environment.initial_orbit.date(),
            )));
        }

        Ok(Self {
            environment,
            non_spherical: forces.gravity_degree > 0,
            drag,
            srp,
            third_bodies,
            extras,
        })
    }

    /// Bodies raising solid tides on the central body
    pub fn tide_bodies(&self) -> Vec<BodyEphemeris> {
        self.third_bodies
            .iter()
            .filter(|b| b.with_solid_tides)
            .map(|b| b.ephemeris.clone())
            .collect()
    }

    /// Acceleration models for the Cowell propagator
    ///
    /// Order: drag, third bodies, solid tides, SRP, non-spherical gravity,
    /// relativity and polynomial accelerations, Newtonian attraction last.
    pub fn as_numerical(&self) -> Vec<Box<dyn ForceModel>> {
        let environment = self.environment;
        let mut models: Vec<Box<dyn ForceModel>> = Vec::new();

        if let Some(drag) = &self.drag {
            models.push(Box::new(drag.clone()));
        }
        for third_body in &self.third_bodies {
            models.push(Box::new(ThirdBodyAttraction::new(third_body.ephemeris.clone())));
        }

        let tide_bodies = self.tide_bodies();
        if !tide_bodies.is_empty() {
            let field = &environment.normalized;
            models.push(Box::new(SolidTides::new(
                environment.body_frame,
                field.ae,
                field.mu,
                field.tide_system,
                tide_bodies,
            )));
        }

        if let Some(srp) = &self.srp {
            models.push(Box::new(srp.clone()));
        }
        if self.non_spherical {
            models.push(Box::new(HolmesFeatherstoneAttraction::new(
                environment.body_frame,
                &environment.normalized,
            )));
        }
        for extra in &self.extras {
            models.push(Box::new(Arc::clone(extra)));
        }
        models.push(Box::new(NewtonianAttraction::new(environment.mu())));
        models
    }

    /// Mean-element contributions for the DSST propagator
    ///
    /// Order: drag, SRP, third bodies, tesseral and zonal harmonics,
    /// relativity and polynomial accelerations, Newtonian term last. Third
    /// bodies raise no solid tides here.
    pub fn as_dsst(&self) -> Result<Vec<Box<dyn DsstForceModel>>> {
        let environment = self.environment;
        let mu = environment.mu();
        let mut models: Vec<Box<dyn DsstForceModel>> = Vec::new();

        if let Some(drag) = &self.drag {
            models.push(Box::new(GaussianContribution::drag(
                drag.clone(),
                environment.body.equatorial_radius,
                mu,
            )));
        }
        if let Some(srp) = &self.srp {
            models.push(Box::new(GaussianContribution::solar_radiation_pressure(srp.clone(), mu)));
        }
        for third_body in &self.third_bodies {
            let attraction = ThirdBodyAttraction::new(third_body.ephemeris.clone());
            models.push(Box::new(GaussianContribution::third_body(attraction, mu)));
        }

        models.push(Box::new(DsstTesseral::new(
            environment.body_frame,
            WGS84_EARTH_ANGULAR_VELOCITY,
            &environment.unnormalized,
            &environment.initial_orbit,
        )?));
        models.push(Box::new(DsstZonal::new(environment.body_frame, &environment.unnormalized)));

        for extra in &self.extras {
            let label = if extra.name() == "Relativity" {
                "DSST relativity"
            } else {
                "DSST polynomial acceleration"
            };
            models.push(Box::new(GaussianContribution::new(
                label,
                Arc::clone(extra),
                mu,
                EXTRA_POINTS,
                EXTRA_HARMONICS,
            )));
        }

        models.push(Box::new(DsstNewtonian::new(mu)));
        Ok(models)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::TWO_BODY;
    use crate::config::OrbitComparatorInputs;
    use crate::data::DataContext;

    fn data() -> DataContext {
        let dir = std::env::temp_dir().join(format!("orbit-comparator-catalog-{}", std::process::id()));
        let _ = std::fs::create_dir_all(&dir);
        DataContext::new(dir)
    }

    fn settings(extra: &str) -> ComparisonSettings {
        let text = format!("{}{}", TWO_BODY, extra);
        OrbitComparatorInputs::from_yaml_str(&text).unwrap().validate().unwrap()
    }

    #[test]
    fn test_both_views_share_mu() {
        let settings = settings("  relativity:\n    isUsed: true\n");
        let environment = Environment::build(&settings, &data()).unwrap();
        let catalog = ForceCatalog::build(&settings, &environment).unwrap();
        let mu = environment.mu();

        let numerical = catalog.as_numerical();
        assert!(numerical.iter().filter_map(|m| m.mu()).all(|m| m == mu));
        let dsst = catalog.as_dsst().unwrap();
        assert!(dsst.iter().filter_map(|m| m.mu()).all(|m| m == mu));
        assert_eq!(environment.initial_orbit.mu(), mu);
    }

    #[test]
    fn test_srp_shadow_uses_field_radius() {
        let environment = Environment::build(&settings(""), &data()).unwrap();
        let settings = settings("  solarRadiationPressure:\n    area: 2.0\n    cr: 1.3\n");
        let catalog = ForceCatalog::build(&settings, &environment).unwrap();
        let srp = catalog.srp.as_ref().unwrap();
        assert_eq!(srp.occulting_radius(), environment.normalized.ae);
        assert_ne!(srp.occulting_radius(), environment.body.equatorial_radius);
    }

    #[test]
    fn test_tide_bodies() {
        let environment = Environment::build(&settings(""), &data()).unwrap();
        let settings = settings("  thirdBody:\n    - name: Sun\n      withSolidTides: true\n    - name: Moon\n");
        let catalog = ForceCatalog::build(&settings, &environment).unwrap();
        assert_eq!(catalog.tide_bodies().len(), 1);

        let names: Vec<&str> = catalog.as_dsst().unwrap().iter().map(|m| m.name()).collect();
        assert_eq!(names.iter().filter(|n| **n == "DSST third body").count(), 2, "{:?}", names);
    }
}
