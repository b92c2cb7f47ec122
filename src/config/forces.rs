use nalgebra::Vector3;
use serde::Deserialize;

use super::null_as_default;
use crate::error::ConfigError;
use crate::propagation::bodies::CelestialBody;

/// `forceModels` block; every entry is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForceModelConfiguration {
    pub gravity: Option<GravityConfiguration>,
    pub third_body: Option<Vec<ThirdBodyConfiguration>>,
    pub drag: Option<DragConfiguration>,
    pub solar_radiation_pressure: Option<SolarRadiationPressureConfiguration>,
    pub relativity: Option<RelativityConfiguration>,
    pub ocean_tides: Option<OceanTidesConfiguration>,
    pub polynomial_acceleration: Option<Vec<PolynomialAccelerationConfiguration>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GravityConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub degree: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub order: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThirdBodyConfiguration {
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub with_solid_tides: bool,
}

/// Area in m²
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DragConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub cd: f64,
}

/// Area in m²
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolarRadiationPressureConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub area: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub cr: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelativityConfiguration {
    #[serde(rename = "isUsed", deserialize_with = "null_as_default")]
    pub is_used: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OceanTidesConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub degree: usize,
    #[serde(deserialize_with = "null_as_default")]
    pub order: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolynomialAccelerationConfiguration {
    pub name: String,
    pub directions: Vec<f64>,
    pub coefficients: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThirdBodySettings {
    pub body: CelestialBody,
    pub with_solid_tides: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSettings {
    pub area: f64,
    pub cd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrpSettings {
    pub area: f64,
    pub cr: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolynomialSettings {
    pub name: String,
    pub direction: Vector3<f64>,
    pub coefficients: Vec<f64>,
}

/// Validated force environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceSettings {
    pub gravity_degree: usize,
    /// Already clamped to the degree
    pub gravity_order: usize,
    pub third_bodies: Vec<ThirdBodySettings>,
    pub drag: Option<DragSettings>,
    pub srp: Option<SrpSettings>,
    pub relativity: bool,
    pub polynomial: Vec<PolynomialSettings>,
}

impl ForceSettings {
    /// Whether any third body raises solid tides
    pub fn solid_tides(&self) -> bool {
        self.third_bodies.iter().any(|b| b.with_solid_tides)
    }
}

fn non_negative(field: &'static str, key: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(field, format!("{} = {} must not be negative", key, value)))
    }
}

impl ForceModelConfiguration {
    pub fn settings(&self) -> Result<ForceSettings, ConfigError> {
        let (gravity_degree, gravity_order) = match &self.gravity {
            Some(g) => {
                if g.order > g.degree {
                    log::debug!("Gravity order {} clamped to degree {}", g.order, g.degree);
                }
                (g.degree, g.order.min(g.degree))
            }
            None => (0, 0),
        };

        let third_bodies = self
            .third_body
            .iter()
            .flatten()
            .map(|tb| {
                Ok(ThirdBodySettings {
                    body: CelestialBody::from_name(&tb.name)?,
                    with_solid_tides: tb.with_solid_tides,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let drag = match &self.drag {
            Some(d) => Some(DragSettings {
                area: non_negative("forceModels.drag", "area", d.area)?,
                cd: non_negative("forceModels.drag", "cd", d.cd)?,
            }),
            None => None,
        };

        let srp = match &self.solar_radiation_pressure {
            Some(s) => Some(SrpSettings {
                area: non_negative("forceModels.solarRadiationPressure", "area", s.area)?,
                cr: non_negative("forceModels.solarRadiationPressure", "cr", s.cr)?,
            }),
            None => None,
        };

        if let Some(tides) = &self.ocean_tides {
            log::warn!(
                "Ocean tides ({}x{}) are not supported and will be ignored",
                tides.degree,
                tides.order
            );
        }

        let polynomial = self
            .polynomial_acceleration
            .iter()
            .flatten()
            .map(|p| {
                if p.directions.len() != 3 {
                    return Err(ConfigError::invalid(
                        "forceModels.polynomialAcceleration",
                        format!("'{}' needs 3 direction components, got {}", p.name, p.directions.len()),
                    ));
                }
                let direction = Vector3::new(p.directions[0], p.directions[1], p.directions[2]);
                if direction.norm() == 0.0 || !direction.iter().all(|x| x.is_finite()) {
                    return Err(ConfigError::invalid(
                        "forceModels.polynomialAcceleration",
                        format!("'{}' has no usable direction", p.name),
                    ));
                }
                Ok(PolynomialSettings {
                    name: p.name.clone(),
                    direction,
                    coefficients: p.coefficients.clone(),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(ForceSettings {
            gravity_degree,
            gravity_order,
            third_bodies,
            drag,
            srp,
            relativity: self.relativity.as_ref().map_or(false, |r| r.is_used),
            polynomial,
        })
    }
}
