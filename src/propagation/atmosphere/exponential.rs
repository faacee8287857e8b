//! Exponential atmospheric density model
//!
//! Piecewise exponential decay: within a layer starting at h₀,
//! ρ(h) = ρ₀ × exp(-(h − h₀) / H). A single-layer model reduces to the
//! classic sea-level form.

use super::AtmosphereModel;

/// One band of the piecewise model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialLayer {
    /// Base altitude of the band (km)
    pub base_altitude: f64,

    /// Density at the base altitude (kg/m³)
    pub base_density: f64,

    /// Scale height (km)
    pub scale_height: f64,
}

/// Exponential atmosphere model
///
/// Fast but approximate; it does not account for:
/// - Day/night differences
/// - Solar activity effects
/// - Composition changes with altitude
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    /// Bands sorted by ascending base altitude
    layers: Vec<ExponentialLayer>,

    /// Maximum altitude for non-zero density (km)
    pub max_altitude: f64,
}

impl Default for Exponential {
    fn default() -> Self {
        Self::standard()
    }
}

// (base altitude km, base density kg/m³, scale height km), 1976 US Standard / CIRA-72
#[rustfmt::skip]
const EARTH_TABLE: [(f64, f64, f64); 28] = [
    (0.0, 1.225, 7.249),
    (25.0, 3.899e-2, 6.349),
    (30.0, 1.774e-2, 6.682),
    (40.0, 3.972e-3, 7.554),
    (50.0, 1.057e-3, 8.382),
    (60.0, 3.206e-4, 7.714),
    (70.0, 8.770e-5, 6.549),
    (80.0, 1.905e-5, 5.799),
    (90.0, 3.396e-6, 5.382),
    (100.0, 5.297e-7, 5.877),
    (110.0, 9.661e-8, 7.263),
    (120.0, 2.438e-8, 9.473),
    (130.0, 8.484e-9, 12.636),
    (140.0, 3.845e-9, 16.149),
    (150.0, 2.070e-9, 22.523),
    (180.0, 5.464e-10, 29.740),
    (200.0, 2.789e-10, 37.105),
    (250.0, 7.248e-11, 45.546),
    (300.0, 2.418e-11, 53.628),
    (350.0, 9.518e-12, 53.298),
    (400.0, 3.725e-12, 58.515),
    (450.0, 1.585e-12, 60.828),
    (500.0, 6.967e-13, 63.822),
    (600.0, 1.454e-13, 71.835),
    (700.0, 3.614e-14, 88.667),
    (800.0, 1.170e-14, 124.64),
    (900.0, 5.245e-15, 181.05),
    (1000.0, 3.019e-15, 268.00),
];

impl Exponential {
    /// Standard Earth atmosphere, 0-1000 km
    pub fn standard() -> Self {
        let layers = EARTH_TABLE
            .iter()
            .map(|&(base_altitude, base_density, scale_height)| ExponentialLayer {
                base_altitude,
                base_density,
                scale_height,
            })
            .collect();
        Self::layered(layers, 1_000.0)
    }

    /// Single-layer model from surface density and scale height
    pub fn new(rho0: f64, scale_height: f64, max_altitude: f64) -> Self {
        Self {
            layers: vec![ExponentialLayer {
                base_altitude: 0.0,
                base_density: rho0,
                scale_height,
            }],
            max_altitude,
        }
    }

    /// Custom piecewise model; layers are sorted by base altitude
    pub fn layered(mut layers: Vec<ExponentialLayer>, max_altitude: f64) -> Self {
        layers.sort_by(|a, b| a.base_altitude.total_cmp(&b.base_altitude));
        Self {
            layers,
            max_altitude,
        }
    }

    pub fn layers(&self) -> &[ExponentialLayer] {
        &self.layers
    }

    fn layer_for(&self, altitude: f64) -> Option<&ExponentialLayer> {
        let idx = self
            .layers
            .partition_point(|layer| layer.base_altitude <= altitude);
        self.layers.get(idx.saturating_sub(1))
    }
}

impl AtmosphereModel for Exponential {
    fn density(&self, altitude: f64) -> f64 {
        if altitude > self.max_altitude {
            return 0.0;
        }

        let Some(layer) = self.layer_for(altitude.max(0.0)) else {
            return 0.0;
        };

        if altitude < 0.0 {
            // Below surface
            return layer.base_density;
        }

        layer.base_density * (-(altitude - layer.base_altitude) / layer.scale_height).exp()
    }

    fn name(&self) -> &'static str {
        "Exponential"
    }

    fn description(&self) -> &'static str {
        "Piecewise exponential density decay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exponential_sea_level() {
        let model = Exponential::standard();
        assert!((model.density(0.0) - 1.225).abs() < 0.001);
        assert!((model.density(-3.0) - 1.225).abs() < 0.001);
    }

    #[test]
    fn test_exponential_one_scale_height() {
        let model = Exponential::new(1.225, 8.5, 1_000.0);

        // At one scale height, density should be ~37% of surface (1/e)
        let expected = 1.225 * (-1.0_f64).exp();
        assert!((model.density(8.5) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_standard_layers_decreasing() {
        let model = Exponential::standard();
        let mut previous = f64::INFINITY;
        for km in (0..1000).step_by(5) {
            let rho = model.density(km as f64);
            assert!(rho > 0.0 && rho < previous, "density not decreasing at {} km", km);
            previous = rho;
        }

        // 400 km density is a few 1e-12 kg/m³
        let rho = model.density(400.0);
        assert!(rho > 1e-12 && rho < 1e-11);
    }

    #[test]
    fn test_above_max_altitude() {
        let model = Exponential::standard();
        assert_eq!(model.density(1_000.5), 0.0);
    }
}
