//! Values and columns tagged with a runtime [`Unit`].
//!
//! Every operation returns a new value; operands are never mutated.
//! Addition and subtraction require one dimension and express the result in
//! the left operand's unit. Multiplication and division compose units.

use std::fmt;

use crate::error::{MfError, MfResult};
use crate::numeric::nan_mean;
use crate::units::{Dimension, Unit};

/// A scalar magnitude with its unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Serialized as `"<value> <unit>"`, e.g. `"3.5 m"`.
#[cfg(feature = "serde")]
impl serde::Serialize for Quantity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Accepts a `"<value> <unit>"` string or a bare number (dimensionless).
#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Quantity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Text(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(Quantity::dimensionless(v)),
            Repr::Text(text) => Quantity::parse(&text).map_err(serde::de::Error::custom),
        }
    }
}

/// Linear map bringing `rhs` values into the unit of `lhs` for addition.
fn additive_map(lhs: &Unit, rhs: &Unit, what: &str) -> MfResult<(f64, f64)> {
    if !lhs.is_compatible(rhs) {
        return Err(MfError::mismatch(what, lhs.symbol(), rhs.symbol()));
    }
    if lhs == rhs {
        return Ok((1.0, 0.0));
    }
    if lhs.has_offset() || rhs.has_offset() {
        return Err(MfError::mismatch(what, lhs.symbol(), rhs.symbol()));
    }
    rhs.conversion_to(lhs)
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn dimensionless(value: f64) -> Self {
        Self::new(value, Unit::dimensionless())
    }

    /// Parse `"1.2 kg/m^3"`, `"25degC"` or a bare number (dimensionless).
    pub fn parse(text: &str) -> MfResult<Self> {
        let (value, unit) = split_value_and_unit(text)?;
        Ok(Self::new(value, Unit::parse(&unit)?))
    }

    /// Bridge from a typed `uom` quantity (stored in SI base units).
    pub fn from_uom<D>(q: uom::si::Quantity<D, uom::si::SI<f64>, f64>) -> Self
    where
        D: uom::si::Dimension + ?Sized,
    {
        use uom::typenum::Integer;
        let dim = Dimension::new([
            D::M::to_i8(),
            D::L::to_i8(),
            D::T::to_i8(),
            D::I::to_i8(),
            D::Th::to_i8(),
            D::N::to_i8(),
            D::J::to_i8(),
        ]);
        Self::new(q.value, Unit::si(dim))
    }

    pub fn convert(&self, to: &Unit) -> MfResult<Quantity> {
        Ok(Self::new(self.unit.convert_value(self.value, to)?, to.clone()))
    }

    pub fn value_in(&self, to: &Unit) -> MfResult<f64> {
        self.unit.convert_value(self.value, to)
    }

    /// Magnitude of a unitless ratio (`mol/mol`, `g/kg`, `%`).
    pub fn to_dimensionless(&self) -> MfResult<f64> {
        if !self.unit.is_dimensionless() {
            return Err(MfError::IncompatibleUnits {
                from: self.unit.symbol().to_string(),
                to: "dimensionless".to_string(),
            });
        }
        Ok(self.value * self.unit.scale())
    }

    pub fn add(&self, rhs: &Quantity) -> MfResult<Quantity> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "addition")?;
        Ok(Self::new(self.value + rhs.value * a + b, self.unit.clone()))
    }

    pub fn sub(&self, rhs: &Quantity) -> MfResult<Quantity> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "subtraction")?;
        Ok(Self::new(self.value - (rhs.value * a + b), self.unit.clone()))
    }

    pub fn mul(&self, rhs: &Quantity) -> MfResult<Quantity> {
        Ok(Self::new(self.value * rhs.value, self.unit.mul(&rhs.unit)?))
    }

    pub fn div(&self, rhs: &Quantity) -> MfResult<Quantity> {
        Ok(Self::new(self.value / rhs.value, self.unit.div(&rhs.unit)?))
    }

    /// Multiply by a pure number.
    pub fn scale(&self, factor: f64) -> Quantity {
        Self::new(self.value * factor, self.unit.clone())
    }

    pub fn powi(&self, n: i8) -> MfResult<Quantity> {
        Ok(Self::new(self.value.powi(i32::from(n)), self.unit.powi(n)?))
    }

    pub fn sqrt(&self) -> MfResult<Quantity> {
        let unit = self.unit.sqrt()?;
        // the root unit is canonical; fold any leftover scale into the magnitude
        let root = (self.value * self.unit.scale()).sqrt() / unit.scale();
        Ok(Self::new(root, unit))
    }
}

/// A column of magnitudes sharing one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub values: Vec<f64>,
    pub unit: Unit,
}

impl Series {
    pub fn new(values: Vec<f64>, unit: Unit) -> Self {
        Self { values, unit }
    }

    /// A column of `len` copies of `q`.
    pub fn broadcast(q: &Quantity, len: usize) -> Self {
        Self::new(vec![q.value; len], q.unit.clone())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn convert(&self, to: &Unit) -> MfResult<Series> {
        let (a, b) = self.unit.conversion_to(to)?;
        if (a, b) == (1.0, 0.0) {
            return Ok(Self::new(self.values.clone(), to.clone()));
        }
        Ok(Self::new(
            self.values.iter().map(|v| v * a + b).collect(),
            to.clone(),
        ))
    }

    pub fn to_dimensionless(&self) -> MfResult<Vec<f64>> {
        if !self.unit.is_dimensionless() {
            return Err(MfError::IncompatibleUnits {
                from: self.unit.symbol().to_string(),
                to: "dimensionless".to_string(),
            });
        }
        let scale = self.unit.scale();
        Ok(self.values.iter().map(|v| v * scale).collect())
    }

    /// Mean over the non-NaN samples.
    pub fn mean(&self) -> MfResult<Quantity> {
        let mean = nan_mean(&self.values).ok_or_else(|| MfError::InvalidArg {
            what: "mean of an empty or all-NaN column".to_string(),
        })?;
        Ok(Quantity::new(mean, self.unit.clone()))
    }

    /// Same unit, values transformed.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Series {
        Self::new(self.values.iter().map(|v| f(*v)).collect(), self.unit.clone())
    }

    fn zip_with(&self, rhs: &Series, unit: Unit, f: impl Fn(f64, f64) -> f64) -> MfResult<Series> {
        if self.len() != rhs.len() {
            return Err(MfError::InvalidArg {
                what: format!("column lengths differ ({} vs {})", self.len(), rhs.len()),
            });
        }
        Ok(Self::new(
            self.values
                .iter()
                .zip(&rhs.values)
                .map(|(a, b)| f(*a, *b))
                .collect(),
            unit,
        ))
    }

    pub fn add(&self, rhs: &Series) -> MfResult<Series> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "addition")?;
        self.zip_with(rhs, self.unit.clone(), |x, y| x + (y * a + b))
    }

    pub fn sub(&self, rhs: &Series) -> MfResult<Series> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "subtraction")?;
        self.zip_with(rhs, self.unit.clone(), |x, y| x - (y * a + b))
    }

    pub fn mul(&self, rhs: &Series) -> MfResult<Series> {
        let unit = self.unit.mul(&rhs.unit)?;
        self.zip_with(rhs, unit, |x, y| x * y)
    }

    pub fn div(&self, rhs: &Series) -> MfResult<Series> {
        let unit = self.unit.div(&rhs.unit)?;
        self.zip_with(rhs, unit, |x, y| x / y)
    }

    pub fn add_scalar(&self, rhs: &Quantity) -> MfResult<Series> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "addition")?;
        let shift = rhs.value * a + b;
        Ok(self.map_values(|x| x + shift))
    }

    pub fn sub_scalar(&self, rhs: &Quantity) -> MfResult<Series> {
        let (a, b) = additive_map(&self.unit, &rhs.unit, "subtraction")?;
        let shift = rhs.value * a + b;
        Ok(self.map_values(|x| x - shift))
    }

    pub fn mul_scalar(&self, rhs: &Quantity) -> MfResult<Series> {
        let unit = self.unit.mul(&rhs.unit)?;
        Ok(Self::new(
            self.values.iter().map(|x| x * rhs.value).collect(),
            unit,
        ))
    }

    pub fn div_scalar(&self, rhs: &Quantity) -> MfResult<Series> {
        let unit = self.unit.div(&rhs.unit)?;
        Ok(Self::new(
            self.values.iter().map(|x| x / rhs.value).collect(),
            unit,
        ))
    }

    /// Scalar divided by each element: `rhs / self`.
    pub fn rdiv_scalar(&self, lhs: &Quantity) -> MfResult<Series> {
        let unit = lhs.unit.div(&self.unit)?;
        Ok(Self::new(
            self.values.iter().map(|x| lhs.value / x).collect(),
            unit,
        ))
    }
}

/// Split a value+unit string into (numeric_value, unit_string).
///
/// Examples:
/// - "1.2 kg/m^3" -> (1.2, "kg/m^3")
/// - "25degC" -> (25.0, "degC")
/// - "300" -> (300.0, "")
fn split_value_and_unit(input: &str) -> MfResult<(f64, String)> {
    let trimmed = input.trim();

    let mut split_idx = trimmed.len();
    for (i, c) in trimmed.char_indices() {
        let exponent_marker = (c == 'e' || c == 'E')
            && trimmed[i + 1..]
                .chars()
                .next()
                .is_some_and(|n| n.is_ascii_digit() || n == '-' || n == '+');
        if !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+' || exponent_marker) {
            split_idx = i;
            break;
        }
    }

    let (num_part, unit_part) = trimmed.split_at(split_idx);
    let value: f64 = num_part.trim().parse().map_err(|_| MfError::InvalidArg {
        what: format!("could not parse numeric value from '{input}'"),
    })?;

    Ok((value, unit_part.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Tolerances, nearly_equal};

    fn q(text: &str) -> Quantity {
        Quantity::parse(text).unwrap()
    }

    #[test]
    fn parse_value_and_unit() {
        let rho = q("1.2 kg/m^3");
        assert_eq!(rho.value, 1.2);
        assert_eq!(rho.unit, Unit::kg_per_m3());
        let t = q("25degC");
        assert_eq!(t.value, 25.0);
        assert!(t.unit.has_offset());
        let ratio = q("3e-4");
        assert!(ratio.unit.is_dimensionless());
        assert!(Quantity::parse("kg").is_err());
    }

    #[test]
    fn convert_rescales_without_mutating() {
        let rho = q("1200 g/m^3");
        let kg = rho.convert(&Unit::kg_per_m3()).unwrap();
        assert!(nearly_equal(kg.value, 1.2, Tolerances::default()));
        assert_eq!(rho.value, 1200.0);
    }

    #[test]
    fn add_requires_same_dimension() {
        let a = q("1 kg/m^3");
        let b = q("500 g/m^3");
        let sum = a.add(&b).unwrap();
        assert!(nearly_equal(sum.value, 1.5, Tolerances::default()));
        assert_eq!(sum.unit, Unit::kg_per_m3());

        let err = a.add(&q("300 K")).unwrap_err();
        assert!(matches!(err, MfError::UnitMismatch { .. }));
    }

    #[test]
    fn mul_and_div_compose_units() {
        let molar = q("10 mmol/m^3");
        let mass = q("18.0153 g/mol");
        let rho = molar.mul(&mass).unwrap();
        assert!(nearly_equal(rho.value, 180.153, Tolerances::default()));
        assert_eq!(rho.unit, Unit::parse("mg/m^3").unwrap());

        let ratio = q("2 g/m^3").div(&q("1 kg/m^3")).unwrap();
        assert!(nearly_equal(ratio.to_dimensionless().unwrap(), 2e-3, Tolerances::default()));
    }

    #[test]
    fn to_dimensionless_rejects_dimensional_units() {
        assert!(q("0.5 mol/mol").to_dimensionless().is_ok());
        assert!(nearly_equal(q("50 %").to_dimensionless().unwrap(), 0.5, Tolerances::default()));
        let err = q("3 m/s").to_dimensionless().unwrap_err();
        assert!(matches!(err, MfError::IncompatibleUnits { .. }));
    }

    #[test]
    fn sqrt_of_velocity_variance() {
        let var = q("0.25 m^2/s^2");
        let sd = var.sqrt().unwrap();
        assert!(nearly_equal(sd.value, 0.5, Tolerances::default()));
        assert_eq!(sd.unit, Unit::meter_per_second());

        let cm2 = q("4 cm^2").sqrt().unwrap();
        assert!(nearly_equal(cm2.value_in(&Unit::meter()).unwrap(), 0.02, Tolerances::default()));
    }

    #[test]
    fn from_uom_keeps_si_value_and_dimension() {
        use uom::si::f64::MassDensity;
        use uom::si::mass_density::gram_per_cubic_centimeter;
        let rho = MassDensity::new::<gram_per_cubic_centimeter>(1.0);
        let qty = Quantity::from_uom(rho);
        assert!(nearly_equal(qty.value, 1000.0, Tolerances::default()));
        assert_eq!(qty.unit, Unit::kg_per_m3());
    }

    #[test]
    fn series_arithmetic_and_mean() {
        let rho_h2o = Series::new(vec![10.0, 12.0, f64::NAN], Unit::parse("g/m^3").unwrap());
        let rho_air = Series::new(vec![1.2, 1.2, 1.2], Unit::kg_per_m3());
        let q_h2o = rho_h2o.div(&rho_air).unwrap();
        let ratios = q_h2o.to_dimensionless().unwrap();
        assert!(nearly_equal(ratios[0], 10.0 / 1200.0, Tolerances::default()));
        assert!(ratios[2].is_nan());

        let mean = rho_h2o.mean().unwrap();
        assert_eq!(mean.value, 11.0);

        let dry = rho_air.sub(&rho_h2o).unwrap();
        assert!(nearly_equal(dry.values[0], 1.19, Tolerances::default()));
        assert_eq!(dry.unit, Unit::kg_per_m3());
    }

    #[test]
    fn series_length_mismatch_is_rejected() {
        let a = Series::new(vec![1.0, 2.0], Unit::meter());
        let b = Series::new(vec![1.0], Unit::meter());
        assert!(matches!(a.add(&b), Err(MfError::InvalidArg { .. })));
    }

    #[test]
    fn celsius_series_to_kelvin() {
        let t = Series::new(vec![0.0, 25.0], Unit::celsius());
        let k = t.convert(&Unit::kelvin()).unwrap();
        assert!(nearly_equal(k.values[1], 298.15, Tolerances::default()));
        assert!(t.mul(&t).is_err());
    }
}
