// mf-core/src/units.rs

//! Runtime units of measure.
//!
//! Column units are only known once a dataset is loaded, so a [`Unit`] carries
//! its dimension as an exponent vector over the seven SI base dimensions plus a
//! scale (to SI base) and an offset (for affine scales such as Celsius).
//! Typed `uom` quantities enter through [`crate::Quantity::from_uom`].
//!
//! Unit expressions accept products and quotients with parentheses, integer
//! powers (`^`, `**` or trailing digits as in `m3`), SI prefixes and the named
//! units listed in [`NAMED_UNITS`]:
//!
//! - `"kg/m**3"`, `"g/m^3"`, `"mmol/m3"`
//! - `"J/(g*K)"`, `"W/m^2"`, `"m s^-1"`
//! - `"degC"`, `"kPa"`, `"mol/mol"`, `"ppm"`

use std::fmt;

use crate::error::{MfError, MfResult};
use crate::numeric::{Tolerances, nearly_equal};

const BASE_SYMBOLS: [&str; 7] = ["kg", "m", "s", "A", "K", "mol", "cd"];
const BASE_NAMES: [&str; 7] = [
    "mass",
    "length",
    "time",
    "current",
    "temperature",
    "amount",
    "luminosity",
];

/// Exponents over mass, length, time, current, temperature, amount, luminosity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Dimension([i8; 7]);

impl Dimension {
    pub const NONE: Self = Self([0; 7]);
    pub const MASS: Self = Self::base(0);
    pub const LENGTH: Self = Self::base(1);
    pub const TIME: Self = Self::base(2);
    pub const CURRENT: Self = Self::base(3);
    pub const TEMPERATURE: Self = Self::base(4);
    pub const AMOUNT: Self = Self::base(5);
    pub const LUMINOSITY: Self = Self::base(6);

    pub const VOLUME: Self = Self([0, 3, 0, 0, 0, 0, 0]);
    pub const VELOCITY: Self = Self([0, 1, -1, 0, 0, 0, 0]);
    pub const FORCE: Self = Self([1, 1, -2, 0, 0, 0, 0]);
    pub const PRESSURE: Self = Self([1, -1, -2, 0, 0, 0, 0]);
    pub const ENERGY: Self = Self([1, 2, -2, 0, 0, 0, 0]);
    pub const POWER: Self = Self([1, 2, -3, 0, 0, 0, 0]);
    pub const MASS_DENSITY: Self = Self([1, -3, 0, 0, 0, 0, 0]);
    pub const MOLAR_DENSITY: Self = Self([0, -3, 0, 0, 0, 1, 0]);
    pub const MOLAR_MASS: Self = Self([1, 0, 0, 0, 0, -1, 0]);
    pub const HEAT_FLUX: Self = Self([1, 0, -3, 0, 0, 0, 0]);
    pub const MOLAR_FLUX: Self = Self([0, -2, -1, 0, 0, 1, 0]);
    pub const SPECIFIC_HEAT: Self = Self([0, 2, -2, 0, -1, 0, 0]);

    const fn base(index: usize) -> Self {
        let mut exponents = [0; 7];
        exponents[index] = 1;
        Self(exponents)
    }

    pub const fn new(exponents: [i8; 7]) -> Self {
        Self(exponents)
    }

    pub fn exponents(&self) -> [i8; 7] {
        self.0
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0 == [0; 7]
    }

    /// Exponents multiplied by `n`; `None` when one leaves the `i8` range.
    pub fn checked_powi(self, n: i8) -> Option<Self> {
        let mut out = self.0;
        for e in &mut out {
            *e = e.checked_mul(n)?;
        }
        Some(Self(out))
    }

    /// Integer root; `None` when any exponent is not divisible by `n`.
    pub fn root(self, n: i8) -> Option<Self> {
        if n == 0 || self.0.iter().any(|e| e % n != 0) {
            return None;
        }
        Some(Self(self.0.map(|e| e / n)))
    }

    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = o.checked_add(r)?;
        }
        Some(Self(out))
    }

    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0) {
            *o = o.checked_sub(r)?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "[dimensionless]");
        }
        let parts: Vec<String> = BASE_NAMES
            .iter()
            .zip(self.0)
            .filter(|(_, e)| *e != 0)
            .map(|(name, e)| {
                if e == 1 {
                    format!("[{name}]")
                } else {
                    format!("[{name}]^{e}")
                }
            })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// A unit of measure known at runtime.
///
/// Equality compares dimension, scale and offset; the symbol is display only.
#[derive(Clone, Debug)]
pub struct Unit {
    symbol: String,
    dim: Dimension,
    scale: f64,
    offset: f64,
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        let tol = Tolerances {
            abs: 1e-15,
            rel: 1e-12,
        };
        self.dim == other.dim
            && nearly_equal(self.scale, other.scale, tol)
            && nearly_equal(self.offset, other.offset, Tolerances::default())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

impl std::str::FromStr for Unit {
    type Err = MfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Unit {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.symbol)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Unit {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Unit::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl Unit {
    pub fn new(symbol: impl Into<String>, dim: Dimension, scale: f64, offset: f64) -> Self {
        Self {
            symbol: symbol.into(),
            dim,
            scale,
            offset,
        }
    }

    /// The coherent SI unit for a dimension (`kg*m^-1*s^-2` for pressure).
    pub fn si(dim: Dimension) -> Self {
        Self::new(si_symbol(dim), dim, 1.0, 0.0)
    }

    pub fn dimensionless() -> Self {
        Self::new("1", Dimension::NONE, 1.0, 0.0)
    }

    pub fn kelvin() -> Self {
        Self::new("K", Dimension::TEMPERATURE, 1.0, 0.0)
    }

    pub fn celsius() -> Self {
        Self::new("degC", Dimension::TEMPERATURE, 1.0, 273.15)
    }

    pub fn meter() -> Self {
        Self::new("m", Dimension::LENGTH, 1.0, 0.0)
    }

    pub fn meter_per_second() -> Self {
        Self::new("m/s", Dimension::VELOCITY, 1.0, 0.0)
    }

    pub fn kg_per_m3() -> Self {
        Self::new("kg/m^3", Dimension::MASS_DENSITY, 1.0, 0.0)
    }

    pub fn mol_per_m3() -> Self {
        Self::new("mol/m^3", Dimension::MOLAR_DENSITY, 1.0, 0.0)
    }

    pub fn mol_per_mol() -> Self {
        Self::new("mol/mol", Dimension::NONE, 1.0, 0.0)
    }

    pub fn g_per_g() -> Self {
        Self::new("g/g", Dimension::NONE, 1.0, 0.0)
    }

    pub fn g_per_mol() -> Self {
        Self::new("g/mol", Dimension::MOLAR_MASS, 1e-3, 0.0)
    }

    pub fn watt_per_m2() -> Self {
        Self::new("W/m^2", Dimension::HEAT_FLUX, 1.0, 0.0)
    }

    pub fn newton_per_m2() -> Self {
        Self::new("N/m^2", Dimension::PRESSURE, 1.0, 0.0)
    }

    pub fn mol_per_m2_s() -> Self {
        Self::new("mol/(m^2*s)", Dimension::MOLAR_FLUX, 1.0, 0.0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn dimension(&self) -> Dimension {
        self.dim
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// True for unitless ratios such as `mol/mol`, `g/kg` or `%`.
    pub fn is_dimensionless(&self) -> bool {
        self.dim.is_dimensionless() && self.offset == 0.0
    }

    pub fn has_offset(&self) -> bool {
        self.offset != 0.0
    }

    /// Temperature on an absolute scale (kelvin, rankine), not Celsius-like.
    pub fn is_absolute_temperature(&self) -> bool {
        self.dim == Dimension::TEMPERATURE && !self.has_offset()
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dim == other.dim
    }

    /// Linear map `(a, b)` such that a value in `self` becomes `v * a + b` in `to`.
    pub fn conversion_to(&self, to: &Unit) -> MfResult<(f64, f64)> {
        if self.dim != to.dim {
            return Err(MfError::IncompatibleUnits {
                from: self.symbol.clone(),
                to: to.symbol.clone(),
            });
        }
        if self == to {
            return Ok((1.0, 0.0));
        }
        Ok((self.scale / to.scale, (self.offset - to.offset) / to.scale))
    }

    pub fn convert_value(&self, value: f64, to: &Unit) -> MfResult<f64> {
        let (a, b) = self.conversion_to(to)?;
        Ok(value * a + b)
    }

    pub fn mul(&self, other: &Unit) -> MfResult<Unit> {
        self.reject_offsets(other, "unit multiplication")?;
        let symbol = product_symbol(&self.symbol, &other.symbol);
        let dim = combined(&symbol, self.dim.checked_mul(other.dim))?;
        Ok(Unit::new(
            symbol,
            dim,
            self.scale * other.scale,
            0.0,
        ))
    }

    pub fn div(&self, other: &Unit) -> MfResult<Unit> {
        self.reject_offsets(other, "unit division")?;
        let symbol = quotient_symbol(&self.symbol, &other.symbol);
        let dim = combined(&symbol, self.dim.checked_div(other.dim))?;
        Ok(Unit::new(
            symbol,
            dim,
            self.scale / other.scale,
            0.0,
        ))
    }

    pub fn powi(&self, n: i8) -> MfResult<Unit> {
        match n {
            0 => Ok(Unit::dimensionless()),
            1 => Ok(self.clone()),
            _ => {
                self.reject_offsets(self, "unit power")?;
                let symbol = format!("{}^{n}", group(&self.symbol, true));
                let dim = combined(&symbol, self.dim.checked_powi(n))?;
                Ok(Unit::new(
                    symbol,
                    dim,
                    self.scale.powi(i32::from(n)),
                    0.0,
                ))
            }
        }
    }

    pub fn sqrt(&self) -> MfResult<Unit> {
        self.reject_offsets(self, "unit square root")?;
        let dim = self.dim.root(2).ok_or_else(|| {
            MfError::mismatch(
                "unit square root",
                self.symbol.clone(),
                "exponents divisible by 2",
            )
        })?;
        let scale = self.scale.sqrt();
        Ok(Unit::new(canonical_symbol(dim, scale), dim, scale, 0.0))
    }

    fn reject_offsets(&self, other: &Unit, what: &str) -> MfResult<()> {
        if self.has_offset() || other.has_offset() {
            return Err(MfError::mismatch(what, self.symbol.clone(), other.symbol.clone()));
        }
        Ok(())
    }

    /// Parse a unit expression.
    ///
    /// The parsed unit keeps the trimmed input as its symbol.
    pub fn parse(input: &str) -> MfResult<Unit> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Unit::dimensionless());
        }
        let tokens = tokenize(trimmed).map_err(|reason| MfError::UnitParse {
            input: trimmed.to_string(),
            reason,
        })?;
        let mut parser = Parser { tokens, pos: 0 };
        let unit = parser
            .expr()
            .and_then(|u| parser.finish().map(|_| u))
            .map_err(|reason| MfError::UnitParse {
                input: trimmed.to_string(),
                reason,
            })?;
        Ok(unit.with_symbol(trimmed))
    }
}

fn si_symbol(dim: Dimension) -> String {
    if dim.is_dimensionless() {
        return "1".to_string();
    }
    BASE_SYMBOLS
        .iter()
        .zip(dim.exponents())
        .filter(|(_, e)| *e != 0)
        .map(|(s, e)| if e == 1 { s.to_string() } else { format!("{s}^{e}") })
        .collect::<Vec<_>>()
        .join("*")
}

fn canonical_symbol(dim: Dimension, scale: f64) -> String {
    let tol = Tolerances {
        abs: 0.0,
        rel: 1e-12,
    };
    if nearly_equal(scale, 1.0, tol) {
        si_symbol(dim)
    } else {
        format!("{scale:e}*{}", group(&si_symbol(dim), false))
    }
}

fn group(symbol: &str, for_power: bool) -> String {
    let needs = symbol.contains(['*', '/', ' ', '·']) || (for_power && symbol.contains('^'));
    if needs {
        format!("({symbol})")
    } else {
        symbol.to_string()
    }
}

fn combined(symbol: &str, dim: Option<Dimension>) -> MfResult<Dimension> {
    dim.ok_or_else(|| exponent_overflow(symbol))
}

fn exponent_overflow(symbol: &str) -> MfError {
    MfError::InvalidArg {
        what: format!("dimension exponent out of range in '{symbol}'"),
    }
}

fn product_symbol(a: &str, b: &str) -> String {
    match (a, b) {
        ("1", _) => b.to_string(),
        (_, "1") => a.to_string(),
        _ => format!("{}*{}", a, group(b, false)),
    }
}

fn quotient_symbol(a: &str, b: &str) -> String {
    if b == "1" {
        a.to_string()
    } else {
        format!("{}/{}", a, group(b, false))
    }
}

/// A named unit usable in unit expressions.
#[derive(Debug, Clone, Copy)]
pub struct NamedUnit {
    pub names: &'static [&'static str],
    pub dim: Dimension,
    pub scale: f64,
    pub offset: f64,
    pub prefixable: bool,
}

const fn named(
    names: &'static [&'static str],
    dim: Dimension,
    scale: f64,
    offset: f64,
    prefixable: bool,
) -> NamedUnit {
    NamedUnit {
        names,
        dim,
        scale,
        offset,
        prefixable,
    }
}

pub const NAMED_UNITS: &[NamedUnit] = &[
    named(&["m", "meter", "metre"], Dimension::LENGTH, 1.0, 0.0, true),
    named(&["s", "sec", "second"], Dimension::TIME, 1.0, 0.0, true),
    named(&["g", "gram"], Dimension::MASS, 1e-3, 0.0, true),
    named(&["mol", "mole"], Dimension::AMOUNT, 1.0, 0.0, true),
    named(&["A", "ampere"], Dimension::CURRENT, 1.0, 0.0, true),
    named(&["cd", "candela"], Dimension::LUMINOSITY, 1.0, 0.0, false),
    named(&["K", "kelvin"], Dimension::TEMPERATURE, 1.0, 0.0, true),
    named(
        &["degC", "°C", "celsius", "degree_Celsius"],
        Dimension::TEMPERATURE,
        1.0,
        273.15,
        false,
    ),
    named(
        &["degF", "°F", "fahrenheit", "degree_Fahrenheit"],
        Dimension::TEMPERATURE,
        5.0 / 9.0,
        273.15 - 32.0 * 5.0 / 9.0,
        false,
    ),
    named(&["Pa", "pascal"], Dimension::PRESSURE, 1.0, 0.0, true),
    named(&["J", "joule"], Dimension::ENERGY, 1.0, 0.0, true),
    named(&["W", "watt"], Dimension::POWER, 1.0, 0.0, true),
    named(&["N", "newton"], Dimension::FORCE, 1.0, 0.0, true),
    named(&["L", "l", "liter", "litre"], Dimension::VOLUME, 1e-3, 0.0, true),
    named(&["min", "minute"], Dimension::TIME, 60.0, 0.0, false),
    named(&["h", "hr", "hour"], Dimension::TIME, 3600.0, 0.0, false),
    named(&["day"], Dimension::TIME, 86_400.0, 0.0, false),
    named(&["bar"], Dimension::PRESSURE, 1e5, 0.0, true),
    named(&["atm", "atmosphere"], Dimension::PRESSURE, 101_325.0, 0.0, false),
    named(&["%", "percent"], Dimension::NONE, 1e-2, 0.0, false),
    named(&["ppm"], Dimension::NONE, 1e-6, 0.0, false),
    named(&["ppb"], Dimension::NONE, 1e-9, 0.0, false),
    named(&["dimensionless"], Dimension::NONE, 1.0, 0.0, false),
    named(&["rad", "radian"], Dimension::NONE, 1.0, 0.0, false),
    named(
        &["deg", "degree"],
        Dimension::NONE,
        std::f64::consts::PI / 180.0,
        0.0,
        false,
    ),
];

const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("G", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("h", 1e2),
    ("d", 1e-1),
    ("c", 1e-2),
    ("m", 1e-3),
    ("u", 1e-6),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("n", 1e-9),
    ("p", 1e-12),
];

fn find_named(name: &str) -> Option<&'static NamedUnit> {
    NAMED_UNITS.iter().find(|u| u.names.contains(&name))
}

fn lookup_identifier(ident: &str) -> Option<Unit> {
    let to_unit = |u: &NamedUnit, factor: f64| Unit::new(ident, u.dim, u.scale * factor, u.offset);

    if let Some(u) = find_named(ident) {
        return Some(to_unit(u, 1.0));
    }
    // plural long names: "meters", "moles", "watts"
    if ident.chars().count() > 3
        && let Some(u) = ident.strip_suffix('s').and_then(find_named)
    {
        return Some(to_unit(u, 1.0));
    }
    for (prefix, factor) in PREFIXES {
        if let Some(rest) = ident.strip_prefix(prefix)
            && let Some(u) = find_named(rest).filter(|u| u.prefixable)
        {
            return Some(to_unit(u, *factor));
        }
    }
    let lower = ident.to_lowercase();
    NAMED_UNITS
        .iter()
        .find(|u| u.names.iter().any(|n| n.len() > 2 && n.to_lowercase() == lower))
        .map(|u| to_unit(u, 1.0))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Mul,
    Div,
    Pow,
    LParen,
    RParen,
}

fn is_ident_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '%' | '°' | '_' | 'µ')
}

fn read_number(chars: &[char], start: usize) -> (String, usize) {
    let mut i = start;
    let mut text = String::new();
    if matches!(chars.get(i), Some('-' | '+')) {
        text.push(chars[i]);
        i += 1;
    }
    while let Some(&c) = chars.get(i) {
        if c.is_ascii_digit() || c == '.' {
            text.push(c);
            i += 1;
        } else if (c == 'e' || c == 'E')
            && chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_digit() || *n == '-' || *n == '+')
        {
            text.push(c);
            i += 1;
            if matches!(chars.get(i), Some('-' | '+')) {
                text.push(chars[i]);
                i += 1;
            }
        } else {
            break;
        }
    }
    (text, i)
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Pow);
                i += 2;
            }
            '*' | '·' => {
                tokens.push(Token::Mul);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Div);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Pow);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' || c == '-' || c == '+' => {
                let (text, next) = read_number(&chars, i);
                let value: f64 = text
                    .parse()
                    .map_err(|_| format!("invalid number '{text}'"))?;
                tokens.push(Token::Number(value));
                i = next;
            }
            c if is_ident_char(c) => {
                let start = i;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
                // "m3" and "m-2" style trailing exponents
                let signed = matches!(chars.get(i), Some('-' | '+'))
                    && chars.get(i + 1).is_some_and(char::is_ascii_digit);
                if signed || chars.get(i).is_some_and(char::is_ascii_digit) {
                    let (text, next) = read_number(&chars, i);
                    let value: f64 = text
                        .parse()
                        .map_err(|_| format!("invalid exponent '{text}'"))?;
                    tokens.push(Token::Pow);
                    tokens.push(Token::Number(value));
                    i = next;
                }
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }

    // juxtaposition means multiplication: "J/(kg K)", "m s^-1"
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for tok in tokens {
        let left_ends_factor = matches!(
            out.last(),
            Some(Token::Ident(_) | Token::Number(_) | Token::RParen)
        );
        let right_starts_factor = matches!(tok, Token::Ident(_) | Token::Number(_) | Token::LParen);
        if left_ends_factor && right_starts_factor {
            out.push(Token::Mul);
        }
        out.push(tok);
    }
    Ok(out)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn finish(&self) -> Result<(), String> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(format!("unexpected trailing token {tok:?}")),
        }
    }

    fn expr(&mut self) -> Result<Unit, String> {
        let mut acc = self.power()?;
        loop {
            match self.peek() {
                Some(Token::Mul) => {
                    self.pos += 1;
                    let rhs = self.power()?;
                    acc = acc.mul(&rhs).map_err(|e| e.to_string())?;
                }
                Some(Token::Div) => {
                    self.pos += 1;
                    let rhs = self.power()?;
                    acc = acc.div(&rhs).map_err(|e| e.to_string())?;
                }
                _ => return Ok(acc),
            }
        }
    }

    fn power(&mut self) -> Result<Unit, String> {
        let base = self.atom()?;
        if self.peek() != Some(&Token::Pow) {
            return Ok(base);
        }
        self.pos += 1;
        match self.next() {
            Some(Token::Number(n)) if n.fract() == 0.0 && n.abs() <= f64::from(i8::MAX) => {
                base.powi(n as i8).map_err(|e| e.to_string())
            }
            Some(Token::Number(n)) => Err(format!("exponent {n} is not a small integer")),
            other => Err(format!("expected exponent, found {other:?}")),
        }
    }

    fn atom(&mut self) -> Result<Unit, String> {
        match self.next() {
            Some(Token::Ident(name)) => {
                lookup_identifier(&name).ok_or_else(|| format!("unknown unit '{name}'"))
            }
            Some(Token::Number(n)) if n > 0.0 && n.is_finite() => {
                Ok(Unit::new(n.to_string(), Dimension::NONE, n, 0.0))
            }
            Some(Token::Number(n)) => Err(format!("scale factor {n} must be positive")),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.next() {
                    Some(Token::RParen) => Ok(inner),
                    other => Err(format!("expected ')', found {other:?}")),
                }
            }
            other => Err(format!("expected a unit, found {other:?}")),
        }
    }
}
