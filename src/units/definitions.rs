//! Named units, SI prefixes and their dimensions.

/// Exponents over length, mass, time, current, temperature, amount, luminosity.
pub type Dimension = [i32; 7];

pub const DIMENSIONLESS: Dimension = [0; 7];

/// Coherent SI unit for each base dimension, in `Dimension` order.
pub(crate) const BASE_UNITS: [&str; 7] = [
    "meter", "kilogram", "second", "ampere", "kelvin", "mole", "candela",
];

pub(crate) struct UnitDef {
    pub name: &'static str,
    pub symbol: &'static str,
    /// Multiplier to the coherent SI unit of the same dimension.
    pub scale: f64,
    pub dimension: Dimension,
}

const fn dim(l: i32, m: i32, t: i32, i: i32, th: i32, n: i32, j: i32) -> Dimension {
    [l, m, t, i, th, n, j]
}

pub(crate) const UNITS: &[UnitDef] = &[
    UnitDef { name: "meter", symbol: "m", scale: 1.0, dimension: dim(1, 0, 0, 0, 0, 0, 0) },
    UnitDef { name: "gram", symbol: "g", scale: 1e-3, dimension: dim(0, 1, 0, 0, 0, 0, 0) },
    UnitDef { name: "second", symbol: "s", scale: 1.0, dimension: dim(0, 0, 1, 0, 0, 0, 0) },
    UnitDef { name: "minute", symbol: "min", scale: 60.0, dimension: dim(0, 0, 1, 0, 0, 0, 0) },
    UnitDef { name: "hour", symbol: "h", scale: 3600.0, dimension: dim(0, 0, 1, 0, 0, 0, 0) },
    UnitDef { name: "ampere", symbol: "A", scale: 1.0, dimension: dim(0, 0, 0, 1, 0, 0, 0) },
    UnitDef { name: "kelvin", symbol: "K", scale: 1.0, dimension: dim(0, 0, 0, 0, 1, 0, 0) },
    UnitDef { name: "mole", symbol: "mol", scale: 1.0, dimension: dim(0, 0, 0, 0, 0, 1, 0) },
    UnitDef { name: "candela", symbol: "cd", scale: 1.0, dimension: dim(0, 0, 0, 0, 0, 0, 1) },
    UnitDef { name: "radian", symbol: "rad", scale: 1.0, dimension: DIMENSIONLESS },
    UnitDef {
        name: "degree",
        symbol: "deg",
        scale: std::f64::consts::PI / 180.0,
        dimension: DIMENSIONLESS,
    },
    UnitDef { name: "newton", symbol: "N", scale: 1.0, dimension: dim(1, 1, -2, 0, 0, 0, 0) },
    UnitDef { name: "pascal", symbol: "Pa", scale: 1.0, dimension: dim(-1, 1, -2, 0, 0, 0, 0) },
    UnitDef { name: "bar", symbol: "bar", scale: 1e5, dimension: dim(-1, 1, -2, 0, 0, 0, 0) },
    UnitDef { name: "joule", symbol: "J", scale: 1.0, dimension: dim(2, 1, -2, 0, 0, 0, 0) },
    UnitDef { name: "watt", symbol: "W", scale: 1.0, dimension: dim(2, 1, -3, 0, 0, 0, 0) },
    UnitDef { name: "hertz", symbol: "Hz", scale: 1.0, dimension: dim(0, 0, -1, 0, 0, 0, 0) },
    UnitDef { name: "liter", symbol: "L", scale: 1e-3, dimension: dim(3, 0, 0, 0, 0, 0, 0) },
    UnitDef { name: "dimensionless", symbol: "", scale: 1.0, dimension: DIMENSIONLESS },
];

pub(crate) struct Prefix {
    pub name: &'static str,
    pub symbol: &'static str,
    pub factor: f64,
}

pub(crate) const PREFIXES: &[Prefix] = &[
    Prefix { name: "nano", symbol: "n", factor: 1e-9 },
    Prefix { name: "micro", symbol: "u", factor: 1e-6 },
    Prefix { name: "milli", symbol: "m", factor: 1e-3 },
    Prefix { name: "centi", symbol: "c", factor: 1e-2 },
    Prefix { name: "deci", symbol: "d", factor: 1e-1 },
    Prefix { name: "kilo", symbol: "k", factor: 1e3 },
    Prefix { name: "mega", symbol: "M", factor: 1e6 },
    Prefix { name: "giga", symbol: "G", factor: 1e9 },
];

/// A unit name resolved against the tables.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Resolved {
    pub canonical: String,
    pub scale: f64,
    pub dimension: Dimension,
}

fn exact(name: &str) -> Option<&'static UnitDef> {
    UNITS
        .iter()
        .find(|u| u.name == name || (!u.symbol.is_empty() && u.symbol == name))
}

fn with_prefix(name: &str) -> Option<Resolved> {
    for prefix in PREFIXES {
        if let Some(rest) = name.strip_prefix(prefix.name) {
            if let Some(def) = UNITS.iter().find(|u| u.name == rest) {
                return Some(Resolved {
                    canonical: format!("{}{}", prefix.name, def.name),
                    scale: prefix.factor * def.scale,
                    dimension: def.dimension,
                });
            }
        }
        if let Some(rest) = name.strip_prefix(prefix.symbol) {
            if let Some(def) = UNITS.iter().find(|u| !u.symbol.is_empty() && u.symbol == rest) {
                return Some(Resolved {
                    canonical: format!("{}{}", prefix.name, def.name),
                    scale: prefix.factor * def.scale,
                    dimension: def.dimension,
                });
            }
        }
    }
    None
}

/// Looks a unit name up: exact names and symbols win over prefixed forms,
/// and a trailing plural `s` is accepted.
pub(crate) fn resolve(name: &str) -> Option<Resolved> {
    if let Some(def) = exact(name) {
        return Some(Resolved {
            canonical: def.name.to_string(),
            scale: def.scale,
            dimension: def.dimension,
        });
    }
    if let Some(resolved) = with_prefix(name) {
        return Some(resolved);
    }
    match name.strip_suffix('s') {
        Some(singular) if singular.len() > 1 => resolve(singular),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("m", "meter", 1.0)]
    #[case("mm", "millimeter", 1e-3)]
    #[case("kg", "kilogram", 1.0)]
    #[case("kilogram", "kilogram", 1.0)]
    #[case("min", "minute", 60.0)]
    #[case("cd", "candela", 1.0)]
    #[case("kPa", "kilopascal", 1e3)]
    #[case("meters", "meter", 1.0)]
    #[case("centimeter", "centimeter", 1e-2)]
    fn test_resolve(#[case] input: &str, #[case] canonical: &str, #[case] scale: f64) {
        let r = resolve(input).unwrap();
        assert_eq!(r.canonical, canonical);
        assert!((r.scale - scale).abs() < 1e-12 * scale.max(1.0));
    }

    #[test]
    fn test_resolve_unknown() {
        assert!(resolve("furlong").is_none());
        assert!(resolve("").is_none());
    }
}
