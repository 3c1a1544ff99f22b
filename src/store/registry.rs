use super::error::StoreError;
use super::types::*;
use crate::algebra::{parse_relation, Namespace, ParseError, Relation};
use crate::units::Unit;
use std::collections::HashMap;

/// Symbol table and equation registry.
///
/// Populated during setup and read-only afterwards. Entries live in insertion
/// order; the name maps give O(1) lookup into them.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    symbols: Vec<Symbol>,
    equations: Vec<Equation>,
    symbol_index: HashMap<String, usize>,
    equation_index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn equation_count(&self) -> usize {
        self.equations.len()
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.symbol_index.get(name).map(|&i| &self.symbols[i])
    }

    pub fn equation(&self, name: &str) -> Option<&Equation> {
        self.equation_index.get(name).map(|&i| &self.equations[i])
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn equations(&self) -> impl Iterator<Item = &Equation> {
        self.equations.iter()
    }

    /// Registers one symbol. Returns `false` when an identical definition was
    /// already present.
    pub fn add_symbol(&mut self, name: &str, definition: &SymbolDefinition) -> Result<bool, StoreError> {
        let symbol = Self::build_symbol(name, definition)?;
        if let Some(existing) = self.symbol(name) {
            return Self::check_same_unit(existing, &symbol).map(|_| false);
        }
        self.symbol_index.insert(symbol.name.clone(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(true)
    }

    /// Registers a batch of symbols. Nothing is stored unless every entry is valid.
    pub fn add_symbols<'a, I>(&mut self, definitions: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a SymbolDefinition)>,
    {
        let mut staged: Vec<Symbol> = Vec::new();
        for (name, definition) in definitions {
            let symbol = Self::build_symbol(name, definition)?;
            let previous = self
                .symbol(name)
                .or_else(|| staged.iter().find(|s| s.name == name));
            match previous {
                Some(existing) => Self::check_same_unit(existing, &symbol)?,
                None => staged.push(symbol),
            }
        }
        for symbol in staged {
            self.symbol_index.insert(symbol.name.clone(), self.symbols.len());
            self.symbols.push(symbol);
        }
        Ok(())
    }

    fn build_symbol(name: &str, definition: &SymbolDefinition) -> Result<Symbol, StoreError> {
        let unit = Unit::parse(&definition.units).map_err(|source| StoreError::Unit {
            symbol: name.to_string(),
            source,
        })?;
        Ok(Symbol {
            name: name.to_string(),
            unit,
            description: definition.description.clone(),
            properties: definition.properties,
        })
    }

    fn check_same_unit(existing: &Symbol, requested: &Symbol) -> Result<(), StoreError> {
        if existing.unit == requested.unit {
            Ok(())
        } else {
            Err(StoreError::SymbolConflict {
                name: existing.name.clone(),
                existing: existing.unit.to_string(),
                requested: requested.unit.to_string(),
            })
        }
    }

    pub fn add_equation(
        &mut self,
        name: &str,
        relation: Relation,
        metadata: EquationMetadata,
    ) -> Result<&Equation, StoreError> {
        if self.equation_index.contains_key(name) {
            return Err(StoreError::DuplicateEquation(name.to_string()));
        }
        let equation = Equation::new(name, relation, metadata);

        if let Some(missing) = equation.symbols.iter().find(|s| self.symbol(s).is_none()) {
            return Err(StoreError::UnregisteredSymbol {
                equation: name.to_string(),
                symbol: missing.clone(),
            });
        }
        let named = equation.metadata.output.iter().chain(&equation.metadata.inputs);
        for symbol in named {
            if !equation.symbols.contains(symbol) {
                return Err(StoreError::MetadataSymbol {
                    equation: name.to_string(),
                    symbol: symbol.clone(),
                });
            }
        }

        let index = self.equations.len();
        self.equation_index.insert(name.to_string(), index);
        self.equations.push(equation);
        Ok(&self.equations[index])
    }

    /// Parses `"lhs = rhs"` against the registered symbols and stores it.
    pub fn add_equation_str(
        &mut self,
        name: &str,
        expression: &str,
        metadata: EquationMetadata,
    ) -> Result<&Equation, StoreError> {
        let relation = parse_relation(expression, self).map_err(|source| match source {
            ParseError::UnknownSymbol(symbol) => StoreError::UnregisteredSymbol {
                equation: name.to_string(),
                symbol,
            },
            source => StoreError::Parse { equation: name.to_string(), source },
        })?;
        self.add_equation(name, relation, metadata)
    }
}

impl Namespace for Registry {
    fn contains_symbol(&self, name: &str) -> bool {
        self.symbol_index.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> Registry {
        let mut reg = Registry::new();
        let defs = [
            ("A", SymbolDefinition::new("meter**2", "Area")),
            ("r", SymbolDefinition::new("meter", "Radius")),
            ("l", SymbolDefinition::new("meter", "Length")),
            ("w", SymbolDefinition::new("meter", "Width")),
        ];
        reg.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap();
        reg
    }

    #[test]
    fn test_symbols_are_registered_once() {
        let mut reg = geometry();
        assert_eq!(reg.symbol_count(), 4);

        let same = SymbolDefinition::new("m", "Radius again");
        assert!(!reg.add_symbol("r", &same).unwrap());
        assert_eq!(reg.symbol("r").unwrap().description, "Radius");

        let err = reg.add_symbol("r", &SymbolDefinition::new("second", "")).unwrap_err();
        assert!(matches!(err, StoreError::SymbolConflict { .. }), "{}", err);
    }

    #[test]
    fn test_batch_registration_is_all_or_nothing() {
        let mut reg = geometry();
        let defs = [
            ("F", SymbolDefinition::new("newton", "Force")),
            ("P", SymbolDefinition::new("parsec", "Pressure")),
        ];
        let err = reg.add_symbols(defs.iter().map(|(n, d)| (*n, d))).unwrap_err();
        assert!(matches!(err, StoreError::Unit { ref symbol, .. } if symbol == "P"));
        assert!(reg.symbol("F").is_none());
    }

    #[test]
    fn test_add_equation_records_symbol_order() {
        let mut reg = geometry();
        let eq = reg
            .add_equation_str("rectangle_area", "A = l * w", EquationMetadata::output("A", &["l", "w"]))
            .unwrap();
        assert_eq!(eq.symbols, vec!["A", "l", "w"]);
        assert_eq!(eq.relation.to_string(), "A = l*w");
        assert!(reg.equation("rectangle_area").is_some());
    }

    #[test]
    fn test_add_equation_rejections() {
        let mut reg = geometry();
        reg.add_equation_str("circle_area", "A = pi * r**2", EquationMetadata::default())
            .unwrap();

        let dup = reg.add_equation_str("circle_area", "A = l * w", EquationMetadata::default());
        assert_eq!(dup.unwrap_err(), StoreError::DuplicateEquation("circle_area".into()));

        let unknown = reg.add_equation_str("force", "F = P * A", EquationMetadata::default());
        assert!(matches!(unknown, Err(StoreError::UnregisteredSymbol { ref symbol, .. }) if symbol == "F"));

        let bad = reg.add_equation_str("broken", "A = = r", EquationMetadata::default());
        assert!(matches!(bad, Err(StoreError::Parse { .. })));

        let meta = reg.add_equation_str("ring", "A = l * w", EquationMetadata::output("r", &[]));
        assert!(matches!(meta, Err(StoreError::MetadataSymbol { ref symbol, .. }) if symbol == "r"));
        assert_eq!(reg.equation_count(), 1);
    }
}
