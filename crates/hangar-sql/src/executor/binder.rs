//! Positional parameter binding.
//!
//! Each `?` in a statement owns the slot given by its position among all
//! placeholders of that statement. A slot with no supplied parameter is
//! unbound: inserts omit the column, and predicates compare it as absent.

use crate::parser::Operand;

use super::Value;

/// Resolves operands against the parameters of one execution.
#[derive(Debug, Clone, Copy)]
pub struct Binder<'a> {
    params: &'a [Value],
}

impl<'a> Binder<'a> {
    /// Creates a binder over `params`.
    pub fn new(params: &'a [Value]) -> Self {
        Self { params }
    }

    /// Returns the parameter bound to a slot.
    pub fn get(&self, slot: usize) -> Option<&'a Value> {
        self.params.get(slot)
    }

    /// Resolves an operand. Literals always resolve; placeholders resolve
    /// only when a parameter was supplied for their slot.
    pub fn resolve(&self, operand: &Operand) -> Option<Value> {
        match operand {
            Operand::Placeholder(slot) => self.get(*slot).cloned(),
            Operand::Literal(lit) => Some(Value::from_literal(lit)),
        }
    }

    /// Returns the number of supplied parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Literal;

    #[test]
    fn test_resolve_placeholders() {
        let params = vec![Value::text("a"), Value::Integer(2)];
        let binder = Binder::new(&params);

        assert_eq!(binder.resolve(&Operand::Placeholder(1)), Some(Value::Integer(2)));
        assert_eq!(binder.resolve(&Operand::Placeholder(2)), None);
        assert_eq!(
            binder.resolve(&Operand::Literal(Literal::Null)),
            Some(Value::Null)
        );
    }

    #[test]
    fn test_empty_binder() {
        let binder = Binder::new(&[]);
        assert!(binder.is_empty());
        assert_eq!(binder.get(0), None);
    }
}
