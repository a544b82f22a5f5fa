//! Bags: unordered multisets of attribute values

use serde::{Deserialize, Serialize};

use crate::datatypes::AttributeValue;
use crate::identifier::Identifier;

/// Unordered collection of attribute values, duplicates allowed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bag {
    values: Vec<AttributeValue>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, value: AttributeValue) {
        self.values.push(value);
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttributeValue> {
        self.values.iter()
    }

    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<AttributeValue> {
        self.values
    }

    /// Values of the given data type only
    pub fn filter_type(&self, data_type: &Identifier) -> Bag {
        self.values
            .iter()
            .filter(|value| value.is_type(data_type))
            .cloned()
            .collect()
    }
}

impl FromIterator<AttributeValue> for Bag {
    fn from_iter<I: IntoIterator<Item = AttributeValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl Extend<AttributeValue> for Bag {
    fn extend<I: IntoIterator<Item = AttributeValue>>(&mut self, iter: I) {
        self.values.extend(iter);
    }
}

impl IntoIterator for Bag {
    type Item = AttributeValue;
    type IntoIter = std::vec::IntoIter<AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Bag {
    type Item = &'a AttributeValue;
    type IntoIter = std::slice::Iter<'a, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl From<Vec<AttributeValue>> for Bag {
    fn from(values: Vec<AttributeValue>) -> Self {
        Self { values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::DATATYPE_STRING;

    #[test]
    fn test_duplicates_are_kept() {
        let mut bag = Bag::new();
        bag.add(AttributeValue::string("a"));
        bag.add(AttributeValue::string("a"));
        assert_eq!(bag.size(), 2);
    }

    #[test]
    fn test_filter_type() {
        let bag: Bag = vec![AttributeValue::string("a"), AttributeValue::integer(1)].into();
        let strings = bag.filter_type(&DATATYPE_STRING);
        assert_eq!(strings.size(), 1);
        assert_eq!(strings.values()[0], AttributeValue::string("a"));
    }
}
