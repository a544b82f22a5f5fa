//! Validation and conversion of one function argument to a native type

use std::marker::PhantomData;

use super::FunctionArgument;
use crate::bag::Bag;
use crate::datatypes::{AttributeValue, DataType};
use crate::identifier::Identifier;
use crate::status::Status;

/// Native payload of a successfully converted argument
#[derive(Debug, Clone, PartialEq)]
pub enum Converted<N> {
    Single(N),
    Bag(Bag),
}

/// An argument checked against an expected data type and bag/scalar shape.
///
/// The status is always set; a value is present only when it is OK. Bags pass
/// through unconverted; use [`ConvertedArgument::bag_values`] to convert
/// their members.
#[derive(Debug, Clone)]
pub struct ConvertedArgument<T: DataType> {
    status: Status,
    value: Option<Converted<T::Native>>,
    _data_type: PhantomData<T>,
}

/// Shortened data-type id for error messages: the text after `#`, or after
/// `:data-type:`, or the whole id.
pub fn short_data_type_id(id: &Identifier) -> &str {
    let id = id.as_str();
    if let Some(index) = id.find('#') {
        return &id[index + 1..];
    }
    match id.find(":data-type:") {
        Some(index) => &id[index + ":data-type:".len()..],
        None => id,
    }
}

fn type_mismatch<T: DataType>(value: &AttributeValue) -> Status {
    Status::processing_error(format!(
        "Expected data type '{}' saw '{}'",
        short_data_type_id(&T::id()),
        short_data_type_id(&value.data_type)
    ))
}

fn convert_value<T: DataType>(value: &AttributeValue) -> Result<T::Native, Status> {
    if value.data_type != T::id() {
        return Err(type_mismatch::<T>(value));
    }
    T::convert(&value.value).map_err(|e| Status::processing_error(e.status_message()))
}

impl<T: DataType> ConvertedArgument<T> {
    pub fn new(argument: Option<&dyn FunctionArgument>, expect_bag: bool) -> Self {
        match Self::convert(argument, expect_bag) {
            Ok(value) => Self {
                status: Status::ok(),
                value: Some(value),
                _data_type: PhantomData,
            },
            Err(status) => Self {
                status,
                value: None,
                _data_type: PhantomData,
            },
        }
    }

    fn convert(argument: Option<&dyn FunctionArgument>, expect_bag: bool) -> Result<Converted<T::Native>, Status> {
        let argument = argument.ok_or_else(|| Status::processing_error("Got null argument"))?;

        if !argument.is_ok() {
            return Err(argument.status().cloned().unwrap_or_default());
        }

        if expect_bag {
            if !argument.is_bag() {
                return Err(Status::processing_error("Expected a bag, saw a simple value"));
            }
            return Ok(Converted::Bag(argument.bag().cloned().unwrap_or_default()));
        }

        if argument.is_bag() {
            return Err(Status::processing_error("Expected a simple value, saw a bag"));
        }

        let value = argument
            .value()
            .ok_or_else(|| Status::processing_error("Got null attribute"))?;
        convert_value::<T>(value).map(Converted::Single)
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    pub fn value(&self) -> Option<&T::Native> {
        match &self.value {
            Some(Converted::Single(value)) => Some(value),
            _ => None,
        }
    }

    pub fn bag(&self) -> Option<&Bag> {
        match &self.value {
            Some(Converted::Bag(bag)) => Some(bag),
            _ => None,
        }
    }

    /// Consume into the converted payload, or the error status
    pub fn into_result(self) -> Result<Converted<T::Native>, Status> {
        match self.value {
            Some(value) if self.status.is_ok() => Ok(value),
            _ => Err(self.status),
        }
    }

    /// Consume into the single native value, or the error status
    pub fn into_value(self) -> Result<T::Native, Status> {
        match self.into_result()? {
            Converted::Single(value) => Ok(value),
            Converted::Bag(_) => Err(Status::processing_error("Expected a simple value, saw a bag")),
        }
    }

    /// Convert every member of a bag argument, checking each data type
    pub fn bag_values(&self) -> Result<Vec<T::Native>, Status> {
        if !self.status.is_ok() {
            return Err(self.status.clone());
        }
        match &self.value {
            Some(Converted::Bag(bag)) => bag.iter().map(convert_value::<T>).collect(),
            _ => Err(Status::processing_error("Expected a bag, saw a simple value")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{DataTypeInteger, DataTypeString};
    use crate::function::{FunctionArgumentAttributeValue, FunctionArgumentBag};
    use crate::identifier::DATATYPE_STRING;

    #[test]
    fn test_short_data_type_id() {
        assert_eq!(short_data_type_id(&DATATYPE_STRING), "string");
        assert_eq!(
            short_data_type_id(&Identifier::new("urn:oasis:names:tc:xacml:2.0:data-type:ipAddress")),
            "ipAddress"
        );
        assert_eq!(short_data_type_id(&Identifier::new("custom")), "custom");
    }

    #[test]
    fn test_null_argument() {
        let converted = ConvertedArgument::<DataTypeString>::new(None, false);
        assert_eq!(converted.status().message(), Some("Got null argument"));
        assert!(converted.value().is_none());
    }

    #[test]
    fn test_scalar_conversion() {
        let argument = FunctionArgumentAttributeValue::new(AttributeValue::integer(4));
        let converted = ConvertedArgument::<DataTypeInteger>::new(Some(&argument), false);
        assert!(converted.is_ok());
        assert_eq!(converted.value(), Some(&4));
    }

    #[test]
    fn test_type_mismatch_names_both_types() {
        let argument = FunctionArgumentAttributeValue::new(AttributeValue::string("4"));
        let converted = ConvertedArgument::<DataTypeInteger>::new(Some(&argument), false);
        assert_eq!(
            converted.status().message(),
            Some("Expected data type 'integer' saw 'string'")
        );
    }

    #[test]
    fn test_bag_shape_mismatch() {
        let bag = FunctionArgumentBag::new(Bag::new());
        let converted = ConvertedArgument::<DataTypeString>::new(Some(&bag), false);
        assert_eq!(converted.status().message(), Some("Expected a simple value, saw a bag"));

        let scalar = FunctionArgumentAttributeValue::new(AttributeValue::string("a"));
        let converted = ConvertedArgument::<DataTypeString>::new(Some(&scalar), true);
        assert_eq!(converted.status().message(), Some("Expected a bag, saw a simple value"));
    }

    #[test]
    fn test_bag_values_checks_member_types() {
        let bag: Bag = vec![AttributeValue::integer(1), AttributeValue::string("x")].into();
        let argument = FunctionArgumentBag::new(bag);
        let converted = ConvertedArgument::<DataTypeInteger>::new(Some(&argument), true);
        assert!(converted.is_ok());
        let err = converted.bag_values().unwrap_err();
        assert_eq!(err.message(), Some("Expected data type 'integer' saw 'string'"));
    }
}
