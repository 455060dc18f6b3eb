//! Document model adapters
//!
//! A [`DocumentModel`] turns raw JSON text into the parsed tree an
//! implementation prefers, and back again. Every adapter currently wraps a
//! library that consumes `serde_json::Value`, so [`ValueModel`] is the one
//! they share. [`TypedModel`] binds the benchmark test model to a concrete
//! struct, which gives the serialize benchmark a typed comparison point.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Conversion between JSON text and a native document representation
pub trait DocumentModel {
    /// The parsed representation
    type Native;

    /// Short identifier used in logs and benchmark ids
    fn name(&self) -> &'static str;

    /// Parse text into the native representation
    fn to_native(&self, text: &str) -> Result<Self::Native>;

    /// Render the native representation back to text
    fn to_text(&self, native: &Self::Native) -> Result<String>;

    /// Parse and re-render, returning the new text
    fn round_trip(&self, text: &str) -> Result<String> {
        let native = self.to_native(text)?;
        self.to_text(&native)
    }
}

/// The untyped `serde_json::Value` tree
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueModel;

impl DocumentModel for ValueModel {
    type Native = Value;

    fn name(&self) -> &'static str {
        "value"
    }

    fn to_native(&self, text: &str) -> Result<Value> {
        Ok(serde_json::from_str(text)?)
    }

    fn to_text(&self, native: &Value) -> Result<String> {
        Ok(serde_json::to_string(native)?)
    }
}

/// Enumerated field of [`TestModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum AnEnum {
    THIS,
    THAT,
    OTHER,
}

/// One element of [`TestModel::polymorphic_types`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum PolyType {
    #[serde(rename = "poly-a")]
    A { id: Uuid },
    #[serde(rename = "poly-b")]
    B { num: f64 },
}

/// The document shape described by the bundled `test-model-*` fixtures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestModel {
    pub name: String,
    pub decimal: f64,
    #[serde(rename = "anEnum")]
    pub an_enum: AnEnum,
    pub list: Vec<String>,
    #[serde(rename = "polymorphicTypes")]
    pub polymorphic_types: Vec<PolyType>,
}

impl TestModel {
    /// A representative instance, large enough that parsing cost is visible
    pub fn sample() -> Self {
        let words = [
            "long", "long", "list", "of", "data", "so", "that", "we've", "got", "some", "time",
            "spent", "parsing", "all", "this", "json", "data",
        ];
        let list = words
            .iter()
            .chain(words.iter())
            .map(|w| w.to_string())
            .collect();

        Self {
            name: "some name".to_string(),
            decimal: 145.000001,
            an_enum: AnEnum::THAT,
            list,
            polymorphic_types: vec![
                PolyType::A { id: Uuid::from_u128(0x6f1c_2d40_8a7e_4b1f_9c3d_5e6f_7a8b_9c0d) },
                PolyType::A { id: Uuid::from_u128(0x1b2c_3d4e_5f60_4172_8394_a5b6_c7d8_e9f0) },
                PolyType::B { num: 12.34000005 },
                PolyType::B { num: 0.0000000002 },
                PolyType::A { id: Uuid::from_u128(0x0a1b_2c3d_4e5f_4061_8273_8495_a6b7_c8d9) },
                PolyType::A { id: Uuid::from_u128(0xf0e1_d2c3_b4a5_4697_8879_6a5b_4c3d_2e1f) },
                PolyType::B { num: 13.34000005 },
                PolyType::B { num: 1.0000000002 },
            ],
        }
    }
}

/// Binds JSON text to [`TestModel`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedModel;

impl DocumentModel for TypedModel {
    type Native = TestModel;

    fn name(&self) -> &'static str {
        "typed"
    }

    fn to_native(&self, text: &str) -> Result<TestModel> {
        Ok(serde_json::from_str(text)?)
    }

    fn to_text(&self, native: &TestModel) -> Result<String> {
        Ok(serde_json::to_string(native)?)
    }
}

/// Structural equality of two JSON texts
pub fn same_document(left: &str, right: &str) -> Result<bool> {
    let l: Value = serde_json::from_str(left)?;
    let r: Value = serde_json::from_str(right)?;
    Ok(l == r)
}

/// Parse a schema document; malformed text is a compilation failure
pub(crate) fn parse_schema(implementation: &str, text: &str) -> Result<Value> {
    ValueModel
        .to_native(text)
        .map_err(|e| Error::compilation(implementation, format!("malformed schema: {}", e)))
}

/// Parse an instance document; malformed text is an execution failure
pub(crate) fn parse_instance(implementation: &str, text: &str) -> Result<Value> {
    ValueModel
        .to_native(text)
        .map_err(|e| Error::execution(implementation, format!("malformed instance: {}", e)))
}
