//! Document - the payload accepted by the dispatcher
//!
//! Record shapes for the product-introduction document. Field names are
//! serialized in camelCase.

use serde::{Deserialize, Serialize};

/// Document submitted to the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Document description
    pub description: Description,

    pub doc_id: String,

    pub doc_status: String,

    pub doc_type: String,

    /// Import flag
    pub import_request: bool,

    pub owner_inn: String,

    pub participant_inn: String,

    pub producer_inn: String,

    /// Production date (`YYYY-MM-DD`)
    pub production_date: String,

    pub production_type: String,

    /// Products covered by this document
    #[serde(default)]
    pub products: Vec<Product>,

    /// Registration date (`YYYY-MM-DD`)
    pub reg_date: String,

    pub reg_number: String,
}

/// Document description block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub participant_inn: String,
}

/// Single product entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub certificate_document: String,
    pub certificate_document_date: String,
    pub certificate_document_number: String,
    pub owner_inn: String,
    pub producer_inn: String,
    pub production_date: String,
    pub tnved_code: String,
    pub uit_code: String,
    pub uitu_code: String,
}

impl Document {
    /// Build a filled-in demo document with the given id
    pub fn sample(doc_id: impl Into<String>) -> Self {
        Self {
            description: Description {
                participant_inn: "123".to_string(),
            },
            doc_id: doc_id.into(),
            doc_status: "status".to_string(),
            doc_type: "type".to_string(),
            import_request: true,
            owner_inn: "owner_inn".to_string(),
            participant_inn: "participant_inn".to_string(),
            producer_inn: "producer_inn".to_string(),
            production_date: "2024-01-01".to_string(),
            production_type: "production_type".to_string(),
            products: vec![Product::sample()],
            reg_date: "2024-01-01".to_string(),
            reg_number: "reg_number".to_string(),
        }
    }
}

impl Product {
    /// Build a filled-in demo product
    pub fn sample() -> Self {
        Self {
            certificate_document: "cert".to_string(),
            certificate_document_date: "2024-01-01".to_string(),
            certificate_document_number: "123".to_string(),
            owner_inn: "owner_inn".to_string(),
            producer_inn: "producer_inn".to_string(),
            production_date: "2024-01-01".to_string(),
            tnved_code: "tnved_code".to_string(),
            uit_code: "uit_code".to_string(),
            uitu_code: "uitu_code".to_string(),
        }
    }
}
