//! Static catalog of the sentence-embedding model types the service knows by name.
//!
//! Pure lookup over a table built at compile time; no concurrency concerns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EmbedError;

/// Known sentence-embedding model types.
///
/// Serialized with the upper-case names used on the wire (e.g. `"ALL_MINILM_L12_V2"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    #[serde(rename = "ALL_MINILM_L12_V2")]
    AllMiniLmL12V2,
    #[serde(rename = "E5_BASE_V2")]
    E5BaseV2,
    #[serde(rename = "MSMARCO_MINILM_L_6_V3")]
    MsmarcoMiniLmL6V3,
    #[serde(rename = "MSMARCO_DISTILBERT_BASE_V4")]
    MsmarcoDistilbertBaseV4,
    #[serde(rename = "PARAPHRASE_MULTILINGUAL_MPNET_BASE_V2")]
    ParaphraseMultilingualMpnetBaseV2,
}

/// Immutable catalog entry: wire identifier, display name and source URI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub model_type: ModelType,
    pub identifier: &'static str,
    pub display_name: &'static str,
    pub source_uri: &'static str,
}

static CATALOG: [ModelDescriptor; 5] = [
    ModelDescriptor {
        model_type: ModelType::AllMiniLmL12V2,
        identifier: "ALL_MINILM_L12_V2",
        display_name: "all-MiniLM-L12-v2",
        source_uri: "djl://ai.djl.huggingface.pytorch/sentence-transformers/all-MiniLM-L12-v2",
    },
    ModelDescriptor {
        model_type: ModelType::E5BaseV2,
        identifier: "E5_BASE_V2",
        display_name: "e5-base-v2",
        source_uri: "djl://ai.djl.huggingface.pytorch/sentence-transformers/e5-base-v2",
    },
    ModelDescriptor {
        model_type: ModelType::MsmarcoMiniLmL6V3,
        identifier: "MSMARCO_MINILM_L_6_V3",
        display_name: "msmarco-MiniLM-L-6-v3",
        source_uri: "djl://ai.djl.huggingface.pytorch/sentence-transformers/msmarco-MiniLM-L-6-v3",
    },
    ModelDescriptor {
        model_type: ModelType::MsmarcoDistilbertBaseV4,
        identifier: "MSMARCO_DISTILBERT_BASE_V4",
        display_name: "msmarco-distilbert-base-V4",
        source_uri: "djl://ai.djl.huggingface.pytorch/sentence-transformers/msmarco-distilbert-base-V4",
    },
    ModelDescriptor {
        model_type: ModelType::ParaphraseMultilingualMpnetBaseV2,
        identifier: "PARAPHRASE_MULTILINGUAL_MPNET_BASE_V2",
        display_name: "paraphrase-multilingual-mpnet-base-V2",
        source_uri: "djl://ai.djl.huggingface.pytorch/sentence-transformers/paraphrase-multilingual-mpnet-base-V2",
    },
];

impl ModelType {
    /// All catalog model types, in catalog order.
    pub const ALL: [ModelType; 5] = [
        ModelType::AllMiniLmL12V2,
        ModelType::E5BaseV2,
        ModelType::MsmarcoMiniLmL6V3,
        ModelType::MsmarcoDistilbertBaseV4,
        ModelType::ParaphraseMultilingualMpnetBaseV2,
    ];

    /// Catalog entry for this model type.
    pub fn descriptor(self) -> &'static ModelDescriptor {
        // CATALOG is declared in the same order as ALL.
        &CATALOG[self as usize]
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor().identifier)
    }
}

impl FromStr for ModelType {
    type Err = EmbedError;

    /// Case-insensitive match on the wire identifier (`E5_BASE_v2` and `E5_BASE_V2` both work).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CATALOG
            .iter()
            .find(|d| d.identifier.eq_ignore_ascii_case(s.trim()))
            .map(|d| d.model_type)
            .ok_or_else(|| EmbedError::NotFound(s.to_string()))
    }
}

/// Looks up a model type identifier in the catalog.
///
/// Returns [`EmbedError::NotFound`] for anything outside the five known types.
pub fn lookup(model_type: &str) -> Result<&'static ModelDescriptor, EmbedError> {
    model_type.parse::<ModelType>().map(ModelType::descriptor)
}

/// The whole catalog, in declaration order.
pub fn descriptors() -> &'static [ModelDescriptor] {
    &CATALOG
}
