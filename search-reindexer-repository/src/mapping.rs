//! Index mappings for the product search index.
//!
//! The control plane treats mappings as opaque: a `MappingProvider` is
//! injected wherever indices are created, and the domain-specific schema
//! lives behind it.

use serde_json::{json, Value};

/// Supplies the settings and mappings body used when creating an index.
pub trait MappingProvider: Send + Sync {
    /// The full index-creation body (settings + mappings).
    fn index_body(&self) -> Value;
}

/// Mapping provider for the product catalog index.
///
/// The configuration includes:
/// - **search_as_you_type**: autocomplete on product and search names
/// - **Keyword fields**: for filtering and exact id lookups
/// - **double**: price fields for range criteria
#[derive(Debug, Clone)]
pub struct ProductMapping {
    /// Number of primary shards.
    pub shards: u32,
    /// Number of replicas per shard.
    pub replicas: u32,
}

impl Default for ProductMapping {
    fn default() -> Self {
        Self {
            shards: 1,
            replicas: 1,
        }
    }
}

impl MappingProvider for ProductMapping {
    fn index_body(&self) -> Value {
        json!({
            "settings": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas
            },
            "mappings": {
                "properties": {
                    "RecordId": {
                        "type": "long"
                    },
                    "ItemId": {
                        "type": "keyword"
                    },
                    "ProductNumber": {
                        "type": "keyword"
                    },
                    "ProductName": {
                        "type": "search_as_you_type",
                        "fields": {
                            "raw": {
                                "type": "keyword"
                            }
                        }
                    },
                    "SearchName": {
                        "type": "search_as_you_type"
                    },
                    "Description": {
                        "type": "text"
                    },
                    "BasePrice": {
                        "type": "double"
                    },
                    "Price": {
                        "type": "double"
                    },
                    "AdjustedPrice": {
                        "type": "double"
                    },
                    "Rules": {
                        "properties": {
                            "ProductId": {
                                "type": "long"
                            }
                        }
                    },
                    "indexedAt": {
                        "type": "date"
                    }
                }
            }
        })
    }
}
