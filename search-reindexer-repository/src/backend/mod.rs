//! Concrete cluster backends.

mod elasticsearch_gateway;

pub use elasticsearch_gateway::ElasticsearchGateway;
