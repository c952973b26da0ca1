//! Promotion domain: data model and the pure rules over it.
pub mod aggregates;
pub mod events;
pub mod freshness;
pub mod message;
pub mod pricing;
pub mod value_objects;
