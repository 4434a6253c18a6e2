// Adapters layer: concrete implementations of the domain ports for the local
// filesystem and the Salesforce APIs.

pub mod salesforce;
pub mod storage;
