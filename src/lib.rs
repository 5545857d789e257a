//! Bridges API Gateway and load-balancer Lambda events to an HTTP-serving
//! component and shapes its responses back into gateway replies.

pub mod decoration;
pub mod handler;
pub mod http;
pub mod models;
pub mod normalizer;
pub mod shaper;
pub mod stringifiers;
pub mod utils;

pub use handler::Adapter;
