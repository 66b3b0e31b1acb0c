//! Image classification with a TorchScript model, packaged for serverless
//! invocation.
//!
//! A process fetches its model once at cold start ([`artifact`]), loads it
//! together with a label mapping ([`engine`], [`labels`]) into an
//! [`ImageClassifier`], and then serves any number of invocations through
//! [`handler::handle`].

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod labels;
pub mod payload;
pub mod preprocess;
pub mod ranking;
pub mod timer;

pub use classifier::ImageClassifier;
pub use config::Config;
pub use engine::{Engine, TorchScriptModel};
pub use error::{Result, ServeError};
pub use handler::{InvocationEvent, InvocationResponse};
pub use labels::LabelMap;
pub use ranking::Prediction;
pub use timer::Timer;
