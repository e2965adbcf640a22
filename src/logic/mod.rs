//! Logic Module - Attack evaluation engine
//!
//! - `attack/` - Perturbation hook, evaluation, session state
//! - `model/` - Classifier contract, labels, ONNX backend
//! - `tensor/` - Tensor math (softmax, top-k, resize) and JSON layout
//! - `report/` - JSON / PNG persistence

pub mod error;
pub mod config;

pub mod tensor;
pub mod model;
pub mod attack;
pub mod report;
