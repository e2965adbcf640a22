//! Report Module - Persisting attack results
//!
//! Evaluation records accumulate in a JSON array per file; perturbed tensors are
//! dumped as nested JSON lists or rendered to PNG. Every writer checks the file
//! extension and creates missing parent directories.

pub mod record;
pub mod writer;
pub mod png;


pub use record::EvalRecord;
pub use writer::{append_record, ensure_extension, read_perturbation, write_perturbation};
pub use png::write_png;
