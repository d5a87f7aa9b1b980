pub mod error;
pub mod evaluator;
pub mod position;
pub mod value;

pub use error::MatScriptError;
pub use evaluator::Evaluator;
pub use position::Position;
pub use value::MsValue;
