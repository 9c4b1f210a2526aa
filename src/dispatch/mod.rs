//! Runtime-typed dispatch onto the store's typed operations
//!
//! - `value`: `Value` (type-erased, nullable) and `TypeKey`
//! - `registry`: `TypeRegistry`, runtime type → typed store operations
//! - `invoker`: `Dispatcher`, single and batched reads/writes for one owner

pub mod invoker;
pub mod registry;
pub mod value;

pub use invoker::{BatchResults, Dispatcher};
pub use registry::{Persist, TypeRegistry, TypedOps};
pub use value::{TypeKey, Value};
