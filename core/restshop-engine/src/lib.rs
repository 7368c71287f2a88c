//! Engine handle contract for restshop.
//!
//! The optimization engine is an opaque, stateful, blocking component. This
//! crate pins down what the rest of the service expects from it:
//! - [`Engine`]: one instance with its object model, attributes, commands
//!   and relation index
//! - [`EngineFactory`]: how instances are created
//! - [`NativeValue`]: the shapes attribute values take inside the engine
//!
//! [`MemoryEngine`] implements the contract in process. It backs the test
//! suites and the default build of the service binary.

pub mod error;
pub mod handle;
pub mod memory;
pub mod native;

pub use error::{EngineError, EngineResult};
pub use handle::{AttributeInfo, Engine, EngineConfig, EngineFactory, LogCallback};
pub use memory::{MemoryEngine, MemoryEngineFactory};
pub use native::{
    Frame, FrameColumn, NativeTimeResolution, NativeValue, Scalar, Series, SeriesIndex, SeriesLabel,
};
