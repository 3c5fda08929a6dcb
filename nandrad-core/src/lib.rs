//! Core types and traits for the NANDRAD simulation models.
//!
//! This crate defines the shared vocabulary used by the model crates and by the
//! simulation framework that wires them together:
//!
//! - [`QuantityName`], [`QuantityDescription`], [`InputReference`]: how a model
//!   names the quantities it publishes and the quantities it needs
//! - [`ValueRef`] and [`ValueSource`]: stable handles to published values and
//!   the lookup used to read them
//! - [`VectorValuedQuantity`]: a quantity computed once per member of an index set
//! - [`ObjectList`] and [`Zone`]: the configuration records models resolve against
//! - [`ResultProvider`] and [`StateDependency`]: the calling convention between
//!   models and the framework
//! - [`ConfigurationError`], [`ConsistencyFault`], [`ModelError`]: the error taxonomy

mod error;
mod model;
mod object_list;
mod quantity;
mod value;
mod vector;

pub use error::{ConfigurationError, ConsistencyFault, ModelError};
pub use model::{ResultProvider, StateDependency};
pub use object_list::{ObjectList, Zone};
pub use quantity::{IndexKeyType, InputReference, QuantityDescription, QuantityName, ReferenceType};
pub use value::{ModelId, ValueRef, ValueSource};
pub use vector::VectorValuedQuantity;
