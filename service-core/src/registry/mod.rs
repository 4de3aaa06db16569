//! Registry protocol and the service lifecycle built on it.
//!
//! A provider brings its [`ServiceDescriptor`] into the catalog with
//! [`Registration::acquire`], keeps a [`LivenessLoop`] running while it serves
//! and hands the registration back with [`Registration::release`] on graceful
//! shutdown. Consumers resolve a capability name with [`lookup`].

pub mod client;
pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod lifecycle;

pub use client::{HttpRegistryClient, RegistryClient};
pub use descriptor::{
    AgentService, AgentServiceCheck, AgentServiceRegistration, CatalogEntry, ServiceDescriptor,
};
pub use discovery::{ServiceInstance, lookup};
pub use error::RegistryError;
pub use lifecycle::{
    InertCheck, LivenessCheck, LivenessLoop, Registration, RegistrationFailed, RegistrationState,
    RetryPolicy, deregister, register,
};
