//! Scheduler error type.
//!
//! Every variant is a caller-contract violation reported synchronously to the
//! calling thread.  Contention is never an error: it ends in a deferral and a
//! later retry.

use thiserror::Error;

use tc_core::{ClientId, ResourceRef, ResourceSet};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("client {0} is not registered")]
    UnknownClient(ClientId),

    #[error("client {0} is already registered")]
    DuplicateClient(ClientId),

    #[error("client {0} passed an empty resource set")]
    EmptyResourceSet(ClientId),

    #[error("resource {0} is not part of the plant model")]
    UnknownResource(ResourceRef),

    #[error("client {client} requested {requested}, which is not the head of its claim queue")]
    NotClaimHead { client: ClientId, requested: ResourceSet },

    #[error("client {client} released {resources}, which it does not hold")]
    NotAllocated { client: ClientId, resources: ResourceSet },

    #[error("allocation worker is already running")]
    AlreadyRunning,

    #[error("failed to start allocation worker: {0}")]
    Worker(#[from] std::io::Error),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
