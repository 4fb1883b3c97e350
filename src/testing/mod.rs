//! Test doubles for the store and authorization capabilities.
//!
//! - [`MockResourceRepository`]: scripted store responses with call recording
//! - [`MockAuthorizer`]: scripted decisions and tuple responses with call recording
//! - [`InMemoryResourceRepository`]: a working store backed by a map
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use inventory_authz::testing::{InMemoryResourceRepository, MockAuthorizer};
//! use inventory_authz::{Decision, Resources, ResourcesConfig};
//!
//! let store = InMemoryResourceRepository::new();
//! let authorizer = MockAuthorizer::new().on_check("view", Ok(Decision::allowed()));
//!
//! let resources = Resources::new(
//!     Arc::new(store.clone()),
//!     Arc::new(store),
//!     Some(Arc::new(authorizer)),
//!     ResourcesConfig::for_namespace("hbi"),
//! );
//! assert!(resources.is_authorization_enabled());
//! ```
//!
//! ## Mocks vs InMemoryResourceRepository
//!
//! | Feature | Mocks | InMemoryResourceRepository |
//! |---------|-------|----------------------------|
//! | Scripted failures | ✓ | ✗ |
//! | Call recording | ✓ | ✗ |
//! | Real lookup semantics | ✗ | ✓ |
//! | Best for | Unit tests | Integration tests |

mod in_memory;
mod mock_authorizer;
mod mock_repository;

use std::collections::VecDeque;

pub use in_memory::InMemoryResourceRepository;
pub use mock_authorizer::{AuthorizerCall, AuthorizerMethod, MockAuthorizer};
pub use mock_repository::{MockResourceRepository, RepositoryCall, RepositoryMethod};

use crate::{Error, ErrorKind};

/// A scripted outcome. Errors are kept as parts so they can be rebuilt on
/// every call.
type Stub<T> = Result<T, (ErrorKind, String)>;

fn stub<T>(result: Result<T, Error>) -> Stub<T> {
    result.map_err(|e| (e.kind(), e.message().to_owned()))
}

fn unstub<T: Clone>(stub: &Stub<T>) -> Result<T, Error> {
    match stub {
        Ok(value) => Ok(value.clone()),
        Err((kind, message)) => Err(Error::new(*kind, message.clone())),
    }
}

/// Queued responses for one method. The last response repeats.
#[derive(Debug)]
struct Responses<T> {
    queue: VecDeque<T>,
}

impl<T> Default for Responses<T> {
    fn default() -> Self {
        Self { queue: VecDeque::new() }
    }
}

impl<T: Clone> Responses<T> {
    fn push(&mut self, response: T) {
        self.queue.push_back(response);
    }

    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }

    fn clear(&mut self) {
        self.queue.clear();
    }
}
