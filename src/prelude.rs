//! Common imports for writing an application on this runtime.
//!
//! ```
//! use usertable::prelude::*;
//! ```

pub use crate::application::Application;
pub use crate::command::{Action, Command};
pub use crate::runtime::Runtime;
pub use crate::subscription::Subscription;
pub use crate::subscription::query::{FetchState, Query, QueryClient, QueryConfig, QueryError};
