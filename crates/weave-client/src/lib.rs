//! Client side of Weave: a typed API client, a keyed query cache, and the
//! connection/invitation controller that keeps the two coherent.
//!
//! ```rust,ignore
//! let client     = ApiClient::new("http://localhost:8080")?;
//! let controller = Controller::new(client, StaticToken::new(token));
//! let view       = controller.load_network(&CancellationToken::new()).await?;
//! println!("{}", render_network(&view, Tab::Pending, Layout::List));
//! ```

pub mod cache;
pub mod client;
pub mod controller;
pub mod error;
pub mod mutation;
pub mod token;
pub mod view;

pub use cache::{QueryCache, QueryKey, Resource};
pub use client::ApiClient;
pub use controller::{Applied, Controller, UserRef};
pub use error::{ClientError, Result};
pub use mutation::{Mutation, MutationKind};
pub use token::{StaticToken, TokenProvider};
pub use view::{Layout, NetworkView, ProfileView, Tab, TabCounts, ViewState};
