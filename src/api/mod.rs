//! REST API module
//!
//! Provides HTTP access to one chain's proposal workflow.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness and served chain
//! - `GET /api/safe` - Owners, threshold and nonce
//!
//! ## Proposals
//! - `GET /api/proposals` - List proposals (`?pending=true` for unexecuted)
//! - `GET /api/proposals/{hash}` - Get proposal with derived status
//! - `POST /api/proposals/owners/add` - Propose `addOwnerWithThreshold`
//! - `POST /api/proposals/owners/remove` - Propose `removeOwner`
//! - `POST /api/proposals/owners/swap` - Propose `swapOwner`
//! - `POST /api/proposals/threshold` - Propose `changeThreshold`
//! - `POST /api/proposals/upgrade` - Propose a proxy upgrade
//!
//! ## Signatures
//! - `POST /api/proposals/{hash}/signatures` - Add a pre-signed signature
//! - `POST /api/proposals/{hash}/execute` - Submit once the threshold is met
//!
//! Private keys never travel over the API; signatures are produced by the
//! CLI or another signer and posted as `r || s || v` hex.

pub mod handlers;
pub mod routes;

pub use handlers::ApiState;
pub use routes::create_router;
