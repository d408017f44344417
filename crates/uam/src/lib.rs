//! Unmanaged Application Master (UAM) client.
//!
//! Lets an external process act as an application master inside a
//! cluster-resource-manager (CRM) without being launched by the CRM
//! itself: submits a placeholder application, waits for the CRM to accept
//! an attempt, registers as that attempt's master, then drives a
//! long-running, asynchronous allocate/heartbeat loop against the CRM's
//! application-master RPC endpoint.
//!
//! RPC transport, CRM-side scheduling, container lifecycle on worker
//! nodes, and credential/keytab acquisition are out of scope: the host
//! process supplies an authenticated [`Principal`] and implementations of
//! [`rpc::ClientProtocol`] / [`rpc::MasterProtocol`] behind a
//! [`rpc::ProxyFactory`].

pub mod config;
pub mod error;
pub mod monitor;
pub mod principal;
pub mod queue;
pub mod reregister;
pub mod rpc;
pub mod types;
pub mod worker;

mod controller;

pub use config::UamConfig;
pub use controller::UnmanagedApplicationMaster;
pub use error::UamError;
pub use principal::{Principal, TokenHolder};
pub use queue::Callback;
