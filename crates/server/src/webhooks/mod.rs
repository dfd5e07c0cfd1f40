//! Webhook subscription filtering and best-effort dispatch.
//!
//! Dispatch is a side effect of ticket mutations: it must never block or
//! fail the mutation that triggered it. Delivery is a single concurrent
//! attempt per interested subscriber with no retry and no ordering
//! guarantee; the only output is a delivered/attempted summary for logging.

pub mod dispatcher;
pub mod filter;

pub use dispatcher::{DispatchSummary, WebhookDispatcher};
