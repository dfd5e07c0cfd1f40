pub mod health_routes;
pub mod stats_routes;
pub mod ticket_routes;
pub mod webhook_routes;
