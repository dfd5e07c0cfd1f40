pub mod stats_service;
pub mod subscription_service;
pub mod ticket_service;
