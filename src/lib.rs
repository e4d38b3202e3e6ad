pub mod authentication;
pub mod configuration;
pub mod contact_client;
pub mod dispatcher;
pub mod domain;
pub mod email_client;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod token_manager;
pub mod utils;
