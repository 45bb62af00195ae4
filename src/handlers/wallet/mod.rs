mod builder;
pub mod handler;
mod prepare_calls;
mod send_prepared_calls;
pub mod types;
mod validation;
