mod health;
mod metrics;
mod wallet;
