pub mod broadcast;
pub mod health;
