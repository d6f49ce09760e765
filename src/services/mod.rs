pub mod telegram;
pub mod whitelist;
