pub mod booking_mapper;
pub mod settlement_mapper;
pub mod wallet_mapper;
