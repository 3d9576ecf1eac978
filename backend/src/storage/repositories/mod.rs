pub mod booking_repository;
pub mod catalog_repository;
pub mod wallet_repository;

pub use booking_repository::BookingRepository;
pub use catalog_repository::CatalogRepository;
pub use wallet_repository::WalletRepository;
