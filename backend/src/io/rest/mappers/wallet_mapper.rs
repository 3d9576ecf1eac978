use crate::domain::models::catalog::{Pet as DomainPet, Service as DomainService};
use crate::domain::models::wallet::{WalletAccount, WalletTransaction as DomainTransaction};
use shared::{Pet, RegisterPetRequest, Service, Wallet, WalletTransaction};

/// Wallet and catalog conversions
pub struct WalletMapper;

impl WalletMapper {
    pub fn to_wallet_dto(account: WalletAccount) -> Wallet {
        Wallet {
            owner_id: account.owner_id,
            balance: account.balance,
        }
    }

    pub fn to_transaction_dto(domain: DomainTransaction) -> WalletTransaction {
        WalletTransaction {
            id: domain.id,
            owner_id: domain.owner_id,
            date: domain.date,
            description: domain.description,
            amount: domain.amount,
            balance: domain.balance,
        }
    }

    pub fn to_transaction_dto_list(domain: Vec<DomainTransaction>) -> Vec<WalletTransaction> {
        domain.into_iter().map(Self::to_transaction_dto).collect()
    }

    pub fn to_service_dto(domain: DomainService) -> Service {
        Service {
            service_type: domain.service_type,
            rate: domain.rate,
        }
    }

    pub fn to_domain_pet(request: RegisterPetRequest) -> DomainPet {
        DomainPet {
            id: request.pet_id,
            owner_id: request.owner_id,
            name: request.name,
        }
    }

    pub fn to_pet_dto(domain: DomainPet) -> Pet {
        Pet {
            id: domain.id,
            owner_id: domain.owner_id,
            name: domain.name,
        }
    }
}
