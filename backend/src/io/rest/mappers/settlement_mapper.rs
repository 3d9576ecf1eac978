use crate::domain::commands::settlement::{
    SettleCommand, SettlementQuote as DomainQuote, SettlementReceipt as DomainReceipt,
};
use crate::domain::grouping::{BillingKey, Group};
use crate::io::rest::mappers::booking_mapper::BookingMapper;
use shared::{OutstandingGroup, SettleRequest, SettlementQuote, SettlementReceipt};

pub struct SettlementMapper;

impl SettlementMapper {
    pub fn to_command(request: SettleRequest) -> SettleCommand {
        SettleCommand {
            owner_id: request.owner_id,
            booking_ids: request.booking_ids,
        }
    }

    pub fn to_quote_dto(quote: DomainQuote) -> SettlementQuote {
        SettlementQuote {
            service_subtotal: quote.service_subtotal,
            penalty_subtotal: quote.penalty_subtotal,
            tax: quote.tax,
            grand_total: quote.grand_total,
            booking_ids: quote.booking_ids,
        }
    }

    pub fn to_receipt_dto(receipt: DomainReceipt) -> SettlementReceipt {
        SettlementReceipt {
            owner_id: receipt.owner_id,
            amount_charged: receipt.quote.grand_total,
            tax: receipt.quote.tax,
            service_subtotal: receipt.quote.service_subtotal,
            penalty_subtotal: receipt.quote.penalty_subtotal,
            booking_ids: receipt.quote.booking_ids,
            balance_after: receipt.balance_after,
            settled_at: receipt.settled_at,
        }
    }

    pub fn to_outstanding_dto(groups: Vec<(Group<BillingKey>, DomainQuote)>) -> Vec<OutstandingGroup> {
        groups
            .into_iter()
            .map(|(group, quote)| OutstandingGroup {
                group: BookingMapper::to_billing_group(group),
                quote: Self::to_quote_dto(quote),
            })
            .collect()
    }
}
