use crate::domain::commands::bookings::{
    BookingActionCommand, CancelBookingCommand, CreateBookingCommand,
};
use crate::domain::grouping::{BillingKey, Group, OrderKey};
use crate::domain::models::booking::Booking as DomainBooking;
use shared::{
    BillingGroup, Booking, BookingActionRequest, CancelBookingRequest, CreateBookingRequest,
    OrderGroup,
};

pub struct BookingMapper;

impl BookingMapper {
    pub fn to_dto(domain: DomainBooking) -> Booking {
        Booking {
            id: domain.id,
            owner_id: domain.owner_id,
            pet_id: domain.pet_id,
            service_type: domain.service_type,
            start_date: domain.start_date,
            end_date: domain.end_date,
            status: domain.status,
            total_price: domain.total_price,
            charge_kind: domain.charge_kind,
            is_paid: domain.is_paid,
            notes: domain.notes,
            processed_by: domain.processed_by,
            status_note: domain.status_note,
            created_at: domain.created_at,
            updated_at: domain.updated_at,
        }
    }

    pub fn to_dto_list(domain: Vec<DomainBooking>) -> Vec<Booking> {
        domain.into_iter().map(Self::to_dto).collect()
    }

    pub fn to_create_command(request: CreateBookingRequest) -> CreateBookingCommand {
        CreateBookingCommand {
            owner_id: request.owner_id,
            pet_ids: request.pet_ids,
            service_type: request.service_type,
            start_date: request.start_date,
            end_date: request.end_date,
            notes: request.notes,
        }
    }

    /// Body is optional on action endpoints
    pub fn to_action_command(booking_id: String, request: Option<BookingActionRequest>) -> BookingActionCommand {
        BookingActionCommand {
            booking_id,
            note: request.and_then(|r| r.note),
        }
    }

    pub fn to_cancel_command(booking_id: String, request: Option<CancelBookingRequest>) -> CancelBookingCommand {
        let request = request.unwrap_or_default();
        CancelBookingCommand {
            booking_id,
            reason: request.reason,
            assess_penalty: request.assess_penalty,
        }
    }

    pub fn to_order_group(group: Group<OrderKey>) -> OrderGroup {
        let (owner_id, start_date, end_date) = group.key;
        OrderGroup {
            owner_id,
            start_date,
            end_date,
            bookings: Self::to_dto_list(group.bookings),
        }
    }

    pub fn to_billing_group(group: Group<BillingKey>) -> BillingGroup {
        let (owner_id, service_type, start_date, end_date) = group.key;
        BillingGroup {
            owner_id,
            service_type,
            start_date,
            end_date,
            bookings: Self::to_dto_list(group.bookings),
        }
    }
}
