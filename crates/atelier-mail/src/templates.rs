//! Plain-text templates for the site's outbound messages.

use atelier_core::{Booking, Event, GiftCardBalance, GiftCardOrder, PrivateEventRequest};

use crate::EmailMessage;

/// Format a cent amount as dollars ("$45.00").
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.abs();
    format!("{}${}.{:02}", sign, cents / 100, cents % 100)
}

/// Confirmation sent to the attendee after a successful booking.
pub fn booking_confirmation(event: &Event, booking: &Booking) -> EmailMessage {
    let seats = if booking.seats == 1 {
        "1 seat".to_string()
    } else {
        format!("{} seats", booking.seats)
    };

    let body = format!(
        "Hi {name},\n\n\
         You're booked! Here are the details:\n\n\
         {title}\n\
         {when}\n\
         {seats}, {amount} charged\n\n\
         We'll have everything set up when you arrive; just bring yourself.\n\
         If your plans change, reply to this email and we'll help out.\n\n\
         See you in the studio,\n\
         Atelier Art Studio",
        name = booking.attendee_name,
        title = event.title,
        when = event.starts_at.format("%A, %B %-d at %-I:%M %p UTC"),
        seats = seats,
        amount = format_cents(booking.amount_cents),
    );

    EmailMessage {
        to: booking.attendee_email.clone(),
        subject: format!("You're booked: {}", event.title),
        body,
    }
}

/// Receipt sent to the purchaser after a gift-card purchase.
pub fn gift_card_receipt(order: &GiftCardOrder, card: &GiftCardBalance) -> EmailMessage {
    let gift_note = match &order.message {
        Some(message) if !message.trim().is_empty() => {
            format!("\nYour gift message:\n  \"{}\"\n", message.trim())
        }
        _ => String::new(),
    };

    let body = format!(
        "Hi {name},\n\n\
         Thanks for your gift card purchase of {amount}.\n\n\
         Card code: {code}\n\
         We've sent the code to {recipient} as well.\n\
         {gift_note}\n\
         The balance can be checked any time on our gift card page.\n\n\
         Atelier Art Studio",
        name = order.purchaser_name,
        amount = format_cents(order.amount_cents),
        code = card.code,
        recipient = order.recipient_email,
        gift_note = gift_note,
    );

    EmailMessage {
        to: order.purchaser_email.clone(),
        subject: "Your Atelier gift card".to_string(),
        body,
    }
}

/// Notification sent to the studio inbox when a private-event request lands.
pub fn private_event_notification(
    notify_email: &str,
    request: &PrivateEventRequest,
) -> EmailMessage {
    let preferred = request
        .preferred_date
        .map(|d| d.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|| "no date preference".to_string());
    let phone = request.phone.as_deref().unwrap_or("not provided");

    let body = format!(
        "New private event request:\n\n\
         From:       {name} <{email}>\n\
         Phone:      {phone}\n\
         Date:       {preferred}\n\
         Party size: {party}\n\n\
         Message:\n{message}\n",
        name = request.contact_name,
        email = request.email,
        phone = phone,
        preferred = preferred,
        party = request.party_size,
        message = request.message,
    );

    EmailMessage {
        to: notify_email.to_string(),
        subject: format!("Private event request from {}", request.contact_name),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::EventCategory;
    use chrono::{Duration, Utc};

    #[test]
    fn format_cents_handles_whole_and_fractional_amounts() {
        assert_eq!(format_cents(4500), "$45.00");
        assert_eq!(format_cents(105), "$1.05");
        assert_eq!(format_cents(9), "$0.09");
        assert_eq!(format_cents(-250), "-$2.50");
    }

    #[test]
    fn booking_confirmation_addresses_the_attendee() {
        let starts = Utc::now() + Duration::days(5);
        let mut event = Event::new(
            "Wheel Throwing for Beginners",
            EventCategory::Class,
            starts,
            starts + Duration::hours(2),
            6500,
            12,
        );
        event.id = Some("507f1f77bcf86cd799439011".to_string());

        let booking = Booking {
            event_id: "507f1f77bcf86cd799439011".to_string(),
            attendee_name: "Ren Ito".to_string(),
            attendee_email: "ren@example.com".to_string(),
            seats: 2,
            amount_cents: 13000,
            payment_id: "pay_123".to_string(),
            created_at: Utc::now(),
        };

        let message = booking_confirmation(&event, &booking);
        assert_eq!(message.to, "ren@example.com");
        assert!(message.subject.contains("Wheel Throwing"));
        assert!(message.body.contains("2 seats"));
        assert!(message.body.contains("$130.00"));
    }

    #[test]
    fn gift_card_receipt_includes_code_and_optional_message() {
        let order = GiftCardOrder {
            amount_cents: 5000,
            purchaser_name: "Sam Ode".to_string(),
            purchaser_email: "sam@example.com".to_string(),
            recipient_email: "friend@example.com".to_string(),
            message: Some("Happy birthday!".to_string()),
        };
        let card = GiftCardBalance {
            code: "GC-TEST-0001".to_string(),
            balance_cents: 5000,
        };

        let message = gift_card_receipt(&order, &card);
        assert_eq!(message.to, "sam@example.com");
        assert!(message.body.contains("GC-TEST-0001"));
        assert!(message.body.contains("Happy birthday!"));
        assert!(message.body.contains("$50.00"));
    }

    #[test]
    fn private_event_notification_goes_to_the_studio_inbox() {
        let request = PrivateEventRequest::new(
            "Dana Field",
            "dana@example.com",
            14,
            "Birthday party, mosaics if possible",
        );

        let message = private_event_notification("hello@atelier.site", &request);
        assert_eq!(message.to, "hello@atelier.site");
        assert!(message.subject.contains("Dana Field"));
        assert!(message.body.contains("no date preference"));
        assert!(message.body.contains("Party size: 14"));
    }
}
