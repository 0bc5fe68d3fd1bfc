use bigdecimal::RoundingMode;

use crate::domain::order::InvoiceView;
use crate::domain::ports::InvoiceRenderer;
use crate::domain::pricing::rental_days;

/// Renders a paid order as a plain-text invoice.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextInvoiceRenderer;

impl InvoiceRenderer for TextInvoiceRenderer {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }

    fn render(&self, invoice: &InvoiceView) -> Vec<u8> {
        let order = &invoice.order;
        let days = rental_days(order.start_time, order.end_time)
            .with_scale_round(2, RoundingMode::HalfUp);
        let issued = order.paid_at.unwrap_or(order.updated_at);

        let mut lines = vec![
            format!("INVOICE {}", order.order_no.as_deref().unwrap_or("-")),
            format!("Issued:    {}", issued.format("%Y-%m-%d %H:%M UTC")),
            String::new(),
            format!(
                "Customer:  {} ({})",
                invoice.customer.name, invoice.customer.id
            ),
            format!(
                "Vehicle:   {} ({})",
                invoice.vehicle.name, invoice.vehicle.id
            ),
            format!("Daily rate: {}", invoice.vehicle.daily_price),
            format!(
                "Period:    {} to {} ({} days)",
                order.start_time.format("%Y-%m-%d %H:%M"),
                order.end_time.format("%Y-%m-%d %H:%M"),
                days
            ),
            format!("Driver:    {}", if order.is_driver { "yes" } else { "no" }),
        ];
        if let Some(promo) = &order.promo {
            lines.push(format!("Promo:     {}", promo));
        }
        if let Some(receipt) = &order.receipt {
            lines.push(format!("Receipt:   {}", receipt));
        }
        lines.push(String::new());
        lines.push(format!("TOTAL:     {}", order.total));

        let mut text = lines.join("\n");
        text.push('\n');
        text.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use bigdecimal::BigDecimal;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::domain::order::{CustomerRef, Order, OrderStatus};
    use crate::domain::vehicle::Vehicle;

    #[test]
    fn renders_number_parties_and_total() {
        let start = Utc.with_ymd_and_hms(2024, 11, 12, 9, 0, 0).unwrap();
        let order = Order {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            start_time: start,
            end_time: start + Duration::hours(36),
            is_driver: true,
            total: BigDecimal::from(150),
            status: OrderStatus::Paid,
            order_no: Some("INV/2024/11/10/3".to_string()),
            receipt: Some("BCA-99".to_string()),
            promo: None,
            paid_at: Some(Utc.with_ymd_and_hms(2024, 11, 10, 14, 5, 0).unwrap()),
            created_by: "Dewi".to_string(),
            updated_by: "Dewi".to_string(),
            created_at: start,
            updated_at: start,
        };
        let view = InvoiceView {
            customer: CustomerRef::from_order(&order),
            vehicle: Vehicle {
                id: order.vehicle_id,
                name: "Mitsubishi Xpander".to_string(),
                daily_price: BigDecimal::from(100),
                requires_driver: true,
                is_available: false,
            },
            order,
        };

        let text = String::from_utf8(TextInvoiceRenderer.render(&view)).unwrap();

        assert!(text.starts_with("INVOICE INV/2024/11/10/3\n"));
        assert!(text.contains("Issued:    2024-11-10 14:05 UTC"));
        assert!(text.contains("Customer:  Dewi"));
        assert!(text.contains("Mitsubishi Xpander"));
        assert!(text.contains("(1.50 days)"));
        assert!(text.contains("Receipt:   BCA-99"));
        assert!(!text.contains("Promo:"));
        assert!(text.trim_end().ends_with("TOTAL:     150"));
    }
}
