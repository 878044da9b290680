use atelier_db::models::order::Order;

/// wa.me deep link with the order summary prefilled. The storefront
/// opens it so the shopper confirms the order over WhatsApp; no
/// outbound call is made from the server.
pub fn order_link(store_number: &str, order: &Order) -> Option<String> {
    let number: String = store_number
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if number.is_empty() {
        return None;
    }
    Some(format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(&order_message(order))
    ))
}

pub fn order_message(order: &Order) -> String {
    let mut lines = vec![format!("New order #{}", order.id)];
    for item in &order.items {
        lines.push(format!(
            "{} x{} = {}",
            item.title,
            item.quantity,
            item.unit_price * i64::from(item.quantity)
        ));
    }
    if order.discount > 0 {
        lines.push(format!("Subtotal: {}", order.subtotal));
        lines.push(format!("Discount: -{}", order.discount));
    }
    lines.push(format!("Total: {}", order.total));
    lines.push(format!("Name: {}", order.customer_name));
    lines.push(format!("Phone: {}", order.phone));
    lines.push(format!("Address: {}, {}", order.address, order.city));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use atelier_db::models::order::{Order, OrderItem, status};
    use chrono::Utc;

    use super::*;

    fn sample_order() -> Order {
        Order {
            id: 7,
            customer_name: "Dana".to_string(),
            phone: "0770000000".to_string(),
            address: "Main St 5".to_string(),
            city: "Erbil".to_string(),
            note: None,
            coupon_code: Some("WELCOME12345678".to_string()),
            subtotal: 1000,
            discount: 120,
            total: 880,
            status: status::PENDING.to_string(),
            created_at: Utc::now(),
            items: vec![OrderItem {
                id: 1,
                order_id: 7,
                product_id: Some(3),
                title: "Linen shirt".to_string(),
                unit_price: 500,
                quantity: 2,
            }],
        }
    }

    #[test]
    fn link_strips_formatting_from_the_store_number() {
        let order = sample_order();
        let link = order_link("+964 770 000 0000", &order).unwrap();
        assert!(link.starts_with("https://wa.me/9647700000000?text="));
        // The summary must be fully percent-encoded.
        let (_, text) = link.split_once("?text=").unwrap();
        assert!(!text.contains(' '));
        assert!(!text.contains('\n'));
    }

    #[test]
    fn no_link_without_a_configured_number() {
        assert_eq!(order_link("", &sample_order()), None);
        assert_eq!(order_link("not a number", &sample_order()), None);
    }

    #[test]
    fn message_includes_discount_line_only_when_discounted() {
        let mut order = sample_order();
        let message = order_message(&order);
        assert!(message.contains("New order #7"));
        assert!(message.contains("Linen shirt x2 = 1000"));
        assert!(message.contains("Discount: -120"));
        assert!(message.contains("Total: 880"));

        order.discount = 0;
        order.total = 1000;
        assert!(!order_message(&order).contains("Discount"));
    }
}
