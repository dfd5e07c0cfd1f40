use crate::db::models::WebhookSubscription;

/// Deserializes a stored interest list. Anything that is not a JSON array
/// of strings yields an empty list: a malformed row must never abort
/// dispatch for the other subscribers.
pub fn parse_events(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}

/// Selects the subscriptions whose interest set contains `event`, by exact
/// case-sensitive match.
pub fn select_interested<'a>(
    subscriptions: &'a [WebhookSubscription],
    event: &str,
) -> Vec<&'a WebhookSubscription> {
    subscriptions
        .iter()
        .filter(|sub| parse_events(&sub.events).iter().any(|e| e == event))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn subscription(id: i64, events: &str) -> WebhookSubscription {
        WebhookSubscription {
            id,
            url: format!("https://hooks.example/{id}"),
            events: events.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn malformed_events_are_excluded_without_error() {
        let subs = vec![
            subscription(1, "not json"),
            subscription(2, r#"{"ticket.created": true}"#),
            subscription(3, r#"["ticket.created", 7]"#),
            subscription(4, r#"["ticket.created"]"#),
        ];

        let selected = select_interested(&subs, "ticket.created");
        assert_eq!(selected.iter().map(|s| s.id).collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let subs = vec![subscription(1, r#"["ticket.created"]"#)];

        assert_eq!(select_interested(&subs, "ticket.created").len(), 1);
        assert!(select_interested(&subs, "Ticket.Created").is_empty());
        assert!(select_interested(&subs, "ticket.create").is_empty());
    }

    #[test]
    fn selection_follows_interest_sets() {
        let a = subscription(1, r#"["ticket.created", "ticket.updated"]"#);
        let b = subscription(2, r#"["ticket.deleted"]"#);
        let subs = vec![a, b];

        let updated = select_interested(&subs, "ticket.updated");
        assert_eq!(updated.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1]);

        let deleted = select_interested(&subs, "ticket.deleted");
        assert_eq!(deleted.iter().map(|s| s.id).collect::<Vec<_>>(), vec![2]);

        assert!(select_interested(&subs, "ticket.archived").is_empty());
    }

    #[test]
    fn duplicate_entries_do_not_duplicate_selection() {
        let subs = vec![subscription(1, r#"["a", "a"]"#)];
        assert_eq!(select_interested(&subs, "a").len(), 1);
    }
}
