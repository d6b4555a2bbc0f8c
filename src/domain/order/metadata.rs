use serde::{Deserialize, Serialize};

use super::value_objects::OrderKind;

// ============================================================================
// Order Metadata - client contact, delivery and requirement details
// ============================================================================
//
// Stored twice: natively as a JSON column, and as a labelled annotation in
// the order's `notes` text (one `LABEL: value` per line). The annotation is
// kept for consumers that only read `notes`; decoding it is the fallback
// for rows written without the JSON column.
//
// Known limitation of the annotation: values cannot span lines, and list
// entries cannot contain commas. Line breaks are flattened to spaces on
// encode.
//
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderMetadata {
    #[serde(default)]
    pub client: ClientInfo,
    #[serde(default)]
    pub delivery_location: Option<String>,
    #[serde(default)]
    pub dietary_requirements: Vec<String>,
    #[serde(default)]
    pub special_requirements: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub event_time: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i32>,
}

const CLIENT: &str = "CLIENT";
const EMAIL: &str = "EMAIL";
const PHONE: &str = "PHONE";
const DELIVERY: &str = "DELIVERY";
const DIETARY: &str = "DIETARY";
const NOTES: &str = "NOTES";
const EVENT: &str = "EVENT";
const TYPE: &str = "TYPE";
const DATE: &str = "DATE";
const GUESTS: &str = "GUESTS";
const REQUIREMENTS: &str = "REQUIREMENTS";

const DATE_TIME_SEPARATOR: &str = " at ";

impl OrderMetadata {
    /// Render the populated fields as `LABEL: value` lines using the label
    /// set of `kind`. Empty fields produce no line at all.
    pub fn encode(&self, kind: OrderKind) -> String {
        let mut lines = Vec::new();
        let client = &self.client;

        match kind {
            OrderKind::Regular => {
                push_line(&mut lines, CLIENT, client.full_name.as_deref());
                push_line(&mut lines, EMAIL, client.email.as_deref());
                push_line(&mut lines, PHONE, client.phone_number.as_deref());
                push_line(&mut lines, DELIVERY, self.delivery_location.as_deref());
                push_list(&mut lines, DIETARY, &self.dietary_requirements);
                push_line(&mut lines, NOTES, self.notes.as_deref());
            }
            OrderKind::Catering => {
                let date = populated(self.event_date.as_deref()).map(|date| {
                    match populated(self.event_time.as_deref()) {
                        Some(time) => format!("{date}{DATE_TIME_SEPARATOR}{time}"),
                        None => date.to_string(),
                    }
                });
                let guests = self.guest_count.map(|count| count.to_string());

                push_line(&mut lines, EVENT, self.event_name.as_deref());
                push_line(&mut lines, TYPE, self.event_type.as_deref());
                push_line(&mut lines, DATE, date.as_deref());
                push_line(&mut lines, GUESTS, guests.as_deref());
                push_line(&mut lines, DELIVERY, self.delivery_location.as_deref());
                push_line(&mut lines, CLIENT, client.full_name.as_deref());
                push_line(&mut lines, EMAIL, client.email.as_deref());
                push_line(&mut lines, PHONE, client.phone_number.as_deref());
                push_list(&mut lines, REQUIREMENTS, &self.special_requirements);
                push_line(&mut lines, NOTES, self.notes.as_deref());
            }
        }

        lines.join("\n")
    }

    /// Parse an annotation back. Unknown labels and malformed lines are
    /// skipped; missing labels leave the field at its default.
    pub fn decode(text: &str) -> Self {
        let mut metadata = Self::default();

        for line in text.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            match label.trim() {
                CLIENT => metadata.client.full_name = Some(value.to_string()),
                EMAIL => metadata.client.email = Some(value.to_string()),
                PHONE => metadata.client.phone_number = Some(value.to_string()),
                DELIVERY => metadata.delivery_location = Some(value.to_string()),
                DIETARY => metadata.dietary_requirements = split_list(value),
                REQUIREMENTS => metadata.special_requirements = split_list(value),
                NOTES => metadata.notes = Some(value.to_string()),
                EVENT => metadata.event_name = Some(value.to_string()),
                TYPE => metadata.event_type = Some(value.to_string()),
                DATE => match value.split_once(DATE_TIME_SEPARATOR) {
                    Some((date, time)) => {
                        metadata.event_date = Some(date.trim().to_string());
                        metadata.event_time = Some(time.trim().to_string());
                    }
                    None => metadata.event_date = Some(value.to_string()),
                },
                GUESTS => {
                    if let Ok(count) = value.parse() {
                        metadata.guest_count = Some(count);
                    }
                }
                _ => {}
            }
        }

        metadata
    }
}

fn populated(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn flatten(value: &str) -> String {
    value.replace(['\r', '\n'], " ").trim().to_string()
}

fn push_line(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = populated(value) {
        lines.push(format!("{label}: {}", flatten(value)));
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, values: &[String]) {
    let entries: Vec<String> = values
        .iter()
        .map(|v| flatten(v))
        .filter(|v| !v.is_empty())
        .collect();

    if !entries.is_empty() {
        lines.push(format!("{label}: {}", entries.join(", ")));
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_metadata() -> OrderMetadata {
        OrderMetadata {
            client: ClientInfo {
                full_name: Some("John Doe".to_string()),
                email: Some("john@example.com".to_string()),
                phone_number: Some("123-456-7890".to_string()),
            },
            delivery_location: Some("123 Main St, City".to_string()),
            dietary_requirements: vec!["vegetarian".to_string(), "gluten-free".to_string()],
            notes: Some("Ring the bell".to_string()),
            ..Default::default()
        }
    }

    fn catering_metadata() -> OrderMetadata {
        OrderMetadata {
            client: ClientInfo {
                full_name: Some("Jane Roe".to_string()),
                email: Some("jane@example.com".to_string()),
                phone_number: None,
            },
            delivery_location: Some("Conference Hall B".to_string()),
            special_requirements: vec!["nut-free".to_string()],
            notes: None,
            event_name: Some("Company Meeting".to_string()),
            event_type: Some("corporate".to_string()),
            event_date: Some("2025-11-15".to_string()),
            event_time: Some("12:00".to_string()),
            guest_count: Some(50),
            ..Default::default()
        }
    }

    #[test]
    fn test_regular_encoding_uses_regular_labels() {
        let encoded = regular_metadata().encode(OrderKind::Regular);
        assert_eq!(
            encoded,
            "CLIENT: John Doe\n\
             EMAIL: john@example.com\n\
             PHONE: 123-456-7890\n\
             DELIVERY: 123 Main St, City\n\
             DIETARY: vegetarian, gluten-free\n\
             NOTES: Ring the bell"
        );
    }

    #[test]
    fn test_catering_encoding_uses_catering_labels() {
        let encoded = catering_metadata().encode(OrderKind::Catering);
        let labels: Vec<&str> = encoded
            .lines()
            .map(|line| line.split_once(':').unwrap().0)
            .collect();

        assert_eq!(
            labels,
            vec!["EVENT", "TYPE", "DATE", "GUESTS", "DELIVERY", "CLIENT", "EMAIL", "REQUIREMENTS"]
        );
        assert!(encoded.contains("DATE: 2025-11-15 at 12:00"));
        assert!(encoded.contains("GUESTS: 50"));
    }

    #[test]
    fn test_absent_fields_never_emit_empty_lines() {
        let metadata = OrderMetadata {
            client: ClientInfo {
                full_name: Some("Only Name".to_string()),
                email: Some("   ".to_string()),
                phone_number: None,
            },
            dietary_requirements: vec!["".to_string()],
            ..Default::default()
        };

        assert_eq!(metadata.encode(OrderKind::Regular), "CLIENT: Only Name");
        assert_eq!(OrderMetadata::default().encode(OrderKind::Catering), "");
    }

    #[test]
    fn test_round_trip_regular() {
        let metadata = regular_metadata();
        let decoded = OrderMetadata::decode(&metadata.encode(OrderKind::Regular));
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_round_trip_catering() {
        let metadata = catering_metadata();
        let decoded = OrderMetadata::decode(&metadata.encode(OrderKind::Catering));
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn test_decode_ignores_unknown_and_malformed_lines() {
        let decoded = OrderMetadata::decode(
            "garbage without separator\nFOO: bar\nEMAIL:\nPHONE:  555-0100  \nGUESTS: many",
        );

        assert_eq!(decoded.client.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(decoded.client.email, None);
        assert_eq!(decoded.guest_count, None);
        assert!(decoded.dietary_requirements.is_empty());
    }

    #[test]
    fn test_decode_keeps_colons_inside_values() {
        let decoded = OrderMetadata::decode("NOTES: arrive at: 10:30 sharp");
        assert_eq!(decoded.notes.as_deref(), Some("arrive at: 10:30 sharp"));
    }

    #[test]
    fn test_encode_flattens_line_breaks() {
        let metadata = OrderMetadata {
            notes: Some("first line\nsecond line".to_string()),
            ..Default::default()
        };

        let encoded = metadata.encode(OrderKind::Regular);
        assert_eq!(encoded, "NOTES: first line second line");
        assert_eq!(encoded.lines().count(), 1);
    }

    #[test]
    fn test_decode_empty_text() {
        assert_eq!(OrderMetadata::decode(""), OrderMetadata::default());
    }
}
