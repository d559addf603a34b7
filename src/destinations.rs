//! Destination enumeration and cold-bytes normalization.

use crate::{
    api_types::{ColdBytes, DESTINATION_PATH, DestinationKind, DestinationRecord,
        DestinationResponse},
    client::{ApiClient, ClientError},
};

/// A destination with its reported cold storage size normalized to bytes.
#[derive(Debug, Clone)]
pub struct Destination {
    pub id: i64,
    pub guid: String,
    pub name: String,
    pub kind: DestinationKind,
    pub cold_bytes: i64,
}

/// Fetch all destinations in one unpaged GET and normalize each entry's
/// cold storage size.
///
/// With `skip_zero` set, destinations normalizing to zero are dropped (and
/// each destination's size is logged for the operator). Otherwise every
/// destination is retained: reported sizes are known to be unreliable, and a
/// zero does not guarantee the destination holds no archives.
pub async fn list_destinations(
    client: &ApiClient,
    skip_zero: bool,
) -> Result<Vec<Destination>, ClientError> {
    let response: DestinationResponse = client.get_json(DESTINATION_PATH, &[]).await?;

    let mut destinations = Vec::new();
    for record in response.data.destinations {
        let cold_bytes = normalize_cold_bytes(record.kind, record.cold_bytes.as_ref());
        if skip_zero {
            tracing::info!(
                destination_id = record.destination_id,
                cold_bytes,
                "Destination reported cold storage size"
            );
            if cold_bytes == 0 {
                tracing::debug!(
                    destination_id = record.destination_id,
                    "Skipping destination reporting zero cold storage bytes"
                );
                continue;
            }
        }
        destinations.push(Destination {
            id: record.destination_id,
            guid: record.guid,
            name: record.destination_name,
            kind: record.kind,
            cold_bytes,
        });
    }

    tracing::info!(
        count = destinations.len(),
        "Destinations selected for scanning"
    );
    Ok(destinations)
}

/// Normalize the heterogeneous `coldBytes` wire value to a byte count.
///
/// PROVIDER destinations report a numeric string; everything else reports a
/// JSON number. Unparsable or absent values count as zero, fractional numbers
/// truncate, and negative values clamp to zero so the result is always usable
/// as a size.
fn normalize_cold_bytes(kind: DestinationKind, raw: Option<&ColdBytes>) -> i64 {
    let parsed = match (kind, raw) {
        (DestinationKind::Provider, Some(ColdBytes::Text(s))) => {
            s.trim().parse::<i64>().unwrap_or(0)
        }
        (DestinationKind::Provider, _) => 0,
        (_, Some(ColdBytes::Number(n))) => *n as i64,
        (_, _) => 0,
    };
    parsed.max(0)
}
