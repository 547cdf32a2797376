//! Share fan-out: validated delivery of one envelope to a recipient set.
//!
//! The broker keeps nothing: no envelope, no history of who shared what
//! with whom. Each submission resolves recipients against the registry at
//! that instant, pushes independent copies, and reports per-recipient
//! outcomes back to the caller.

use chrono::Utc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::protocol::{ServerMessage, ShareEnvelope};
use crate::registry::Registry;

/// One fan-out request. Exists only for the duration of the operation.
#[derive(Debug, Clone)]
pub struct ShareRequest {
    pub sender_peer_id: String,
    pub recipients: Vec<String>,
    pub envelope: ShareEnvelope,
}

/// Per-recipient delivery result. "Never registered" and "just
/// disconnected" are deliberately indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    RecipientOffline,
}

/// Aggregate outcome of one fan-out.
#[derive(Debug, Clone)]
pub struct ShareReport {
    pub outcomes: Vec<(String, DeliveryOutcome)>,
}

impl ShareReport {
    pub fn all_delivered(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome == DeliveryOutcome::Delivered)
    }

    pub fn delivered_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == DeliveryOutcome::Delivered)
            .count()
    }

    /// Peer ids that were not reached.
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == DeliveryOutcome::RecipientOffline)
            .map(|(peer_id, _)| peer_id.as_str())
            .collect()
    }
}

/// Fan a share out to each recipient.
///
/// The sender must currently be registered and the recipient set non-empty.
/// Delivery failures are per-recipient outcomes, never an error for the
/// operation as a whole; there is no retry and no queueing.
pub fn fan_out(registry: &Registry, request: &ShareRequest) -> Result<ShareReport> {
    let from_name = registry
        .display_name(&request.sender_peer_id)
        .ok_or_else(|| Error::PeerNotFound(request.sender_peer_id.clone()))?
        .to_string();

    if request.recipients.is_empty() {
        return Err(Error::Validation("share has no recipients".to_string()));
    }

    let timestamp = Utc::now();
    let mut outcomes = Vec::with_capacity(request.recipients.len());

    for recipient in &request.recipients {
        let outcome = match registry.lookup(recipient) {
            Some(connection) => {
                let delivery = connection.push(ServerMessage::IncomingShare {
                    from_peer_id: request.sender_peer_id.clone(),
                    from_name: from_name.clone(),
                    share: request.envelope.clone(),
                    timestamp,
                });
                match delivery {
                    Ok(()) => DeliveryOutcome::Delivered,
                    // In-flight send to a just-closed connection.
                    Err(_) => DeliveryOutcome::RecipientOffline,
                }
            }
            None => DeliveryOutcome::RecipientOffline,
        };
        outcomes.push((recipient.clone(), outcome));
    }

    debug!(
        sender = %request.sender_peer_id,
        share = %request.envelope.label(),
        recipients = outcomes.len(),
        delivered = outcomes
            .iter()
            .filter(|(_, o)| *o == DeliveryOutcome::Delivered)
            .count(),
        "share fanned out"
    );

    Ok(ShareReport { outcomes })
}

/// Build the message reporting a fan-out back to its sender.
///
/// Partial success still reports failure: the sender decides how to react
/// per recipient, so every unreached recipient is named — by display name
/// where the registry still knows one, by peer id otherwise.
pub fn report_message(registry: &Registry, report: &ShareReport) -> ServerMessage {
    if report.all_delivered() {
        ServerMessage::ShareSuccess {
            message: format!("Shared with {} peer(s)", report.delivered_count()),
        }
    } else {
        let failed: Vec<String> = report
            .failed()
            .into_iter()
            .map(|peer_id| {
                registry
                    .display_name(peer_id)
                    .unwrap_or(peer_id)
                    .to_string()
            })
            .collect();
        ServerMessage::ShareFailed {
            message: format!("Could not reach: {}", failed.join(", ")),
        }
    }
}
