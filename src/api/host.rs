use serde_json::json;

use super::model::id_field;
use super::{DdiClient, Outcome, endpoint};
use crate::address;

/// Everything needed to register a new host.
#[derive(Debug, Clone)]
pub struct NewHost {
    /// The host's FQDN; must be unique.
    pub name: String,
    /// Dotted-quad address to assign.
    pub ip: String,
    pub building: String,
    pub department: String,
    pub contact: String,
    pub phone: String,
    pub comment: Option<String>,
    pub site_name: String,
}

impl NewHost {
    /// Builds the URL-encoded `ip_class_parameters` string for this host.
    pub fn class_parameters(&self) -> String {
        let short_name = self.name.split('.').next().unwrap_or_default();

        let mut pairs = vec![
            ("hostname", short_name),
            ("ucb_buildings", &self.building[..]),
            ("ucb_dept_aff", &self.department[..]),
            ("ucb_ph_no", &self.phone[..]),
            ("ucb_resp_per", &self.contact[..]),
        ];
        if let Some(comment) = self.comment.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("ucb_comment", comment));
        }

        address::encode_query_string(pairs)
    }
}

impl DdiClient {
    /// Looks up a host by its exact FQDN.
    pub async fn get_host(&self, fqdn: &str) -> eyre::Result<Outcome> {
        log::debug!("Getting host info for: {fqdn}");

        let clause = format!("name='{fqdn}'");
        self.get(endpoint::IP_ADDRESS_LIST, &[("WHERE", clause)]).await
    }

    /// Creates a host with the given address and class parameters.
    pub async fn add_host(&self, host: &NewHost) -> eyre::Result<Outcome> {
        let payload = json!({
            "hostaddr": host.ip,
            "name": host.name,
            "site_name": host.site_name,
            "ip_class_parameters": host.class_parameters(),
        });

        log::debug!("Add operation invoked on host {} with IP {}, payload: {payload}", host.name, host.ip);

        let outcome = self.post(endpoint::IP_ADD, &payload).await?;
        log::debug!("Add host result: {}", outcome.status());
        Ok(outcome)
    }

    /// Deletes a host, found by FQDN. If the lookup doesn't find it, the lookup's payload comes back as a `fail`.
    pub async fn delete_host(&self, fqdn: &str) -> eyre::Result<Outcome> {
        let lookup = self.get_host(fqdn).await?;

        let Some(ip_id) = lookup.first_result().and_then(|row| id_field(row, "ip_id")) else {
            log::debug!("Host {fqdn} not found; nothing to delete");
            return Ok(lookup.into_fail());
        };

        log::debug!("Deleting host: {fqdn} with ip_id: {ip_id}");
        self.delete_with_query(endpoint::IP_DELETE, &[("ip_id", &ip_id[..])]).await
    }
}
