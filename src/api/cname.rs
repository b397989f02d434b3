use serde_json::json;

use super::model::id_field;
use super::{DdiClient, Outcome, endpoint};

impl DdiClient {
    /// Finds the address object(s) whose aliases contain the given CNAME.
    pub async fn get_cname_info(&self, cname: &str) -> eyre::Result<Outcome> {
        log::debug!("Get CNAME called for: {cname}");

        let clause = format!("ip_alias like '%{cname}%'");
        self.get(endpoint::IP_ADDRESS_LIST, &[("WHERE", clause)]).await
    }

    /// Adds a CNAME to an existing host.
    pub async fn add_cname(&self, cname: &str, host: &str) -> eyre::Result<Outcome> {
        log::debug!("Add CNAME: {cname} called on host: {host}");

        let lookup = self.get_host(host).await?;
        let Some(ip_id) = lookup.first_result().and_then(|row| id_field(row, "ip_id")) else {
            return Ok(lookup.into_fail());
        };

        let payload = json!({ "ip_id": ip_id, "ip_name": cname });
        let outcome = self.put(endpoint::IP_ALIAS_ADD, &payload).await?;

        log::debug!("Add CNAME result: {}", outcome.status());
        Ok(outcome)
    }

    /// Removes a CNAME from whichever host carries it.
    pub async fn delete_cname(&self, cname: &str) -> eyre::Result<Outcome> {
        log::debug!("Delete CNAME: {cname} called");

        let lookup = self.get_cname_info(cname).await?;
        let Some(ip_id) = lookup.first_result().and_then(|row| id_field(row, "ip_id")) else {
            return Ok(lookup.into_fail());
        };

        let payload = json!({ "ip_id": ip_id, "ip_name": cname });
        let outcome = self.delete_with_body(endpoint::IP_ALIAS_DELETE, &payload).await?;

        log::debug!("Delete CNAME result: {}", outcome.status());
        Ok(outcome)
    }
}
