use super::model::id_field;
use super::{DdiClient, Outcome, endpoint};
use crate::address;

impl DdiClient {
    /// Looks up the address object for a dotted-quad IPv4 address.
    pub async fn get_ipv4_info(&self, ip: &str) -> eyre::Result<Outcome> {
        log::debug!("Getting IP info for: {ip}");

        let hex = address::hexlify(address::parse_dotted_quad(ip)?);
        let clause = format!("ip_addr='{hex}'");
        self.get(endpoint::IP_ADDRESS_LIST, &[("WHERE", clause)]).await
    }

    /// Asks the server for unused addresses in the subnet starting at `subnet`.
    pub async fn get_free_ipv4(&self, subnet: &str) -> eyre::Result<Outcome> {
        log::debug!("Getting free IP for subnet: {subnet}");

        let lookup = self.get_subnet_info(subnet).await?;
        let Some(subnet_id) = lookup.first_result().and_then(|row| id_field(row, "subnet_id")) else {
            log::debug!("Failed: getting free IP for subnet: {subnet}");
            return Ok(lookup.into_fail());
        };

        self.get(endpoint::IP_FIND_FREE_ADDRESS, &[("subnet_id", &subnet_id[..])]).await
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::client_for;

    #[tokio::test]
    async fn info_queries_by_hex_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip_address_list"))
            .and(query_param("WHERE", "ip_addr='ac171704'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "ddi-test-host.example.com"}])))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).get_ipv4_info("172.23.23.4").await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn free_address_goes_through_subnet_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip_block_subnet_list"))
            .and(query_param("WHERE", "start_ip_addr='ac171700'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"subnet_id": 77}])))
            .mount(&server)
            .await;

        let free: Vec<_> = (5..15).map(|n| json!({"hostaddr": format!("172.23.23.{n}")})).collect();
        Mock::given(method("GET"))
            .and(path("/rpc/ip_find_free_address"))
            .and(query_param("subnet_id", "77"))
            .respond_with(ResponseTemplate::new(200).set_body_json(free))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).get_free_ipv4("172.23.23.0").await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.rows().count(), 10);
    }

    #[tokio::test]
    async fn free_address_in_unknown_subnet_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip_block_subnet_list"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rpc/ip_find_free_address"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server).get_free_ipv4("1.1.1.0").await.unwrap();
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn free_address_with_empty_subnet_lookup_is_fail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip_block_subnet_list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rpc/ip_find_free_address"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let outcome = client_for(&server).get_free_ipv4("10.9.9.0").await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.results(), &json!([]));
    }
}
