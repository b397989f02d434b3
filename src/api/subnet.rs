use super::{DdiClient, Outcome, endpoint};
use crate::address;

impl DdiClient {
    /// Looks up a subnet by its first address (e.g. `192.168.127.0`).
    pub async fn get_subnet_info(&self, subnet: &str) -> eyre::Result<Outcome> {
        log::debug!("Getting subnet info for: {subnet}");

        let start = address::hexlify(address::parse_dotted_quad(subnet)?);
        let clause = format!("start_ip_addr='{start}'");
        self.get(endpoint::IP_BLOCK_SUBNET_LIST, &[("WHERE", clause)]).await
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::client_for;

    #[tokio::test]
    async fn subnet_is_looked_up_by_hex_start() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/ip_block_subnet_list"))
            .and(query_param("WHERE", "start_ip_addr='ac171700'"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"subnet_id": "77"}])))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server).get_subnet_info("172.23.23.0").await.unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.first_result().unwrap()["subnet_id"], "77");
    }

    #[tokio::test]
    async fn malformed_subnet_never_reaches_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server).get_subnet_info("172.23.23").await.unwrap_err();
        assert!(err.to_string().contains("not a valid IPv4 address"));
    }
}
