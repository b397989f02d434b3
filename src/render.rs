//! Human-readable and JSON output of API outcomes.

use std::io::Write;

use eyre::WrapErr;

use crate::address::{self, AddressError};
use crate::api::Outcome;
use crate::api::model::{FreeAddress, HostRecord, SubnetRecord};

/// Writes the outcome as a pretty-printed JSend envelope.
///
/// `serde_json` maps keep their keys sorted, so output is stable between runs.
pub fn json<W: Write>(out: &mut W, outcome: &Outcome) -> eyre::Result<()> {
    let text = serde_json::to_string_pretty(outcome).wrap_err("Failed to serialize result")?;
    writeln!(out, "{text}")?;
    Ok(())
}

/// Writes one block per address row in the outcome.
pub fn host_info<W: Write>(out: &mut W, outcome: &Outcome) -> eyre::Result<()> {
    log::debug!("Echoing host info");
    for row in outcome.rows() {
        let host = HostRecord::from_json(row).wrap_err("Unexpected address record from server")?;
        host_block(out, &host)?;
    }
    Ok(())
}

fn host_block<W: Write>(out: &mut W, host: &HostRecord) -> eyre::Result<()> {
    let params = host.class_parameters();
    let param = |key: &str| params.get(key).and_then(|v| v.first()).map(String::as_str).unwrap_or("");

    let view = host
        .subnet_view()
        .inspect_err(|e| log::warn!("Could not work out subnet for {}: {e}", host.name))
        .ok();
    let fmt_opt = |v: Option<String>| v.unwrap_or_default();

    let ip_addr = view.as_ref().map_or_else(|| host.ip_addr.clone(), |v| v.ip_addr.to_string());
    let start = fmt_opt(view.as_ref().and_then(|v| v.start).map(|a| a.to_string()));
    let end = fmt_opt(view.as_ref().and_then(|v| v.end).map(|a| a.to_string()));
    let netmask = fmt_opt(view.as_ref().map(|v| v.netmask.to_string()));
    let cidr = fmt_opt(view.as_ref().map(|v| v.cidr.to_string()));

    writeln!(out)?;
    writeln!(out, "Hostname: {}", host.name)?;
    writeln!(out, "Short Hostname: {}", param("hostname"))?;
    writeln!(out, "IP Address: {ip_addr}")?;
    writeln!(out, "CNAMES: {}", host.ip_alias)?;
    writeln!(out, "Subnet Start: {start}")?;
    writeln!(out, "Subnet End: {end}")?;
    writeln!(out, "Subnet Netmask: {netmask}")?;
    writeln!(out, "Subnet CIDR: {cidr}")?;
    writeln!(out, "UCB Building: {}", param("ucb_buildings"))?;
    writeln!(out, "UCB Comment: {}", param("ucb_comment"))?;
    writeln!(out, "UCB Department: {}", param("ucb_dept_aff"))?;
    writeln!(out, "UCB Phone Number: {}", param("ucb_ph_no"))?;
    writeln!(out, "UCB Responsible Person: {}", param("ucb_resp_per"))?;
    writeln!(out)?;
    Ok(())
}

/// Writes one block per subnet row in the outcome. A row whose range can't be decoded gets blank range fields.
pub fn subnet_info<W: Write>(out: &mut W, outcome: &Outcome) -> eyre::Result<()> {
    for row in outcome.rows() {
        let subnet = SubnetRecord::from_json(row).wrap_err("Unexpected subnet record from server")?;

        let warn = |e: &AddressError| log::warn!("Could not work out range of subnet {}: {e}", subnet.subnet_name);
        let start = address::unhexlify(&subnet.start_ip_addr).inspect_err(warn).ok();
        let end = address::unhexlify(&subnet.end_ip_addr).inspect_err(warn).ok();
        let cidr = start
            .zip(end)
            .and_then(|(start, end)| address::range_to_cidr(start, end).inspect_err(warn).ok());

        let show = |v: Option<String>| v.unwrap_or_default();

        writeln!(out)?;
        writeln!(out, "Subnet Name: {}", subnet.subnet_name)?;
        writeln!(out, "Subnet Start: {}", show(start.map(|a| a.to_string())))?;
        writeln!(out, "Subnet End: {}", show(end.map(|a| a.to_string())))?;
        writeln!(out, "Subnet Netmask: {}", show(cidr.map(|c| c.netmask().to_string())))?;
        writeln!(out, "Subnet CIDR: {}", show(cidr.map(|c| c.to_string())))?;
        writeln!(out, "Subnet ID: {}", subnet.subnet_id)?;
        writeln!(out, "Site: {}", subnet.site_name)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the hostname and aliases of the first match of a CNAME lookup.
pub fn cname_info<W: Write>(out: &mut W, outcome: &Outcome) -> eyre::Result<()> {
    if let Some(row) = outcome.first_result() {
        let host = HostRecord::from_json(row).wrap_err("Unexpected address record from server")?;
        writeln!(out, "Hostname: {}.", host.name)?;
        writeln!(out, "CNAMES: {}", host.ip_alias)?;
    }
    Ok(())
}

/// Writes each free address on its own line.
pub fn free_addresses<W: Write>(out: &mut W, outcome: &Outcome) -> eyre::Result<()> {
    for row in outcome.rows() {
        let free = FreeAddress::from_json(row).wrap_err("Unexpected free address record from server")?;
        writeln!(out, "{}", free.hostaddr)?;
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use super::*;

    fn render<F>(f: F, outcome: &Outcome) -> String
    where
        F: FnOnce(&mut Vec<u8>, &Outcome) -> eyre::Result<()>,
    {
        let mut out = Vec::new();
        f(&mut out, outcome).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn success(body: serde_json::Value) -> Outcome {
        Outcome::from_response(StatusCode::OK, &body.to_string())
    }

    #[test]
    fn host_block_decodes_addresses_and_parameters() {
        let outcome = success(json!([{
            "name": "ddi-test-host.example.com",
            "ip_addr": "ac171704",
            "ip_alias": "www.example.com",
            "subnet_start_ip_addr": "ac171700",
            "subnet_end_ip_addr": "ac1717ff",
            "ip_class_parameters": "hostname=ddi-test-host&ucb_buildings=TEST&ucb_resp_per=Test+User",
        }]));

        let text = render(host_info, &outcome);
        let expected = "\n\
            Hostname: ddi-test-host.example.com\n\
            Short Hostname: ddi-test-host\n\
            IP Address: 172.23.23.4\n\
            CNAMES: www.example.com\n\
            Subnet Start: 172.23.23.0\n\
            Subnet End: 172.23.23.255\n\
            Subnet Netmask: 255.255.255.0\n\
            Subnet CIDR: 172.23.23.0/24\n\
            UCB Building: TEST\n\
            UCB Comment: \n\
            UCB Department: \n\
            UCB Phone Number: \n\
            UCB Responsible Person: Test User\n\
            \n";
        assert_eq!(text, expected);
    }

    #[test]
    fn external_host_is_its_own_network() {
        let outcome = success(json!([{
            "name": "outside.example.org",
            "ip_addr": "01010101",
            "subnet_start_ip_addr": "0",
            "subnet_end_ip_addr": "0",
        }]));

        let text = render(host_info, &outcome);
        assert!(text.contains("Subnet CIDR: 1.1.1.1/32\n"));
        assert!(text.contains("Subnet Netmask: 255.255.255.255\n"));
        assert!(text.contains("Subnet Start: \n"));
    }

    #[test]
    fn failed_outcome_renders_nothing_as_text() {
        let outcome = Outcome::from_response(StatusCode::NO_CONTENT, "");
        assert_eq!(render(host_info, &outcome), "");
        assert_eq!(render(cname_info, &outcome), "");
    }

    #[test]
    fn json_is_pretty_printed_jsend() {
        let outcome = success(json!([{"ip_id": "1", "name": "a"}]));
        let text = render(json, &outcome);
        let expected = r#"{
  "data": {
    "results": [
      {
        "ip_id": "1",
        "name": "a"
      }
    ]
  },
  "status": "success"
}
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn subnet_block() {
        let outcome = success(json!([{
            "subnet_id": "77",
            "subnet_name": "Test Net",
            "start_ip_addr": "ac171700",
            "end_ip_addr": "ac1717ff",
            "site_name": "EXAMPLE",
        }]));

        let text = render(subnet_info, &outcome);
        assert!(text.contains("Subnet Name: Test Net\n"));
        assert!(text.contains("Subnet CIDR: 172.23.23.0/24\n"));
        assert!(text.contains("Subnet Netmask: 255.255.255.0\n"));
        assert!(text.contains("Subnet ID: 77\n"));
    }

    #[test]
    fn bad_subnet_rows_print_blanks_and_keep_going() {
        let outcome = success(json!([
            {"subnet_id": "1", "subnet_name": "Unbounded", "start_ip_addr": "0", "end_ip_addr": "0"},
            {"subnet_id": "2", "subnet_name": "Garbled", "start_ip_addr": "0a000000", "end_ip_addr": "zz"},
            {"subnet_id": "3", "subnet_name": "Good", "start_ip_addr": "0a000100", "end_ip_addr": "0a0001ff"},
        ]));

        let text = render(subnet_info, &outcome);
        assert!(text.contains("Subnet Name: Unbounded\nSubnet Start: \nSubnet End: \nSubnet Netmask: \nSubnet CIDR: \n"));
        assert!(text.contains("Subnet Name: Garbled\nSubnet Start: 10.0.0.0\nSubnet End: \n"));
        assert!(text.contains("Subnet Name: Good\n"));
        assert!(text.contains("Subnet CIDR: 10.0.1.0/24\n"));
    }

    #[test]
    fn cname_and_free_address_lines() {
        let outcome = success(json!([{"name": "web01.example.com", "ip_alias": "www.example.com"}]));
        assert_eq!(render(cname_info, &outcome), "Hostname: web01.example.com.\nCNAMES: www.example.com\n");

        let outcome = success(json!([{"hostaddr": "10.0.0.5"}, {"hostaddr": "10.0.0.6"}]));
        assert_eq!(render(free_addresses, &outcome), "10.0.0.5\n10.0.0.6\n");
    }
}
