// sumactl - CLI reports for the SUSE Manager XML-RPC API
// Copyright (C) 2025 sumactl contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::client::ApiError;
use crate::schema::NetworkDevice;
use regex::Regex;
use std::sync::OnceLock;

/// Sentinel rendered when no address can be determined.
pub const NO_ADDRESS: &str = "N/A";

const LOOPBACK: &str = "127.0.0.1";

static DOTTED_QUAD: OnceLock<Regex> = OnceLock::new();

fn dotted_quad() -> &'static Regex {
    DOTTED_QUAD
        .get_or_init(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("dotted-quad pattern"))
}

/// Leftmost dotted-quad in the text. Octet ranges are deliberately not
/// validated (`999.999.999.999` matches); operators rely on the loose match.
pub fn ip_from_description(description: &str) -> Option<&str> {
    dotted_quad().find(description).map(|m| m.as_str())
}

/// Best-guess management address for a system.
///
/// An address embedded in the description is an operator-supplied override
/// and wins outright; only without one is the device list fetched. Devices
/// are checked in the order returned, skipping absent addresses and the
/// loopback. A fetch failure resolves to [`NO_ADDRESS`] without surfacing.
pub fn resolve_ip<F>(description: Option<&str>, fetch_devices: F) -> String
where
    F: FnOnce() -> Result<Vec<NetworkDevice>, ApiError>,
{
    if let Some(ip) = description.and_then(ip_from_description) {
        return ip.to_string();
    }

    let devices = match fetch_devices() {
        Ok(devices) => devices,
        Err(_) => return NO_ADDRESS.to_string(),
    };

    devices
        .into_iter()
        .filter_map(|device| device.ip)
        .find(|ip| !ip.is_empty() && ip != LOOPBACK)
        .unwrap_or_else(|| NO_ADDRESS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(ip: Option<&str>) -> NetworkDevice {
        NetworkDevice {
            ip: ip.map(ToOwned::to_owned),
        }
    }

    fn fetch_err() -> Result<Vec<NetworkDevice>, ApiError> {
        Err(ApiError::Query {
            method: "system.getNetworkDevices",
            detail: "unreachable".into(),
        })
    }

    #[test]
    fn description_address_wins_without_device_lookup() {
        let resolved = resolve_ip(Some("rack3 host 10.0.0.5 DC-A"), || {
            panic!("device lookup must not run when the description carries an address")
        });
        assert_eq!(resolved, "10.0.0.5");
    }

    #[test]
    fn leftmost_description_address_is_used() {
        let resolved = resolve_ip(Some("primary 10.0.0.5 backup 10.0.0.6"), || Ok(vec![]));
        assert_eq!(resolved, "10.0.0.5");
    }

    #[test]
    fn octet_ranges_are_not_validated() {
        assert_eq!(
            ip_from_description("broken box 999.999.999.999"),
            Some("999.999.999.999")
        );
    }

    #[test]
    fn first_non_loopback_device_is_used_in_order() {
        let resolved = resolve_ip(Some("DC-A primary node"), || {
            Ok(vec![
                device(Some("127.0.0.1")),
                device(Some("192.168.1.20")),
                device(Some("192.168.1.21")),
            ])
        });
        assert_eq!(resolved, "192.168.1.20");
    }

    #[test]
    fn absent_addresses_are_skipped() {
        let resolved = resolve_ip(None, || {
            Ok(vec![device(None), device(Some("")), device(Some("10.1.2.3"))])
        });
        assert_eq!(resolved, "10.1.2.3");
    }

    #[test]
    fn loopback_only_devices_resolve_to_the_sentinel() {
        let resolved = resolve_ip(Some("no address here"), || {
            Ok(vec![device(Some("127.0.0.1"))])
        });
        assert_eq!(resolved, NO_ADDRESS);
    }

    #[test]
    fn empty_device_list_resolves_to_the_sentinel() {
        assert_eq!(resolve_ip(None, || Ok(vec![])), NO_ADDRESS);
    }

    #[test]
    fn device_fetch_failure_is_swallowed() {
        assert_eq!(resolve_ip(Some("DC-B"), fetch_err), NO_ADDRESS);
    }
}
