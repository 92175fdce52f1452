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

//! The three report formatters: fixed-width, left-justified plain text on
//! stdout. Missing optional fields render as `N/A`, never as empty cells.

use crate::client::{ApiClient, ApiError, Session};
use crate::resolver::resolve_ip;

const MISSING: &str = "N/A";

pub fn user_detail(client: &ApiClient, session: &Session, username: &str) -> Result<(), ApiError> {
    let user = client.user_details(session, username)?;
    let full_name = user.full_name();

    println!();
    println!("User Details:");
    println!("{}", "-".repeat(30));
    println!("{:<20} {}", "Username:", or_missing(user.login.as_deref()));
    println!("{:<20} {}", "Full Name:", or_missing(full_name.as_deref()));
    println!("{:<20} {}", "Email:", or_missing(user.email.as_deref()));
    println!("{:<20} {}", "Account Status:", account_status(user.enabled));
    println!("{:<20} {}", "Roles:", role_list(&user.roles));
    Ok(())
}

pub fn user_list(client: &ApiClient, session: &Session) -> Result<(), ApiError> {
    let users = client.list_users(session)?;

    if users.is_empty() {
        println!();
        println!("No users are registered.");
        return Ok(());
    }

    println!();
    println!("List of Users:");
    println!(
        "{:<20} {:<25} {:<35} {:<15}",
        "Username", "Full Name", "Email", "Status"
    );
    println!(
        "{:<20} {:<25} {:<35} {:<15}",
        "-".repeat(20),
        "-".repeat(25),
        "-".repeat(35),
        "-".repeat(15)
    );

    for user in &users {
        let full_name = user.full_name();
        println!(
            "{:<20} {:<25} {:<35} {:<15}",
            or_missing(user.login.as_deref()),
            or_missing(full_name.as_deref()),
            or_missing(user.email.as_deref()),
            account_status(user.enabled)
        );
    }
    Ok(())
}

/// One row per registered system. A detail fetch failure aborts the whole
/// report; only the device lookup inside the resolver is allowed to fail
/// quietly.
pub fn system_list(client: &ApiClient, session: &Session) -> Result<(), ApiError> {
    let systems = client.list_systems(session)?;

    println!();
    println!(
        "{:<20} {:<12} {:<8} {:<15}",
        "Name", "ID", "Release", "IP Address"
    );
    println!(
        "{:<20} {:<12} {:<8} {:<15}",
        "-".repeat(20),
        "-".repeat(12),
        "-".repeat(8),
        "-".repeat(15)
    );

    for system in &systems {
        let id = system.id.ok_or_else(|| ApiError::Query {
            method: "system.listSystems",
            detail: "system entry without an id".into(),
        })?;
        let details = client.system_details(session, id)?;
        let ip = resolve_ip(details.description.as_deref(), || {
            client.network_devices(session, id)
        });

        println!(
            "{:<20} {:<12} {:<8} {:<15}",
            or_missing(system.name.as_deref()),
            id,
            or_missing(details.release.as_deref()),
            ip
        );
    }
    Ok(())
}

fn or_missing(value: Option<&str>) -> &str {
    value.unwrap_or(MISSING)
}

fn account_status(enabled: bool) -> &'static str {
    if enabled { "Active" } else { "Disabled" }
}

fn role_list(roles: &[String]) -> String {
    if roles.is_empty() {
        "None".to_string()
    } else {
        roles.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_values_render_the_sentinel() {
        assert_eq!(or_missing(None), "N/A");
        assert_eq!(or_missing(Some("10.0.0.5")), "10.0.0.5");
    }

    #[test]
    fn enabled_flag_maps_to_account_status() {
        assert_eq!(account_status(true), "Active");
        assert_eq!(account_status(false), "Disabled");
    }

    #[test]
    fn roles_are_comma_joined_or_none() {
        assert_eq!(role_list(&[]), "None");
        assert_eq!(
            role_list(&["org_admin".into(), "channel_admin".into()]),
            "org_admin, channel_admin"
        );
    }
}
