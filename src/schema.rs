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

//! Typed views of XML-RPC response structs.
//!
//! Optional fields stay optional here; the `"N/A"` fallback belongs to the
//! formatting boundary, not to the records.

use std::collections::BTreeMap;
use xmlrpc::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub login: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub enabled: bool,
    pub roles: Vec<String>,
}

impl UserRecord {
    /// Returns `None` for anything that is not a non-empty struct, which is
    /// how the API answers a lookup for an unknown login.
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_struct().filter(|fields| !fields.is_empty())?;
        Some(Self {
            login: string_field(fields, "login"),
            first_name: string_field(fields, "first_name"),
            last_name: string_field(fields, "last_name"),
            email: string_field(fields, "email"),
            enabled: fields
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            roles: role_labels(fields.get("roles")),
        })
    }

    /// Name parts that are actually present, joined by a space.
    pub fn full_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// One entry from `system.listSystems`.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSummary {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl SystemSummary {
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_struct()?;
        Some(Self {
            id: fields.get("id").and_then(Value::as_i64),
            name: string_field(fields, "name"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemDetails {
    pub release: Option<String>,
    pub description: Option<String>,
}

impl SystemDetails {
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_struct()?;
        Some(Self {
            release: string_field(fields, "release"),
            description: string_field(fields, "description"),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetworkDevice {
    pub ip: Option<String>,
}

impl NetworkDevice {
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_struct()?;
        Some(Self {
            ip: string_field(fields, "ip"),
        })
    }
}

fn string_field(fields: &BTreeMap<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(ToOwned::to_owned)
}

fn role_labels(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|roles| {
            roles
                .iter()
                .filter_map(|role| {
                    role.as_struct()
                        .and_then(|fields| string_field(fields, "label"))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_struct(entries: Vec<(&str, Value)>) -> Value {
        Value::Struct(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        )
    }

    #[test]
    fn decodes_a_full_user_record() {
        let value = value_struct(vec![
            ("login", Value::String("jdoe".into())),
            ("first_name", Value::String("Jane".into())),
            ("last_name", Value::String("Doe".into())),
            ("email", Value::String("jane@x.com".into())),
            ("enabled", Value::Bool(true)),
            (
                "roles",
                Value::Array(vec![
                    value_struct(vec![("label", Value::String("org_admin".into()))]),
                    value_struct(vec![("label", Value::String("channel_admin".into()))]),
                ]),
            ),
        ]);

        let user = UserRecord::from_value(&value).unwrap();
        assert_eq!(user.login.as_deref(), Some("jdoe"));
        assert_eq!(user.full_name().as_deref(), Some("Jane Doe"));
        assert_eq!(user.email.as_deref(), Some("jane@x.com"));
        assert!(user.enabled);
        assert_eq!(user.roles, vec!["org_admin", "channel_admin"]);
    }

    #[test]
    fn empty_struct_decodes_to_absent_user() {
        assert!(UserRecord::from_value(&Value::Struct(BTreeMap::new())).is_none());
        assert!(UserRecord::from_value(&Value::Bool(false)).is_none());
    }

    #[test]
    fn missing_fields_stay_optional() {
        let value = value_struct(vec![("login", Value::String("svc".into()))]);
        let user = UserRecord::from_value(&value).unwrap();

        assert_eq!(user.full_name(), None);
        assert_eq!(user.email, None);
        assert!(!user.enabled);
        assert!(user.roles.is_empty());
    }

    #[test]
    fn full_name_skips_absent_parts() {
        let value = value_struct(vec![
            ("login", Value::String("solo".into())),
            ("last_name", Value::String("Doe".into())),
            ("first_name", Value::String("".into())),
        ]);
        let user = UserRecord::from_value(&value).unwrap();
        assert_eq!(user.full_name().as_deref(), Some("Doe"));
    }

    #[test]
    fn decodes_system_entries_with_large_ids() {
        let value = value_struct(vec![
            ("id", Value::Int64(1000010001)),
            ("name", Value::String("web01".into())),
        ]);
        let system = SystemSummary::from_value(&value).unwrap();
        assert_eq!(system.id, Some(1000010001));
        assert_eq!(system.name.as_deref(), Some("web01"));
    }

    #[test]
    fn decodes_network_devices_without_an_address() {
        let device = NetworkDevice::from_value(&value_struct(vec![])).unwrap();
        assert_eq!(device.ip, None);
    }
}
