//! Per-router SNMP configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::RecordId;

/// SNMP transport and credentials for one router (1:1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnmpConfig {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub router_id: Option<RecordId>,
    /// Transport network, `udp` or `tcp`
    #[serde(default = "default_network")]
    pub network: String,
    /// Agent address, `host:port`
    pub address: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_max_msg_size")]
    pub max_msg_size: u32,
    /// Version selector and version-specific credentials
    pub credentials: SnmpCredentials,
}

impl UserSnmpConfig {
    /// SNMPv2c config with the default transport settings
    pub fn v2c(address: impl Into<String>, community: impl Into<String>) -> Self {
        Self {
            id: None,
            created_at: None,
            updated_at: None,
            router_id: None,
            network: default_network(),
            address: address.into(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            max_msg_size: default_max_msg_size(),
            credentials: SnmpCredentials::V2c {
                community: community.into(),
            },
        }
    }

    /// Validate transport and credential fields
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.address.is_empty() {
            return Err(crate::Error::config("SNMP address cannot be empty"));
        }
        match self.network.as_str() {
            "udp" | "udp4" | "udp6" | "tcp" | "tcp4" | "tcp6" => {}
            other => {
                return Err(crate::Error::config(format!(
                    "Unsupported SNMP transport network '{}'",
                    other
                )));
            }
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("SNMP timeout must be > 0"));
        }
        self.credentials.validate()
    }
}

fn default_network() -> String {
    "udp".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_retries() -> u32 {
    3
}

fn default_max_msg_size() -> u32 {
    1400
}

/// Version-specific credentials
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "version", rename_all = "lowercase")]
pub enum SnmpCredentials {
    V1 {
        community: String,
    },
    V2c {
        community: String,
    },
    V3 {
        user_name: String,
        security_level: SecurityLevel,
        #[serde(default)]
        auth_protocol: AuthProtocol,
        #[serde(default)]
        auth_password: String,
        #[serde(default)]
        priv_protocol: PrivProtocol,
        #[serde(default)]
        priv_password: String,
        #[serde(default)]
        authoritative_engine_id: String,
        #[serde(default)]
        context_engine_id: String,
        #[serde(default)]
        context_name: String,
    },
}

impl SnmpCredentials {
    /// Protocol version label
    pub fn version(&self) -> &'static str {
        match self {
            SnmpCredentials::V1 { .. } => "v1",
            SnmpCredentials::V2c { .. } => "v2c",
            SnmpCredentials::V3 { .. } => "v3",
        }
    }

    fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SnmpCredentials::V1 { community } | SnmpCredentials::V2c { community } => {
                if community.is_empty() {
                    return Err(crate::Error::config("SNMP community cannot be empty"));
                }
                Ok(())
            }
            SnmpCredentials::V3 {
                user_name,
                security_level,
                auth_protocol,
                auth_password,
                priv_protocol,
                priv_password,
                ..
            } => {
                if user_name.is_empty() {
                    return Err(crate::Error::config("SNMPv3 user name cannot be empty"));
                }
                if security_level.needs_auth()
                    && (*auth_protocol == AuthProtocol::None || auth_password.is_empty())
                {
                    return Err(crate::Error::config(format!(
                        "SNMPv3 security level {:?} requires an auth protocol and password",
                        security_level
                    )));
                }
                if security_level.needs_priv()
                    && (*priv_protocol == PrivProtocol::None || priv_password.is_empty())
                {
                    return Err(crate::Error::config(
                        "SNMPv3 security level AuthPriv requires a privacy protocol and password",
                    ));
                }
                Ok(())
            }
        }
    }
}

// Passwords and communities stay out of logs.
impl fmt::Debug for SnmpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnmpCredentials::V1 { .. } => f.debug_struct("V1").field("community", &"<redacted>").finish(),
            SnmpCredentials::V2c { .. } => f.debug_struct("V2c").field("community", &"<redacted>").finish(),
            SnmpCredentials::V3 {
                user_name,
                security_level,
                auth_protocol,
                priv_protocol,
                context_name,
                ..
            } => f
                .debug_struct("V3")
                .field("user_name", user_name)
                .field("security_level", security_level)
                .field("auth_protocol", auth_protocol)
                .field("auth_password", &"<redacted>")
                .field("priv_protocol", priv_protocol)
                .field("priv_password", &"<redacted>")
                .field("context_name", context_name)
                .finish_non_exhaustive(),
        }
    }
}

/// SNMPv3 message security level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    NoAuthNoPriv,
    AuthNoPriv,
    AuthPriv,
}

impl SecurityLevel {
    fn needs_auth(&self) -> bool {
        !matches!(self, SecurityLevel::NoAuthNoPriv)
    }

    fn needs_priv(&self) -> bool {
        matches!(self, SecurityLevel::AuthPriv)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthProtocol {
    #[default]
    None,
    Md5,
    Sha,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivProtocol {
    #[default]
    None,
    Des,
    Aes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_secrets() {
        let config = UserSnmpConfig::v2c("10.0.1.1:161", "s3cret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn v3_auth_priv_requires_priv_password() {
        let mut config = UserSnmpConfig::v2c("10.0.1.1:161", "public");
        config.credentials = SnmpCredentials::V3 {
            user_name: "poller".to_string(),
            security_level: SecurityLevel::AuthPriv,
            auth_protocol: AuthProtocol::Sha,
            auth_password: "authpass".to_string(),
            priv_protocol: PrivProtocol::Aes,
            priv_password: String::new(),
            authoritative_engine_id: String::new(),
            context_engine_id: String::new(),
            context_name: String::new(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn credentials_deserialize_by_version_tag() {
        let json = r#"{"address": "10.0.1.2:161", "credentials": {"version": "v1", "community": "public"}}"#;
        let config: UserSnmpConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.credentials.version(), "v1");
        assert_eq!(config.network, "udp");
        assert_eq!(config.retries, 3);
        assert!(config.validate().is_ok());
    }
}
