use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
}

/// Final, merged global configuration used by the running process.
///
/// Merge order (after DB connection): CLI > ENV > DB, then persist back to DB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Stored as a hash (not plaintext).
    pub admin_token_hash: String,
    pub dsn: String,
    /// SystemSetting `force_project_binding`.
    pub force_project_binding: bool,
    /// SystemSetting `force_project_timeout`, seconds, clamped to [5, 300].
    pub force_project_timeout_secs: u32,
    /// Redact sensitive fields in emitted events.
    pub event_redact_sensitive: bool,
    /// Outbound proxy URL for upstream dispatch, if any (§4.11).
    pub outbound_proxy: Option<String>,
}

impl GlobalConfig {
    pub const MIN_FORCE_PROJECT_TIMEOUT_SECS: u32 = 5;
    pub const MAX_FORCE_PROJECT_TIMEOUT_SECS: u32 = 300;
    pub const DEFAULT_FORCE_PROJECT_TIMEOUT_SECS: u32 = 30;

    pub fn clamp_force_project_timeout(secs: u32) -> u32 {
        secs.clamp(
            Self::MIN_FORCE_PROJECT_TIMEOUT_SECS,
            Self::MAX_FORCE_PROJECT_TIMEOUT_SECS,
        )
    }
}

/// Optional layer used for merging global config across CLI/ENV/DB sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub admin_token_hash: Option<String>,
    pub dsn: Option<String>,
    pub force_project_binding: Option<bool>,
    pub force_project_timeout_secs: Option<u32>,
    pub event_redact_sensitive: Option<bool>,
    pub outbound_proxy: Option<String>,
}

impl GlobalConfigPatch {
    /// Overlay `other` onto `self`; any field `other` sets wins.
    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.admin_token_hash.is_some() {
            self.admin_token_hash = other.admin_token_hash;
        }
        if other.dsn.is_some() {
            self.dsn = other.dsn;
        }
        if other.force_project_binding.is_some() {
            self.force_project_binding = other.force_project_binding;
        }
        if other.force_project_timeout_secs.is_some() {
            self.force_project_timeout_secs = other.force_project_timeout_secs;
        }
        if other.event_redact_sensitive.is_some() {
            self.event_redact_sensitive = other.event_redact_sensitive;
        }
        if other.outbound_proxy.is_some() {
            self.outbound_proxy = other.outbound_proxy;
        }
    }

    pub fn into_config(self) -> Result<GlobalConfig, GlobalConfigError> {
        Ok(GlobalConfig {
            host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: self.port.unwrap_or(8787),
            admin_token_hash: self
                .admin_token_hash
                .ok_or(GlobalConfigError::MissingField("admin_token_hash"))?,
            dsn: self.dsn.ok_or(GlobalConfigError::MissingField("dsn"))?,
            force_project_binding: self.force_project_binding.unwrap_or(false),
            force_project_timeout_secs: GlobalConfig::clamp_force_project_timeout(
                self.force_project_timeout_secs
                    .unwrap_or(GlobalConfig::DEFAULT_FORCE_PROJECT_TIMEOUT_SECS),
            ),
            event_redact_sensitive: self.event_redact_sensitive.unwrap_or(true),
            outbound_proxy: self.outbound_proxy,
        })
    }
}

impl From<GlobalConfig> for GlobalConfigPatch {
    fn from(value: GlobalConfig) -> Self {
        Self {
            host: Some(value.host),
            port: Some(value.port),
            admin_token_hash: Some(value.admin_token_hash),
            dsn: Some(value.dsn),
            force_project_binding: Some(value.force_project_binding),
            force_project_timeout_secs: Some(value.force_project_timeout_secs),
            event_redact_sensitive: Some(value.event_redact_sensitive),
            outbound_proxy: value.outbound_proxy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_prefers_incoming_fields() {
        let mut base = GlobalConfigPatch {
            host: Some("127.0.0.1".into()),
            port: Some(1),
            ..Default::default()
        };
        base.overlay(GlobalConfigPatch {
            port: Some(2),
            ..Default::default()
        });
        assert_eq!(base.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(base.port, Some(2));
    }

    #[test]
    fn timeout_clamped_to_bounds() {
        assert_eq!(GlobalConfig::clamp_force_project_timeout(1), 5);
        assert_eq!(GlobalConfig::clamp_force_project_timeout(9999), 300);
        assert_eq!(GlobalConfig::clamp_force_project_timeout(30), 30);
    }

    #[test]
    fn into_config_requires_dsn_and_token() {
        let err = GlobalConfigPatch::default().into_config().unwrap_err();
        assert!(matches!(err, GlobalConfigError::MissingField("admin_token_hash")));
    }
}
