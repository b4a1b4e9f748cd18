//! Signed-in identity and the admin capability derived from it.

use crate::config::ClientConfig;
use crate::error::{CatalogError, Result};
use reelrack_engine::Uid;
use serde::{Deserialize, Serialize};

/// Identity supplied by the sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: Uid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<Uid>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }
}

/// Who is calling, and whether they may mutate the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    identity: Option<Identity>,
    is_admin: bool,
}

impl Session {
    /// A visitor that is not signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Derive the session for a (possibly absent) identity.
    ///
    /// The session is admin iff someone is signed in and their uid equals the
    /// configured, non-empty admin uid.
    pub fn resolve(identity: Option<Identity>, admin_uid: Option<&str>) -> Self {
        let is_admin = match (&identity, admin_uid) {
            (Some(identity), Some(admin)) => !admin.is_empty() && identity.uid == admin,
            _ => false,
        };
        Self { identity, is_admin }
    }

    /// Resolve against the admin uid from `REELRACK_ADMIN_UID`.
    pub fn from_config(identity: Option<Identity>, config: &ClientConfig) -> Self {
        Self::resolve(identity, config.admin_uid.as_deref())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.uid.as_str())
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Fail with `AuthorizationDenial` unless this is an admin session.
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(CatalogError::AuthorizationDenial { action })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_requires_matching_uid() {
        let session = Session::resolve(Some(Identity::new("u-1")), Some("u-1"));
        assert!(session.is_admin());
        assert_eq!(session.uid(), Some("u-1"));
        assert!(session.require_admin("create").is_ok());

        let session = Session::resolve(Some(Identity::new("u-2")), Some("u-1"));
        assert!(!session.is_admin());
        assert!(matches!(
            session.require_admin("create"),
            Err(CatalogError::AuthorizationDenial { action: "create" })
        ));
    }

    #[test]
    fn admin_uid_comes_from_config() {
        let mut config = ClientConfig::new("http://localhost:3000");
        assert!(!Session::from_config(Some(Identity::new("u-1")), &config).is_admin());

        config.admin_uid = Some("u-1".into());
        assert!(Session::from_config(Some(Identity::new("u-1")), &config).is_admin());
        assert!(!Session::from_config(Some(Identity::new("u-2")), &config).is_admin());
        assert!(!Session::from_config(None, &config).is_admin());
    }

    #[test]
    fn no_admin_without_identity_or_config() {
        assert!(!Session::resolve(None, Some("u-1")).is_admin());
        assert!(!Session::resolve(Some(Identity::new("u-1")), None).is_admin());
        assert!(!Session::resolve(Some(Identity::new("")), Some("")).is_admin());
        assert!(!Session::anonymous().is_admin());
        assert_eq!(Session::anonymous().uid(), None);
    }
}
