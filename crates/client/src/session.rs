// Identity session: who is signed in, which workspace, online or not.
//
// Every setter returns the `SessionChange` it made so the caller can queue
// it for the mirror. Identity failures come back as `SessionError` for the
// UI to show; they never leave the session half-updated.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use twodays_common::types::{Keypair, WorkspaceId};

use crate::identity::{IdentityError, KeypairAuthority};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub identity: Option<Keypair>,
    pub online: bool,
    pub workspace: Option<WorkspaceId>,
    pub relays: Vec<String>,
}

/// One field of the session, as it must be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    Identity(Option<Keypair>),
    Online(bool),
    Workspace(Option<WorkspaceId>),
    Relays(Vec<String>),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("identity rejected: {0}")]
    Rejected(#[from] IdentityError),
}

#[derive(Debug, Default)]
pub struct IdentitySession {
    state: SessionState,
}

impl IdentitySession {
    pub fn new(state: SessionState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Keypair> {
        self.state.identity.as_ref()
    }

    pub fn address(&self) -> Option<&str> {
        self.state.identity.as_ref().map(|keypair| keypair.address.as_str())
    }

    pub fn is_online(&self) -> bool {
        self.state.online
    }

    pub fn workspace(&self) -> Option<&WorkspaceId> {
        self.state.workspace.as_ref()
    }

    pub fn relays(&self) -> &[String] {
        &self.state.relays
    }

    /// Store an identity handle the caller already trusts.
    pub fn sign_in(&mut self, keypair: Keypair) -> SessionChange {
        info!(address = %keypair.address, "signed in");
        self.state.identity = Some(keypair.clone());
        SessionChange::Identity(Some(keypair))
    }

    /// Sign in with an existing keypair after the authority accepts it.
    pub fn sign_in_existing(
        &mut self,
        authority: &dyn KeypairAuthority,
        keypair: Keypair,
    ) -> Result<SessionChange, SessionError> {
        if let Err(error) = authority.validate(&keypair) {
            warn!(address = %keypair.address, %error, "keypair rejected");
            return Err(error.into());
        }
        Ok(self.sign_in(keypair))
    }

    /// Generate a fresh identity for `shortname` and sign in with it.
    pub fn sign_in_new(
        &mut self,
        authority: &dyn KeypairAuthority,
        shortname: &str,
    ) -> Result<(Keypair, SessionChange), SessionError> {
        let keypair = authority.generate(shortname).map_err(|error| {
            warn!(shortname, %error, "identity generation rejected");
            SessionError::from(error)
        })?;
        let change = self.sign_in(keypair.clone());
        Ok((keypair, change))
    }

    /// Forget the identity; workspace and online flag are kept.
    pub fn sign_out(&mut self) -> SessionChange {
        if let Some(keypair) = self.state.identity.take() {
            info!(address = %keypair.address, "signed out");
        }
        SessionChange::Identity(None)
    }

    pub fn set_online(&mut self, online: bool) -> SessionChange {
        self.state.online = online;
        SessionChange::Online(online)
    }

    pub fn set_workspace(&mut self, workspace: Option<WorkspaceId>) -> SessionChange {
        self.state.workspace = workspace.clone();
        SessionChange::Workspace(workspace)
    }

    pub fn set_relays(&mut self, relays: Vec<String>) -> SessionChange {
        self.state.relays = relays.clone();
        SessionChange::Relays(relays)
    }

    /// Summary line for the connection indicator.
    pub fn connection_status(&self) -> String {
        if self.state.online {
            format!("Connected to {} pockets", self.state.relays.len())
        } else {
            "Working offline".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAuthority;

    impl KeypairAuthority for FixedAuthority {
        fn generate(&self, shortname: &str) -> Result<Keypair, IdentityError> {
            if shortname.len() != 4 {
                return Err(IdentityError::InvalidShortname {
                    shortname: shortname.into(),
                    reason: "must be 4 characters".into(),
                });
            }
            Ok(Keypair { address: format!("@{shortname}.bkey"), secret: "bsecret".into() })
        }

        fn validate(&self, keypair: &Keypair) -> Result<(), IdentityError> {
            if keypair.secret == "bsecret" {
                Ok(())
            } else {
                Err(IdentityError::InvalidKeypair("secret does not match address".into()))
            }
        }
    }

    fn session() -> IdentitySession {
        IdentitySession::new(SessionState {
            identity: None,
            online: true,
            workspace: Some(WorkspaceId::new("+plaza.test")),
            relays: vec!["https://pub.example".into()],
        })
    }

    #[test]
    fn new_identity_signs_in() {
        let mut session = session();
        let (keypair, change) =
            session.sign_in_new(&FixedAuthority, "suzy").expect("shortname should be accepted");

        assert_eq!(keypair.address, "@suzy.bkey");
        assert_eq!(change, SessionChange::Identity(Some(keypair)));
        assert_eq!(session.address(), Some("@suzy.bkey"));
    }

    #[test]
    fn bad_shortname_is_rejected_without_state_change() {
        let mut session = session();
        let error = session.sign_in_new(&FixedAuthority, "toolong").expect_err("should reject");

        assert!(error.to_string().contains("must be 4 characters"));
        assert!(session.identity().is_none());
    }

    #[test]
    fn existing_keypair_is_validated() {
        let mut session = session();
        let bad = Keypair { address: "@suzy.bkey".into(), secret: "wrong".into() };
        assert!(session.sign_in_existing(&FixedAuthority, bad).is_err());
        assert!(session.identity().is_none());

        let good = Keypair { address: "@suzy.bkey".into(), secret: "bsecret".into() };
        session.sign_in_existing(&FixedAuthority, good).expect("keypair should validate");
        assert_eq!(session.address(), Some("@suzy.bkey"));
    }

    #[test]
    fn sign_out_keeps_workspace_and_online() {
        let mut session = session();
        session.sign_in(Keypair { address: "@suzy.bkey".into(), secret: "s".into() });

        assert_eq!(session.sign_out(), SessionChange::Identity(None));
        assert!(session.identity().is_none());
        assert!(session.is_online());
        assert_eq!(session.workspace().map(WorkspaceId::as_str), Some("+plaza.test"));
    }

    #[test]
    fn connection_status_reflects_online_flag() {
        let mut session = session();
        assert_eq!(session.connection_status(), "Connected to 1 pockets");

        assert_eq!(session.set_online(false), SessionChange::Online(false));
        assert_eq!(session.connection_status(), "Working offline");
    }
}
