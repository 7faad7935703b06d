// Keypair collaborator seam.
//
// Key generation and address checking belong to the identity library; the
// client only stores the handle it hands back.

use thiserror::Error;
use twodays_common::types::Keypair;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid shortname `{shortname}`: {reason}")]
    InvalidShortname { shortname: String, reason: String },

    #[error("invalid keypair: {0}")]
    InvalidKeypair(String),
}

pub trait KeypairAuthority {
    fn generate(&self, shortname: &str) -> Result<Keypair, IdentityError>;

    fn validate(&self, keypair: &Keypair) -> Result<(), IdentityError>;
}
