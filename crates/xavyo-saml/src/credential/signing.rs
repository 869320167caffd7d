//! Signing credential
//!
//! The key material used to sign SAML assertions for a tenant, or to verify
//! signatures when built from bare public key components.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use openssl::bn::BigNum;
use openssl::pkey::{PKey, Private, Public};
use openssl::rsa::Rsa;
use openssl::x509::{X509Crl, X509};
use std::fmt;

use crate::error::{CredentialError, CredentialResult};

/// Credential context sets are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialContextSet {
    Unsupported,
}

/// Intended usage of the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageType {
    Signing,
    Encryption,
    Unspecified,
}

/// Kind of credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialType {
    X509,
}

/// A tenant signing credential.
///
/// Resolved credentials always carry both private key and certificate.
/// Verification-only credentials carry just the public key.
#[derive(Clone)]
pub struct SigningCredential {
    private_key: Option<PKey<Private>>,
    certificate: Option<X509>,
    public_key: PKey<Public>,
    entity_id: String,
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningCredential")
            .field("private_key", &self.private_key.as_ref().map(|_| "[REDACTED]"))
            .field(
                "certificate",
                &self.certificate.as_ref().map(|c| format!("{:?}", c.subject_name())),
            )
            .field("public_key", &self.public_key.id())
            .field("entity_id", &self.entity_id)
            .finish()
    }
}

impl SigningCredential {
    /// Pair a private key with its certificate.
    pub(crate) fn from_key_and_certificate(
        private_key: PKey<Private>,
        certificate: X509,
    ) -> CredentialResult<Self> {
        let public_key = certificate_public_key(&certificate)?;
        Ok(Self {
            private_key: Some(private_key),
            certificate: Some(certificate),
            public_key,
            entity_id: String::new(),
        })
    }

    /// Verification-only credential from a big-endian RSA modulus and exponent.
    pub fn from_rsa_components(modulus: &[u8], exponent: &[u8]) -> CredentialResult<Self> {
        let n = positive_bignum("modulus", modulus)?;
        let e = positive_bignum("exponent", exponent)?;
        if !e.is_bit_set(0) {
            return Err(CredentialError::InvalidKeySpec(
                "RSA exponent must be odd".to_string(),
            ));
        }

        let rsa = Rsa::from_public_components(n, e)
            .map_err(|err| CredentialError::UnsupportedKeyAlgorithm(format!("RSA: {err}")))?;
        let public_key = PKey::from_rsa(rsa)
            .map_err(|err| CredentialError::UnsupportedKeyAlgorithm(format!("RSA: {err}")))?;

        Ok(Self {
            private_key: None,
            certificate: None,
            public_key,
            entity_id: String::new(),
        })
    }

    /// Verification-only credential from JWK `n` and `e` members (base64url).
    pub fn from_jwk_components(n: &str, e: &str) -> CredentialResult<Self> {
        let decode = |name: &str, value: &str| {
            URL_SAFE_NO_PAD
                .decode(value.trim().trim_end_matches('='))
                .map_err(|err| CredentialError::InvalidKeySpec(format!("JWK '{name}': {err}")))
        };
        let modulus = decode("n", n)?;
        let exponent = decode("e", e)?;
        Self::from_rsa_components(&modulus, &exponent)
    }

    /// Credential wrapping a certificate, without a private key.
    pub fn from_certificate(certificate: X509) -> CredentialResult<Self> {
        let public_key = certificate_public_key(&certificate)?;
        Ok(Self {
            private_key: None,
            certificate: Some(certificate),
            public_key,
            entity_id: String::new(),
        })
    }

    /// Credential wrapping a certificate, tagged with an entity id.
    pub fn from_certificate_with_entity_id(
        certificate: X509,
        entity_id: impl Into<String>,
    ) -> CredentialResult<Self> {
        let mut credential = Self::from_certificate(certificate)?;
        credential.entity_id = entity_id.into();
        Ok(credential)
    }

    #[must_use]
    pub fn private_key(&self) -> Option<&PKey<Private>> {
        self.private_key.as_ref()
    }

    /// The signing certificate.
    #[must_use]
    pub fn certificate(&self) -> Option<&X509> {
        self.certificate.as_ref()
    }

    #[must_use]
    pub fn public_key(&self) -> &PKey<Public> {
        &self.public_key
    }

    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    // Not supported: always empty.

    #[must_use]
    pub fn entity_certificate(&self) -> Option<&X509> {
        None
    }

    #[must_use]
    pub fn entity_certificate_chain(&self) -> Vec<X509> {
        Vec::new()
    }

    #[must_use]
    pub fn crls(&self) -> Vec<X509Crl> {
        Vec::new()
    }

    #[must_use]
    pub fn key_names(&self) -> Vec<String> {
        Vec::new()
    }

    #[must_use]
    pub fn secret_key(&self) -> Option<&[u8]> {
        None
    }

    #[must_use]
    pub fn credential_context_set(&self) -> CredentialContextSet {
        CredentialContextSet::Unsupported
    }

    #[must_use]
    pub fn usage_type(&self) -> UsageType {
        UsageType::Unspecified
    }

    #[must_use]
    pub fn credential_type(&self) -> CredentialType {
        CredentialType::X509
    }
}

fn certificate_public_key(certificate: &X509) -> CredentialResult<PKey<Public>> {
    certificate
        .public_key()
        .map_err(|err| CredentialError::UnsupportedKeyAlgorithm(format!("certificate key: {err}")))
}

fn positive_bignum(name: &str, bytes: &[u8]) -> CredentialResult<BigNum> {
    if bytes.iter().all(|b| *b == 0) {
        return Err(CredentialError::InvalidKeySpec(format!(
            "RSA {name} must be a positive integer"
        )));
    }
    BigNum::from_slice(bytes)
        .map_err(|err| CredentialError::InvalidKeySpec(format!("RSA {name}: {err}")))
}
