//! Certificate authority collaborator.
//!
//! The provisioner only sees [`CertificateAuthority`]: hand it a request, get
//! back a freshly generated key and a certificate signed by the CA. [`LocalCa`]
//! is the on-disk implementation backed by rcgen.

mod store;

pub use store::{CaPair, CaStore};

use crate::error::{NodeError, Result};
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose,
    IsCa, KeyPair, KeyUsagePurpose, SanType,
};
use std::net::IpAddr;
use std::time::{Duration, SystemTime};

/// CA certificate validity period
const CA_VALIDITY: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Issued node certificate validity period
const CERT_VALIDITY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// What to put in an issued certificate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateRequest {
    pub common_name: String,
    pub organizational_unit: Option<String>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
}

/// Certificate plus the private key generated for it, both PEM
#[derive(Debug, Clone)]
pub struct SignedCertificate {
    pub certificate_pem: String,
    pub private_key_pem: String,
}

pub trait CertificateAuthority {
    /// Generate a new key pair and issue a certificate for it
    fn sign(&self, request: &CertificateRequest) -> Result<SignedCertificate>;

    /// The CA's own certificate, used as the chain for issued certificates
    fn certificate_pem(&self) -> &str;
}

/// A CA whose certificate and key are held in memory
pub struct LocalCa {
    cert: rcgen::Certificate,
    key: KeyPair,
    cert_pem: String,
}

impl LocalCa {
    /// Generate a self-signed root CA (valid 10 years)
    pub fn generate(common_name: &str, organization: &str) -> Result<Self> {
        let mut params = CertificateParams::new(Vec::<String>::new())
            .map_err(|e| NodeError::Ca(format!("Failed to create CA params: {}", e)))?;

        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, common_name);
        params
            .distinguished_name
            .push(DnType::OrganizationName, organization);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];

        let not_before = SystemTime::now();
        params.not_before = not_before.into();
        params.not_after = (not_before + CA_VALIDITY).into();

        let key = KeyPair::generate()
            .map_err(|e| NodeError::Ca(format!("Failed to generate CA key pair: {}", e)))?;
        let cert = params
            .self_signed(&key)
            .map_err(|e| NodeError::Ca(format!("Failed to generate CA certificate: {}", e)))?;
        let cert_pem = cert.pem();

        Ok(Self {
            cert,
            key,
            cert_pem,
        })
    }

    /// Rebuild a CA from its stored certificate and key.
    ///
    /// rcgen signs with an in-memory issuer certificate, so the stored one is
    /// re-created from its parameters and key. The subject and key are
    /// unchanged, so issued certificates chain to the stored PEM, which is
    /// kept verbatim.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let key = KeyPair::from_pem(key_pem)
            .map_err(|e| NodeError::Ca(format!("Failed to parse CA key: {}", e)))?;
        let params = CertificateParams::from_ca_cert_pem(cert_pem)
            .map_err(|e| NodeError::Ca(format!("Failed to parse CA certificate: {}", e)))?;
        let cert = params
            .self_signed(&key)
            .map_err(|e| NodeError::Ca(format!("Failed to recreate CA cert for signing: {}", e)))?;

        Ok(Self {
            cert,
            key,
            cert_pem: cert_pem.to_string(),
        })
    }

    pub fn key_pem(&self) -> String {
        self.key.serialize_pem()
    }
}

impl CertificateAuthority for LocalCa {
    fn sign(&self, request: &CertificateRequest) -> Result<SignedCertificate> {
        let mut params = CertificateParams::new(request.dns_names.clone())
            .map_err(|e| NodeError::Ca(format!("Failed to create certificate params: {}", e)))?;

        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, request.common_name.as_str());
        if let Some(ou) = &request.organizational_unit {
            params
                .distinguished_name
                .push(DnType::OrganizationalUnitName, ou.as_str());
        }

        for ip in &request.ip_addresses {
            params.subject_alt_names.push(SanType::IpAddress(*ip));
        }

        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];
        params.use_authority_key_identifier_extension = true;

        let not_before = SystemTime::now();
        params.not_before = not_before.into();
        params.not_after = (not_before + CERT_VALIDITY).into();

        let key = KeyPair::generate()
            .map_err(|e| NodeError::Ca(format!("Failed to generate key pair: {}", e)))?;
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .map_err(|e| NodeError::Ca(format!("Failed to sign certificate: {}", e)))?;

        tracing::debug!(
            common_name = %request.common_name,
            dns_names = request.dns_names.len(),
            ip_addresses = request.ip_addresses.len(),
            "[CA] Issued certificate"
        );

        Ok(SignedCertificate {
            certificate_pem: cert.pem(),
            private_key_pem: key.serialize_pem(),
        })
    }

    fn certificate_pem(&self) -> &str {
        &self.cert_pem
    }
}
