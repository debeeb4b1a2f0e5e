use std::collections::HashSet;

use crate::{CertificateType, DerivationPath, RequiredSigner, SigningMode, SigningRequest};

impl SigningRequest {
    /// Return the paths of the keys that must witness the transaction.
    ///
    /// Paths are gathered from inputs, certificates (pool owners only when signing as pool
    /// owner), withdrawals, collateral inputs, required signers and additional witness requests,
    /// in this order. Duplicates keep their first position.
    ///
    /// The device is asked for witnesses in this order and the witnesses are returned in the
    /// same order.
    pub fn witness_paths(&self) -> Vec<DerivationPath> {
        let mut seen = HashSet::new();
        let mut paths = vec![];
        let mut insert = |path: &DerivationPath| {
            if seen.insert(path.clone()) {
                paths.push(path.clone());
            }
        };

        for path in self.inputs.iter().filter_map(|i| i.path.as_ref()) {
            insert(path);
        }
        for certificate in &self.certificates {
            if matches!(
                certificate.certificate_type,
                CertificateType::StakeDelegation | CertificateType::StakeDeregistration
            ) {
                if let Some(path) = certificate.path.as_ref() {
                    insert(path);
                }
            }
            if self.signing_mode == SigningMode::PoolRegistrationAsOwner {
                for owner in certificate.pool_owners() {
                    if let Some(path) = owner.staking_key_path.as_ref() {
                        insert(path);
                    }
                }
            }
        }
        for path in self.withdrawals.iter().filter_map(|w| w.path.as_ref()) {
            insert(path);
        }
        for path in self.collateral_inputs.iter().filter_map(|i| i.path.as_ref()) {
            insert(path);
        }
        for signer in &self.required_signers {
            if let RequiredSigner::KeyPath(path) = signer {
                insert(path);
            }
        }
        for path in &self.additional_witness_requests {
            insert(path);
        }

        paths
    }
}
