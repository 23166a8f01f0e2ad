//! Access-control gate
//!
//! Every mutation that produces a ciphertext finishes by sealing it: the
//! contract and the owning account receive decryption rights, nobody else.
//! Widening a handle to everyone is a separate, explicit step.

use nostr::PublicKey;
use tracing::trace;
use crate::error::CasinoResult;
use crate::fhe::{FheBackend, Handle};

/// Post-mutation grant policy
pub struct AccessGate;

impl AccessGate {
    /// Grant decryption of `handle` to the contract and to `owner`
    pub fn seal<B: FheBackend>(
        backend: &mut B,
        handle: Handle,
        owner: &PublicKey,
    ) -> CasinoResult<()> {
        backend.allow_this(handle)?;
        backend.allow(handle, owner)?;
        trace!(handle = %handle, owner = %owner, "handle sealed");
        Ok(())
    }

    /// Seal several handles for the same owner
    pub fn seal_all<B: FheBackend>(
        backend: &mut B,
        handles: &[Handle],
        owner: &PublicKey,
    ) -> CasinoResult<()> {
        for handle in handles {
            Self::seal(backend, *handle, owner)?;
        }
        Ok(())
    }

    /// Let anyone decrypt `handle`
    pub fn publish<B: FheBackend>(backend: &mut B, handle: Handle) -> CasinoResult<()> {
        backend.make_publicly_decryptable(handle)?;
        trace!(handle = %handle, "handle published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::LocalBackend;
    use nostr::Keys;

    #[test]
    fn test_seal_grants_contract_and_owner_only() {
        let contract = Keys::generate().public_key();
        let owner = Keys::generate().public_key();
        let stranger = Keys::generate().public_key();
        let mut fhe = LocalBackend::new(contract);

        let ct = fhe.trivial_encrypt(11u32);
        AccessGate::seal(&mut fhe, ct.handle(), &owner).unwrap();

        assert!(fhe.is_allowed(ct.handle(), &contract));
        assert!(fhe.is_allowed(ct.handle(), &owner));
        assert!(!fhe.is_allowed(ct.handle(), &stranger));
        assert!(!fhe.is_publicly_decryptable(ct.handle()));
    }

    #[test]
    fn test_publish_opens_handle() {
        let contract = Keys::generate().public_key();
        let mut fhe = LocalBackend::new(contract);

        let ct = fhe.trivial_encrypt(true);
        AccessGate::publish(&mut fhe, ct.handle()).unwrap();

        assert!(fhe.is_publicly_decryptable(ct.handle()));
        assert!(fhe.public_decrypt(&ct).unwrap());
    }
}
