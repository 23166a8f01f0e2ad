//! In-process reference backend
//!
//! Keeps plaintexts in a table keyed by opaque SHA-256 handles and enforces
//! decryption grants on the oracle side. Inputs are masked with a keystream
//! derived from a network key and bound to (contract, sender, type) by a
//! keyed digest. This is a deterministic stand-in for a real homomorphic
//! scheme: it is NOT confidential against whoever holds the process.

use std::collections::{HashMap, HashSet};
use std::fmt;
use nostr::PublicKey;
use tracing::trace;
use crate::error::{utils, CasinoError, CasinoResult};
use super::{Ebool, Encrypted, ExternalInput, FheBackend, FheInteger, FheScalar, FheType, Handle};

const SALT_LEN: usize = 16;
const PAYLOAD_LEN: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq)]
struct StoredCiphertext {
    fhe_type: FheType,
    bits: u64,
}

/// Everything created since `begin`, in creation order
#[derive(Debug, Clone, PartialEq, Eq)]
struct Journal {
    counter: u64,
    stored: Vec<Handle>,
    granted: Vec<(Handle, PublicKey)>,
    published: Vec<Handle>,
}

/// Reference [`FheBackend`] with an attached decryption oracle
#[derive(Clone, PartialEq, Eq)]
pub struct LocalBackend {
    contract: PublicKey,
    network_key: [u8; 32],
    store: HashMap<Handle, StoredCiphertext>,
    acl: HashMap<Handle, HashSet<PublicKey>>,
    public: HashSet<Handle>,
    counter: u64,
    journal: Option<Journal>,
}

impl fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackend")
            .field("contract", &self.contract.to_string())
            .field("network_key", &"<secret>")
            .field("ciphertexts", &self.store.len())
            .field("public", &self.public.len())
            .finish()
    }
}

impl LocalBackend {
    /// Create a backend serving the contract at `contract`
    pub fn new(contract: PublicKey) -> Self {
        let network_key = utils::sha256_parts(&[
            b"parity-dice/local-network-key",
            contract.to_string().as_bytes(),
        ]);
        Self::with_network_key(contract, network_key)
    }

    pub fn with_network_key(contract: PublicKey, network_key: [u8; 32]) -> Self {
        Self {
            contract,
            network_key,
            store: HashMap::new(),
            acl: HashMap::new(),
            public: HashSet::new(),
            counter: 0,
            journal: None,
        }
    }

    /// Number of ciphertexts held
    pub fn ciphertext_count(&self) -> usize {
        self.store.len()
    }

    /// Client side: encrypt `value` for submission by `sender` to this contract
    pub fn encrypt_input<T: FheScalar>(&self, value: T, sender: &PublicKey) -> ExternalInput {
        let salt = *uuid::Uuid::new_v4().as_bytes();
        let keystream = self.keystream(&salt, sender);

        let mut ciphertext = Vec::with_capacity(SALT_LEN + PAYLOAD_LEN);
        ciphertext.extend_from_slice(&salt);
        for (byte, key) in value.to_bits().to_le_bytes().iter().zip(keystream.iter()) {
            ciphertext.push(byte ^ key);
        }

        let proof = self.input_proof(T::TYPE, &ciphertext, sender).to_vec();
        ExternalInput {
            fhe_type: T::TYPE,
            ciphertext,
            proof,
        }
    }

    /// Oracle side: decrypt for `requester` if a grant exists
    pub fn user_decrypt<T: FheScalar>(
        &self,
        ct: &Encrypted<T>,
        requester: &PublicKey,
    ) -> CasinoResult<T> {
        let handle = ct.handle();
        if !self.is_publicly_decryptable(handle) && !self.is_allowed(handle, requester) {
            return Err(CasinoError::DecryptionNotAllowed {
                handle: handle.to_hex(),
            });
        }
        Ok(T::from_bits(self.load::<T>(ct)?))
    }

    /// Oracle side: decrypt a handle that was made public
    pub fn public_decrypt<T: FheScalar>(&self, ct: &Encrypted<T>) -> CasinoResult<T> {
        let handle = ct.handle();
        if !self.is_publicly_decryptable(handle) {
            return Err(CasinoError::DecryptionNotAllowed {
                handle: handle.to_hex(),
            });
        }
        Ok(T::from_bits(self.load::<T>(ct)?))
    }

    fn keystream(&self, salt: &[u8], sender: &PublicKey) -> [u8; 32] {
        utils::sha256_parts(&[
            b"keystream",
            &self.network_key,
            salt,
            sender.to_string().as_bytes(),
        ])
    }

    fn input_proof(&self, fhe_type: FheType, ciphertext: &[u8], sender: &PublicKey) -> [u8; 32] {
        utils::sha256_parts(&[
            b"input-proof",
            &self.network_key,
            self.contract.to_string().as_bytes(),
            sender.to_string().as_bytes(),
            &[fhe_type.tag()],
            ciphertext,
        ])
    }

    fn load<T: FheScalar>(&self, ct: &Encrypted<T>) -> CasinoResult<u64> {
        let handle = ct.handle();
        match self.store.get(&handle) {
            Some(stored) if stored.fhe_type == T::TYPE => Ok(stored.bits),
            Some(stored) => Err(CasinoError::UnknownHandle(format!(
                "{} holds {:?}, expected {:?}",
                handle, stored.fhe_type, T::TYPE
            ))),
            None => Err(CasinoError::UnknownHandle(handle.to_hex())),
        }
    }

    fn store_value<T: FheScalar>(&mut self, op: &str, bits: u64) -> Encrypted<T> {
        self.counter += 1;
        let mut bytes = utils::sha256_parts(&[
            b"handle",
            self.contract.to_string().as_bytes(),
            op.as_bytes(),
            &self.counter.to_be_bytes(),
        ]);
        bytes[31] = T::TYPE.tag();
        let handle = Handle::from_bytes(bytes);

        self.store.insert(
            handle,
            StoredCiphertext {
                fhe_type: T::TYPE,
                bits: bits & T::TYPE.max_value(),
            },
        );
        if let Some(journal) = self.journal.as_mut() {
            journal.stored.push(handle);
        }
        trace!(op = op, handle = %handle, "ciphertext stored");
        Encrypted::from_handle(handle)
    }
}

impl FheBackend for LocalBackend {
    fn contract_address(&self) -> PublicKey {
        self.contract
    }

    fn trivial_encrypt<T: FheScalar>(&mut self, value: T) -> Encrypted<T> {
        self.store_value("trivial", value.to_bits())
    }

    fn verify_input<T: FheScalar>(
        &mut self,
        input: &ExternalInput,
        sender: &PublicKey,
    ) -> CasinoResult<Encrypted<T>> {
        if input.fhe_type != T::TYPE {
            return Err(CasinoError::InvalidProof(format!(
                "input declares {:?}, expected {:?}",
                input.fhe_type,
                T::TYPE
            )));
        }

        if input.ciphertext.len() != SALT_LEN + PAYLOAD_LEN {
            return Err(CasinoError::InvalidProof("malformed ciphertext".to_string()));
        }

        let expected = self.input_proof(input.fhe_type, &input.ciphertext, sender);
        if input.proof.as_slice() != expected.as_slice() {
            return Err(CasinoError::InvalidProof(
                "proof does not bind ciphertext to sender and contract".to_string(),
            ));
        }

        let (salt, masked) = input.ciphertext.split_at(SALT_LEN);
        let keystream = self.keystream(salt, sender);
        let mut plain = [0u8; PAYLOAD_LEN];
        for (i, (byte, key)) in masked.iter().zip(keystream.iter()).enumerate() {
            plain[i] = byte ^ key;
        }

        let bits = u64::from_le_bytes(plain);
        if bits > T::TYPE.max_value() {
            return Err(CasinoError::InvalidProof("plaintext out of range".to_string()));
        }

        Ok(self.store_value("input", bits))
    }

    fn add<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>> {
        let (a, b) = (self.load(lhs)?, self.load(rhs)?);
        Ok(self.store_value("add", a.wrapping_add(b)))
    }

    fn sub<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>> {
        let (a, b) = (self.load(lhs)?, self.load(rhs)?);
        Ok(self.store_value("sub", a.wrapping_sub(b)))
    }

    fn and<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>> {
        let (a, b) = (self.load(lhs)?, self.load(rhs)?);
        Ok(self.store_value("and", a & b))
    }

    fn eq<T: FheScalar>(&mut self, lhs: &Encrypted<T>, rhs: &Encrypted<T>) -> CasinoResult<Ebool> {
        let (a, b) = (self.load(lhs)?, self.load(rhs)?);
        Ok(self.store_value("eq", (a == b) as u64))
    }

    fn select<T: FheScalar>(
        &mut self,
        condition: &Ebool,
        if_true: &Encrypted<T>,
        if_false: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>> {
        let cond = self.load(condition)?;
        let (a, b) = (self.load(if_true)?, self.load(if_false)?);
        Ok(self.store_value("select", if cond == 1 { a } else { b }))
    }

    fn allow(&mut self, handle: Handle, account: &PublicKey) -> CasinoResult<()> {
        if !self.store.contains_key(&handle) {
            return Err(CasinoError::UnknownHandle(handle.to_hex()));
        }
        let fresh = self.acl.entry(handle).or_default().insert(*account);
        if let (true, Some(journal)) = (fresh, self.journal.as_mut()) {
            journal.granted.push((handle, *account));
        }
        Ok(())
    }

    fn make_publicly_decryptable(&mut self, handle: Handle) -> CasinoResult<()> {
        if !self.store.contains_key(&handle) {
            return Err(CasinoError::UnknownHandle(handle.to_hex()));
        }
        let fresh = self.public.insert(handle);
        if let (true, Some(journal)) = (fresh, self.journal.as_mut()) {
            journal.published.push(handle);
        }
        Ok(())
    }

    fn is_allowed(&self, handle: Handle, account: &PublicKey) -> bool {
        self.acl
            .get(&handle)
            .map(|grantees| grantees.contains(account))
            .unwrap_or(false)
    }

    fn is_publicly_decryptable(&self, handle: Handle) -> bool {
        self.public.contains(&handle)
    }

    fn begin(&mut self) {
        self.journal = Some(Journal {
            counter: self.counter,
            stored: Vec::new(),
            granted: Vec::new(),
            published: Vec::new(),
        });
    }

    fn commit(&mut self) {
        self.journal = None;
    }

    fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };

        for handle in &journal.published {
            self.public.remove(handle);
        }
        for (handle, account) in &journal.granted {
            if let Some(grantees) = self.acl.get_mut(handle) {
                grantees.remove(account);
                if grantees.is_empty() {
                    self.acl.remove(handle);
                }
            }
        }
        for handle in &journal.stored {
            self.store.remove(handle);
        }
        self.counter = journal.counter;
        trace!(discarded = journal.stored.len(), "backend rolled back");
    }
}
