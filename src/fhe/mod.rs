//! Encrypted arithmetic capability
//!
//! The ledger never touches plaintext of an encrypted value. Everything it
//! needs from the homomorphic layer goes through [`FheBackend`]:
//! - lifting constants and externally supplied ciphertexts (with proof)
//! - add, sub, bitwise-and, equality and conditional select
//! - recording who may decrypt a handle
//!
//! Any backend implementing the trait can be substituted without touching
//! the ledger or the game registry. [`LocalBackend`] is the in-process
//! reference implementation.

pub mod local;

pub use local::LocalBackend;

use std::fmt;
use std::marker::PhantomData;
use nostr::PublicKey;
use serde::{Deserialize, Serialize};
use crate::error::{utils, CasinoResult};

/// Opaque 32-byte identifier of a ciphertext held by a backend
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle([u8; 32]);

impl Handle {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_hex(&self) -> String {
        utils::to_hex(&self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}..)", &self.to_hex()[..12])
    }
}

/// Plaintext type carried by a ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FheType {
    Bool,
    Uint8,
    Uint32,
}

impl FheType {
    pub fn bits(self) -> u32 {
        match self {
            FheType::Bool => 1,
            FheType::Uint8 => 8,
            FheType::Uint32 => 32,
        }
    }

    /// Largest representable plaintext
    pub fn max_value(self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    pub fn tag(self) -> u8 {
        match self {
            FheType::Bool => 0,
            FheType::Uint8 => 2,
            FheType::Uint32 => 4,
        }
    }
}

/// Plaintext types that can be encrypted
pub trait FheScalar: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    const TYPE: FheType;

    fn to_bits(self) -> u64;

    fn from_bits(bits: u64) -> Self;
}

/// Plaintext types supporting arithmetic
pub trait FheInteger: FheScalar {}

impl FheScalar for bool {
    const TYPE: FheType = FheType::Bool;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits & 1 == 1
    }
}

impl FheScalar for u8 {
    const TYPE: FheType = FheType::Uint8;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as u8
    }
}

impl FheScalar for u32 {
    const TYPE: FheType = FheType::Uint32;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits as u32
    }
}

impl FheInteger for u8 {}
impl FheInteger for u32 {}

/// Typed reference to a ciphertext. Cheap to copy; carries no plaintext.
#[derive(Serialize, Deserialize)]
pub struct Encrypted<T> {
    handle: Handle,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T> Encrypted<T> {
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl<T> Clone for Encrypted<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Encrypted<T> {}

impl<T> PartialEq for Encrypted<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T> Eq for Encrypted<T> {}

impl<T: FheScalar> fmt::Debug for Encrypted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Encrypted<{:?}>({:?})", T::TYPE, self.handle)
    }
}

pub type Ebool = Encrypted<bool>;
pub type Euint8 = Encrypted<u8>;
pub type Euint32 = Encrypted<u32>;

/// Ciphertext submitted from outside together with its validity proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalInput {
    pub fhe_type: FheType,
    pub ciphertext: Vec<u8>,
    pub proof: Vec<u8>,
}

/// Homomorphic operations and decryption grants consumed by the ledger
pub trait FheBackend {
    /// Identity under which the ledger itself holds decryption rights
    fn contract_address(&self) -> PublicKey;

    /// Encrypt a plaintext constant
    fn trivial_encrypt<T: FheScalar>(&mut self, value: T) -> Encrypted<T>;

    /// Lift an external ciphertext after checking its proof binds it to
    /// `sender`, this contract and type `T`
    fn verify_input<T: FheScalar>(
        &mut self,
        input: &ExternalInput,
        sender: &PublicKey,
    ) -> CasinoResult<Encrypted<T>>;

    /// Addition, wrapping at the bit width of `T`
    fn add<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>>;

    /// Subtraction, wrapping at the bit width of `T`
    fn sub<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>>;

    fn and<T: FheInteger>(
        &mut self,
        lhs: &Encrypted<T>,
        rhs: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>>;

    fn eq<T: FheScalar>(&mut self, lhs: &Encrypted<T>, rhs: &Encrypted<T>) -> CasinoResult<Ebool>;

    /// `condition ? if_true : if_false`, both branches already computed
    fn select<T: FheScalar>(
        &mut self,
        condition: &Ebool,
        if_true: &Encrypted<T>,
        if_false: &Encrypted<T>,
    ) -> CasinoResult<Encrypted<T>>;

    /// Grant `account` the right to decrypt `handle`
    fn allow(&mut self, handle: Handle, account: &PublicKey) -> CasinoResult<()>;

    /// Grant the contract itself the right to decrypt `handle`
    fn allow_this(&mut self, handle: Handle) -> CasinoResult<()> {
        let contract = self.contract_address();
        self.allow(handle, &contract)
    }

    /// Let anyone decrypt `handle`
    fn make_publicly_decryptable(&mut self, handle: Handle) -> CasinoResult<()>;

    fn is_allowed(&self, handle: Handle, account: &PublicKey) -> bool;

    fn is_publicly_decryptable(&self, handle: Handle) -> bool;

    /// Start recording ciphertexts and grants created from here on
    fn begin(&mut self);

    /// Keep everything recorded since `begin`
    fn commit(&mut self);

    /// Discard every ciphertext and grant created since `begin`
    fn rollback(&mut self);
}
