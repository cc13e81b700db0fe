//! Key-management collaborator for the signing payload.
//!
//! The submit stage only sees the [`Sealer`] trait: hand it the payload parts,
//! get back ciphertexts plus a wrapped key. The production implementation
//! derives a one-time AES key from a short numeric code, encrypts every part
//! with AES-256-CBC, and wraps the code with the service's RSA public key so
//! only the signing service can recover it.

use crate::errors::FlowlineError;
use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::Rng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::path::Path;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Width of the one-time numeric code an envelope is keyed on.
pub const ENVELOPE_CODE_LEN: usize = 8;

/// AES block size; also the width of the IV prepended to each ciphertext.
const AES_BLOCK_SIZE: usize = 16;

/// A sealed payload: one ciphertext per input part, all under one wrapped key.
#[derive(Debug, Clone)]
pub struct SealedEnvelope {
    /// Base64 ciphertexts, in the order the parts were given.
    pub ciphertexts: Vec<String>,
    /// The base64, RSA-wrapped one-time code the parts are keyed on.
    pub wrapped_key: String,
}

/// Seals payload parts for transmission to the signing service.
pub trait Sealer: Send + Sync {
    /// Encrypts every part under one fresh key and wraps that key.
    fn seal(&self, parts: &[&[u8]]) -> Result<SealedEnvelope, FlowlineError>;
}

/// Production [`Sealer`] backed by the service's RSA public key.
#[derive(Debug, Clone)]
pub struct RsaEnvelopeSealer {
    public_key: RsaPublicKey,
}

impl RsaEnvelopeSealer {
    /// Creates a sealer from an already-parsed public key.
    #[must_use]
    pub fn new(public_key: RsaPublicKey) -> Self {
        Self { public_key }
    }

    /// Parses a PKCS#8 PEM public key.
    pub fn from_pem(pem: &str) -> Result<Self, FlowlineError> {
        let public_key = RsaPublicKey::from_public_key_pem(pem)
            .map_err(|e| FlowlineError::Encoding(format!("public key parse: {e}")))?;
        Ok(Self::new(public_key))
    }

    /// Reads and parses a PKCS#8 PEM public key file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, FlowlineError> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }
}

impl Sealer for RsaEnvelopeSealer {
    fn seal(&self, parts: &[&[u8]]) -> Result<SealedEnvelope, FlowlineError> {
        let code = gen_code(ENVELOPE_CODE_LEN);
        let key = derive_key(&code);

        let ciphertexts = parts
            .iter()
            .map(|part| aes_cbc_encrypt(&key, part))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rng = rand::thread_rng();
        let wrapped = self
            .public_key
            .encrypt(&mut rng, Pkcs1v15Encrypt, code.as_bytes())
            .map_err(|e| FlowlineError::Encoding(format!("key wrap: {e}")))?;

        Ok(SealedEnvelope {
            ciphertexts,
            wrapped_key: BASE64.encode(wrapped),
        })
    }
}

/// Inverse of [`RsaEnvelopeSealer`]; the service side of the exchange.
pub struct RsaEnvelopeOpener {
    private_key: RsaPrivateKey,
}

impl RsaEnvelopeOpener {
    /// Creates an opener from an already-parsed private key.
    #[must_use]
    pub fn new(private_key: RsaPrivateKey) -> Self {
        Self { private_key }
    }

    /// Parses a PKCS#1 PEM private key.
    pub fn from_pem(pem: &str) -> Result<Self, FlowlineError> {
        let private_key = RsaPrivateKey::from_pkcs1_pem(pem)
            .map_err(|e| FlowlineError::Encoding(format!("private key parse: {e}")))?;
        Ok(Self::new(private_key))
    }

    /// Reads and parses a PKCS#1 PEM private key file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, FlowlineError> {
        let pem = std::fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }

    /// Unwraps the envelope key and decrypts every part, in order.
    pub fn open(&self, envelope: &SealedEnvelope) -> Result<Vec<Vec<u8>>, FlowlineError> {
        let wrapped = BASE64
            .decode(&envelope.wrapped_key)
            .map_err(|e| FlowlineError::Encoding(format!("wrapped key base64: {e}")))?;
        let code = self
            .private_key
            .decrypt(Pkcs1v15Encrypt, &wrapped)
            .map_err(|e| FlowlineError::Encoding(format!("key unwrap: {e}")))?;
        let code = String::from_utf8(code)
            .map_err(|e| FlowlineError::Encoding(format!("envelope code: {e}")))?;

        let key = derive_key(&code);
        envelope
            .ciphertexts
            .iter()
            .map(|ciphertext| aes_cbc_decrypt(&key, ciphertext))
            .collect()
    }
}

/// Derives the 32-byte AES key for a one-time code.
#[must_use]
pub fn derive_key(code: &str) -> [u8; 32] {
    Sha256::digest(code.as_bytes()).into()
}

/// Generates a random numeric code of the given width.
#[must_use]
pub fn gen_code(width: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..width)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// AES-256-CBC with PKCS#7 padding; the IV is prepended to the ciphertext and
/// the whole buffer is base64-encoded.
fn aes_cbc_encrypt(key: &[u8; 32], plaintext: &[u8]) -> Result<String, FlowlineError> {
    let iv_code = gen_code(AES_BLOCK_SIZE);
    let cipher = Aes256CbcEnc::new_from_slices(key, iv_code.as_bytes())
        .map_err(|e| FlowlineError::Encoding(format!("cipher init: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut buffer = Vec::with_capacity(AES_BLOCK_SIZE + ciphertext.len());
    buffer.extend_from_slice(iv_code.as_bytes());
    buffer.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(buffer))
}

/// Inverse of [`aes_cbc_encrypt`].
pub fn aes_cbc_decrypt(key: &[u8; 32], encoded: &str) -> Result<Vec<u8>, FlowlineError> {
    let data = BASE64
        .decode(encoded)
        .map_err(|e| FlowlineError::Encoding(format!("ciphertext base64: {e}")))?;
    if data.len() < AES_BLOCK_SIZE {
        return Err(FlowlineError::Encoding(
            "ciphertext shorter than one block".to_string(),
        ));
    }

    let (iv, ciphertext) = data.split_at(AES_BLOCK_SIZE);
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|e| FlowlineError::Encoding(format!("cipher init: {e}")))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|e| FlowlineError::Encoding(format!("unpad: {e}")))
}
