//! Seeds and key pairs.
//!
//! Family seeds (`s…`) derive secp256k1 keys through a root and an
//! intermediate key, `sEd…` seeds derive ed25519 keys directly.

use {
    crate::address::{self, ClassicAddress},
    ed25519_dalek::Signer as _,
    k256::{
        Scalar,
        SecretKey,
        ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner},
        elliptic_curve::sec1::ToEncodedPoint,
    },
    rand::RngCore,
    sha2::{Digest, Sha512},
    std::{fmt, str::FromStr},
};

const SECP256K1_SEED_PREFIX: [u8; 1] = [0x21];
const ED25519_SEED_PREFIX: [u8; 3] = [0x01, 0xE1, 0x4B];
const ED25519_KEY_PREFIX: u8 = 0xED;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid XRPL seed")]
    InvalidSeed,
    #[error("invalid XRPL private key")]
    InvalidPrivateKey,
    #[error("signing failed: {0}")]
    Signing(#[from] k256::ecdsa::Error),
}

/// First half of SHA-512, the ledger's standard hash.
pub fn sha512_half(data: &[u8]) -> [u8; 32] {
    let digest = Sha512::digest(data);
    let mut half = [0; 32];
    half.copy_from_slice(&digest[..32]);
    half
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    Secp256k1,
    Ed25519,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Seed {
    entropy: [u8; 16],
    algorithm: Algorithm,
}

impl Seed {
    pub fn new(entropy: [u8; 16], algorithm: Algorithm) -> Self {
        Self { entropy, algorithm }
    }

    /// Fresh random ed25519 seed.
    pub fn random() -> Self {
        let mut entropy = [0; 16];
        rand::thread_rng().fill_bytes(&mut entropy);
        Self::new(entropy, Algorithm::Ed25519)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn keypair(&self) -> Result<Keypair, Error> {
        match self.algorithm {
            Algorithm::Ed25519 => {
                let secret = sha512_half(&self.entropy);
                Ok(Keypair::Ed25519(ed25519_dalek::SigningKey::from_bytes(
                    &secret,
                )))
            }
            Algorithm::Secp256k1 => derive_secp256k1(&self.entropy).map(Keypair::Secp256k1),
        }
    }
}

impl FromStr for Seed {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = address::base58_decode(s.trim()).ok_or(Error::InvalidSeed)?;
        let (algorithm, entropy) = if let Some(entropy) = payload.strip_prefix(&ED25519_SEED_PREFIX) {
            (Algorithm::Ed25519, entropy)
        } else if let Some(entropy) = payload.strip_prefix(&SECP256K1_SEED_PREFIX) {
            (Algorithm::Secp256k1, entropy)
        } else {
            return Err(Error::InvalidSeed);
        };
        let entropy = entropy.try_into().map_err(|_| Error::InvalidSeed)?;
        Ok(Self::new(entropy, algorithm))
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: &[u8] = match self.algorithm {
            Algorithm::Ed25519 => &ED25519_SEED_PREFIX,
            Algorithm::Secp256k1 => &SECP256K1_SEED_PREFIX,
        };
        f.write_str(&address::base58_encode(&[prefix, &self.entropy].concat()))
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seed")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

/// Returns the first hash of `data ‖ counter` that is a valid secp256k1
/// secret key. Virtually always the first one.
fn first_valid_scalar(data: &[u8]) -> SecretKey {
    let mut counter: u32 = 0;
    loop {
        let hash = sha512_half(&[data, &counter.to_be_bytes()].concat());
        if let Ok(key) = SecretKey::from_slice(&hash) {
            return key;
        }
        counter = counter.wrapping_add(1);
    }
}

fn derive_secp256k1(entropy: &[u8; 16]) -> Result<SigningKey, Error> {
    let root = first_valid_scalar(entropy);
    let root_public = root.public_key().to_encoded_point(true);
    // Account family 0.
    let intermediate =
        first_valid_scalar(&[root_public.as_bytes(), &0u32.to_be_bytes()].concat());
    let scalar: Scalar = *root.to_nonzero_scalar() + *intermediate.to_nonzero_scalar();
    SigningKey::from_bytes(&scalar.to_bytes()).map_err(|_| Error::InvalidPrivateKey)
}

pub enum Keypair {
    Secp256k1(SigningKey),
    Ed25519(ed25519_dalek::SigningKey),
}

impl Keypair {
    /// Parses the hex private key format used by wallet files: 33 bytes with
    /// a `00` (secp256k1) or `ED` (ed25519) prefix, or 32 raw secp256k1 bytes.
    pub fn from_private_hex(private_key: &str) -> Result<Self, Error> {
        let bytes = hex::decode(private_key.trim()).map_err(|_| Error::InvalidPrivateKey)?;
        match bytes.as_slice() {
            [ED25519_KEY_PREFIX, key @ ..] if key.len() == 32 => {
                let key: [u8; 32] = key.try_into().map_err(|_| Error::InvalidPrivateKey)?;
                Ok(Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&key)))
            }
            [0x00, key @ ..] | key if key.len() == 32 => SigningKey::from_slice(key)
                .map(Self::Secp256k1)
                .map_err(|_| Error::InvalidPrivateKey),
            _ => Err(Error::InvalidPrivateKey),
        }
    }

    /// 33 byte public key as it appears in `SigningPubKey`.
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Self::Secp256k1(key) => key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            Self::Ed25519(key) => [&[ED25519_KEY_PREFIX][..], key.verifying_key().as_bytes()].concat(),
        }
    }

    /// Private key in wallet file format.
    pub fn private_key_hex(&self) -> String {
        let (prefix, key) = match self {
            Self::Secp256k1(key) => (0x00, key.to_bytes().to_vec()),
            Self::Ed25519(key) => (ED25519_KEY_PREFIX, key.to_bytes().to_vec()),
        };
        hex::encode_upper([&[prefix][..], &key[..]].concat())
    }

    pub fn address(&self) -> ClassicAddress {
        ClassicAddress::from_public_key(&self.public_key())
    }

    /// Signs a serialized message. secp256k1 signs the SHA-512Half digest
    /// and returns a DER encoded low-S signature, ed25519 signs the message
    /// itself.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            Self::Secp256k1(key) => {
                let signature: Signature = key.sign_prehash(&sha512_half(message))?;
                let signature = signature.normalize_s().unwrap_or(signature);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Self::Ed25519(key) => Ok(key.sign(message).to_bytes().to_vec()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        k256::ecdsa::{VerifyingKey, signature::hazmat::PrehashVerifier},
    };

    // Genesis account of every new ledger.
    const GENESIS_SEED: &str = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb";
    const GENESIS_ADDRESS: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn derives_genesis_account() {
        let seed: Seed = GENESIS_SEED.parse().unwrap();
        assert_eq!(seed.algorithm(), Algorithm::Secp256k1);
        assert_eq!(seed.to_string(), GENESIS_SEED);
        let keypair = seed.keypair().unwrap();
        assert_eq!(keypair.address().to_string(), GENESIS_ADDRESS);
        assert_eq!(keypair.public_key().len(), 33);
    }

    #[test]
    fn random_seeds_are_ed25519() {
        let seed = Seed::random();
        assert!(seed.to_string().starts_with("sEd"));
        let parsed: Seed = seed.to_string().parse().unwrap();
        assert_eq!(parsed, seed);

        let keypair = seed.keypair().unwrap();
        let public_key = keypair.public_key();
        assert_eq!(public_key.len(), 33);
        assert_eq!(public_key[0], ED25519_KEY_PREFIX);
        assert_eq!(
            parsed.keypair().unwrap().address(),
            keypair.address()
        );
    }

    #[test]
    fn private_key_hex_roundtrip() {
        for seed in [GENESIS_SEED.parse::<Seed>().unwrap(), Seed::random()] {
            let keypair = seed.keypair().unwrap();
            let hex = keypair.private_key_hex();
            assert_eq!(hex.len(), 66);
            let restored = Keypair::from_private_hex(&hex).unwrap();
            assert_eq!(restored.address(), keypair.address());
        }
        assert!(Keypair::from_private_hex("zz").is_err());
        assert!(Keypair::from_private_hex("0011").is_err());
    }

    #[test]
    fn secp256k1_signatures_verify() {
        let keypair = GENESIS_SEED.parse::<Seed>().unwrap().keypair().unwrap();
        let message = b"payment";
        let signature = keypair.sign(message).unwrap();
        let signature = Signature::from_der(&signature).unwrap();
        assert!(signature.normalize_s().is_none());
        let verifying_key = VerifyingKey::from_sec1_bytes(&keypair.public_key()).unwrap();
        verifying_key
            .verify_prehash(&sha512_half(message), &signature)
            .unwrap();
    }

    #[test]
    fn ed25519_signatures_verify() {
        let keypair = Seed::random().keypair().unwrap();
        let message = b"payment";
        let signature = keypair.sign(message).unwrap();
        let public_key: [u8; 32] = keypair.public_key()[1..].try_into().unwrap();
        let verifying_key = ed25519_dalek::VerifyingKey::from_bytes(&public_key).unwrap();
        let signature = ed25519_dalek::Signature::from_slice(&signature).unwrap();
        verifying_key.verify_strict(message, &signature).unwrap();
    }

    #[test]
    fn rejects_garbage_seeds() {
        assert!("".parse::<Seed>().is_err());
        assert!(GENESIS_ADDRESS.parse::<Seed>().is_err());
    }
}
