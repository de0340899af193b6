//! Classic `r…` addresses: base58check over a version byte and the 20 byte
//! account id, with the Ripple alphabet.

use {
    regex::Regex,
    ripemd::Ripemd160,
    sha2::{Digest, Sha256},
    std::{fmt, str::FromStr, sync::LazyLock},
};

const ACCOUNT_ID_VERSION: u8 = 0x00;

static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^r[1-9A-HJ-NP-Za-km-z]{24,34}$").expect("address pattern is valid")
});

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid XRPL address {0:?}, expected an r-address")]
    Format(String),
    #[error("invalid XRPL address {0:?}: bad checksum or payload")]
    Checksum(String),
}

/// Cheap syntactic check, performed before any network call.
pub fn is_valid_format(address: &str) -> bool {
    PATTERN.is_match(address)
}

pub(crate) fn base58_decode(value: &str) -> Option<Vec<u8>> {
    bs58::decode(value)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check(None)
        .into_vec()
        .ok()
}

pub(crate) fn base58_encode(payload: &[u8]) -> String {
    bs58::encode(payload)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .with_check()
        .into_string()
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassicAddress([u8; 20]);

impl ClassicAddress {
    pub fn from_account_id(account_id: [u8; 20]) -> Self {
        Self(account_id)
    }

    /// Address of the account controlled by a (33 byte) public key.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Ripemd160::digest(Sha256::digest(public_key));
        Self(digest.into())
    }

    pub fn account_id(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for ClassicAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_format(s) {
            return Err(Error::Format(s.to_string()));
        }
        match base58_decode(s).as_deref() {
            Some([ACCOUNT_ID_VERSION, account_id @ ..]) if account_id.len() == 20 => {
                let mut id = [0; 20];
                id.copy_from_slice(account_id);
                Ok(Self(id))
            }
            _ => Err(Error::Checksum(s.to_string())),
        }
    }
}

impl fmt::Display for ClassicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(21);
        payload.push(ACCOUNT_ID_VERSION);
        payload.extend_from_slice(&self.0);
        f.write_str(&base58_encode(&payload))
    }
}

impl fmt::Debug for ClassicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassicAddress({self})")
    }
}

impl serde::Serialize for ClassicAddress {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for ClassicAddress {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}
