//! Canonical binary encoding of Payment transactions.
//!
//! Fields are written sorted by (type code, field code), each behind its
//! field header. Only the fields a plain XRP payment uses are supported.

use crate::{
    address::ClassicAddress,
    keys::{self, Keypair, sha512_half},
};

const PAYMENT: u16 = 0;
const XRP_AMOUNT_POSITIVE: u64 = 0x4000_0000_0000_0000;

/// Prefix of the message that gets signed.
const SIGNING_PREFIX: [u8; 4] = *b"STX\0";
/// Prefix of the signed blob when computing the transaction id.
const TRANSACTION_ID_PREFIX: [u8; 4] = *b"TXN\0";

const OBJECT_END: u8 = 0xE1;
const ARRAY_END: u8 = 0xF1;

#[derive(Clone, Copy)]
enum TypeCode {
    UInt16 = 1,
    UInt32 = 2,
    Amount = 6,
    Blob = 7,
    AccountId = 8,
    Object = 14,
    Array = 15,
}

#[derive(Clone, Copy)]
struct Field(TypeCode, u8);

const TRANSACTION_TYPE: Field = Field(TypeCode::UInt16, 2);
const FLAGS: Field = Field(TypeCode::UInt32, 2);
const SEQUENCE: Field = Field(TypeCode::UInt32, 4);
const DESTINATION_TAG: Field = Field(TypeCode::UInt32, 14);
const LAST_LEDGER_SEQUENCE: Field = Field(TypeCode::UInt32, 27);
const AMOUNT: Field = Field(TypeCode::Amount, 1);
const FEE: Field = Field(TypeCode::Amount, 8);
const SIGNING_PUB_KEY: Field = Field(TypeCode::Blob, 3);
const TXN_SIGNATURE: Field = Field(TypeCode::Blob, 4);
const MEMO_TYPE: Field = Field(TypeCode::Blob, 12);
const MEMO_DATA: Field = Field(TypeCode::Blob, 13);
const ACCOUNT: Field = Field(TypeCode::AccountId, 1);
const DESTINATION: Field = Field(TypeCode::AccountId, 3);
const MEMO: Field = Field(TypeCode::Object, 10);
const MEMOS: Field = Field(TypeCode::Array, 9);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("amount of {0} drops cannot be encoded")]
    Amount(u64),
    #[error("blob of {0} bytes is too long")]
    BlobTooLong(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Memo {
    pub memo_type: Option<Vec<u8>>,
    pub memo_data: Option<Vec<u8>>,
}

impl Memo {
    /// Plain text memo with `text/plain` as its type.
    pub fn text(data: impl Into<Vec<u8>>) -> Self {
        Self {
            memo_type: Some(b"text/plain".to_vec()),
            memo_data: Some(data.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payment {
    pub account: ClassicAddress,
    pub destination: ClassicAddress,
    pub amount_drops: u64,
    pub fee_drops: u64,
    pub sequence: u32,
    pub flags: u32,
    pub destination_tag: Option<u32>,
    pub last_ledger_sequence: Option<u32>,
    pub memos: Vec<Memo>,
    pub signing_pub_key: Vec<u8>,
    pub txn_signature: Option<Vec<u8>>,
}

/// A payment ready for submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedPayment {
    pub blob: Vec<u8>,
    /// Transaction id, upper case hex.
    pub hash: String,
}

impl Payment {
    /// Serializes every field, including the signature when present.
    pub fn encode(&self) -> Result<Vec<u8>, Error> {
        self.serialize(true)
    }

    /// The bytes a signer signs over.
    pub fn signing_data(&self) -> Result<Vec<u8>, Error> {
        let mut data = SIGNING_PREFIX.to_vec();
        data.extend(self.serialize(false)?);
        Ok(data)
    }

    pub fn sign(mut self, keypair: &Keypair) -> Result<SignedPayment, SignError> {
        self.signing_pub_key = keypair.public_key();
        let signature = keypair.sign(&self.signing_data()?)?;
        self.txn_signature = Some(signature);
        let blob = self.encode()?;
        let hash = transaction_hash(&blob);
        Ok(SignedPayment { blob, hash })
    }

    fn serialize(&self, with_signature: bool) -> Result<Vec<u8>, Error> {
        let mut out = Vec::with_capacity(256);
        write_header(&mut out, TRANSACTION_TYPE);
        out.extend(PAYMENT.to_be_bytes());
        write_header(&mut out, FLAGS);
        out.extend(self.flags.to_be_bytes());
        write_header(&mut out, SEQUENCE);
        out.extend(self.sequence.to_be_bytes());
        if let Some(tag) = self.destination_tag {
            write_header(&mut out, DESTINATION_TAG);
            out.extend(tag.to_be_bytes());
        }
        if let Some(ledger) = self.last_ledger_sequence {
            write_header(&mut out, LAST_LEDGER_SEQUENCE);
            out.extend(ledger.to_be_bytes());
        }
        write_header(&mut out, AMOUNT);
        out.extend(xrp_amount(self.amount_drops)?);
        write_header(&mut out, FEE);
        out.extend(xrp_amount(self.fee_drops)?);
        write_blob(&mut out, SIGNING_PUB_KEY, &self.signing_pub_key)?;
        if let (true, Some(signature)) = (with_signature, &self.txn_signature) {
            write_blob(&mut out, TXN_SIGNATURE, signature)?;
        }
        write_blob(&mut out, ACCOUNT, self.account.account_id())?;
        write_blob(&mut out, DESTINATION, self.destination.account_id())?;
        if !self.memos.is_empty() {
            write_header(&mut out, MEMOS);
            for memo in &self.memos {
                write_header(&mut out, MEMO);
                if let Some(memo_type) = &memo.memo_type {
                    write_blob(&mut out, MEMO_TYPE, memo_type)?;
                }
                if let Some(memo_data) = &memo.memo_data {
                    write_blob(&mut out, MEMO_DATA, memo_data)?;
                }
                out.push(OBJECT_END);
            }
            out.push(ARRAY_END);
        }
        Ok(out)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Encode(#[from] Error),
    #[error(transparent)]
    Key(#[from] keys::Error),
}

/// Transaction id of a signed blob.
pub fn transaction_hash(blob: &[u8]) -> String {
    let mut data = TRANSACTION_ID_PREFIX.to_vec();
    data.extend_from_slice(blob);
    hex::encode_upper(sha512_half(&data))
}

fn write_header(out: &mut Vec<u8>, Field(type_code, field_code): Field) {
    let type_code = type_code as u8;
    match (type_code < 16, field_code < 16) {
        (true, true) => out.push(type_code << 4 | field_code),
        (true, false) => out.extend([type_code << 4, field_code]),
        (false, true) => out.extend([field_code, type_code]),
        (false, false) => out.extend([0, type_code, field_code]),
    }
}

fn write_blob(out: &mut Vec<u8>, field: Field, blob: &[u8]) -> Result<(), Error> {
    write_header(out, field);
    let len = blob.len();
    match len {
        0..=192 => out.push(len as u8),
        193..=12_480 => {
            let rest = len - 193;
            out.extend([193 + (rest >> 8) as u8, (rest & 0xff) as u8]);
        }
        _ => return Err(Error::BlobTooLong(len)),
    }
    out.extend_from_slice(blob);
    Ok(())
}

fn xrp_amount(drops: u64) -> Result<[u8; 8], Error> {
    if drops > crate::amount::MAX_DROPS {
        return Err(Error::Amount(drops));
    }
    Ok((XRP_AMOUNT_POSITIVE | drops).to_be_bytes())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::keys::Seed};

    fn payment() -> Payment {
        Payment {
            account: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".parse().unwrap(),
            destination: ClassicAddress::from_account_id([0x11; 20]),
            amount_drops: 10_050_000,
            fee_drops: 12,
            sequence: 7,
            flags: 0,
            destination_tag: None,
            last_ledger_sequence: Some(1_000),
            memos: vec![],
            signing_pub_key: vec![],
            txn_signature: None,
        }
    }

    #[test]
    fn encodes_fields_in_canonical_order() {
        let encoded = payment().encode().unwrap();
        let mut expected = vec![0x12, 0x00, 0x00];
        expected.extend([0x22, 0, 0, 0, 0]);
        expected.extend([0x24, 0, 0, 0, 7]);
        expected.extend([0x20, 0x1B, 0, 0, 0x03, 0xE8]);
        expected.extend([0x61, 0x40, 0, 0, 0, 0, 0x99, 0x59, 0xD0]);
        expected.extend([0x68, 0x40, 0, 0, 0, 0, 0, 0, 12]);
        expected.extend([0x73, 0x00]);
        expected.push(0x81);
        expected.push(20);
        expected.extend(hex::decode("B5F762798A53D543A014CAF8B297CFF8F2F937E8").unwrap());
        expected.push(0x83);
        expected.push(20);
        expected.extend([0x11; 20]);
        assert_eq!(encoded, expected);
    }

    #[test]
    fn encodes_optional_fields() {
        let payment = Payment {
            destination_tag: Some(42),
            memos: vec![Memo::text("ref")],
            ..payment()
        };
        let encoded = payment.encode().unwrap();
        // Destination tag sorts right after the sequence.
        assert_eq!(&encoded[13..18], &[0x2E, 0, 0, 0, 42]);
        let memos = [
            &[0xF9, 0xEA, 0x7C, 10][..],
            b"text/plain",
            &[0x7D, 3],
            b"ref",
            &[OBJECT_END, ARRAY_END],
        ]
        .concat();
        assert!(encoded.ends_with(&memos));
    }

    #[test]
    fn signature_is_excluded_from_signing_data() {
        let keypair = Seed::random().keypair().unwrap();
        let unsigned = Payment {
            signing_pub_key: keypair.public_key(),
            ..payment()
        };
        let signed = Payment {
            txn_signature: Some(vec![0xAB; 64]),
            ..unsigned.clone()
        };
        assert_eq!(unsigned.signing_data(), signed.signing_data());
        assert!(unsigned.signing_data().unwrap().starts_with(b"STX\0"));
        assert_eq!(signed.encode().unwrap().len(), unsigned.encode().unwrap().len() + 66);
    }

    #[test]
    fn signs_and_hashes() {
        let keypair = "snoPBrXtMeMyMHUVTgbuqAfg1SUTb"
            .parse::<Seed>()
            .unwrap()
            .keypair()
            .unwrap();
        let signed = payment().sign(&keypair).unwrap();
        assert_eq!(signed.hash.len(), 64);
        assert_eq!(signed.hash, transaction_hash(&signed.blob));
        assert!(signed.hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
    }

    #[test]
    fn long_blobs_use_two_length_bytes() {
        let mut out = Vec::new();
        write_blob(&mut out, MEMO_DATA, &[0; 200]).unwrap();
        assert_eq!(&out[..3], &[0x7D, 193, 7]);
        assert_eq!(out.len(), 203);
        assert_eq!(
            write_blob(&mut out, MEMO_DATA, &[0; 20_000]),
            Err(Error::BlobTooLong(20_000))
        );
    }

    #[test]
    fn rejects_impossible_amounts() {
        let payment = Payment {
            amount_drops: u64::MAX,
            ..payment()
        };
        assert_eq!(payment.encode(), Err(Error::Amount(u64::MAX)));
    }
}
