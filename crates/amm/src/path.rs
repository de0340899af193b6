//! Packed multi-hop swap paths as expected by the routers and quoters.
//!
//! Uniswap V3 packs `token ‖ fee(uint24) ‖ token ‖ …`, Algebra Integral packs
//! `token ‖ deployer ‖ token ‖ …` where the zero deployer selects the default
//! pool deployer.

use alloy::primitives::{Address, Bytes};

const ADDRESS_LEN: usize = 20;
const FEE_LEN: usize = 3;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("a path needs at least two tokens")]
    TooShort,
    #[error("{tokens} tokens need {} hop parameters, got {hops}", tokens - 1)]
    HopMismatch { tokens: usize, hops: usize },
    #[error("fee {0} does not fit in 24 bits")]
    FeeTooLarge(u32),
    #[error("path of {0} bytes is not a valid encoding")]
    InvalidLength(usize),
}

pub fn encode_v3(tokens: &[Address], fees: &[u32]) -> Result<Bytes, Error> {
    check_hops(tokens, fees.len())?;
    let mut path = Vec::with_capacity(tokens.len() * ADDRESS_LEN + fees.len() * FEE_LEN);
    for (token, fee) in tokens.iter().zip(fees) {
        if *fee >= 1 << 24 {
            return Err(Error::FeeTooLarge(*fee));
        }
        path.extend_from_slice(token.as_slice());
        path.extend_from_slice(&fee.to_be_bytes()[1..]);
    }
    path.extend_from_slice(tokens[tokens.len() - 1].as_slice());
    Ok(path.into())
}

pub fn decode_v3(path: &[u8]) -> Result<(Vec<Address>, Vec<u32>), Error> {
    let (tokens, hops) = split(path, FEE_LEN)?;
    let fees = hops
        .into_iter()
        .map(|fee| u32::from_be_bytes([0, fee[0], fee[1], fee[2]]))
        .collect();
    Ok((tokens, fees))
}

pub fn encode_algebra(tokens: &[Address], deployers: &[Address]) -> Result<Bytes, Error> {
    check_hops(tokens, deployers.len())?;
    let mut path = Vec::with_capacity((tokens.len() + deployers.len()) * ADDRESS_LEN);
    for (token, deployer) in tokens.iter().zip(deployers) {
        path.extend_from_slice(token.as_slice());
        path.extend_from_slice(deployer.as_slice());
    }
    path.extend_from_slice(tokens[tokens.len() - 1].as_slice());
    Ok(path.into())
}

/// Algebra path through the default deployer for every hop.
pub fn encode_algebra_default(tokens: &[Address]) -> Result<Bytes, Error> {
    let deployers = vec![Address::ZERO; tokens.len().saturating_sub(1)];
    encode_algebra(tokens, &deployers)
}

pub fn decode_algebra(path: &[u8]) -> Result<(Vec<Address>, Vec<Address>), Error> {
    let (tokens, hops) = split(path, ADDRESS_LEN)?;
    let deployers = hops.into_iter().map(Address::from_slice).collect();
    Ok((tokens, deployers))
}

fn check_hops(tokens: &[Address], hops: usize) -> Result<(), Error> {
    if tokens.len() < 2 {
        return Err(Error::TooShort);
    }
    if tokens.len() != hops + 1 {
        return Err(Error::HopMismatch {
            tokens: tokens.len(),
            hops,
        });
    }
    Ok(())
}

/// Splits a packed path into its tokens and raw hop parameters of `hop_len`
/// bytes each.
fn split(path: &[u8], hop_len: usize) -> Result<(Vec<Address>, Vec<&[u8]>), Error> {
    let stride = ADDRESS_LEN + hop_len;
    if path.len() < ADDRESS_LEN + stride || (path.len() - ADDRESS_LEN) % stride != 0 {
        return Err(Error::InvalidLength(path.len()));
    }
    let mut tokens = Vec::new();
    let mut hops = Vec::new();
    let mut rest = path;
    while rest.len() > ADDRESS_LEN {
        let (hop, tail) = rest.split_at(stride);
        tokens.push(Address::from_slice(&hop[..ADDRESS_LEN]));
        hops.push(&hop[ADDRESS_LEN..]);
        rest = tail;
    }
    tokens.push(Address::from_slice(rest));
    Ok((tokens, hops))
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{address, hex},
    };

    const A: Address = address!("1D80c49BbBCd1C0911346656B529DF9E5c2F783d");
    const B: Address = address!("AD552A648C74D49E10027AB8a618A3ad4901c5bE");
    const C: Address = address!("12e605bc104e93B45e1aD99F9e555f659051c2BB");

    #[test]
    fn v3_two_hops() {
        let path = encode_v3(&[A, B, C], &[3000, 500]).unwrap();
        assert_eq!(path.len(), 66);
        assert_eq!(&path[20..23], hex!("000bb8"));
        assert_eq!(&path[43..46], hex!("0001f4"));
        assert_eq!(decode_v3(&path).unwrap(), (vec![A, B, C], vec![3000, 500]));
    }

    #[test]
    fn algebra_two_hops() {
        let path = encode_algebra_default(&[A, B, C]).unwrap();
        assert_eq!(path.len(), 100);
        assert_eq!(
            decode_algebra(&path).unwrap(),
            (vec![A, B, C], vec![Address::ZERO; 2])
        );

        let deployer = address!("0000000000000000000000000000000000000d0d");
        let path = encode_algebra(&[A, C], &[deployer]).unwrap();
        assert_eq!(path.len(), 60);
        assert_eq!(decode_algebra(&path).unwrap().1, vec![deployer]);
    }

    #[test]
    fn rejects_mismatched_hops() {
        assert_eq!(encode_v3(&[A], &[]), Err(Error::TooShort));
        assert_eq!(
            encode_v3(&[A, B, C], &[3000]),
            Err(Error::HopMismatch { tokens: 3, hops: 1 })
        );
        assert_eq!(encode_v3(&[A, B], &[1 << 24]), Err(Error::FeeTooLarge(1 << 24)));
        assert_eq!(
            encode_algebra(&[A, B], &[]),
            Err(Error::HopMismatch { tokens: 2, hops: 0 })
        );
    }

    #[test]
    fn rejects_truncated_paths() {
        let path = encode_v3(&[A, B], &[3000]).unwrap();
        assert_eq!(decode_v3(&path[..42]), Err(Error::InvalidLength(42)));
        assert_eq!(decode_v3(&path[..20]), Err(Error::InvalidLength(20)));
        assert_eq!(decode_algebra(&path), Err(Error::InvalidLength(43)));
    }
}
