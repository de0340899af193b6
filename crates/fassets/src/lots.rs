use {
    crate::arguments::Size,
    alloy::primitives::U256,
    anyhow::{Context, Result},
    number::format_amount,
};

/// Requested size of a mint or redemption, validated before anything is
/// read from chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requested {
    Lots(u64),
    /// FXRP amount in UBA.
    Amount(U256),
}

impl Requested {
    pub fn parse(size: &Size, decimals: u8) -> Result<Self> {
        match (size.lots, &size.amount) {
            (Some(lots), _) => {
                anyhow::ensure!(lots >= 1, "--lots must be at least 1");
                Ok(Self::Lots(lots))
            }
            (None, Some(amount)) => Ok(Self::Amount(number::parse_positive_amount(
                amount, decimals,
            )?)),
            (None, None) => anyhow::bail!("pass either --lots or --amount"),
        }
    }

    /// Number of lots once the lot size is known. Amounts must be a whole
    /// number of lots.
    pub fn lots(self, lot_size: U256, decimals: u8) -> Result<u64> {
        match self {
            Self::Lots(lots) => Ok(lots),
            Self::Amount(amount) => {
                anyhow::ensure!(!lot_size.is_zero(), "the asset manager reports a zero lot size");
                let (lots, rest) = amount.div_rem(lot_size);
                anyhow::ensure!(
                    rest.is_zero() && !lots.is_zero(),
                    "{} FXRP is not a whole number of lots, one lot is {} FXRP",
                    format_amount(amount, decimals),
                    format_amount(lot_size, decimals)
                );
                u64::try_from(lots).context("too many lots")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn size(lots: Option<u64>, amount: Option<&str>) -> Size {
        Size {
            lots,
            amount: amount.map(str::to_string),
        }
    }

    #[rstest]
    #[case(size(Some(3), None), 3)]
    #[case(size(None, Some("10")), 1)]
    #[case(size(None, Some("40")), 4)]
    fn converts_to_lots(#[case] size: Size, #[case] lots: u64) {
        let lot_size = U256::from(10_000_000);
        let requested = Requested::parse(&size, 6).unwrap();
        assert_eq!(requested.lots(lot_size, 6).unwrap(), lots);
    }

    #[test]
    fn rejects_partial_lots() {
        let requested = Requested::parse(&size(None, Some("15")), 6).unwrap();
        let err = requested.lots(U256::from(10_000_000), 6).unwrap_err();
        assert_eq!(
            err.to_string(),
            "15.0 FXRP is not a whole number of lots, one lot is 10.0 FXRP"
        );
        assert!(Requested::parse(&size(None, Some("5")), 6)
            .unwrap()
            .lots(U256::from(10_000_000), 6)
            .is_err());
        assert!(Requested::parse(&size(None, Some("0")), 6).is_err());
        assert!(Requested::parse(&size(None, None), 6).is_err());
    }
}
