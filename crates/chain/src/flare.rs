use {
    crate::{Enosys, Fassets, Network, Sparkdex, Token},
    alloy::primitives::{Address, address},
    url::Url,
};

const WFLR: Address = address!("1D80c49BbBCd1C0911346656B529DF9E5c2F783d");

fn token(symbol: &str, address: Address, decimals: u8) -> Token {
    Token {
        symbol: symbol.to_string(),
        address,
        decimals,
    }
}

fn url(url: &str) -> Url {
    Url::parse(url).expect("built-in urls are valid")
}

fn pair(a: &str, b: &str) -> (String, String) {
    (a.to_string(), b.to_string())
}

/// Flare mainnet, chain id 14.
pub fn network() -> Network {
    Network {
        key: "flare".to_string(),
        name: "Flare".to_string(),
        chain_id: 14,
        rpc: url("https://flare-api.flare.network/ext/C/rpc"),
        explorer: url("https://flarescan.com"),
        native_symbol: "FLR".to_string(),
        wrapped_native: WFLR,
        tokens: vec![
            token("WFLR", WFLR, 18),
            token(
                "BANK",
                address!("194726F6C2aE988f1Ab5e1C943c17e591a6f6059"),
                18,
            ),
            token(
                "FXRP",
                address!("Ad552A648C74D49E10027AB8a618A3ad4901c5bE"),
                6,
            ),
            token(
                "sFLR",
                address!("12e605bc104e93B45e1aD99F9e555f659051c2BB"),
                18,
            ),
            token(
                "rFLR",
                address!("26d460c3Cf931Fb2014FA436a49e3Af08619810e"),
                18,
            ),
            token(
                "USDT0",
                address!("e7cd86e13AC4309349F30B3435a9d337750fC82D"),
                6,
            ),
            token(
                "USDC.e",
                address!("fbda5f676cb37624f28265a144a48b0d6e87d3b6"),
                6,
            ),
            token(
                "CDP",
                address!("6Cd3a5Ba46FA254D4d2E3C2B37350ae337E94a0F"),
                18,
            ),
            token(
                "stXRP",
                address!("4C18Ff3C89632c3Dd62E796c0aFA5c07c4c1B2b3"),
                6,
            ),
            token(
                "earnXRP",
                address!("e533e447fd7720b2f8654da2b1953efa06b60bfa"),
                6,
            ),
            token(
                "HLN",
                address!("140D8d3649Ec605CF69018C627fB44cCC76eC89f"),
                18,
            ),
            token(
                "APS",
                address!("ff56eb5b1a7faa972291117e5e9565da29bc808d"),
                18,
            ),
        ],
        enosys: Enosys {
            position_manager: address!("d9770b1c7a6ccd33c75b5bcb1c0078f46be46657"),
            factory: address!("17AA157AC8C54034381b840Cb8f6bf7Fc355f0de"),
            swap_router: address!("5FD34090E9b195d8482Ad3CC63dB078534F1b113"),
            quoter: address!("E505Bf33e84dDA2183cd0E4a6E8B084b85BC4269"),
            fee_tiers: vec![500, 3000, 10000],
            pairs: vec![
                pair("WFLR", "sFLR"),
                pair("WFLR", "FXRP"),
                pair("WFLR", "HLN"),
                pair("WFLR", "BANK"),
                pair("sFLR", "FXRP"),
            ],
        },
        sparkdex: Sparkdex {
            factory: address!("805488DaA81c1b9e7C5cE3f1DCeA28F21448EC6A"),
            swap_router: address!("69D57B9D705eaD73a5d2f2476C30c55bD755cc2F"),
            quoter: address!("6AD6A4f233F1E33613e996CCc17409B93fF8bf5f"),
        },
        fassets: Fassets {
            asset_manager: address!("2a3Fe068cD92178554cabcf7c95ADf49B4B0B6A8"),
            fasset: "FXRP".to_string(),
        },
    }
}
