//! Token and triangle definitions

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::{ChainId, CoreError, CoreResult};

/// Token information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    pub chain: ChainId,
}

impl Token {
    pub fn new(address: Address, symbol: &str, decimals: u8, chain: ChainId) -> Self {
        Self {
            address,
            symbol: symbol.to_string(),
            decimals,
            chain,
        }
    }
}

/// Well-known token addresses per chain
pub static TOKENS: LazyLock<HashMap<ChainId, HashMap<&'static str, Token>>> = LazyLock::new(|| {
    let mut chains = HashMap::new();

    // Base
    let mut base_tokens = HashMap::new();
    base_tokens.insert("WETH", Token::new(
        address!("4200000000000000000000000000000000000006"),
        "WETH", 18, ChainId::Base
    ));
    base_tokens.insert("USDC", Token::new(
        address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"),
        "USDC", 6, ChainId::Base  // 6 decimals
    ));
    base_tokens.insert("cbETH", Token::new(
        address!("2Ae3F1Ec7F1F5563a3d161649c025dac7e983970"),
        "cbETH", 18, ChainId::Base
    ));
    chains.insert(ChainId::Base, base_tokens);

    // Ethereum Mainnet
    let mut eth_tokens = HashMap::new();
    eth_tokens.insert("WETH", Token::new(
        address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
        "WETH", 18, ChainId::Ethereum
    ));
    eth_tokens.insert("USDC", Token::new(
        address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
        "USDC", 6, ChainId::Ethereum
    ));
    eth_tokens.insert("cbETH", Token::new(
        address!("Be9895146f7AF43049ca1c1AE358B0541Ea49704"),
        "cbETH", 18, ChainId::Ethereum
    ));
    chains.insert(ChainId::Ethereum, eth_tokens);

    chains
});

/// Get token by symbol for a chain
pub fn get_token(chain: ChainId, symbol: &str) -> Option<&'static Token> {
    TOKENS.get(&chain)?.get(symbol)
}

/// Symbol for a known address, used for log labels only
pub fn symbol_of(chain: ChainId, address: Address) -> Option<&'static str> {
    TOKENS
        .get(&chain)?
        .values()
        .find(|t| t.address == address)
        .map(|t| t.symbol.as_str())
}

/// The three tokens of a triangular loop. The base asset is where every
/// loop starts and ends and is what gets flash-borrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    base: Address,
    first: Address,
    second: Address,
}

impl Triangle {
    pub fn new(base: Address, first: Address, second: Address) -> CoreResult<Self> {
        for (addr, label) in [(base, "base"), (first, "first leg"), (second, "second leg")] {
            if addr.is_zero() {
                return Err(CoreError::ZeroAddress(label));
            }
        }
        if first == base || second == base {
            return Err(CoreError::DuplicateMember(base));
        }
        if first == second {
            return Err(CoreError::DuplicateMember(first));
        }
        Ok(Self { base, first, second })
    }

    pub fn base(&self) -> Address {
        self.base
    }

    /// The non-base members, in configured order
    pub fn legs(&self) -> [Address; 2] {
        [self.first, self.second]
    }

    pub fn contains(&self, token: Address) -> bool {
        token == self.base || token == self.first || token == self.second
    }
}
